use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Upstream OpenAI-compatible chat model endpoint
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Base URL of the chat completions API
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// API key sent as a bearer token
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Model used when the request names none
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    /// Model selected by the deep-thinking flag
    #[serde(default = "default_reasoning_model")]
    pub reasoning_model: String,
    /// Sampling temperature when the request does not override it
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,
    /// Ask the upstream to append a usage chunk to each stream
    #[serde(default = "default_include_usage")]
    pub include_usage: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            chat_model: default_chat_model(),
            reasoning_model: default_reasoning_model(),
            default_temperature: default_temperature(),
            include_usage: default_include_usage(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse("https://api.deepseek.com/v1").expect("default base URL must be valid")
}

fn default_chat_model() -> String {
    "deepseek-chat".to_string()
}

fn default_reasoning_model() -> String {
    "deepseek-reasoner".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_temperature() -> f32 {
    0.9
}

#[allow(clippy::missing_const_for_fn)]
fn default_include_usage() -> bool {
    true
}
