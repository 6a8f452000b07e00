use std::net::SocketAddr;

use serde::Deserialize;

use crate::health::HealthConfig;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: Option<SocketAddr>,
    /// Header carrying the user id set by the upstream authentication layer
    #[serde(default = "default_user_header")]
    pub user_header: String,
    #[serde(default)]
    pub health: HealthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: None,
            user_header: default_user_header(),
            health: HealthConfig::default(),
        }
    }
}

fn default_user_header() -> String {
    "x-user-id".to_string()
}
