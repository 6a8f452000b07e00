use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a placeholder cannot be
    /// resolved, the TOML is malformed, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if a placeholder cannot be resolved, the TOML is
    /// malformed, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded = crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_model_config()?;
        self.chat.stream_idle_timeout()?;
        self.validate_mcp_config()?;
        self.validate_telemetry_config()?;
        Ok(())
    }

    fn validate_model_config(&self) -> anyhow::Result<()> {
        if self.model.chat_model.trim().is_empty() {
            anyhow::bail!("model.chat_model must not be empty");
        }

        if self.model.reasoning_model.trim().is_empty() {
            anyhow::bail!("model.reasoning_model must not be empty");
        }

        if !self.model.default_temperature.is_finite() || self.model.default_temperature < 0.0 {
            anyhow::bail!("model.default_temperature must be a non-negative number");
        }

        Ok(())
    }

    fn validate_mcp_config(&self) -> anyhow::Result<()> {
        let timeouts = &self.mcp.timeouts;
        timeouts.connect_timeout()?;
        timeouts.list_tools_timeout()?;
        timeouts.call_timeout()?;
        timeouts.shutdown_grace()?;
        timeouts.cleanup_timeout()?;

        for (name, server) in &self.mcp.servers {
            if server.has_blank_env_key() {
                anyhow::bail!("MCP server '{name}' has an env entry with an empty key");
            }
        }

        Ok(())
    }

    fn validate_telemetry_config(&self) -> anyhow::Result<()> {
        let rate = self.telemetry.sampling_rate;
        if !(0.0..=1.0).contains(&rate) {
            anyhow::bail!("telemetry.sampling_rate must be between 0.0 and 1.0, got {rate}");
        }

        Ok(())
    }
}
