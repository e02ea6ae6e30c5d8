use crate::traits::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Environment variable that overrides the configured hub URL
pub const HUB_URL_ENV: &str = "HUB_URL";

/// One extra query parameter appended to the connect URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParam {
    pub key: String,
    pub value: String,
}

/// Configuration of a hub connection
///
/// Loaded from YAML; every field except `url` has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubConfig {
    /// Base endpoint, e.g. `https://example.com/hub`
    pub url: String,

    /// Protocol version announced in the handshake
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,

    /// Reconnect automatically after an unexpected disconnect
    #[serde(default = "default_true")]
    pub auto_reconnect: bool,

    /// Delay before each reconnect attempt
    #[serde(default = "default_reconnect_wait_ms")]
    pub reconnect_wait_ms: u64,

    /// Append `/connect` or `/reconnect` to the base URL
    #[serde(default = "default_true")]
    pub use_default_context_paths: bool,

    /// Append the transport's default query string
    #[serde(default = "default_true")]
    pub use_default_query_string: bool,

    /// Token added to the default query string
    #[serde(default)]
    pub connection_token: Option<String>,

    #[serde(default)]
    pub query: Vec<QueryParam>,

    #[serde(default)]
    pub headers: Headers,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_protocol_version() -> String {
    "1".to_string()
}

fn default_true() -> bool {
    true
}

fn default_reconnect_wait_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl HubConfig {
    /// Configuration with defaults for everything but the URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            protocol_version: default_protocol_version(),
            auto_reconnect: true,
            reconnect_wait_ms: default_reconnect_wait_ms(),
            use_default_context_paths: true,
            use_default_query_string: true,
            connection_token: None,
            query: Vec::new(),
            headers: Headers::new(),
            log_level: default_log_level(),
        }
    }

    /// Load configuration from a YAML file
    ///
    /// `HUB_URL` overrides the file's `url` when set.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path.as_ref())?;
        let mut config = Self::from_yaml_str(&yaml_content)?;

        if let Ok(url) = std::env::var(HUB_URL_ENV) {
            info!("Using hub URL from {}", HUB_URL_ENV);
            config.url = url;
        }

        config.validate()?;
        info!("Loaded hub configuration from {}", config_path.as_ref().display());
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(HubSocketError::Configuration("url must not be empty".into()));
        }
        if self.protocol_version.trim().is_empty() {
            return Err(HubSocketError::Configuration(
                "protocol_version must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn reconnect_wait(&self) -> Duration {
        Duration::from_millis(self.reconnect_wait_ms)
    }

    /// Extra query parameters as ordered pairs
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .iter()
            .map(|param| (param.key.clone(), param.value.clone()))
            .collect()
    }
}
