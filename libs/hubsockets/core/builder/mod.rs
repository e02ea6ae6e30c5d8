pub mod states;

use crate::config::{HubConfig, QueryParam};
use crate::hub_connection::HubConnection;
use states::*;
use std::time::Duration;

/// Type-state builder for [`HubConnection`]
///
/// The URL is the only required field; `build()` is available only once it
/// has been set.
pub struct HubConnectionBuilder<U>
where
    U: UrlState,
{
    _state: TypeState<U>,
    config: HubConfig,
}

impl HubConnectionBuilder<NoUrl> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _state: TypeState::new(),
            config: HubConfig::new(String::new()),
        }
    }

    pub fn url(self, url: impl Into<String>) -> HubConnectionBuilder<HasUrl> {
        HubConnectionBuilder {
            _state: TypeState::new(),
            config: HubConfig {
                url: url.into(),
                ..self.config
            },
        }
    }
}

impl Default for HubConnectionBuilder<NoUrl> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> HubConnectionBuilder<U>
where
    U: UrlState,
{
    /// Protocol version announced in the handshake (default "1")
    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.config.protocol_version = version.into();
        self
    }

    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.config.auto_reconnect = enabled;
        self
    }

    /// Delay before each reconnect attempt
    pub fn reconnect_wait(mut self, wait: Duration) -> Self {
        self.config.reconnect_wait_ms = wait.as_millis() as u64;
        self
    }

    pub fn use_default_context_paths(mut self, enabled: bool) -> Self {
        self.config.use_default_context_paths = enabled;
        self
    }

    pub fn use_default_query_string(mut self, enabled: bool) -> Self {
        self.config.use_default_query_string = enabled;
        self
    }

    pub fn connection_token(mut self, token: impl Into<String>) -> Self {
        self.config.connection_token = Some(token.into());
        self
    }

    /// Append an extra query parameter; order is preserved
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.query.push(QueryParam {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Add a header to the upgrade request
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(name.into(), value.into());
        self
    }
}

impl HubConnectionBuilder<HasUrl> {
    /// Start from a loaded configuration
    pub fn from_config(config: HubConfig) -> Self {
        Self {
            _state: TypeState::new(),
            config,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn build(self) -> HubConnection {
        HubConnection::new(self.config)
    }
}
