//! CLI utilities for binaries
//!
//! Handles configuration path lookup and command line arguments.

use std::path::PathBuf;

/// Which configuration file to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigType {
    /// Hub connection configuration (config/hub.yaml)
    Hub,
    /// Custom path
    Custom(String),
}

impl ConfigType {
    /// Get the default path for this config type
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Hub => "config/hub.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    /// Get the environment variable name for this config type
    pub fn env_var_name(&self) -> &str {
        "HUB_CONFIG_PATH"
    }
}

/// Load configuration path from environment or use default
///
/// A custom path always wins over the environment.
///
/// # Examples
/// ```
/// use hub_client::bin_common::{load_config_from_env, ConfigType};
///
/// let path = load_config_from_env(ConfigType::Custom("hub.yaml".into()));
/// assert_eq!(path.to_str(), Some("hub.yaml"));
/// ```
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    match config_type {
        ConfigType::Custom(path) => path.into(),
        ConfigType::Hub => std::env::var(config_type.env_var_name())
            .unwrap_or_else(|_| config_type.default_path().to_string())
            .into(),
    }
}

/// Parse command line arguments for a binary
///
/// Returns a vector of arguments (excluding the program name)
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}

/// First positional argument as a custom config path, else the hub default
pub fn resolve_config_type(args: &[String]) -> ConfigType {
    args.iter()
        .find(|arg| !arg.starts_with('-'))
        .map(|path| ConfigType::Custom(path.clone()))
        .unwrap_or(ConfigType::Hub)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_type_paths() {
        assert_eq!(ConfigType::Hub.default_path(), "config/hub.yaml");

        let custom = ConfigType::Custom("custom/path.yaml".to_string());
        assert_eq!(custom.default_path(), "custom/path.yaml");
    }

    #[test]
    fn test_resolve_config_type() {
        assert_eq!(resolve_config_type(&[]), ConfigType::Hub);
        assert_eq!(
            resolve_config_type(&["--verbose".into(), "other.yaml".into()]),
            ConfigType::Custom("other.yaml".into())
        );
    }
}
