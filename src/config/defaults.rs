//! Default configuration values
//!
//! Provides default configuration instances and helper functions.

use super::schema::Config;

/// Get the default configuration
pub fn default_config() -> Config {
    Config::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert!(config.rules.builtin);
        assert!(config.resolver.namespace_scoped);
        assert_eq!(config.logger.level, "info");
    }

    #[test]
    fn test_empty_file_is_default() {
        let parsed: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(parsed, default_config());
    }
}
