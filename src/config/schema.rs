//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Which link rules are active
    #[serde(default)]
    pub rules: RulesConfig,

    /// Resolution options
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerConfig,
}

/// Rule sources
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RulesConfig {
    /// Include the built-in rule table
    #[serde(default = "default_true")]
    pub builtin: bool,

    /// Rule ids to drop (e.g. "Secret->Deployment")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled: Vec<String>,

    /// Extra rule files, loaded after the rules directory
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<PathBuf>,
}

/// Resolver options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Skip candidates in a different namespace than the focal object.
    /// Cluster-scoped objects and manifests without a namespace still link.
    #[serde(default = "default_true")]
    pub namespace_scoped: bool,
}

/// Logger configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggerConfig {
    /// Default level when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write logs to this file instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            builtin: default_true(),
            disabled: Vec::new(),
            files: Vec::new(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            namespace_scoped: default_true(),
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert!(config.rules.builtin);
        assert!(config.rules.disabled.is_empty());
        assert!(config.resolver.namespace_scoped);
        assert_eq!(config.logger.level, "info");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("namespaceScoped"));
        assert!(yaml.contains("builtin"));
        assert!(!yaml.contains("disabled"));
    }

    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
rules:
  disabled:
    - Secret->Deployment
resolver:
  namespaceScoped: false
logger:
  level: debug
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.rules.builtin);
        assert_eq!(config.rules.disabled, vec!["Secret->Deployment"]);
        assert!(!config.resolver.namespace_scoped);
        assert_eq!(config.logger.level, "debug");
        assert_eq!(config.logger.file, None);
    }

    #[test]
    fn test_missing_resolver_section_keeps_scoping() {
        let config: Config = serde_yaml::from_str("logger:\n  level: warn\n").unwrap();
        assert!(config.resolver.namespace_scoped);

        let config: Config = serde_yaml::from_str("resolver: {}\n").unwrap();
        assert!(config.resolver.namespace_scoped);
    }
}
