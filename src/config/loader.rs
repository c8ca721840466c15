//! Configuration loading and merging logic
//!
//! Handles loading configuration from multiple sources and merging them
//! according to precedence rules.

use super::{
    defaults, paths,
    schema::{Config, LoggerConfig, ResolverConfig, RulesConfig},
};
use anyhow::{Context, Result};
use std::path::Path;

/// Environment variable names
pub const ENV_NAMESPACE_SCOPED: &str = "KUBELINKS_NAMESPACE_SCOPED";
pub const ENV_LOG_LEVEL: &str = "KUBELINKS_LOG_LEVEL";
pub const ENV_BUILTIN_RULES: &str = "KUBELINKS_BUILTIN_RULES";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. Explicit config file (`--config`)
    /// 3. Root config
    /// 4. Built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let mut config = Self::load_defaults();

        // Load root config
        let root_path = paths::root_config_path();
        if root_path.exists() {
            match Self::load_file(&root_path) {
                Ok(root_config) => config = Self::merge_config(config, root_config),
                Err(e) => tracing::warn!("Ignoring root config: {:#}", e),
            }
        }

        // An explicitly requested file must load
        if let Some(path) = explicit {
            let explicit_config = Self::load_file(path)?;
            config = Self::merge_config(config, explicit_config);
        }

        // Apply environment variable overrides
        config = Self::apply_env_overrides(config);

        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration by loading and checking for errors
    ///
    /// This performs strict validation - it will fail on:
    /// - Invalid YAML syntax or value types in the root or explicit file
    /// - Unknown log levels
    /// - Rule files that fail to load or compile
    pub fn validate(explicit: Option<&Path>) -> Result<()> {
        let root_path = paths::root_config_path();
        if root_path.exists() {
            Self::load_file(&root_path)?;
        }

        let config = Self::load(explicit).context("Failed to load merged configuration")?;
        Self::validate_config(&config)?;

        let registry = super::build_registry(&config).context("Failed to build rule registry")?;
        tracing::debug!("Configuration valid, {} rule(s) active", registry.len());

        Ok(())
    }

    /// Check values serde cannot check on its own
    pub fn validate_config(config: &Config) -> Result<()> {
        tracing_subscriber::EnvFilter::try_new(&config.logger.level)
            .with_context(|| format!("Invalid logger.level: '{}'", config.logger.level))?;

        if let Some(blank) = config.rules.disabled.iter().find(|id| id.trim().is_empty()) {
            return Err(anyhow::anyhow!(
                "rules.disabled contains a blank rule id: '{}'",
                blank
            ));
        }

        Ok(())
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        defaults::default_config()
    }

    /// Merge two configurations, with `other` taking precedence
    fn merge_config(_base: Config, other: Config) -> Config {
        Config {
            rules: RulesConfig {
                builtin: other.rules.builtin,
                disabled: other.rules.disabled.clone(),
                files: other.rules.files.clone(),
            },
            resolver: ResolverConfig {
                namespace_scoped: other.resolver.namespace_scoped,
            },
            logger: LoggerConfig {
                level: other.logger.level.clone(),
                file: other.logger.file.clone(),
            },
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(config: Config) -> Config {
        Self::apply_env_overrides_from(config, |key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`
    pub fn apply_env_overrides_from<F>(mut config: Config, lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        // KUBELINKS_NAMESPACE_SCOPED override
        if let Some(value) = lookup(ENV_NAMESPACE_SCOPED) {
            match value.parse::<bool>() {
                Ok(val) => config.resolver.namespace_scoped = val,
                Err(_) => tracing::warn!("Ignoring {}='{}'", ENV_NAMESPACE_SCOPED, value),
            }
        }

        // KUBELINKS_LOG_LEVEL override
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.logger.level = level;
        }

        // KUBELINKS_BUILTIN_RULES override
        if let Some(value) = lookup(ENV_BUILTIN_RULES) {
            match value.parse::<bool>() {
                Ok(val) => config.rules.builtin = val,
                Err(_) => tracing::warn!("Ignoring {}='{}'", ENV_BUILTIN_RULES, value),
            }
        }

        config
    }

    /// Save configuration to a file
    pub fn save(config: &Config, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }

        let yaml =
            serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")?;

        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.rules.builtin);
        assert!(config.resolver.namespace_scoped);
    }

    #[test]
    fn test_merge_config() {
        let base = Config::default();
        let other = Config {
            resolver: ResolverConfig {
                namespace_scoped: false,
            },
            ..Default::default()
        };

        let merged = ConfigLoader::merge_config(base, other);
        assert!(!merged.resolver.namespace_scoped);
        assert_eq!(merged.logger.level, "info");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_NAMESPACE_SCOPED, "false"),
            (ENV_LOG_LEVEL, "trace"),
            (ENV_BUILTIN_RULES, "not-a-bool"),
        ]);

        let config = ConfigLoader::apply_env_overrides_from(Config::default(), |key| {
            env.get(key).map(|v| v.to_string())
        });

        assert!(!config.resolver.namespace_scoped);
        assert_eq!(config.logger.level, "trace");
        // unparseable values are ignored
        assert!(config.rules.builtin);
    }

    #[test]
    fn test_save_and_load_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.rules.disabled.push("Endpoints->Service".to_string());
        ConfigLoader::save(&config, &path).unwrap();

        let loaded = ConfigLoader::load_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_file_missing() {
        let err = ConfigLoader::load_file(Path::new("/nonexistent/kubelinks.yaml")).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_validate_config_rejects_bad_level() {
        let mut config = Config::default();
        config.logger.level = "very=loud=please".to_string();
        assert!(ConfigLoader::validate_config(&config).is_err());

        config.logger.level = "debug".to_string();
        assert!(ConfigLoader::validate_config(&config).is_ok());
    }
}
