//! Configuration system for kubelinks
//!
//! Layered YAML configuration (defaults, root file, explicit file, environment)
//! that decides which link rules are active and how resolution behaves.

mod defaults;
pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{Config, LoggerConfig, ResolverConfig, RulesConfig};

use crate::links::{LinkRegistry, RuleLoader};
use anyhow::Context;

/// Every key accepted by [`get_config_value`] and [`set_config_value`]
pub const CONFIG_KEYS: &[&str] = &[
    "rules.builtin",
    "rules.disabled",
    "rules.files",
    "resolver.namespaceScoped",
    "logger.level",
    "logger.file",
];

/// Get a configuration value by key (dot notation)
pub fn get_config_value(config: &schema::Config, key: &str) -> anyhow::Result<String> {
    match key {
        "rules.builtin" => Ok(config.rules.builtin.to_string()),
        "rules.disabled" => Ok(config.rules.disabled.join(",")),
        "rules.files" => Ok(config
            .rules
            .files
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(",")),
        "resolver.namespaceScoped" => Ok(config.resolver.namespace_scoped.to_string()),
        "logger.level" => Ok(config.logger.level.clone()),
        "logger.file" => Ok(config
            .logger
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()),
        _ => Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }
}

/// Set a configuration value by key (dot notation)
pub fn set_config_value(config: &mut schema::Config, key: &str, value: &str) -> anyhow::Result<()> {
    match key {
        "rules.builtin" => {
            config.rules.builtin = value
                .parse()
                .context("rules.builtin must be 'true' or 'false'")?;
        }
        "rules.disabled" => {
            config.rules.disabled = parse_list(value)
                .context("rules.disabled must be a YAML array or comma-separated list")?;
        }
        "rules.files" => {
            config.rules.files = parse_list(value)
                .context("rules.files must be a YAML array or comma-separated list")?
                .into_iter()
                .map(Into::into)
                .collect();
        }
        "resolver.namespaceScoped" => {
            config.resolver.namespace_scoped = value
                .parse()
                .context("resolver.namespaceScoped must be 'true' or 'false'")?;
        }
        "logger.level" => {
            tracing_subscriber::EnvFilter::try_new(value)
                .with_context(|| format!("Invalid log level: '{}'", value))?;
            config.logger.level = value.to_string();
        }
        "logger.file" => {
            if value.is_empty() {
                config.logger.file = None;
            } else {
                config.logger.file = Some(value.into());
            }
        }
        _ => return Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }

    Ok(())
}

/// Parse as YAML array or comma-separated list
fn parse_list(value: &str) -> anyhow::Result<Vec<String>> {
    if value.trim_start().starts_with('[') {
        Ok(serde_yaml::from_str(value)?)
    } else {
        Ok(value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }
}

/// Build the active rule registry for a configuration
///
/// Built-in rules (unless disabled), then the rules directory, then
/// `rules.files`, minus `rules.disabled`.
pub fn build_registry(config: &Config) -> anyhow::Result<LinkRegistry> {
    build_registry_with(config, &RuleLoader::new())
}

/// [`build_registry`] with an explicit rules directory loader
pub fn build_registry_with(config: &Config, loader: &RuleLoader) -> anyhow::Result<LinkRegistry> {
    let base = if config.rules.builtin {
        LinkRegistry::builtin().clone()
    } else {
        LinkRegistry::default()
    };

    let mut extra = loader.load_all()?;
    for file in &config.rules.files {
        extra.extend(RuleLoader::load_file(file)?);
    }

    let registry = base.extend(extra).context("Failed to register link rules")?;

    for id in &config.rules.disabled {
        if registry.get(id).is_none() {
            tracing::warn!("Disabled rule '{}' does not exist", id);
        }
    }

    let registry = registry.without(&config.rules.disabled);
    tracing::debug!("Rule registry ready with {} rule(s)", registry.len());
    Ok(registry)
}
