//! CLI command handlers

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{self, Config, ConfigLoader, ResolverConfig, paths};
use crate::kube::{ManifestSource, collect_pool, find_object};
use crate::links::{LinkRecord, LinkRegistry, LinkResolver, ResolvedLink, RuleLoader};
use crate::output::{OutputFormat, render_links, render_rules};

/// Arguments for `links`
#[derive(Args, Debug, Clone)]
pub struct LinksArgs {
    /// Manifest files or directories ("-" for stdin)
    #[arg(short = 'f', long = "file", required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Kind of the focal object (e.g. "Deployment")
    #[arg(long)]
    pub kind: String,

    /// Name of the focal object
    #[arg(long)]
    pub name: String,

    /// Namespace of the focal object
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Also link objects in other namespaces than the focal object
    #[arg(short = 'A', long)]
    pub all_namespaces: bool,
}

/// Arguments for `graph`
#[derive(Args, Debug, Clone)]
pub struct GraphArgs {
    /// Manifest files or directories ("-" for stdin)
    #[arg(short = 'f', long = "file", required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Also link objects across namespaces
    ///
    /// By default links only form between objects sharing a namespace, or
    /// where one side has none (`resolver.namespaceScoped`).
    #[arg(short = 'A', long)]
    pub all_namespaces: bool,
}

/// Rule introspection subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum RulesSubcommand {
    /// List active rules
    List {
        /// Only rules involving this kind
        #[arg(long)]
        kind: Option<String>,

        /// Output format
        #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// List every kind the active rules relate
    Kinds,
    /// Validate rule files
    Validate {
        /// Rule files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Configuration management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Get configuration value
    Get {
        /// Configuration key (e.g., "rules.builtin", "logger.level")
        key: Option<String>,
    },
    /// Set configuration value
    Set {
        /// Configuration key (e.g., "rules.builtin", "logger.level")
        key: String,
        /// Configuration value
        value: String,
    },
    /// List all configuration
    List,
    /// Show configuration file path
    Path,
    /// Validate configuration
    Validate,
}

/// Resolve the links of one object and render them
pub fn run_links(
    args: &LinksArgs,
    registry: &LinkRegistry,
    resolver_config: &ResolverConfig,
) -> Result<String> {
    let source = ManifestSource::new(args.files.clone());
    let pool = collect_pool(&[&source])?;
    tracing::debug!("Loaded {} object(s) from manifests", pool.len());

    let focal = find_object(&pool, &args.kind, args.namespace.as_deref(), &args.name)
        .with_context(|| {
            format!(
                "{} '{}' not found in the supplied manifests",
                args.kind,
                object_label(args.namespace.as_deref(), &args.name)
            )
        })?;

    if !registry.supports_kind(focal.kind()) {
        tracing::info!("No link rules mention kind {}", focal.kind());
    }

    let resolver = LinkResolver::new(registry)
        .namespace_scoped(resolver_config.namespace_scoped && !args.all_namespaces);
    let records: Vec<LinkRecord> = resolver
        .resolve(focal, &pool)
        .iter()
        .map(ResolvedLink::to_record)
        .collect();

    render_links(&records, args.output)
}

/// Resolve every link in the supplied manifests and render them
pub fn run_graph(
    args: &GraphArgs,
    registry: &LinkRegistry,
    resolver_config: &ResolverConfig,
) -> Result<String> {
    let source = ManifestSource::new(args.files.clone());
    let pool = collect_pool(&[&source])?;

    let resolver = LinkResolver::new(registry)
        .namespace_scoped(resolver_config.namespace_scoped && !args.all_namespaces);
    let records: Vec<LinkRecord> = resolver
        .resolve_all(&pool)
        .iter()
        .map(ResolvedLink::to_record)
        .collect();

    tracing::debug!(
        "Resolved {} link(s) across {} object(s)",
        records.len(),
        pool.len()
    );
    render_links(&records, args.output)
}

/// Handle rule subcommands
pub fn handle_rules_command(cmd: RulesSubcommand, config: &Config) -> Result<()> {
    match cmd {
        RulesSubcommand::List { kind, output } => {
            let registry = config::build_registry(config)?;
            println!("{}", render_rules(&registry, kind.as_deref(), output)?);
        }
        RulesSubcommand::Kinds => {
            let registry = config::build_registry(config)?;
            for kind in registry.kinds() {
                println!("{}", kind);
            }
        }
        RulesSubcommand::Validate { files } => {
            let count = validate_rule_files(&files)?;
            println!("✓ {} rule(s) in {} file(s) are valid", count, files.len());
        }
    }

    Ok(())
}

/// Load every file and check the rules also compile together
pub fn validate_rule_files(files: &[PathBuf]) -> Result<usize> {
    let mut rules = Vec::new();
    for file in files {
        rules.extend(RuleLoader::load_file(file)?);
    }
    let registry = LinkRegistry::new(rules).context("Rule files conflict")?;
    Ok(registry.len())
}

/// Handle configuration subcommands
pub fn handle_config_command(cmd: ConfigSubcommand, explicit: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigSubcommand::Get { key } => {
            // Load config (will use defaults if no file exists)
            let config = ConfigLoader::load(explicit).context("Failed to load configuration")?;

            if let Some(key) = key {
                // Get specific key
                let value = config::get_config_value(&config, &key)?;
                println!("{}", value);
            } else {
                // Print all config as YAML
                let yaml =
                    serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
                print!("{}", yaml);
            }
        }
        ConfigSubcommand::Set { key, value } => {
            // Edit the file being written, not the merged view
            let target = explicit
                .map(Path::to_path_buf)
                .unwrap_or_else(paths::root_config_path);
            let mut config = if target.exists() {
                ConfigLoader::load_file(&target)?
            } else {
                ConfigLoader::load_defaults()
            };

            // Set the value
            config::set_config_value(&mut config, &key, &value)
                .with_context(|| format!("Failed to set {} = {}", key, value))?;

            ConfigLoader::save(&config, &target).context("Failed to save configuration")?;
            println!("Configuration saved to {}", target.display());
        }
        ConfigSubcommand::List => {
            let config = ConfigLoader::load(explicit).context("Failed to load configuration")?;

            let yaml =
                serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
            print!("{}", yaml);
        }
        ConfigSubcommand::Path => {
            println!("{}", paths::root_config_path().display());
            println!("{}", paths::rules_dir().display());
        }
        ConfigSubcommand::Validate => match ConfigLoader::validate(explicit) {
            Ok(()) => {
                println!("Configuration is valid");
            }
            Err(e) => {
                eprintln!("Configuration validation failed: {:#}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

fn object_label(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{}/{}", ns, name),
        None => name.to_string(),
    }
}
