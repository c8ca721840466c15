//! kubelinks - declarative relationship linker for Kubernetes manifests
//!
//! Reads object snapshots from manifest files and reports which objects are
//! related according to the active link rules.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kubelinks::cli::{
    self, ConfigSubcommand, GraphArgs, LinksArgs, RulesSubcommand, handle_config_command,
    handle_rules_command,
};
use kubelinks::config::{self, Config, ConfigLoader};
use std::path::{Path, PathBuf};

/// kubelinks - declarative relationship linker for Kubernetes manifests
#[derive(Parser, Debug)]
#[command(name = "kubelinks")]
#[command(about = "Find related Kubernetes objects using declarative link rules", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    /// Configuration file layered over the root config
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Main commands
#[derive(Subcommand, Debug)]
enum Command {
    /// Show the objects linked to one object
    Links(LinksArgs),
    /// Show every link between the supplied objects
    Graph(GraphArgs),
    /// Inspect and validate link rules
    Rules {
        #[command(subcommand)]
        subcommand: RulesSubcommand,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let explicit = args.config.as_deref();

    match args.command {
        Command::Version => cli::display_version(),
        // Config commands run before logging so a broken config can still be fixed
        Command::Config { subcommand } => handle_config_command(subcommand, explicit)?,
        Command::Links(links) => {
            let config = prepare(args.debug, explicit)?;
            let registry = config::build_registry(&config)?;
            println!("{}", cli::run_links(&links, &registry, &config.resolver)?);
        }
        Command::Graph(graph) => {
            let config = prepare(args.debug, explicit)?;
            let registry = config::build_registry(&config)?;
            println!("{}", cli::run_graph(&graph, &registry, &config.resolver)?);
        }
        Command::Rules { subcommand } => {
            let config = prepare(args.debug, explicit)?;
            handle_rules_command(subcommand, &config)?;
        }
    }

    Ok(())
}

/// Load configuration and initialize logging from it
fn prepare(debug: bool, explicit: Option<&Path>) -> Result<Config> {
    let config = ConfigLoader::load(explicit).context("Failed to load configuration")?;
    ConfigLoader::validate_config(&config)?;

    // Print log file location to stderr so it doesn't mix with command output
    if let Some(log_path) = cli::init_logging(debug, &config.logger)? {
        if debug {
            eprintln!(
                "Debug logging enabled. Logs written to: {}",
                log_path.display()
            );
        }
    }

    tracing::debug!(
        "Configuration loaded: builtin={}, disabled={:?}, namespaceScoped={}",
        config.rules.builtin,
        config.rules.disabled,
        config.resolver.namespace_scoped
    );

    Ok(config)
}
