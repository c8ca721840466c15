//! CLI command handling module
//!
//! Handles all CLI subcommands and argument parsing.

mod commands;
mod logging;
mod version;

pub use commands::{
    ConfigSubcommand, GraphArgs, LinksArgs, RulesSubcommand, handle_config_command,
    handle_rules_command, run_graph, run_links, validate_rule_files,
};
pub use logging::init_logging;
pub use version::{display_version, version_text};
