//! Rule file loader
//!
//! Scans the rules directory for `*.yaml` / `*.yml` files, each holding a
//! `rules:` list of link definitions. Every rule is compiled while loading so
//! a bad selector is reported against the file it came from.

use super::models::SpecLink;
use super::rule::LinkRule;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk shape of a rule file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleFile {
    #[serde(default)]
    pub rules: Vec<SpecLink>,
}

/// Rule file loader
pub struct RuleLoader {
    rules_dir: PathBuf,
}

impl RuleLoader {
    /// Loader for `<config dir>/rules`
    pub fn new() -> Self {
        Self {
            rules_dir: crate::config::paths::rules_dir(),
        }
    }

    /// Loader for a custom rules directory
    pub fn with_dir(rules_dir: PathBuf) -> Self {
        Self { rules_dir }
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Load every rule file in the directory, in file name order
    pub fn load_all(&self) -> Result<Vec<SpecLink>> {
        tracing::debug!("Loading rule files from: {:?}", self.rules_dir);

        if !self.rules_dir.exists() {
            tracing::debug!("Rules directory does not exist: {:?}", self.rules_dir);
            return Ok(vec![]);
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.rules_dir).context("Failed to read rules directory")? {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let extension = path.extension().and_then(|e| e.to_str());
            if extension != Some("yaml") && extension != Some("yml") {
                continue;
            }

            paths.push(path);
        }
        paths.sort();

        let mut rules = Vec::new();
        for path in &paths {
            rules.extend(Self::load_file(path)?);
        }

        if !rules.is_empty() {
            tracing::info!(
                "Loaded {} rule(s) from {} file(s) in {:?}",
                rules.len(),
                paths.len(),
                self.rules_dir
            );
        }

        Ok(rules)
    }

    /// Load and validate a single rule file
    pub fn load_file(path: &Path) -> Result<Vec<SpecLink>> {
        tracing::debug!("Loading rules from: {:?}", path);

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule file: {:?}", path))?;

        let rules = Self::parse(&content)
            .with_context(|| format!("Invalid rule file: {:?}", path))?;

        tracing::debug!("Parsed {} rule(s) from {:?}", rules.len(), path);
        Ok(rules)
    }

    /// Parse rule file contents and compile each rule once as validation
    pub fn parse(content: &str) -> Result<Vec<SpecLink>> {
        let file: RuleFile =
            serde_yaml::from_str(content).context("Failed to parse rule file YAML")?;

        for (idx, rule) in file.rules.iter().enumerate() {
            LinkRule::compile(rule.clone())
                .with_context(|| format!("Rule #{} ({}) is invalid", idx + 1, rule.id()))?;
        }

        Ok(file.rules)
    }
}

impl Default for RuleLoader {
    fn default() -> Self {
        Self::new()
    }
}
