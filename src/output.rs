//! Rendering of links and rules for the command line

use crate::links::{LinkRecord, LinkRegistry, LinkRule};
use anyhow::{Context, Result};
use clap::ValueEnum;
use comfy_table::{Table, presets::ASCII_BORDERS_ONLY_CONDENSED};
use serde::Serialize;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

/// Flat description of a rule for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSummary {
    pub id: String,
    pub direction: String,
    pub source_kind: String,
    pub target_kind: String,
    pub matchers: Vec<MatcherSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatcherSummary {
    pub source_selector: String,
    pub target_selector: String,
    pub match_type: String,
}

impl From<&LinkRule> for RuleSummary {
    fn from(rule: &LinkRule) -> Self {
        Self {
            id: rule.id().to_string(),
            direction: rule.direction().to_string(),
            source_kind: rule.source_kind().to_string(),
            target_kind: rule.target_kind().to_string(),
            matchers: rule
                .matchers()
                .iter()
                .map(|m| MatcherSummary {
                    source_selector: m.source_selector().to_string(),
                    target_selector: m.target_selector().to_string(),
                    match_type: m.match_type().to_string(),
                })
                .collect(),
        }
    }
}

/// Render resolved links
pub fn render_links(records: &[LinkRecord], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => {
            if records.is_empty() {
                return Ok("No links found.".to_string());
            }
            let rows = records
                .iter()
                .map(|r| vec![r.rule.clone(), r.source_ref(), r.target_ref()])
                .collect::<Vec<_>>();
            Ok(render_table(&["RULE", "SOURCE", "TARGET"], &rows))
        }
        OutputFormat::Json => to_json(records),
        OutputFormat::Yaml => to_yaml(records),
    }
}

/// Render the rules of a registry, optionally limited to one kind
pub fn render_rules(
    registry: &LinkRegistry,
    kind: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    let summaries: Vec<RuleSummary> = registry
        .rules()
        .iter()
        .filter(|rule| kind.is_none_or(|k| rule.applies_to(k)))
        .map(RuleSummary::from)
        .collect();

    match format {
        OutputFormat::Table => {
            if summaries.is_empty() {
                return Ok("No rules found.".to_string());
            }
            let rows = summaries
                .iter()
                .map(|s| {
                    vec![
                        s.id.clone(),
                        s.direction.clone(),
                        s.source_kind.clone(),
                        s.target_kind.clone(),
                        s.matchers.len().to_string(),
                    ]
                })
                .collect::<Vec<_>>();
            Ok(render_table(
                &["RULE", "DIRECTION", "SOURCE KIND", "TARGET KIND", "MATCHERS"],
                &rows,
            ))
        }
        OutputFormat::Json => to_json(&summaries),
        OutputFormat::Yaml => to_yaml(&summaries),
    }
}

/// Bordered table with a single header rule
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut table = Table::new();
    table.load_preset(ASCII_BORDERS_ONLY_CONDENSED);
    table.set_header(headers);
    for row in rows {
        table.add_row(row);
    }
    table.to_string()
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output as JSON")
}

fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_yaml::to_string(value).context("Failed to serialize output as YAML")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_alignment() {
        let rows = vec![
            vec!["a".to_string(), "long-value".to_string()],
            vec!["bbb".to_string(), "x".to_string()],
        ];
        let table = render_table(&["K", "V"], &rows);
        let expected = [
            "+------------------+",
            "| K     V          |",
            "+==================+",
            "| a     long-value |",
            "| bbb   x          |",
            "+------------------+",
        ]
        .join("\n");
        assert_eq!(table, expected);
    }

    #[test]
    fn test_empty_links_message() {
        assert_eq!(
            render_links(&[], OutputFormat::Table).unwrap(),
            "No links found."
        );
        assert_eq!(render_links(&[], OutputFormat::Json).unwrap(), "[]");
    }

    #[test]
    fn test_rules_filtered_by_kind() {
        let output = render_rules(LinkRegistry::builtin(), Some("Endpoints"), OutputFormat::Table)
            .unwrap();
        // top border, header, header rule, one row, bottom border
        assert_eq!(output.lines().count(), 5);
        assert!(output.contains("| Endpoints->Service "));
    }
}
