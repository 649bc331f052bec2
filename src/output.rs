//! Result serialization.
//!
//! Text output is one `token<TAB>count` line per result, the simplest form a
//! downstream job can consume. JSON output wraps the same results in a
//! [`TallyReport`] with run metadata and counters; its schema can be printed
//! with `--generate-schema`.

use std::fmt;

use anyhow::Result;
use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateResult;
use crate::config::DedupScope;
use crate::domain_utils::DomainMode;
use crate::processor::Counters;

/// Supported result formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// `token<TAB>count` lines
    #[default]
    Text,
    /// Pretty-printed JSON report
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        })
    }
}

/// Root structure of the JSON report.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct TallyReport {
    /// Tool version and run settings
    pub metadata: ReportMetadata,

    /// Job-wide counters
    pub counters: Counters,

    /// Per-token totals, highest first
    pub results: Vec<AggregateResult>,
}

/// Tool metadata and run settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct ReportMetadata {
    /// Tool name
    pub tool_name: String,

    /// Tool version
    pub version: String,

    /// Timestamp when the report was produced
    pub generated_at: chrono::DateTime<chrono::Utc>,

    /// Archives scanned, one per partition
    pub inputs: Vec<String>,

    /// Dedup enforcement scope used for this run
    pub dedup_scope: DedupScope,

    /// URL-to-domain reduction used for this run
    pub domain_mode: DomainMode,
}

impl ReportMetadata {
    pub fn new(inputs: Vec<String>, dedup_scope: DedupScope, domain_mode: DomainMode) -> Self {
        Self {
            tool_name: crate::NAME.to_string(),
            version: crate::VERSION.to_string(),
            generated_at: chrono::Utc::now(),
            inputs,
            dedup_scope,
            domain_mode,
        }
    }
}

impl TallyReport {
    /// Render in `format`, always newline-terminated (unless empty text).
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(self.to_text()),
            OutputFormat::Json => Ok(format!("{}\n", self.to_json()?)),
        }
    }

    /// One `token<TAB>count` line per result.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for r in &self.results {
            out.push_str(&r.token);
            out.push('\t');
            out.push_str(&r.total.to_string());
            out.push('\n');
        }
        out
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Generate JSON schema for this output format
    pub fn generate_json_schema() -> Result<String> {
        let schema = schemars::schema_for!(TallyReport);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}
