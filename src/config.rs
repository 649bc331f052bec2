//! Configuration management for mailtally.
//!
//! Settings are layered: built-in defaults, then `MAILTALLY_*` environment
//! variables, then command-line flags (see [`Config::merge_with_cli`]).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::archive::HTTP_RESPONSE_MIME;
use crate::domain_utils::DomainMode;
use crate::http::HTML_CONTENT_TYPE_MARKER;
use crate::output::OutputFormat;

/// Main configuration structure for mailtally.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Record filtering and dedup settings
    pub scan: ScanConfig,

    /// Execution and output settings
    pub job: JobConfig,
}

/// Where the "one count per (token, domain)" rule is enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DedupScope {
    /// Within each partition only. A pair seen in two partitions counts twice.
    #[default]
    Partition,
    /// Across the whole job, via a set-union pass over partition tables.
    Global,
}

impl fmt::Display for DedupScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DedupScope::Partition => "partition",
            DedupScope::Global => "global",
        })
    }
}

impl FromStr for DedupScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "partition" => Ok(DedupScope::Partition),
            "global" => Ok(DedupScope::Global),
            other => Err(format!("unknown dedup scope '{other}'")),
        }
    }
}

/// Record selection and dedup configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Dedup enforcement scope
    pub dedup_scope: DedupScope,

    /// How record URLs map to domains
    pub domain_mode: DomainMode,

    /// Maximum bytes of each WARC block kept for scanning
    pub max_payload_bytes: usize,

    /// WARC content type identifying HTTP responses
    pub response_mime: String,

    /// Substring the HTTP header block must contain
    pub html_marker: String,
}

/// Execution and output configuration
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Worker threads for partition processing
    pub threads: usize,

    /// Result serialization
    pub output_format: OutputFormat,

    /// Output file (stdout when `None`)
    pub output_path: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            dedup_scope: DedupScope::Partition,
            domain_mode: DomainMode::Host,
            max_payload_bytes: 64 * 1024 * 1024, // 64MB
            response_mime: HTTP_RESPONSE_MIME.to_string(),
            html_marker: HTML_CONTENT_TYPE_MARKER.to_string(),
        }
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            output_format: OutputFormat::Text,
            output_path: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup (environment-shaped).
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(threads) = lookup("MAILTALLY_THREADS")
            && let Ok(n) = threads.parse::<usize>()
        {
            config.job.threads = n;
        }

        if let Some(scope) = lookup("MAILTALLY_DEDUP_SCOPE")
            && let Ok(s) = scope.parse::<DedupScope>()
        {
            config.scan.dedup_scope = s;
        }

        if let Some(mode) = lookup("MAILTALLY_DOMAIN_MODE")
            && let Ok(m) = mode.parse::<DomainMode>()
        {
            config.scan.domain_mode = m;
        }

        if let Some(limit) = lookup("MAILTALLY_MAX_PAYLOAD_BYTES")
            && let Ok(n) = limit.parse::<usize>()
        {
            config.scan.max_payload_bytes = n;
        }

        config
    }

    /// Merge with CLI arguments, giving CLI precedence
    pub fn merge_with_cli(&mut self, cli: &crate::cli::Cli) {
        if let Some(threads) = cli.threads {
            self.job.threads = threads;
        }

        if cli.global_dedup {
            self.scan.dedup_scope = DedupScope::Global;
        }

        if let Some(mode) = cli.domain_mode {
            self.scan.domain_mode = mode;
        }

        if let Some(limit) = cli.max_payload_bytes {
            self.scan.max_payload_bytes = limit;
        }

        self.job.output_format = cli.format;

        if let Some(ref path) = cli.output {
            self.job.output_path = Some(path.clone());
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.job.threads == 0 {
            return Err(ConfigError::InvalidValue {
                field: "job.threads".to_string(),
                value: "0".to_string(),
                reason: "At least one worker thread is required".to_string(),
            });
        }

        if self.scan.max_payload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scan.max_payload_bytes".to_string(),
                value: "0".to_string(),
                reason: "Payload limit must be greater than 0".to_string(),
            });
        }

        if self.scan.response_mime.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "scan.response_mime".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Missing required configuration
    MissingRequired { field: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue {
                field,
                value,
                reason,
            } => {
                write!(f, "Invalid value '{}' for '{}': {}", value, field, reason)
            }
            ConfigError::MissingRequired { field } => {
                write!(f, "Missing required configuration field: {}", field)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
