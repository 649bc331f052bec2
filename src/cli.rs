use std::path::PathBuf;

use clap::Parser;

use crate::domain_utils::DomainMode;
use crate::output::OutputFormat;

/// Command-line interface definition.
/// Each input archive is processed as one partition.
///
/// Verbosity levels:
/// 0 - silent (only final output)
/// 1 - errors, including skipped records (default)
/// 2 - warnings + errors
/// 3 - progress (per-partition summaries)
/// 5 - trace/debug
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Count email-like tokens in WARC archives by the number of distinct domains serving them"
)]
pub struct Cli {
    /// WARC archives to scan (`.warc` or gzip-compressed `.warc.gz`).
    #[arg(value_name = "ARCHIVE", required_unless_present = "generate_schema")]
    pub inputs: Vec<PathBuf>,

    /// Verbosity level (0,1,2,3,5). `RUST_LOG`, when set, overrides this.
    #[arg(long, default_value_t = 1)]
    pub verbose: u8,

    /// Worker threads (defaults to available parallelism)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Count each (token, domain) pair once across all archives, not once per archive
    #[arg(long = "global-dedup", default_value_t = false)]
    pub global_dedup: bool,

    /// How record URLs are reduced to domains
    #[arg(long = "domain-mode", value_enum)]
    pub domain_mode: Option<DomainMode>,

    /// Keep at most this many bytes of each WARC block
    #[arg(long = "max-payload-bytes")]
    pub max_payload_bytes: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write results to FILE instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the JSON schema of the report and exit
    #[arg(long = "generate-schema")]
    pub generate_schema: bool,
}

impl Cli {
    /// Parse CLI arguments from process args.
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Convenience: are we in very verbose/debug mode?
    pub fn is_trace(&self) -> bool {
        self.verbose >= 5
    }

    /// Log filter directive matching the verbosity level.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "off",
            1 => "error",
            2 => "warn",
            3 | 4 => "info",
            _ => "debug",
        }
    }
}
