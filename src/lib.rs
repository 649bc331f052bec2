//! mailtally library
//!
//! Scans web archive (WARC) captures for email-like tokens in HTML
//! responses and counts, for each token, how many distinct domains served a
//! page containing it. This library provides functionality to:
//!
//! - Read WARC records lazily from plain or gzip-compressed archives
//! - Split recorded HTTP responses into headers and body, keeping HTML only
//! - Extract tokens with a fixed, compile-once pattern
//! - Emit one observation per first-seen (token, domain) pair per partition
//! - Shuffle observations by token and sum them
//!
//! # Example
//!
//! ```rust,no_run
//! use mailtally::{RecordProcessor, TokenExtractor, aggregate};
//! use mailtally::archive::open_archive;
//!
//! let mut processor = RecordProcessor::new(TokenExtractor::init()?);
//! let mut counts = Vec::new();
//! for record in open_archive("capture.warc.gz")? {
//!     for obs in processor.process_record(&record?) {
//!         if obs.token == "info@example.com" {
//!             counts.push(obs.count);
//!         }
//!     }
//! }
//! println!("{:?}", aggregate("info@example.com", counts));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod aggregate;
pub mod archive;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod domain_utils;
pub mod emails;
pub mod errors;
pub mod http;
pub mod job;
pub mod output;
pub mod processor;

// Re-export commonly used types and functions for convenience
pub use aggregate::{AggregateResult, Shuffle, aggregate};
pub use archive::{ArchiveRecord, RecordHeader, WarcReader};
pub use config::{Config, DedupScope};
pub use dedup::DedupTable;
pub use domain_utils::DomainMode;
pub use emails::TokenExtractor;
pub use errors::{MailTallyError, Result};
pub use job::{TallyJob, TallyOutcome};
pub use output::{OutputFormat, TallyReport};
pub use processor::{Counters, Observation, RecordProcessor};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
