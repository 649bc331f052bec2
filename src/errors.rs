//! Unified error handling.
//!
//! All library failures are expressed as one `thiserror`-based enum with:
//!   * Typed variants for each failure domain (record, archive, startup)
//!   * A categorization layer (`ErrorCategory`) for counters & reporting
//!   * Helper constructors
//!   * `From` conversions for common lower-level errors
//!
//! Record-level variants (`MalformedResponse`, `InvalidUrl`,
//! `UnexpectedExtraction`) are contained by the record processor: they skip
//! one record and bump the `exceptions` counter. `PatternCompile` and
//! `Configuration` are fatal and abort the run before any record is read.
//!
//! Usage:
//!   use mailtally::errors::{Result, MailTallyError};
//!
//!   fn do_something() -> Result<()> {
//!       Err(MailTallyError::Configuration { message: "threads must be > 0".into() })
//!   }

use std::io;

use thiserror::Error;

/// High-level classification for counters / structured reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Parse,
    Io,
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Input => "input",
            ErrorCategory::Parse => "parse",
            ErrorCategory::Io => "io",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Primary library error type.
#[derive(Error, Debug)]
pub enum MailTallyError {
    // ----------------------------- Record level -----------------------------
    #[error("Malformed HTTP response (no header/body separator) for {url}")]
    MalformedResponse { url: String },

    #[error("Invalid record URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unexpected extraction failure for {url}: {reason}")]
    UnexpectedExtraction { url: String, reason: String },

    // ---------------------------- Archive level -----------------------------
    #[error("Malformed archive {path} at byte {offset}: {reason}")]
    ArchiveFormat {
        path: String,
        offset: u64,
        reason: String,
    },

    // ------------------------------- Startup --------------------------------
    #[error("Token pattern '{pattern}' failed to compile: {reason}")]
    PatternCompile { pattern: String, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // ----------------------------- I/O / FS ---------------------------------
    #[error("I/O error during {operation} on {path}: {source}")]
    Io {
        path: String,
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl MailTallyError {
    /// Categorize the error for structured output / counters.
    pub fn category(&self) -> ErrorCategory {
        use MailTallyError::*;
        match self {
            InvalidUrl { .. } | Configuration { .. } => ErrorCategory::Input,
            MalformedResponse { .. } | ArchiveFormat { .. } => ErrorCategory::Parse,
            Io { .. } => ErrorCategory::Io,
            UnexpectedExtraction { .. } | PatternCompile { .. } => ErrorCategory::Internal,
        }
    }

    /// True for failures scoped to a single archive record.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            MailTallyError::MalformedResponse { .. }
                | MailTallyError::InvalidUrl { .. }
                | MailTallyError::UnexpectedExtraction { .. }
        )
    }

    /// URL of the record a record-level error belongs to.
    pub fn record_url(&self) -> Option<&str> {
        match self {
            MailTallyError::MalformedResponse { url }
            | MailTallyError::InvalidUrl { url, .. }
            | MailTallyError::UnexpectedExtraction { url, .. } => Some(url),
            _ => None,
        }
    }

    // ---------------------------- Constructors -----------------------------

    pub fn malformed_response(url: impl Into<String>) -> Self {
        Self::MalformedResponse { url: url.into() }
    }

    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn unexpected_extraction(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnexpectedExtraction {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn archive_format(path: impl Into<String>, offset: u64, reason: impl Into<String>) -> Self {
        Self::ArchiveFormat {
            path: path.into(),
            offset,
            reason: reason.into(),
        }
    }

    pub fn pattern_compile(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PatternCompile {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<String>, operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }
}

/// Public result alias.
pub type Result<T> = std::result::Result<T, MailTallyError>;

/// Map standard IO errors into `Io` variant (generic context).
impl From<io::Error> for MailTallyError {
    fn from(e: io::Error) -> Self {
        MailTallyError::Io {
            path: "<unknown>".into(),
            operation: "unspecified".into(),
            source: e,
        }
    }
}

impl From<crate::config::ConfigError> for MailTallyError {
    fn from(e: crate::config::ConfigError) -> Self {
        MailTallyError::Configuration {
            message: e.to_string(),
        }
    }
}

/// Extension trait for enriching IO results with path + operation context.
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<String>, operation: impl Into<String>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, io::Error> {
    fn with_path(self, path: impl Into<String>, operation: impl Into<String>) -> Result<T> {
        self.map_err(|e| MailTallyError::io(path.into(), operation.into(), e))
    }
}
