//! HTTP response splitting for archived transactions.
//!
//! Only recorded *responses* carrying HTML are of interest. The check on the
//! HTTP header block is a plain substring test for `Content-Type: text/html`
//! rather than real header parsing; header case variants such as
//! `content-type: text/html` are therefore not accepted.
//!
//! Payload bytes are decoded with `String::from_utf8_lossy` and no charset
//! detection. Tokens are ASCII-only so invalid sequences never hide a match,
//! but switching to charset-aware decoding would change which bytes end up in
//! the body and is deliberately not done here.

use crate::archive::{ArchiveRecord, HTTP_RESPONSE_MIME};
use crate::errors::{MailTallyError, Result};

/// Substring the HTTP header block must contain for the body to be scanned.
pub const HTML_CONTENT_TYPE_MARKER: &str = "Content-Type: text/html";

const HEADER_BODY_SEPARATOR: &[u8] = b"\r\n\r\n";

/// A recorded HTTP response split into its header block and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMessage {
    pub header_block: String,
    pub body: String,
}

/// Why a record was passed over without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// WARC content type is not an HTTP response (request, metadata, ...).
    NotResponse,
    /// HTTP response whose header block does not announce HTML.
    NotHtml,
}

/// Outcome of splitting one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Split {
    Html(HttpMessage),
    Skipped(Skip),
}

/// Record filter + splitter. `Default` matches the fixed production rules.
#[derive(Debug, Clone)]
pub struct ResponseSplitter {
    pub response_mime: String,
    pub html_marker: String,
}

impl Default for ResponseSplitter {
    fn default() -> Self {
        Self {
            response_mime: HTTP_RESPONSE_MIME.to_string(),
            html_marker: HTML_CONTENT_TYPE_MARKER.to_string(),
        }
    }
}

impl ResponseSplitter {
    pub fn new(response_mime: impl Into<String>, html_marker: impl Into<String>) -> Self {
        Self {
            response_mime: response_mime.into(),
            html_marker: html_marker.into(),
        }
    }

    /// Split `record` into header block and body, or report why it is skipped.
    ///
    /// Fails with `MalformedResponse` when the blank line separating headers
    /// from body is missing, and with `UnexpectedExtraction` when the record
    /// declares more readable bytes than its payload holds.
    pub fn split(&self, record: &ArchiveRecord) -> Result<Split> {
        if record.mime_type() != self.response_mime {
            return Ok(Split::Skipped(Skip::NotResponse));
        }

        let Some(raw) = record.payload.get(..record.available_length) else {
            return Err(MailTallyError::unexpected_extraction(
                record.url(),
                format!(
                    "available length {} exceeds payload of {} bytes",
                    record.available_length,
                    record.payload.len()
                ),
            ));
        };

        let Some(pos) = find_separator(raw) else {
            return Err(MailTallyError::malformed_response(record.url()));
        };

        let header_block = String::from_utf8_lossy(&raw[..pos]);
        if !header_block.contains(self.html_marker.as_str()) {
            return Ok(Split::Skipped(Skip::NotHtml));
        }

        let body = String::from_utf8_lossy(&raw[pos + HEADER_BODY_SEPARATOR.len()..]);
        Ok(Split::Html(HttpMessage {
            header_block: header_block.into_owned(),
            body: body.into_owned(),
        }))
    }
}

/// Split with the default rules.
pub fn split_response(record: &ArchiveRecord) -> Result<Split> {
    ResponseSplitter::default().split(record)
}

fn find_separator(raw: &[u8]) -> Option<usize> {
    raw.windows(HEADER_BODY_SEPARATOR.len())
        .position(|w| w == HEADER_BODY_SEPARATOR)
}
