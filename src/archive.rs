//! Web archive (WARC) record access.
//!
//! The core pipeline only needs three things from a record: its target URL,
//! its WARC content type and the raw block bytes. This module exposes those
//! as [`ArchiveRecord`] and provides a lazy streaming reader over WARC/1.x
//! containers, plain or gzip-compressed.
//!
//! Layout handled by [`WarcReader`]:
//!
//! ```text
//! WARC/1.0\r\n
//! WARC-Type: response\r\n
//! WARC-Target-URI: http://example.com/\r\n
//! Content-Type: application/http; msgtype=response\r\n
//! Content-Length: 1234\r\n
//! \r\n
//! <1234 bytes of block>\r\n
//! \r\n
//! ```
//!
//! Limitations:
//! - Header continuation lines are not unfolded.
//! - Digests are not verified.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::errors::{IoResultExt, MailTallyError, Result};

/// WARC content type of a recorded HTTP response.
pub const HTTP_RESPONSE_MIME: &str = "application/http; msgtype=response";

/// Header metadata the pipeline reads from a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordHeader {
    pub url: String,
    pub mime_type: String,
}

/// One archived network transaction.
#[derive(Debug, Clone, Default)]
pub struct ArchiveRecord {
    pub header: RecordHeader,
    pub payload: Vec<u8>,
    /// Number of payload bytes the record declares readable.
    pub available_length: usize,
}

impl ArchiveRecord {
    /// Build a record whose whole payload is available.
    pub fn new(url: impl Into<String>, mime_type: impl Into<String>, payload: Vec<u8>) -> Self {
        let available_length = payload.len();
        Self {
            header: RecordHeader {
                url: url.into(),
                mime_type: mime_type.into(),
            },
            payload,
            available_length,
        }
    }

    pub fn url(&self) -> &str {
        &self.header.url
    }

    pub fn mime_type(&self) -> &str {
        &self.header.mime_type
    }
}

/// Streaming reader yielding one [`ArchiveRecord`] per WARC record.
///
/// Iteration stops after the first structural error; the error is yielded
/// once and the reader is fused afterwards.
pub struct WarcReader<R> {
    inner: R,
    source: String,
    offset: u64,
    max_payload_bytes: usize,
    done: bool,
}

impl<R: BufRead> WarcReader<R> {
    pub fn new(inner: R, source: impl Into<String>) -> Self {
        Self {
            inner,
            source: source.into(),
            offset: 0,
            max_payload_bytes: usize::MAX,
            done: false,
        }
    }

    /// Keep at most `limit` bytes of each block; the remainder is skipped.
    pub fn with_max_payload(mut self, limit: usize) -> Self {
        self.max_payload_bytes = limit;
        self
    }

    /// Name used in error messages (usually the file path).
    pub fn source(&self) -> &str {
        &self.source
    }

    fn read_line(&mut self, buf: &mut String) -> Result<usize> {
        buf.clear();
        let mut raw = Vec::new();
        let n = self
            .inner
            .read_until(b'\n', &mut raw)
            .with_path(&self.source, "read WARC header")?;
        self.offset += n as u64;
        // Header lines are ASCII by definition; lossy keeps odd bytes harmless.
        buf.push_str(&String::from_utf8_lossy(&raw));
        Ok(n)
    }

    fn format_error(&self, reason: impl Into<String>) -> MailTallyError {
        MailTallyError::archive_format(&self.source, self.offset, reason)
    }

    fn next_record(&mut self) -> Result<Option<ArchiveRecord>> {
        let mut line = String::new();

        // Skip the blank separator lines between records.
        loop {
            if self.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if !line.trim().is_empty() {
                break;
            }
        }

        let version = line.trim_end();
        if !version.starts_with("WARC/") {
            return Err(self.format_error(format!("expected WARC version line, got '{version}'")));
        }

        let mut header = RecordHeader::default();
        let mut content_length: Option<u64> = None;
        loop {
            if self.read_line(&mut line)? == 0 {
                return Err(self.format_error("unexpected end of file inside record header"));
            }
            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.is_empty() {
                break;
            }
            let Some((name, value)) = trimmed.split_once(':') else {
                return Err(self.format_error(format!("invalid header line '{trimmed}'")));
            };
            let value = value.trim();
            if name.eq_ignore_ascii_case("WARC-Target-URI") {
                header.url = value.trim_start_matches('<').trim_end_matches('>').to_string();
            } else if name.eq_ignore_ascii_case("Content-Type") {
                header.mime_type = value.to_string();
            } else if name.eq_ignore_ascii_case("Content-Length") {
                let len = value
                    .parse::<u64>()
                    .map_err(|e| self.format_error(format!("bad Content-Length '{value}': {e}")))?;
                content_length = Some(len);
            }
        }

        let Some(length) = content_length else {
            return Err(self.format_error("record without Content-Length"));
        };

        let keep = length.min(self.max_payload_bytes as u64);
        let mut payload = Vec::with_capacity(keep.min(1 << 20) as usize);
        let read = (&mut self.inner)
            .take(keep)
            .read_to_end(&mut payload)
            .with_path(&self.source, "read WARC block")?;
        self.offset += read as u64;
        if (read as u64) < keep {
            return Err(self.format_error(format!(
                "truncated block: declared {length} bytes, found {read}"
            )));
        }

        let rest = length - keep;
        if rest > 0 {
            let skipped = io::copy(&mut (&mut self.inner).take(rest), &mut io::sink())
                .with_path(&self.source, "skip WARC block")?;
            self.offset += skipped;
            if skipped < rest {
                return Err(self.format_error(format!(
                    "truncated block: declared {length} bytes, found {}",
                    keep + skipped
                )));
            }
        }

        let available_length = payload.len();
        Ok(Some(ArchiveRecord {
            header,
            payload,
            available_length,
        }))
    }
}

impl<R: BufRead> Iterator for WarcReader<R> {
    type Item = Result<ArchiveRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Boxed reader type returned by [`open_archive`].
pub type ArchiveStream = Box<dyn BufRead + Send>;

/// Open a WARC file, decompressing `.gz` archives transparently.
pub fn open_archive<P: AsRef<Path>>(path: P) -> Result<WarcReader<ArchiveStream>> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let file = File::open(path).with_path(&display, "open archive")?;

    let is_gzip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    let stream: ArchiveStream = if is_gzip {
        Box::new(BufReader::new(MultiGzDecoder::new(BufReader::new(file))))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(WarcReader::new(stream, display))
}
