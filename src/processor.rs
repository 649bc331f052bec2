//! Per-partition record processing.
//!
//! A [`RecordProcessor`] is created fresh for each partition, consumes its
//! records one at a time and emits `(token, 1)` observations. Dedup state
//! lives inside the processor, so re-running a partition from scratch gives
//! the same emissions.
//!
//! Record pipeline:
//! 1. Split the record into HTTP headers + body (skip non-HTML responses).
//! 2. Count the record in `records_in`.
//! 3. Resolve the record URL to a domain.
//! 4. Emit each extracted token the first time it is seen on that domain.
//!
//! Any record-level failure is logged, counted in `exceptions` and the
//! record is dropped; it never aborts the partition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::archive::ArchiveRecord;
use crate::config::ScanConfig;
use crate::dedup::DedupTable;
use crate::domain_utils::{self, DomainMode};
use crate::emails::TokenExtractor;
use crate::errors::{MailTallyError, Result};
use crate::http::{ResponseSplitter, Split};

/// One emitted `(token, count)` pair. Processors always emit `count == 1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Observation {
    pub token: String,
    pub count: u64,
}

impl Observation {
    pub fn one(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            count: 1,
        }
    }
}

/// Observability counters for a processor (or a whole job once merged).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct Counters {
    /// Every record handed to the processor.
    pub records_seen: u64,
    /// HTML responses accepted for token extraction.
    pub records_in: u64,
    /// Records (or partitions) skipped because of an error.
    pub exceptions: u64,
    /// Observations emitted.
    pub observations: u64,
}

impl Counters {
    /// Sum `other` into `self` (saturating).
    pub fn absorb(&mut self, other: &Counters) {
        self.records_seen = self.records_seen.saturating_add(other.records_seen);
        self.records_in = self.records_in.saturating_add(other.records_in);
        self.exceptions = self.exceptions.saturating_add(other.exceptions);
        self.observations = self.observations.saturating_add(other.observations);
    }
}

/// Stateful per-partition processor.
#[derive(Debug)]
pub struct RecordProcessor {
    extractor: TokenExtractor,
    splitter: ResponseSplitter,
    domain_mode: DomainMode,
    dedup: DedupTable,
    counters: Counters,
}

impl RecordProcessor {
    /// Processor with the default record rules (host-level domains).
    pub fn new(extractor: TokenExtractor) -> Self {
        Self {
            extractor,
            splitter: ResponseSplitter::default(),
            domain_mode: DomainMode::Host,
            dedup: DedupTable::new(),
            counters: Counters::default(),
        }
    }

    pub fn from_config(extractor: TokenExtractor, scan: &ScanConfig) -> Self {
        Self {
            splitter: ResponseSplitter::new(&scan.response_mime, &scan.html_marker),
            domain_mode: scan.domain_mode,
            ..Self::new(extractor)
        }
    }

    /// Process one record, returning the observations it produced.
    pub fn process_record(&mut self, record: &ArchiveRecord) -> Vec<Observation> {
        let mut out = Vec::new();
        self.process_record_into(record, |obs| out.push(obs));
        out
    }

    /// Process one record, handing each observation to `emit`.
    pub fn process_record_into<F>(&mut self, record: &ArchiveRecord, mut emit: F)
    where
        F: FnMut(Observation),
    {
        self.counters.records_seen += 1;
        if let Err(e) = self.try_process(record, &mut emit) {
            self.record_failure(&e);
        }
    }

    fn try_process(&mut self, record: &ArchiveRecord, emit: &mut dyn FnMut(Observation)) -> Result<()> {
        let message = match self.splitter.split(record)? {
            Split::Html(message) => message,
            Split::Skipped(reason) => {
                debug!(url = %record.url(), ?reason, "record skipped");
                return Ok(());
            }
        };

        self.counters.records_in += 1;

        let domain = domain_utils::domain_of(record.url(), self.domain_mode)?;

        for token in self.extractor.tokens(&message.body) {
            if self.dedup.observe(token, &domain) {
                self.counters.observations += 1;
                emit(Observation::one(token));
            }
        }
        Ok(())
    }

    /// Count and log a failure that caused records to be dropped.
    pub fn record_failure(&mut self, err: &MailTallyError) {
        self.counters.exceptions += 1;
        if err.is_record_level() {
            let url = err.record_url().unwrap_or_default();
            error!(url = %url, category = %err.category(), error = %err, "record skipped");
        } else {
            error!(category = %err.category(), error = %err, "input skipped");
        }
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn dedup_table(&self) -> &DedupTable {
        &self.dedup
    }

    /// Finish the partition, releasing its dedup state and counters.
    pub fn finish(self) -> (DedupTable, Counters) {
        (self.dedup, self.counters)
    }
}
