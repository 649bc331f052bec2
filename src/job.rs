//! Local job driver: partition -> process -> shuffle -> aggregate.
//!
//! Each input archive is one partition and gets its own [`RecordProcessor`];
//! partitions run in parallel on a dedicated rayon pool and share nothing.
//! The merge after the parallel section is the group-by-key barrier: all
//! observations for a token are collected before it is aggregated.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::aggregate::{AggregateResult, Shuffle, aggregate, sort_results};
use crate::archive::{ArchiveRecord, open_archive};
use crate::config::{Config, DedupScope, ScanConfig};
use crate::dedup::DedupTable;
use crate::emails::TokenExtractor;
use crate::errors::{MailTallyError, Result};
use crate::output::{ReportMetadata, TallyReport};
use crate::processor::{Counters, RecordProcessor};

/// Everything one partition hands to the shuffle stage.
#[derive(Debug, Default)]
pub struct PartitionOutput {
    pub shuffle: Shuffle,
    pub dedup: DedupTable,
    pub counters: Counters,
}

/// Final outcome of a job.
#[derive(Debug)]
pub struct TallyOutcome {
    pub results: Vec<AggregateResult>,
    pub counters: Counters,
    pub partitions: usize,
}

impl TallyOutcome {
    /// Total for `token`, if it was observed.
    pub fn total_for(&self, token: &str) -> Option<u64> {
        self.results
            .iter()
            .find(|r| r.token == token)
            .map(|r| r.total)
    }
}

/// A configured tally run.
#[derive(Debug)]
pub struct TallyJob {
    scan: ScanConfig,
    threads: usize,
    extractor: TokenExtractor,
}

impl TallyJob {
    /// Validate `config` and compile the token pattern.
    ///
    /// Both failures are fatal: nothing is scanned if either fails.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let extractor = TokenExtractor::init()?;
        Ok(Self {
            scan: config.scan.clone(),
            threads: config.job.threads,
            extractor,
        })
    }

    pub fn scan_config(&self) -> &ScanConfig {
        &self.scan
    }

    /// Process one partition sequentially with a fresh processor.
    ///
    /// A stream error (broken container, read failure) is counted as one
    /// exception and ends the partition; records already read still count.
    pub fn run_partition<I>(&self, records: I) -> PartitionOutput
    where
        I: IntoIterator<Item = Result<ArchiveRecord>>,
    {
        let mut processor = RecordProcessor::from_config(self.extractor, &self.scan);
        let mut shuffle = Shuffle::new();
        let keep_observations = self.scan.dedup_scope == DedupScope::Partition;

        for item in records {
            match item {
                Ok(record) => processor.process_record_into(&record, |obs| {
                    if keep_observations {
                        shuffle.push(obs);
                    }
                }),
                Err(e) => {
                    processor.record_failure(&e);
                    break;
                }
            }
        }

        let (dedup, counters) = processor.finish();
        PartitionOutput {
            shuffle,
            // Only the global pass needs the tables after the partition ends.
            dedup: if keep_observations {
                DedupTable::new()
            } else {
                dedup
            },
            counters,
        }
    }

    /// Run every partition in parallel and reduce.
    pub fn run_partitions<P>(&self, partitions: Vec<P>) -> Result<TallyOutcome>
    where
        P: IntoIterator<Item = Result<ArchiveRecord>> + Send,
    {
        let count = partitions.len();
        let outputs = self.install(|| {
            partitions
                .into_par_iter()
                .map(|records| self.run_partition(records))
                .collect::<Vec<_>>()
        })?;
        Ok(self.reduce(outputs, count))
    }

    /// Open and process each archive file as its own partition.
    ///
    /// Failing to open a file aborts the job; damage inside a file only
    /// ends that partition early.
    pub fn run_files(&self, paths: &[PathBuf]) -> Result<TallyOutcome> {
        let outputs = self.install(|| {
            paths
                .par_iter()
                .map(|path| self.run_file(path))
                .collect::<Result<Vec<_>>>()
        })??;
        Ok(self.reduce(outputs, paths.len()))
    }

    fn run_file(&self, path: &Path) -> Result<PartitionOutput> {
        let started = Instant::now();
        let reader = open_archive(path)?.with_max_payload(self.scan.max_payload_bytes);
        let output = self.run_partition(reader);
        info!(
            archive = %path.display(),
            records = output.counters.records_seen,
            html = output.counters.records_in,
            exceptions = output.counters.exceptions,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "partition finished"
        );
        Ok(output)
    }

    fn install<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("mailtally-worker-{i}"))
            .build()
            .map_err(|e| MailTallyError::configuration(format!("worker pool: {e}")))?;
        Ok(pool.install(op))
    }

    fn reduce(&self, outputs: Vec<PartitionOutput>, partitions: usize) -> TallyOutcome {
        let mut counters = Counters::default();
        let results = match self.scan.dedup_scope {
            DedupScope::Partition => {
                let mut shuffle = Shuffle::new();
                for out in outputs {
                    counters.absorb(&out.counters);
                    shuffle.merge(out.shuffle);
                }
                debug!(tokens = shuffle.len(), "shuffle complete");
                shuffle.reduce()
            }
            DedupScope::Global => {
                let mut table = DedupTable::new();
                for out in outputs {
                    counters.absorb(&out.counters);
                    table.merge(out.dedup);
                }
                debug!(tokens = table.len(), "global dedup complete");
                let mut results: Vec<_> = table
                    .into_domain_counts()
                    .map(|(token, n)| aggregate(token, [n]))
                    .collect();
                sort_results(&mut results);
                results
            }
        };
        TallyOutcome {
            results,
            counters,
            partitions,
        }
    }

    /// Wrap an outcome into a serializable report.
    pub fn report(&self, inputs: &[PathBuf], outcome: TallyOutcome) -> TallyReport {
        TallyReport {
            metadata: ReportMetadata::new(
                inputs.iter().map(|p| p.display().to_string()).collect(),
                self.scan.dedup_scope,
                self.scan.domain_mode,
            ),
            counters: outcome.counters,
            results: outcome.results,
        }
    }
}
