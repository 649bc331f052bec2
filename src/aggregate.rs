//! Group-by-token shuffle and the sum reduction.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::processor::Observation;

/// Final `(token, total)` output pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct AggregateResult {
    pub token: String,
    pub total: u64,
}

/// Sum every count emitted for `token`.
///
/// Saturates at `u64::MAX` instead of wrapping.
pub fn aggregate<I>(token: impl Into<String>, counts: I) -> AggregateResult
where
    I: IntoIterator<Item = u64>,
{
    let total = counts
        .into_iter()
        .fold(0u64, |acc, c| acc.saturating_add(c));
    AggregateResult {
        token: token.into(),
        total,
    }
}

/// In-process stand-in for a distributed group-by-key.
///
/// Holds every emitted count per token until [`Shuffle::reduce`] hands each
/// (non-empty) group to [`aggregate`].
#[derive(Debug, Default)]
pub struct Shuffle {
    groups: HashMap<String, Vec<u64>>,
}

impl Shuffle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, obs: Observation) {
        self.groups.entry(obs.token).or_default().push(obs.count);
    }

    /// Move all groups of `other` into `self`.
    pub fn merge(&mut self, other: Shuffle) {
        for (token, counts) in other.groups {
            self.groups.entry(token).or_default().extend(counts);
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Reduce every group, sorted by total (desc) then token.
    pub fn reduce(self) -> Vec<AggregateResult> {
        let mut results: Vec<_> = self
            .groups
            .into_iter()
            .map(|(token, counts)| aggregate(token, counts))
            .collect();
        sort_results(&mut results);
        results
    }
}

impl Extend<Observation> for Shuffle {
    fn extend<T: IntoIterator<Item = Observation>>(&mut self, iter: T) {
        for obs in iter {
            self.push(obs);
        }
    }
}

impl FromIterator<Observation> for Shuffle {
    fn from_iter<T: IntoIterator<Item = Observation>>(iter: T) -> Self {
        let mut shuffle = Shuffle::new();
        shuffle.extend(iter);
        shuffle
    }
}

/// Order results by total descending, then token ascending.
pub fn sort_results(results: &mut [AggregateResult]) {
    results.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.token.cmp(&b.token)));
}
