//! Per-partition record of which domains have already served each token.

use std::collections::{HashMap, HashSet};

/// Token -> set of domains already observed for it.
///
/// Owned by exactly one record processor; never shared between partitions.
#[derive(Debug, Default, Clone)]
pub struct DedupTable {
    seen: HashMap<String, HashSet<String>>,
}

impl DedupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `(token, domain)`; returns `true` only the first time the pair is seen.
    pub fn observe(&mut self, token: &str, domain: &str) -> bool {
        match self.seen.get_mut(token) {
            Some(domains) => {
                if domains.contains(domain) {
                    false
                } else {
                    domains.insert(domain.to_string())
                }
            }
            None => {
                let mut domains = HashSet::new();
                domains.insert(domain.to_string());
                self.seen.insert(token.to_string(), domains);
                true
            }
        }
    }

    pub fn contains(&self, token: &str, domain: &str) -> bool {
        self.seen
            .get(token)
            .is_some_and(|domains| domains.contains(domain))
    }

    /// Number of distinct domains recorded for `token`.
    pub fn domain_count(&self, token: &str) -> usize {
        self.seen.get(token).map_or(0, HashSet::len)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Union `other` into `self` (set union per token).
    pub fn merge(&mut self, other: DedupTable) {
        for (token, domains) in other.seen {
            self.seen.entry(token).or_default().extend(domains);
        }
    }

    /// Consume into `(token, distinct domain count)` pairs, unordered.
    pub fn into_domain_counts(self) -> impl Iterator<Item = (String, u64)> {
        self.seen
            .into_iter()
            .map(|(token, domains)| (token, domains.len() as u64))
    }
}
