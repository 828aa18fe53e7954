//! Per-host request counters.
//!
//! One [`CounterStore`] is built at startup and shared through an `Arc` by
//! every spy thread and the reporter for the life of the process. Writers
//! take the write lock for a single map update; the reporter takes the
//! read lock only long enough to copy the map into a [`Snapshot`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Concurrency-safe mapping from host to request count.
#[derive(Debug, Default)]
pub struct CounterStore {
    counters: RwLock<Counters>,
    max_hosts: Option<usize>,
}

/// Per-host counts plus the requests of hosts that did not fit. The
/// overflow never shares the host map, so no `Host:` value can collide
/// with it.
#[derive(Debug, Default)]
struct Counters {
    hosts: HashMap<String, u64>,
    overflow: u64,
}

impl CounterStore {
    /// Creates an empty, unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store tracking at most `max_hosts` distinct hosts. Requests
    /// for further hosts are added to [`CounterStore::overflow`].
    #[must_use]
    pub fn with_max_hosts(max_hosts: Option<usize>) -> Self {
        Self {
            counters: RwLock::default(),
            max_hosts,
        }
    }

    /// Counts one request for `host`.
    pub fn increment(&self, host: &str) {
        let mut counters = self.write();
        if let Some(count) = counters.hosts.get_mut(host) {
            *count = count.saturating_add(1);
            return;
        }
        match self.max_hosts {
            Some(max) if counters.hosts.len() >= max => {
                counters.overflow = counters.overflow.saturating_add(1);
            }
            _ => {
                let _ = counters.hosts.insert(host.to_owned(), 1);
            }
        }
    }

    /// Current count for `host`, if it was ever seen.
    #[must_use]
    pub fn get(&self, host: &str) -> Option<u64> {
        self.read().hosts.get(host).copied()
    }

    /// Requests for hosts that arrived after the store was full.
    #[must_use]
    pub fn overflow(&self) -> u64 {
        self.read().overflow
    }

    /// Number of distinct hosts tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().hosts.len()
    }

    /// Returns whether no request has been counted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let counters = self.read();
        counters.hosts.is_empty() && counters.overflow == 0
    }

    /// Copies every count into an independent, sorted [`Snapshot`].
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let counters = self.read();
        let copied: Vec<(String, u64)> = counters
            .hosts
            .iter()
            .map(|(host, count)| (host.clone(), *count))
            .collect();
        Snapshot::from_counts(copied).with_overflow(counters.overflow)
    }

    fn read(&self) -> RwLockReadGuard<'_, Counters> {
        self.counters.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Counters> {
        self.counters.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One host and its request count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCount {
    /// Host as it appeared in the `Host:` header.
    pub host: String,
    /// Requests counted so far.
    pub count: u64,
}

/// Point-in-time copy of a [`CounterStore`], sorted by count descending.
///
/// Hosts with equal counts are ordered by name so the table does not
/// shuffle between refreshes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: Vec<HostCount>,
    overflow: u64,
}

impl Snapshot {
    /// Builds a sorted snapshot from `(host, count)` pairs.
    #[must_use]
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (String, u64)>,
    {
        let mut entries: Vec<HostCount> = counts
            .into_iter()
            .map(|(host, count)| HostCount { host, count })
            .collect();
        entries.sort_unstable_by(|a, b| b.count.cmp(&a.count).then_with(|| a.host.cmp(&b.host)));
        Self {
            entries,
            overflow: 0,
        }
    }

    /// Attaches the count of requests for untracked hosts.
    #[must_use]
    pub const fn with_overflow(mut self, overflow: u64) -> Self {
        self.overflow = overflow;
        self
    }

    /// Requests for hosts beyond the store's bound.
    #[must_use]
    pub const fn overflow(&self) -> u64 {
        self.overflow
    }

    /// Entries, highest count first.
    pub fn iter(&self) -> std::slice::Iter<'_, HostCount> {
        self.entries.iter()
    }

    /// Count recorded for `host` at snapshot time.
    #[must_use]
    pub fn get(&self, host: &str) -> Option<u64> {
        self.entries.iter().find(|e| e.host == host).map(|e| e.count)
    }

    /// Number of hosts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the snapshot holds no host.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts, overflow included.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.entries
            .iter()
            .fold(self.overflow, |sum, e| sum.saturating_add(e.count))
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a HostCount;
    type IntoIter = std::slice::Iter<'a, HostCount>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
