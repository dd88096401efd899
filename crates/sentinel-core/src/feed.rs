//! Bounded newest-first feed window with transient "new" highlights

use sentinel_config::FeedConfig;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::models::Transaction;

/// Highlight marks for recently arrived transactions.
///
/// Each mark carries its own expiry instant; expired marks are ignored by
/// queries and dropped by [`RecentArrivals::sweep`], so no timer is needed
/// per transaction.
#[derive(Debug, Clone)]
pub struct RecentArrivals {
    ttl: Duration,
    expiry: HashMap<String, Instant>,
}

impl RecentArrivals {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            expiry: HashMap::new(),
        }
    }

    /// Mark an id as new until `now + ttl`
    pub fn mark(&mut self, id: &str, now: Instant) {
        self.expiry.insert(id.to_string(), now + self.ttl);
    }

    pub fn is_recent(&self, id: &str, now: Instant) -> bool {
        self.expiry.get(id).map_or(false, |expires| now < *expires)
    }

    pub fn forget(&mut self, id: &str) {
        self.expiry.remove(id);
    }

    /// Drop expired marks, returning how many were removed
    pub fn sweep(&mut self, now: Instant) -> usize {
        let before = self.expiry.len();
        self.expiry.retain(|_, expires| now < *expires);
        before - self.expiry.len()
    }

    /// Ids still highlighted at `now`
    pub fn ids(&self, now: Instant) -> BTreeSet<String> {
        self.expiry
            .iter()
            .filter(|(_, expires)| now < **expires)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Earliest pending expiry, if any mark is held
    pub fn next_expiry(&self) -> Option<Instant> {
        self.expiry.values().min().copied()
    }

    pub fn clear(&mut self) {
        self.expiry.clear();
    }

    /// Number of marks held, expired or not
    pub fn len(&self) -> usize {
        self.expiry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expiry.is_empty()
    }
}

/// Result of a single ingestion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Ids dropped from the tail to respect the capacity
    pub evicted: Vec<String>,
    /// An older entry with the same id was replaced
    pub replaced: bool,
}

/// Newest-first sliding window over the transaction stream
#[derive(Debug, Clone)]
pub struct FeedBuffer {
    entries: Vec<Transaction>,
    capacity: usize,
    recent: RecentArrivals,
    revision: u64,
}

impl FeedBuffer {
    /// Create an empty buffer; a zero capacity is raised to one
    pub fn new(capacity: usize, highlight: Duration) -> Self {
        Self {
            entries: Vec::with_capacity(capacity.max(1) + 1),
            capacity: capacity.max(1),
            recent: RecentArrivals::new(highlight),
            revision: 0,
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(config.capacity, Duration::from_millis(config.highlight_ms))
    }

    /// Replace the contents with an initial batch (newest first).
    ///
    /// Entries beyond the capacity and repeated ids are dropped; existing
    /// highlight marks are cleared.
    pub fn seed(&mut self, batch: Vec<Transaction>) {
        let mut seen = HashSet::new();
        self.entries = batch
            .into_iter()
            .map(Transaction::sanitized)
            .filter(|tx| seen.insert(tx.id.clone()))
            .take(self.capacity)
            .collect();
        self.recent.clear();
        self.revision += 1;
        log::debug!("Feed seeded with {} transactions", self.entries.len());
    }

    /// Prepend a transaction, highlight it and truncate to the capacity
    pub fn ingest(&mut self, next: Transaction, now: Instant) -> IngestOutcome {
        let next = next.sanitized();
        let mut outcome = IngestOutcome::default();

        if let Some(pos) = self.position(&next.id) {
            log::warn!("Transaction {} arrived twice, replacing the older entry", next.id);
            self.entries.remove(pos);
            outcome.replaced = true;
        }

        self.recent.mark(&next.id, now);
        self.entries.insert(0, next);

        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop() {
                self.recent.forget(&evicted.id);
                outcome.evicted.push(evicted.id);
            }
        }

        self.revision += 1;
        log::debug!(
            "Ingested {} ({} in window, {} evicted)",
            self.entries[0].id,
            self.entries.len(),
            outcome.evicted.len()
        );
        outcome
    }

    /// Expire highlight marks; contents are untouched
    pub fn sweep(&mut self, now: Instant) -> usize {
        self.recent.sweep(now)
    }

    /// When the next highlight lapses
    pub fn next_expiry(&self) -> Option<Instant> {
        self.recent.next_expiry()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.entries.iter().find(|tx| tx.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|tx| tx.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes whenever the contents change; used as the buffer identity
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_recent(&self, id: &str, now: Instant) -> bool {
        self.recent.is_recent(id, now)
    }

    pub fn recent_ids(&self, now: Instant) -> BTreeSet<String> {
        self.recent.ids(now)
    }
}
