//! Per-store lookup and write counters.

use serde::Serialize;

/// Activity of one response store since it was opened.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Responses written, overwrites included
    pub writes: u64,
    pub total_entries: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups that found a response; 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }

    pub fn record_lookup(&mut self, found: bool) {
        if found {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    /// Counts `count` writes that left the store holding `entries` responses.
    pub fn record_writes(&mut self, count: usize, entries: usize) {
        self.writes += count as u64;
        self.total_entries = entries;
    }
}
