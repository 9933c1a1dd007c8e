//! Cache Entry Module
//!
//! Defines the structure for individual cached responses.

use chrono::{DateTime, Utc};

use crate::network::HttpResponse;

// == Cache Entry ==
/// A stored response together with the time it was written.
///
/// Entries carry no expiry: they stay until overwritten or until their
/// store generation is purged.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored response
    pub response: HttpResponse,
    /// When the response was written to the store
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Constructor ==
    /// Wraps a response stamped with the current time.
    pub fn new(response: HttpResponse) -> Self {
        Self {
            response,
            stored_at: Utc::now(),
        }
    }

    // == Age ==
    /// Milliseconds since the entry was stored.
    pub fn age_ms(&self) -> i64 {
        (Utc::now() - self.stored_at).num_milliseconds().max(0)
    }
}
