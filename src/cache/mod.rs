//! Cache Module
//!
//! Named, version-tagged response stores and the storage capability that
//! opens them.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::{CacheStorage, CacheStore, MemoryCache, MemoryCacheStorage};

// == Store Names ==
/// Names of the three stores that make up one cache generation.
///
/// Every name has the shape `{prefix}-{kind}-{version}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNames {
    prefix: String,
    version: String,
    /// Core assets, static assets, offline page and bulk-cached URLs
    pub static_assets: String,
    /// Cross-origin font responses
    pub fonts: String,
    /// Image responses
    pub runtime: String,
}

impl StoreNames {
    pub fn new(prefix: impl Into<String>, version: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let version = version.into();
        Self {
            static_assets: format!("{prefix}-static-{version}"),
            fonts: format!("{prefix}-fonts-{version}"),
            runtime: format!("{prefix}-os-{version}"),
            prefix,
            version,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Names of the current generation.
    pub fn current(&self) -> [&str; 3] {
        [&self.static_assets, &self.fonts, &self.runtime]
    }

    /// True if `name` belongs to this application but not to the current generation.
    pub fn is_stale(&self, name: &str) -> bool {
        let owned = name.starts_with(&format!("{}-", self.prefix));
        owned && !self.current().contains(&name)
    }
}
