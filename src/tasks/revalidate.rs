//! Background Revalidation Task
//!
//! Refreshes a cached entry after a stale copy has already been served.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::CacheStore;
use crate::network::{FetchRequest, Fetcher};

/// Spawns a detached fetch that overwrites the cached entry for `request`.
///
/// The caller has already answered with the cached copy, so nothing about
/// this task is reported back: a failed fetch, a non-success status, or a
/// failed write is logged at debug level and dropped. Only complete 2xx
/// responses replace the stored entry.
///
/// The returned handle may be dropped; the task keeps running.
pub fn spawn_revalidation(
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    request: FetchRequest,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let key = request.cache_key();

        let response = match fetcher.fetch(&request).await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %key, error = %e, "background revalidation failed");
                return;
            }
        };

        if !response.is_cacheable() || request.is_range() {
            debug!(url = %key, status = %response.status, "revalidation kept cached copy");
            return;
        }

        match store.put(key.clone(), response).await {
            Ok(()) => debug!(url = %key, store = store.name(), "revalidated cache entry"),
            Err(e) => debug!(url = %key, error = %e, "revalidation write failed"),
        }
    })
}
