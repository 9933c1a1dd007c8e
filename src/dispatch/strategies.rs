//! Strategy Handlers
//!
//! One handler per [`RequestClass`](super::RequestClass) other than `Skip`.
//! Only complete 2xx responses to full-resource requests are ever written
//! to a store.

use std::sync::Arc;

use axum::http::StatusCode;
use tracing::{info, warn};

use super::Dispatcher;
use crate::cache::CacheStore;
use crate::error::{Result, WorkerError};
use crate::models::OfflineResponse;
use crate::network::{FetchRequest, HttpResponse};
use crate::tasks::spawn_revalidation;

impl Dispatcher {
    // == Font ==
    /// Cache first from the font store; network only on a miss.
    pub(crate) async fn handle_font(&self, request: &FetchRequest) -> Result<HttpResponse> {
        let store = self.storage.open(&self.names.fonts).await?;
        let key = request.cache_key();

        if let Some(cached) = store.match_key(&key).await? {
            return Ok(cached);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                store_if_cacheable(store.as_ref(), request, key, &response).await?;
                Ok(response)
            }
            Err(e) => {
                warn!(url = %key, error = %e, "font fetch failed");
                Ok(HttpResponse::empty(StatusCode::NOT_FOUND))
            }
        }
    }

    // == Api ==
    /// Network only. A network failure becomes a typed 503 offline response.
    pub(crate) async fn handle_api(&self, request: &FetchRequest) -> Result<HttpResponse> {
        match self.fetcher.fetch(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!(url = %request.url, error = %e, "API request failed");
                Ok(HttpResponse::json(
                    StatusCode::SERVICE_UNAVAILABLE,
                    &OfflineResponse::network_error(),
                ))
            }
        }
    }

    // == Image ==
    /// Stale-while-revalidate from the runtime store.
    pub(crate) async fn handle_image(&self, request: &FetchRequest) -> Result<HttpResponse> {
        let store = self.storage.open(&self.names.runtime).await?;
        let key = request.cache_key();

        if let Some(cached) = store.match_key(&key).await? {
            // Detached: the handle is dropped and the outcome never reaches the caller
            spawn_revalidation(Arc::clone(&store), Arc::clone(&self.fetcher), request.clone());
            return Ok(cached);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                store_if_cacheable(store.as_ref(), request, key, &response).await?;
                Ok(response)
            }
            Err(e) => {
                warn!(url = %key, error = %e, "image fetch failed");
                Ok(HttpResponse::empty(StatusCode::NOT_FOUND))
            }
        }
    }

    // == Static ==
    /// Network first, refreshing the static store; cached copy on failure.
    pub(crate) async fn handle_static(&self, request: &FetchRequest) -> Result<HttpResponse> {
        let store = self.storage.open(&self.names.static_assets).await?;
        let key = request.cache_key();
        let cached = store.match_key(&key).await?;

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                store_if_cacheable(store.as_ref(), request, key, &response).await?;
                Ok(response)
            }
            Err(e) => {
                if let Some(cached) = cached {
                    info!(url = %key, "serving cached copy");
                    return Ok(cached);
                }
                self.offline_fallback(store.as_ref(), request, e).await
            }
        }
    }

    // == Default ==
    /// Network first without caching; static store on failure.
    pub(crate) async fn handle_default(&self, request: &FetchRequest) -> Result<HttpResponse> {
        let err = match self.fetcher.fetch(request).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        let store = self.storage.open(&self.names.static_assets).await?;
        if let Some(cached) = store.match_key(&request.cache_key()).await? {
            return Ok(cached);
        }
        self.offline_fallback(store.as_ref(), request, err).await
    }

    /// Offline page for navigations, otherwise the network failure.
    async fn offline_fallback(
        &self,
        store: &dyn CacheStore,
        request: &FetchRequest,
        err: WorkerError,
    ) -> Result<HttpResponse> {
        if request.is_navigation() {
            if let Some(page) = store.match_key(&self.offline_key).await? {
                info!(url = %request.url, "serving offline page");
                return Ok(page);
            }
        }
        Err(err)
    }
}

async fn store_if_cacheable(
    store: &dyn CacheStore,
    request: &FetchRequest,
    key: String,
    response: &HttpResponse,
) -> Result<()> {
    if response.is_cacheable() && !request.is_range() {
        store.put(key, response.clone()).await?;
    }
    Ok(())
}
