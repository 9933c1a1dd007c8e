//! Dispatch Module
//!
//! Classifies intercepted requests and runs the matching caching strategy.
//!
//! The dispatcher owns no global state: cache storage and the network are
//! injected, so a dispatch is a function of the request and those two
//! capabilities.

mod classifier;
mod strategies;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::cache::{CacheStorage, StoreNames};
use crate::error::{Result, WorkerError};
use crate::network::{cache_key, FetchRequest, Fetcher, HttpResponse};

pub use classifier::{
    Classifier, RequestClass, Rule, ALWAYS_FRESH_PATTERNS, FONT_PATTERNS, IMAGE_PATTERNS,
    RULE_PRECEDENCE, STATIC_PATTERNS,
};

// == Dispatch Outcome ==
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Not intercepted; the host sends the request untouched
    Passthrough,
    /// The strategy produced this response
    Respond(HttpResponse),
}

// == Dispatcher ==
pub struct Dispatcher {
    classifier: Classifier,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    names: StoreNames,
    offline_key: String,
}

impl Dispatcher {
    /// Creates a dispatcher for pages served from `origin`.
    ///
    /// `offline_page` is resolved against `origin` to find the offline
    /// fallback document in the static store.
    pub fn new(
        origin: Url,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        names: StoreNames,
        offline_page: &str,
    ) -> Result<Self> {
        let offline_url = origin
            .join(offline_page)
            .map_err(|e| WorkerError::InvalidRequest(format!("offline page: {e}")))?;

        Ok(Self {
            classifier: Classifier::new(origin)?,
            storage,
            fetcher,
            names,
            offline_key: cache_key(&offline_url),
        })
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn names(&self) -> &StoreNames {
        &self.names
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    /// Classifies `request` and runs its strategy.
    ///
    /// `Err` is only returned when no fallback applies: a static or default
    /// request that failed on the network with nothing cached, or a storage
    /// failure.
    pub async fn dispatch(&self, request: &FetchRequest) -> Result<Dispatch> {
        let class = self.classifier.classify(request);
        debug!(method = %request.method, url = %request.url, ?class, "classified request");

        let response = match class {
            RequestClass::Skip => return Ok(Dispatch::Passthrough),
            RequestClass::Font => self.handle_font(request).await?,
            RequestClass::Api => self.handle_api(request).await?,
            RequestClass::Image => self.handle_image(request).await?,
            RequestClass::Static => self.handle_static(request).await?,
            RequestClass::Default => self.handle_default(request).await?,
        };

        Ok(Dispatch::Respond(response))
    }

    /// Like [`dispatch`](Self::dispatch), but sends pass-through requests
    /// straight to the network.
    pub async fn respond(&self, request: &FetchRequest) -> Result<HttpResponse> {
        match self.dispatch(request).await? {
            Dispatch::Passthrough => self.fetcher.fetch(request).await,
            Dispatch::Respond(response) => Ok(response),
        }
    }
}
