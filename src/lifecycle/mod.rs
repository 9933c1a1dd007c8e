//! Lifecycle Module
//!
//! Install/activate state machine plus the worker's message, sync, push and
//! notification-click handlers.
//!
//! # States
//! `installing → installed → activating → active`

use std::sync::Arc;

use futures_util::future::{join_all, try_join_all};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CacheStorage, CacheStore, StoreNames};
use crate::error::{Result, WorkerError};
use crate::models::{
    ClientEvent, MessageReply, Notification, PushPayload, StoreReport, TypedMessage, WorkerMessage,
};
use crate::network::{cache_key, FetchRequest, Fetcher, HttpResponse};
use crate::notion::properties::is_truthy;

/// Sync tag that triggers a client broadcast.
pub const SYNC_TAG: &str = "sync-data";

const DEFAULT_NOTIFICATION_TITLE: &str = "Pleiades OS";
const DEFAULT_NOTIFICATION_BODY: &str = "New notification";
const NOTIFICATION_ICON: &str = "/icon-192.png";
const NOTIFICATION_BADGE: &str = "/icon-96.png";

// Client event buffer; slow clients lag rather than block the worker.
const CLIENT_CHANNEL_CAPACITY: usize = 64;

// == Worker State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Installing,
    Installed,
    Activating,
    Active,
}

impl WorkerState {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Active => "active",
        }
    }
}

// == Worker Lifecycle ==
pub struct WorkerLifecycle {
    origin: Url,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    names: StoreNames,
    core_assets: Vec<String>,
    state: RwLock<WorkerState>,
    clients: broadcast::Sender<ClientEvent>,
}

impl WorkerLifecycle {
    /// Creates a lifecycle manager in the `installing` state.
    pub fn new(
        origin: Url,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        names: StoreNames,
        core_assets: Vec<String>,
    ) -> Self {
        let (clients, _) = broadcast::channel(CLIENT_CHANNEL_CAPACITY);
        Self {
            origin,
            storage,
            fetcher,
            names,
            core_assets,
            state: RwLock::new(WorkerState::Installing),
            clients,
        }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub fn names(&self) -> &StoreNames {
        &self.names
    }

    /// Registers a client; it receives every event broadcast from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.clients.subscribe()
    }

    async fn transition(&self, next: WorkerState) {
        let mut state = self.state.write().await;
        debug!(from = state.as_str(), to = next.as_str(), "worker state change");
        *state = next;
    }

    // == Install ==
    /// Populates the static store with the core assets, then activates.
    ///
    /// Population is best effort: an asset that fails to fetch is logged
    /// and skipped.
    pub async fn install(&self) -> Result<()> {
        self.transition(WorkerState::Installing).await;
        info!(version = self.names.version(), "installing worker");

        let store = self.storage.open(&self.names.static_assets).await?;
        let fetches = self.core_assets.iter().map(|path| self.fetch_asset(path));
        let results = join_all(fetches).await;

        let mut cached = 0;
        for (path, result) in self.core_assets.iter().zip(results) {
            match result {
                Ok((key, response)) => {
                    store.put(key, response).await?;
                    cached += 1;
                }
                Err(e) => warn!(asset = %path, error = %e, "core asset failed to cache"),
            }
        }
        info!(cached, total = self.core_assets.len(), "core assets cached");

        self.transition(WorkerState::Installed).await;
        self.skip_waiting().await
    }

    /// Activates a worker waiting in `installed`; otherwise does nothing.
    pub async fn skip_waiting(&self) -> Result<()> {
        match self.state().await {
            WorkerState::Installed => self.activate().await,
            state => {
                debug!(state = state.as_str(), "skip waiting ignored");
                Ok(())
            }
        }
    }

    // == Activate ==
    /// Deletes stores from older generations and claims all clients.
    pub async fn activate(&self) -> Result<()> {
        self.transition(WorkerState::Activating).await;
        info!(version = self.names.version(), "activating worker");

        for name in self.storage.keys().await? {
            if self.names.is_stale(&name) {
                info!(store = %name, "deleting old cache");
                self.storage.delete(&name).await?;
            }
        }

        self.transition(WorkerState::Active).await;
        let clients = self.broadcast(ClientEvent::Claimed {
            version: self.names.version().to_string(),
        });
        info!(clients, "claimed clients");
        Ok(())
    }

    // == Messages ==
    /// Handles a message from a page. Only CACHE_ASSETS produces a reply.
    pub async fn handle_message(&self, message: WorkerMessage) -> Result<Option<MessageReply>> {
        match message {
            WorkerMessage::Signal(signal) if signal == WorkerMessage::SKIP_WAITING => {
                self.skip_waiting().await?;
                Ok(None)
            }
            WorkerMessage::Typed(TypedMessage::CacheAssets { urls }) => {
                let result = match serde_json::from_value::<Vec<String>>(urls) {
                    Ok(urls) => self.cache_assets(&urls).await,
                    Err(e) => Err(WorkerError::InvalidRequest(format!(
                        "CACHE_ASSETS urls must be a list of strings: {e}"
                    ))),
                };
                let reply = match result {
                    Ok(()) => MessageReply::ok(),
                    Err(e) => {
                        warn!(error = %e, "bulk caching failed");
                        MessageReply::failed(e.to_string())
                    }
                };
                Ok(Some(reply))
            }
            other => {
                debug!(message = ?other, "ignoring unknown message");
                Ok(None)
            }
        }
    }

    /// Adds every URL to the static store, or none of them.
    ///
    /// All URLs are fetched first; a network failure, a non-2xx status or a
    /// partial body on any of them fails the batch before anything is written.
    pub async fn cache_assets(&self, urls: &[String]) -> Result<()> {
        let entries = try_join_all(urls.iter().map(|url| self.fetch_asset(url))).await?;
        let store = self.storage.open(&self.names.static_assets).await?;
        store.put_all(entries).await?;
        info!(count = urls.len(), "cached assets on request");
        Ok(())
    }

    async fn fetch_asset(&self, path: &str) -> Result<(String, HttpResponse)> {
        let url = self
            .origin
            .join(path)
            .map_err(|e| WorkerError::InvalidRequest(format!("invalid asset URL {path}: {e}")))?;

        let response = self.fetcher.fetch(&FetchRequest::get(url.clone())).await?;
        if !response.is_cacheable() {
            return Err(WorkerError::Network(format!(
                "request for {url} failed with status {}",
                response.status
            )));
        }
        Ok((cache_key(&url), response))
    }

    // == Sync / Push / Click ==
    /// Handles a background sync event. Returns false for unknown tags.
    pub fn sync(&self, tag: &str) -> bool {
        if tag != SYNC_TAG {
            debug!(tag, "ignoring sync tag");
            return false;
        }
        info!("background sync triggered");
        self.broadcast(ClientEvent::SyncCompleted);
        true
    }

    /// Displays a notification for a push. A push without payload shows nothing.
    pub fn push(&self, payload: Option<PushPayload>) -> Option<Notification> {
        let payload = payload?;
        let notification = Notification {
            title: non_empty(payload.title).unwrap_or_else(|| DEFAULT_NOTIFICATION_TITLE.into()),
            body: non_empty(payload.body).unwrap_or_else(|| DEFAULT_NOTIFICATION_BODY.into()),
            icon: NOTIFICATION_ICON.to_string(),
            badge: NOTIFICATION_BADGE.to_string(),
            data: payload
                .data
                .filter(is_truthy)
                .unwrap_or_else(|| serde_json::json!({})),
        };

        info!(title = %notification.title, "showing notification");
        self.broadcast(ClientEvent::Notification(notification.clone()));
        Some(notification)
    }

    /// Closes the clicked notification and opens a window at the root.
    pub fn notification_click(&self) {
        self.broadcast(ClientEvent::OpenWindow {
            url: "/".to_string(),
        });
    }

    /// Per-store statistics for every existing store.
    pub async fn store_reports(&self) -> Result<Vec<StoreReport>> {
        let mut reports = Vec::new();
        for name in self.storage.keys().await? {
            let store = self.storage.open(&name).await?;
            reports.push(StoreReport::new(name, store.stats().await?));
        }
        Ok(reports)
    }

    /// Sends `event` to every subscribed client; returns how many received it.
    fn broadcast(&self, event: ClientEvent) -> usize {
        self.clients.send(event).unwrap_or(0)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
