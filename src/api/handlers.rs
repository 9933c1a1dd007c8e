//! API Handlers
//!
//! HTTP request handlers for the worker control routes, the notes proxy and
//! the intercepting fallback.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{StatusCode, Uri},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures_util::stream::{self, Stream};
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use url::Url;

use crate::cache::{CacheStorage, MemoryCacheStorage, StoreNames};
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::{Result, WorkerError};
use crate::lifecycle::{WorkerLifecycle, WorkerState};
use crate::models::{
    AddResponse, HealthResponse, NotionAddRequest, NotionQueryRequest, PushPayload, QueryResponse,
    StateResponse, SyncRequest, WorkerMessage,
};
use crate::network::{
    mode_from_headers, FetchRequest, Fetcher, HttpResponse, ReqwestFetcher, FORWARDED_HEADER,
};
use crate::notion::NotionClient;

// Largest request body the interceptor buffers before forwarding.
const MAX_INTERCEPT_BODY: usize = 16 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub lifecycle: Arc<WorkerLifecycle>,
    pub notion: NotionClient,
    site_origin: Url,
}

impl AppState {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        lifecycle: Arc<WorkerLifecycle>,
        notion: NotionClient,
        site_origin: Url,
    ) -> Self {
        Self {
            dispatcher,
            lifecycle,
            notion,
            site_origin,
        }
    }

    /// Wires an in-memory cache storage and a `reqwest` network into a
    /// dispatcher and lifecycle manager sharing the same stores.
    pub fn from_config(config: &Config) -> Result<Self> {
        let origin = config.site_origin_url()?;
        let storage: Arc<dyn CacheStorage> = Arc::new(MemoryCacheStorage::new());
        let fetcher: Arc<dyn Fetcher> = Arc::new(ReqwestFetcher::new(
            origin.clone(),
            config.upstream_origin_url()?,
            config.fetch_timeout(),
        )?);
        let names = StoreNames::new(&config.cache_prefix, &config.cache_version);

        let dispatcher = Dispatcher::new(
            origin.clone(),
            storage.clone(),
            fetcher.clone(),
            names.clone(),
            &config.offline_page,
        )?;
        let lifecycle = WorkerLifecycle::new(
            origin.clone(),
            storage,
            fetcher,
            names,
            config.core_assets.clone(),
        );

        Ok(Self::new(
            Arc::new(dispatcher),
            Arc::new(lifecycle),
            NotionClient::from_config(config)?,
            origin,
        ))
    }

    /// Absolute URL of an incoming request.
    ///
    /// Absolute-form URIs (forward proxy) keep their own origin; origin-form
    /// URIs are resolved against the site origin.
    pub fn resolve_url(&self, uri: &Uri) -> Result<Url> {
        let resolved = if uri.scheme().is_some() {
            Url::parse(&uri.to_string())
        } else {
            let path = uri.path_and_query().map_or("/", |p| p.as_str());
            self.site_origin.join(path)
        };
        resolved.map_err(|e| WorkerError::InvalidRequest(format!("invalid request URI {uri}: {e}")))
    }
}

// == Worker Control ==

/// Handler for POST /_worker/message
///
/// Answers 200 with the reply for messages that produce one, 202 otherwise.
pub async fn message_handler(
    State(state): State<AppState>,
    Json(message): Json<WorkerMessage>,
) -> Result<Response> {
    let response = match state.lifecycle.handle_message(message).await? {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    };
    Ok(response)
}

/// Handler for POST /_worker/sync
pub async fn sync_handler(
    State(state): State<AppState>,
    Json(req): Json<SyncRequest>,
) -> Json<Value> {
    let handled = state.lifecycle.sync(&req.tag);
    Json(json!({ "tag": req.tag, "handled": handled }))
}

/// Handler for POST /_worker/push
///
/// An empty body is a push without payload and shows nothing (204).
pub async fn push_handler(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let payload = if body.is_empty() {
        None
    } else {
        let payload: PushPayload = serde_json::from_slice(&body)
            .map_err(|e| WorkerError::InvalidRequest(format!("invalid push payload: {e}")))?;
        Some(payload)
    };

    let response = match state.lifecycle.push(payload) {
        Some(notification) => Json(notification).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}

/// Handler for POST /_worker/notification-click
pub async fn notification_click_handler(State(state): State<AppState>) -> StatusCode {
    state.lifecycle.notification_click();
    StatusCode::NO_CONTENT
}

/// Handler for GET /_worker/events
///
/// Streams client events as server-sent events. A client that falls behind
/// skips the events it missed.
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let receiver = state.lifecycle.subscribe();

    let events = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let data = serde_json::to_string(&event).unwrap_or_default();
                    return Some((Ok::<_, Infallible>(Event::default().data(data)), receiver));
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handler for GET /_worker/state
pub async fn state_handler(State(state): State<AppState>) -> Result<Json<StateResponse>> {
    let lifecycle = &state.lifecycle;
    Ok(Json(StateResponse {
        state: lifecycle.state().await.as_str().to_string(),
        version: lifecycle.names().version().to_string(),
        stores: lifecycle.store_reports().await?,
    }))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

// == Notes Proxy ==

/// Handler for POST /api/notion
pub async fn notion_query_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<QueryResponse>> {
    let req: NotionQueryRequest = parse_body(&body)?;
    Ok(Json(state.notion.query_database(&req).await?))
}

/// Handler for POST /api/notion-add
pub async fn notion_add_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AddResponse>> {
    let req: NotionAddRequest = parse_body(&body)?;
    Ok(Json(state.notion.add_page(&req).await?))
}

/// Any method other than POST on a proxy route.
pub async fn method_not_allowed() -> WorkerError {
    WorkerError::MethodNotAllowed
}

// The proxy treats an unreadable body as an internal failure, not a 4xx.
fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| WorkerError::Internal(e.to_string()))
}

// == Interceptor ==

/// Fallback for every other request: the worker's fetch event.
///
/// Until the worker is active, requests go straight to the network. A
/// request this gateway forwarded itself is refused instead of being
/// forwarded again.
pub async fn intercept_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<HttpResponse> {
    let (parts, body) = request.into_parts();
    if parts.headers.contains_key(FORWARDED_HEADER) {
        warn!(uri = %parts.uri, "request came back from the network origin, set UPSTREAM_ORIGIN");
        return Err(WorkerError::ForwardingLoop);
    }
    let url = state.resolve_url(&parts.uri)?;
    let body = axum::body::to_bytes(body, MAX_INTERCEPT_BODY)
        .await
        .map_err(|e| WorkerError::InvalidRequest(format!("unreadable request body: {e}")))?;

    let request = FetchRequest {
        mode: mode_from_headers(&parts.method, &parts.headers),
        url,
        method: parts.method,
        headers: parts.headers,
        body,
    };

    if state.lifecycle.state().await != WorkerState::Active {
        debug!(url = %request.url, "worker not active, forwarding");
        return state.dispatcher.fetcher().fetch(&request).await;
    }
    state.dispatcher.respond(&request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::from_config(&Config::default()).unwrap()
    }

    #[test]
    fn test_resolve_origin_form() {
        let url = state().resolve_url(&Uri::from_static("/app.css?v=2")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/app.css?v=2");
    }

    #[test]
    fn test_resolve_absolute_form() {
        let uri = Uri::from_static("https://fonts.gstatic.com/s/inter.woff2");
        let url = state().resolve_url(&uri).unwrap();
        assert_eq!(url.as_str(), "https://fonts.gstatic.com/s/inter.woff2");
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_state_handler_before_install() {
        let response = state_handler(State(state())).await.unwrap();
        assert_eq!(response.state, "installing");
        assert_eq!(response.version, "v1");
        assert!(response.stores.is_empty());
    }

    #[tokio::test]
    async fn test_sync_handler() {
        let response = sync_handler(
            State(state()),
            Json(SyncRequest {
                tag: "sync-data".to_string(),
            }),
        )
        .await;
        assert_eq!(response.0["handled"], true);
    }

    #[tokio::test]
    async fn test_push_without_body_is_no_content() {
        let response = push_handler(State(state()), Bytes::new()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_intercept_refuses_own_forwarded_request() {
        let request = axum::http::Request::builder()
            .uri("/app.css")
            .header(FORWARDED_HEADER, "1")
            .body(axum::body::Body::empty())
            .unwrap();
        let result = intercept_handler(State(state()), request).await;
        assert!(matches!(result, Err(WorkerError::ForwardingLoop)));
    }

    #[tokio::test]
    async fn test_invalid_proxy_body_is_internal_error() {
        let result = notion_query_handler(State(state()), Bytes::from_static(b"{not json")).await;
        assert!(matches!(result, Err(WorkerError::Internal(_))));
    }
}
