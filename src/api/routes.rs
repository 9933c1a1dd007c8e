//! API Routes
//!
//! Configures the Axum router: worker control routes, the notes proxy and
//! the intercepting fallback.

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    events_handler, health_handler, intercept_handler, message_handler, method_not_allowed,
    notification_click_handler, notion_add_handler, notion_query_handler, push_handler,
    state_handler, sync_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /api/notion` - Query a notes database
/// - `POST /api/notion-add` - Add a page to a notes database
/// - `POST /_worker/message` - Post a message to the worker
/// - `POST /_worker/sync` - Fire a background sync event
/// - `POST /_worker/push` - Deliver a push message
/// - `POST /_worker/notification-click` - Report a notification click
/// - `GET /_worker/events` - Client event stream (SSE)
/// - `GET /_worker/state` - Lifecycle state and store statistics
/// - `GET /health` - Health check endpoint
/// - anything else - intercepted and dispatched by the worker
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/_worker/message", post(message_handler))
        .route("/_worker/sync", post(sync_handler))
        .route("/_worker/push", post(push_handler))
        .route(
            "/_worker/notification-click",
            post(notification_click_handler),
        )
        .route("/_worker/events", get(events_handler))
        .route("/_worker/state", get(state_handler))
        .route("/health", get(health_handler))
        .merge(notes_proxy_routes())
        .fallback(intercept_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// OPTIONS is answered by the CORS layer before reaching the method router.
fn notes_proxy_routes() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route(
            "/api/notion",
            post(notion_query_handler).fallback(method_not_allowed),
        )
        .route(
            "/api/notion-add",
            post(notion_add_handler).fallback(method_not_allowed),
        )
        .layer(cors)
}
