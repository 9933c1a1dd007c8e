//! API Module
//!
//! HTTP surface of the gateway that hosts the worker.
//!
//! # Endpoints
//! - `/api/notion`, `/api/notion-add` - Notes proxy
//! - `/_worker/*` - Lifecycle control and client events
//! - `GET /health` - Health check endpoint
//! - fallback - Every other request, dispatched through the caching strategies

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
