//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing bodies and client events.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::cache::CacheStats;

/// Body of the synthetic response for an always-fresh request made offline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfflineResponse {
    pub error: String,
    pub offline: bool,
}

impl OfflineResponse {
    pub fn network_error() -> Self {
        Self {
            error: "Network error".to_string(),
            offline: true,
        }
    }
}

/// Reply to a CACHE_ASSETS message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageReply {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// A notification shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub data: Value,
}

/// Event broadcast to every controlled client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientEvent {
    /// The worker took control after activating
    Claimed { version: String },
    /// Background sync finished
    SyncCompleted,
    /// A notification was displayed
    Notification(Notification),
    /// A client window should be opened at `url`
    OpenWindow { url: String },
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Per-store statistics in the state endpoint
#[derive(Debug, Clone, Serialize)]
pub struct StoreReport {
    pub name: String,
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hit_rate: f64,
}

impl StoreReport {
    pub fn new(name: impl Into<String>, stats: CacheStats) -> Self {
        Self {
            name: name.into(),
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for GET /_worker/state
#[derive(Debug, Clone, Serialize)]
pub struct StateResponse {
    pub state: String,
    pub version: String,
    pub stores: Vec<StoreReport>,
}

/// One page in the simplified query projection
#[derive(Debug, Clone, Serialize)]
pub struct SimplifiedPage {
    pub id: Value,
    pub url: Value,
    pub created_time: Value,
    pub last_edited_time: Value,
    pub properties: Map<String, Value>,
}

/// Response body for POST /api/notion
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub results: Vec<SimplifiedPage>,
    pub has_more: Value,
    pub next_cursor: Value,
    pub total: usize,
}

/// Response body for POST /api/notion-add
#[derive(Debug, Clone, Serialize)]
pub struct AddResponse {
    pub success: bool,
    pub id: Value,
    pub url: Value,
    pub created_time: Value,
}
