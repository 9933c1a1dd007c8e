//! Request DTOs for the gateway API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Message posted to the worker (POST /_worker/message)
///
/// Either the bare string `"skipWaiting"` or a typed object. Anything else
/// deserializes into [`WorkerMessage::Other`] and is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WorkerMessage {
    Signal(String),
    Typed(TypedMessage),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum TypedMessage {
    /// Add every URL to the static store, all or nothing
    ///
    /// `urls` stays raw so a malformed list still gets a failure reply.
    #[serde(rename = "CACHE_ASSETS")]
    CacheAssets {
        #[serde(default)]
        urls: Value,
    },
}

impl WorkerMessage {
    pub const SKIP_WAITING: &'static str = "skipWaiting";

    pub fn skip_waiting() -> Self {
        WorkerMessage::Signal(Self::SKIP_WAITING.to_string())
    }

    pub fn cache_assets(urls: Vec<String>) -> Self {
        WorkerMessage::Typed(TypedMessage::CacheAssets { urls: urls.into() })
    }
}

/// Request body for POST /_worker/sync
#[derive(Debug, Clone, Deserialize)]
pub struct SyncRequest {
    pub tag: String,
}

/// Push payload (POST /_worker/push)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Request body for POST /api/notion
#[derive(Debug, Clone, Deserialize)]
pub struct NotionQueryRequest {
    #[serde(default)]
    pub database_id: Option<String>,
    #[serde(default)]
    pub filter: Option<Value>,
    #[serde(default)]
    pub sorts: Option<Value>,
    /// Absent means 100; an explicit `null` or `0` omits it upstream
    #[serde(default = "default_page_size")]
    pub page_size: Option<u64>,
}

fn default_page_size() -> Option<u64> {
    Some(100)
}

impl NotionQueryRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.database_id.as_deref().map_or(true, str::is_empty) {
            return Some("database_id is required".to_string());
        }
        None
    }
}

/// Request body for POST /api/notion-add
#[derive(Debug, Clone, Deserialize)]
pub struct NotionAddRequest {
    #[serde(default)]
    pub database_id: Option<String>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl NotionAddRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        let missing_id = self.database_id.as_deref().map_or(true, str::is_empty);
        if missing_id || self.properties.is_none() {
            return Some("database_id and properties are required".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_waiting_message() {
        let msg: WorkerMessage = serde_json::from_str(r#""skipWaiting""#).unwrap();
        assert_eq!(msg, WorkerMessage::skip_waiting());
    }

    #[test]
    fn test_cache_assets_message() {
        let msg: WorkerMessage =
            serde_json::from_str(r#"{"type":"CACHE_ASSETS","urls":["/a.css","/b.js"]}"#).unwrap();
        assert_eq!(
            msg,
            WorkerMessage::cache_assets(vec!["/a.css".to_string(), "/b.js".to_string()])
        );
    }

    #[test]
    fn test_malformed_cache_assets_stays_typed() {
        let msg: WorkerMessage = serde_json::from_str(r#"{"type":"CACHE_ASSETS"}"#).unwrap();
        assert_eq!(
            msg,
            WorkerMessage::Typed(TypedMessage::CacheAssets { urls: Value::Null })
        );

        let msg: WorkerMessage =
            serde_json::from_str(r#"{"type":"CACHE_ASSETS","urls":"/a.css"}"#).unwrap();
        assert!(matches!(msg, WorkerMessage::Typed(TypedMessage::CacheAssets { .. })));
    }

    #[test]
    fn test_unknown_message() {
        let msg: WorkerMessage = serde_json::from_str(r#"{"type":"PING"}"#).unwrap();
        assert!(matches!(msg, WorkerMessage::Other(_)));
    }

    #[test]
    fn test_query_request_defaults() {
        let req: NotionQueryRequest = serde_json::from_str(r#"{"database_id":"db"}"#).unwrap();
        assert_eq!(req.page_size, Some(100));
        assert!(req.filter.is_none());
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_query_request_null_page_size() {
        let req: NotionQueryRequest =
            serde_json::from_str(r#"{"database_id":"db","page_size":null}"#).unwrap();
        assert_eq!(req.page_size, None);
    }

    #[test]
    fn test_query_request_requires_database_id() {
        let req: NotionQueryRequest = serde_json::from_str(r#"{"database_id":""}"#).unwrap();
        assert_eq!(req.validate().unwrap(), "database_id is required");
    }

    #[test]
    fn test_add_request_validation() {
        let req: NotionAddRequest = serde_json::from_str(r#"{"database_id":"db"}"#).unwrap();
        assert!(req.validate().is_some());

        let req: NotionAddRequest =
            serde_json::from_str(r#"{"database_id":"db","properties":{}}"#).unwrap();
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_push_payload_partial() {
        let payload: PushPayload = serde_json::from_str(r#"{"title":"Hi"}"#).unwrap();
        assert_eq!(payload.title.as_deref(), Some("Hi"));
        assert!(payload.body.is_none());
    }
}
