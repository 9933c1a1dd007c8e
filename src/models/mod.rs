//! Request and Response models for the gateway
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP bodies and worker messages.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    NotionAddRequest, NotionQueryRequest, PushPayload, SyncRequest, TypedMessage, WorkerMessage,
};
pub use responses::{
    AddResponse, ClientEvent, HealthResponse, MessageReply, Notification, OfflineResponse,
    QueryResponse, SimplifiedPage, StateResponse, StoreReport,
};
