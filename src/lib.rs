//! Pleiades SW - Offline caching worker for the Pleiades OS dashboard
//!
//! Classifies intercepted requests and serves them through per-class
//! caching strategies backed by versioned response stores.

pub mod api;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod network;
pub mod notion;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use dispatch::{Dispatch, Dispatcher, RequestClass};
pub use error::{Result, WorkerError};
pub use lifecycle::{WorkerLifecycle, WorkerState};
