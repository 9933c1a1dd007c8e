//! Background Tasks Module
//!
//! Contains tasks that run detached from the request that started them.
//!
//! # Tasks
//! - Revalidation: refreshes a cached entry after serving the stale copy

mod revalidate;

pub use revalidate::spawn_revalidation;
