//! Notes proxy
//!
//! Forwards dashboard reads and writes to a Notion database using the
//! server-held integration token, translating between Notion's property
//! objects and flat values.

pub mod client;
pub mod properties;

pub use client::NotionClient;
pub use properties::{simplify_properties, to_notion_properties};
