//! Network Module
//!
//! Request/response models and the fetch capability used by the dispatcher.

mod fetcher;
mod request;
mod response;

pub use fetcher::{Fetcher, ReqwestFetcher, FORWARDED_HEADER};
pub use request::{cache_key, mode_from_headers, FetchRequest, RequestMode};
pub use response::HttpResponse;
