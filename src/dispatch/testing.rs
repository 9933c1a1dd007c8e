//! Scripted network used by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};

use crate::error::{Result, WorkerError};
use crate::network::{FetchRequest, Fetcher, HttpResponse};

/// Answers from a URL table; unknown URLs get a 404. Can be switched offline.
#[derive(Default)]
pub struct ScriptedFetcher {
    routes: Mutex<HashMap<String, HttpResponse>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, body: &'static str) {
        self.route_response(url, ok_response(body));
    }

    pub fn route_response(&self, url: &str, response: HttpResponse) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(WorkerError::Network("network unreachable".to_string()));
        }
        let routes = self.routes.lock().unwrap();
        Ok(routes
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| HttpResponse::empty(StatusCode::NOT_FOUND)))
    }
}

pub fn ok_response(body: &'static str) -> HttpResponse {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    HttpResponse::new(StatusCode::OK, headers, body)
}
