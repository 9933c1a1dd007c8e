//! Network capability.
//!
//! The dispatcher never talks to the network directly; it goes through a
//! [`Fetcher`] so strategies can be exercised against scripted networks.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderValue};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::{Result, WorkerError};
use crate::network::{FetchRequest, HttpResponse};

/// Performs network fetches on behalf of the dispatcher.
///
/// An `Err` means the network itself failed (connectivity, DNS, timeout).
/// Any HTTP status, including 4xx and 5xx, is a successful fetch.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(&self, request: &FetchRequest) -> Result<HttpResponse>;
}

/// Marks requests sent by the gateway so it can recognise its own traffic
/// coming back when the network origin resolves to itself.
pub const FORWARDED_HEADER: &str = "x-pleiades-forwarded";

// Headers that describe a single hop and must not be replayed.
const HOP_HEADERS: [header::HeaderName; 5] = [
    header::CONNECTION,
    header::CONTENT_LENGTH,
    header::HOST,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

// == Reqwest Fetcher ==
/// [`Fetcher`] backed by a shared `reqwest` client.
///
/// When an upstream origin is configured, requests addressed to the site
/// origin are rebased onto it; every other URL is fetched as-is.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    site_origin: Url,
    upstream: Option<Url>,
}

impl ReqwestFetcher {
    pub fn new(site_origin: Url, upstream: Option<Url>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| WorkerError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            site_origin,
            upstream,
        })
    }

    /// URL the request is actually sent to.
    pub fn target_url(&self, url: &Url) -> Url {
        match &self.upstream {
            Some(upstream) if url.origin() == self.site_origin.origin() => {
                let mut target = upstream.clone();
                let base = upstream.path().trim_end_matches('/');
                target.set_path(&format!("{base}{}", url.path()));
                target.set_query(url.query());
                target
            }
            _ => url.clone(),
        }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<HttpResponse> {
        let target = self.target_url(&request.url);
        debug!(method = %request.method, url = %target, "fetching from network");

        let mut headers = request.headers.clone();
        for name in &HOP_HEADERS {
            headers.remove(name);
        }
        headers.insert(FORWARDED_HEADER, HeaderValue::from_static("1"));

        let response = self
            .client
            .request(request.method.clone(), target)
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await?;

        let status = response.status();
        let mut headers = response.headers().clone();
        for name in &HOP_HEADERS {
            headers.remove(name);
        }
        let body = response.bytes().await?;

        Ok(HttpResponse::new(status, headers, body))
    }
}
