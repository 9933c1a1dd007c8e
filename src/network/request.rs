//! Intercepted request model.

use axum::http::{header, HeaderMap, Method};
use bytes::Bytes;
use url::Url;

/// How the page issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Top-level page navigation
    Navigate,
    /// Any subresource or script-initiated request
    #[default]
    Other,
}

// == Fetch Request ==
/// A request as seen by the fetch interceptor.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub method: Method,
    pub mode: RequestMode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl FetchRequest {
    /// Creates a GET request for `url`.
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            mode: RequestMode::Other,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a GET navigation request for `url`.
    pub fn navigate(url: Url) -> Self {
        Self {
            mode: RequestMode::Navigate,
            ..Self::get(url)
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// True when the request asks for part of the resource.
    pub fn is_range(&self) -> bool {
        self.headers.contains_key(header::RANGE)
    }

    /// Cache key for this request: the absolute URL without fragment.
    pub fn cache_key(&self) -> String {
        cache_key(&self.url)
    }
}

/// Cache key for a URL: the serialized URL with any fragment dropped.
pub fn cache_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}

/// Derives the request mode from browser headers.
///
/// `Sec-Fetch-Mode: navigate` is authoritative; without it a GET that
/// accepts HTML is treated as a navigation.
pub fn mode_from_headers(method: &Method, headers: &HeaderMap) -> RequestMode {
    if let Some(mode) = headers.get("sec-fetch-mode").and_then(|v| v.to_str().ok()) {
        return if mode.eq_ignore_ascii_case("navigate") {
            RequestMode::Navigate
        } else {
            RequestMode::Other
        };
    }

    let accepts_html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/html"));

    if *method == Method::GET && accepts_html {
        RequestMode::Navigate
    } else {
        RequestMode::Other
    }
}
