//! Buffered HTTP response shared by the network and cache layers.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Serialize;

// == Http Response ==
/// A fully buffered response.
///
/// Bodies are reference counted, so cloning a response yields an
/// independent copy without duplicating the bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// An empty-bodied response with the given status.
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, HeaderMap::new(), Bytes::new())
    }

    /// A JSON response serialized from `value`.
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        // Serializing plain DTOs into a Vec cannot fail.
        let body = serde_json::to_vec(value).unwrap_or_default();
        Self::new(status, headers, body)
    }

    /// True for 2xx statuses.
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// True when the response may be written to a store: a complete 2xx.
    /// A `206 Partial Content` body is only a slice of the resource.
    pub fn is_cacheable(&self) -> bool {
        self.is_ok() && self.status != StatusCode::PARTIAL_CONTENT
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_response() {
        let response = HttpResponse::empty(StatusCode::NOT_FOUND);
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(response.body.is_empty());
        assert!(!response.is_ok());
        assert!(!response.is_cacheable());
    }

    #[test]
    fn test_partial_content_is_not_cacheable() {
        let response = HttpResponse::new(StatusCode::PARTIAL_CONTENT, HeaderMap::new(), "cons");
        assert!(response.is_ok());
        assert!(!response.is_cacheable());
        assert!(HttpResponse::empty(StatusCode::NO_CONTENT).is_cacheable());
    }

    #[test]
    fn test_json_response() {
        let response = HttpResponse::json(StatusCode::OK, &json!({ "a": 1 }));
        assert!(response.is_ok());
        assert_eq!(response.headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(&response.body[..], br#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_into_response_keeps_parts() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/css"));
        let response = HttpResponse::new(StatusCode::CREATED, headers, "body{}").into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"body{}");
    }
}
