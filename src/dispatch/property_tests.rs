//! Property-Based Tests for the Dispatcher
//!
//! Uses proptest to check the interception invariants over generated requests.

use std::sync::Arc;

use axum::http::{HeaderMap, Method, StatusCode};
use proptest::prelude::*;
use url::Url;

use super::testing::ScriptedFetcher;
use super::{Dispatch, Dispatcher, RequestClass};
use crate::cache::{CacheStorage, MemoryCacheStorage, StoreNames};
use crate::network::{FetchRequest, HttpResponse};

const ORIGIN: &str = "http://localhost:3000";

fn setup() -> (Dispatcher, Arc<MemoryCacheStorage>, Arc<ScriptedFetcher>) {
    let storage = Arc::new(MemoryCacheStorage::new());
    let fetcher = Arc::new(ScriptedFetcher::new());
    let dispatcher = Dispatcher::new(
        Url::parse(ORIGIN).unwrap(),
        storage.clone(),
        fetcher.clone(),
        StoreNames::new("pleiades", "v1"),
        "/offline.html",
    )
    .unwrap();
    (dispatcher, storage, fetcher)
}

// == Strategies ==
fn non_get_method() -> impl Strategy<Value = Method> {
    prop_oneof![
        Just(Method::POST),
        Just(Method::PUT),
        Just(Method::DELETE),
        Just(Method::PATCH),
        Just(Method::HEAD),
        Just(Method::OPTIONS),
    ]
}

/// Same-origin or cross-origin URLs with assorted extensions.
fn any_url() -> impl Strategy<Value = Url> {
    (
        prop_oneof![
            Just(ORIGIN.to_string()),
            "https://[a-z]{3,10}\\.example\\.com",
            Just("https://fonts.gstatic.com".to_string()),
        ],
        "/[a-z]{1,12}",
        prop_oneof![
            Just(""),
            Just(".css"),
            Just(".png"),
            Just(".woff2"),
            Just(".html")
        ],
    )
        .prop_map(|(origin, path, ext)| Url::parse(&format!("{origin}{path}{ext}")).unwrap())
}

fn cross_origin_non_font_url() -> impl Strategy<Value = Url> {
    (
        "[a-z]{3,10}",
        "/[a-z]{1,12}",
        prop_oneof![Just(""), Just(".js"), Just(".css"), Just(".png"), Just(".json")],
    )
        .prop_map(|(host, path, ext)| {
            Url::parse(&format!("https://{host}.example.com{path}{ext}")).unwrap()
        })
}

fn api_url() -> impl Strategy<Value = Url> {
    (
        "[a-z]{1,10}",
        prop_oneof![Just(""), Just(".png"), Just(".css"), Just(".json")],
    )
        .prop_map(|(path, ext)| Url::parse(&format!("{ORIGIN}/api/{path}{ext}")).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Non-GET requests are never intercepted, whatever the URL.
    #[test]
    fn prop_non_get_never_intercepted(method in non_get_method(), url in any_url()) {
        let (dispatcher, storage, fetcher) = setup();
        let request = FetchRequest::get(url).with_method(method);

        let outcome = tokio_test::block_on(dispatcher.dispatch(&request)).unwrap();

        prop_assert_eq!(outcome, Dispatch::Passthrough);
        prop_assert_eq!(fetcher.calls(), 0);
        prop_assert!(tokio_test::block_on(storage.keys()).unwrap().is_empty());
    }

    // Cross-origin requests outside the font patterns are never intercepted.
    #[test]
    fn prop_cross_origin_non_font_never_intercepted(url in cross_origin_non_font_url()) {
        let (dispatcher, _storage, fetcher) = setup();
        let request = FetchRequest::get(url);

        prop_assert_eq!(dispatcher.classifier().classify(&request), RequestClass::Skip);
        let outcome = tokio_test::block_on(dispatcher.dispatch(&request)).unwrap();
        prop_assert_eq!(outcome, Dispatch::Passthrough);
        prop_assert_eq!(fetcher.calls(), 0);
    }

    // Always-fresh requests never read from or write to any store, online or not.
    #[test]
    fn prop_api_requests_bypass_stores(url in api_url(), offline in any::<bool>()) {
        let (dispatcher, storage, fetcher) = setup();
        fetcher.set_offline(offline);
        let request = FetchRequest::get(url);

        let outcome = tokio_test::block_on(dispatcher.dispatch(&request)).unwrap();

        let Dispatch::Respond(response) = outcome else {
            return Err(TestCaseError::fail("API request was not intercepted"));
        };
        if offline {
            prop_assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        }
        prop_assert!(tokio_test::block_on(storage.keys()).unwrap().is_empty());
    }

    // A response stored by the static strategy comes back byte-identical offline.
    #[test]
    fn prop_static_round_trip(
        name in "[a-z]{1,12}",
        ext in prop_oneof![Just("css"), Just("js"), Just("html"), Just("json")],
        body in prop::collection::vec(any::<u8>(), 0..512)
    ) {
        let (dispatcher, _storage, fetcher) = setup();
        let url = Url::parse(&format!("{ORIGIN}/{name}.{ext}")).unwrap();
        let stored = HttpResponse::new(StatusCode::OK, HeaderMap::new(), body);
        fetcher.route_response(url.as_str(), stored.clone());
        let request = FetchRequest::get(url);

        let online = tokio_test::block_on(dispatcher.dispatch(&request)).unwrap();
        prop_assert_eq!(online, Dispatch::Respond(stored.clone()));

        fetcher.set_offline(true);
        let offline = tokio_test::block_on(dispatcher.dispatch(&request)).unwrap();
        prop_assert_eq!(offline, Dispatch::Respond(stored));
    }
}
