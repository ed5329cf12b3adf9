//! # Barcode Database Adapter Tests
//!
//! These tests point the adapter at a mock server standing in for both
//! barcode APIs and exercise the happy path, the "not found" shapes each API
//! uses, and malformed payloads.

use enrich::source::Source;
use enrich::throttle::{RateLimit, Throttle};
use enrich::types::ProductQuery;
use enrich_upcdb::UpcDbSource;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Once};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

fn setup_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt::init();
    });
}

fn test_source(server: &MockServer) -> UpcDbSource {
    // An uncapped throttle so tests are not paced like production crawls.
    let throttle = Arc::new(Throttle::new(HashMap::from([(
        "127.0.0.1".to_string(),
        RateLimit {
            requests_per_second: 1000.0,
            max_concurrent: 8,
        },
    )])));
    UpcDbSource::new(reqwest::Client::new(), throttle)
        .with_base_urls(server.uri(), server.uri())
}

fn query() -> ProductQuery {
    ProductQuery {
        identifier: "850029397809".to_string(),
        brand: "DIBS Beauty".to_string(),
        name: "No Pressure Lip Liner".to_string(),
        size: None,
        color: None,
    }
}

#[tokio::test]
async fn both_databases_contribute_identifier_confirmed_candidates() {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prod/trial/lookup"))
        .and(query_param("upc", "850029397809"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "OK",
            "items": [{
                "title": "DIBS Beauty No Pressure Lip Liner",
                "description": "A long-wearing lip liner.",
                "images": ["https://img.example.com/liner.jpg"],
                "offers": [
                    { "price": 16.0 },
                    { "price": 18.0 }
                ]
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v0/product/850029397809.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "product": {
                "product_name": "DIBS Beauty No Pressure Lip Liner",
                "generic_name": "Lip liner",
                "image_front_url": "https://img.example.com/front.jpg"
            }
        })))
        .mount(&server)
        .await;

    // --- 2. Act ---
    let candidates = test_source(&server).search_by_identifier(&query()).await;

    // --- 3. Assert ---
    assert_eq!(candidates.len(), 2);
    assert!(candidates.iter().all(|c| c.identifier_matched));

    let itemdb = &candidates[0];
    assert_eq!(itemdb.source, "upcitemdb");
    // MSRP is the highest offered price.
    assert_eq!(itemdb.price, Some(18.0));
    assert_eq!(
        itemdb.image_url.as_deref(),
        Some("https://img.example.com/liner.jpg")
    );

    let facts = &candidates[1];
    assert_eq!(facts.source, "openfoodfacts");
    assert_eq!(facts.price, None);
    assert_eq!(
        facts.image_url.as_deref(),
        Some("https://img.example.com/front.jpg")
    );
}

#[tokio::test]
async fn not_found_responses_yield_no_candidates() {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;

    // The item database signals "not found" with a non-OK code.
    Mock::given(method("GET"))
        .and(path("/prod/trial/lookup"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "code": "INVALID_UPC", "items": [] })),
        )
        .mount(&server)
        .await;

    // The facts database signals it with status 0.
    Mock::given(method("GET"))
        .and(path("/api/v0/product/850029397809.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": 0, "status_verbose": "product not found" })),
        )
        .mount(&server)
        .await;

    // --- 2. Act ---
    let candidates = test_source(&server).search_by_identifier(&query()).await;

    // --- 3. Assert ---
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn server_errors_and_malformed_payloads_degrade_to_empty() {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prod/trial/lookup"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v0/product/850029397809.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    // --- 2. Act ---
    let candidates = test_source(&server).search_by_identifier(&query()).await;

    // --- 3. Assert ---
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn english_name_is_used_when_primary_name_is_missing() {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prod/trial/lookup"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v0/product/850029397809.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "product": {
                "product_name_en": "DIBS Beauty No Pressure Lip Liner"
            }
        })))
        .mount(&server)
        .await;

    // --- 2. Act ---
    let candidates = test_source(&server).search_by_identifier(&query()).await;

    // --- 3. Assert ---
    assert_eq!(candidates.len(), 1);
    assert_eq!(
        candidates[0].title.as_deref(),
        Some("DIBS Beauty No Pressure Lip Liner")
    );
}
