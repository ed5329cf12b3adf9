//! # Storefront Adapter Tests
//!
//! A mock server plays the retailer: a search page with product links and
//! product pages carrying JSON-LD (or only visible markup, for the fallback).

use enrich::source::Source;
use enrich::throttle::{RateLimit, Throttle};
use enrich::types::ProductQuery;
use enrich_storefront::StorefrontSource;
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

fn test_source(server: &MockServer) -> StorefrontSource {
    let throttle = Arc::new(Throttle::new(HashMap::from([(
        "127.0.0.1".to_string(),
        RateLimit {
            requests_per_second: 1000.0,
            max_concurrent: 8,
        },
    )])));
    StorefrontSource::new(reqwest::Client::new(), throttle).with_base_url(server.uri())
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

fn search_page(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{l}">result</a>"#))
        .collect();
    format!("<html><body>{anchors}</body></html>")
}

fn json_ld_page(gtin13: &str) -> String {
    let block = json!({
        "@type": "Product",
        "name": "DIBS Beauty No Pressure Lip Liner",
        "description": "A long-wearing lip liner.",
        "image": ["https://img.example.com/liner.jpg"],
        "gtin13": gtin13,
        "offers": { "price": "18.00" }
    });
    format!(
        r#"<html><head><script type="application/ld+json">{block}</script></head><body></body></html>"#
    )
}

#[tokio::test]
async fn reads_product_data_from_json_ld() {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("keyword", "850029397809"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(search_page(&["/product/lip-liner-P1"])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/lip-liner-P1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(json_ld_page("850029397809")))
        .mount(&server)
        .await;

    // --- 2. Act ---
    let candidates = test_source(&server).search_by_identifier(&query()).await;

    // --- 3. Assert ---
    assert_eq!(candidates.len(), 1);
    let c = &candidates[0];
    assert_eq!(c.title.as_deref(), Some("DIBS Beauty No Pressure Lip Liner"));
    assert_eq!(c.price, Some(18.0));
    assert_eq!(
        c.image_url.as_deref(),
        Some("https://img.example.com/liner.jpg")
    );
    // The page's GTIN matches the queried identifier.
    assert!(c.identifier_matched);
}

#[tokio::test]
async fn mismatched_gtin_is_not_identifier_confirmed() {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(search_page(&["/product/other-P2"])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/other-P2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(json_ld_page("0000000000000")))
        .mount(&server)
        .await;

    // --- 2. Act ---
    let candidates = test_source(&server).search_by_identifier(&query()).await;

    // --- 3. Assert ---
    assert_eq!(candidates.len(), 1);
    assert!(!candidates[0].identifier_matched);
    assert_eq!(candidates[0].identifier.as_deref(), Some("0000000000000"));
}

#[tokio::test]
async fn falls_back_to_visible_markup_without_json_ld() {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;
    let product_html = r#"<html><body>
        <h1 data-at="product_name">DIBS Beauty No Pressure Lip Liner</h1>
        <div data-at="price">$18.00</div>
        <img data-at="product_image" src="https://img.example.com/liner.jpg">
        </body></html>"#;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(search_page(&["/product/lip-liner-P1"])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/lip-liner-P1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_html))
        .mount(&server)
        .await;

    // --- 2. Act ---
    let candidates = test_source(&server).search_by_identifier(&query()).await;

    // --- 3. Assert ---
    assert_eq!(candidates.len(), 1);
    let c = &candidates[0];
    assert_eq!(c.title.as_deref(), Some("DIBS Beauty No Pressure Lip Liner"));
    assert_eq!(c.price, Some(18.0));
    // CSS-scraped pages can never confirm the identifier.
    assert!(!c.identifier_matched);
}

#[tokio::test]
async fn only_the_top_two_product_pages_are_fetched() {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(&[
            "/product/one-P1",
            "/product/two-P2",
            "/product/three-P3",
        ])))
        .mount(&server)
        .await;

    for p in ["one-P1", "two-P2"] {
        Mock::given(method("GET"))
            .and(path(format!("/product/{p}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(json_ld_page("850029397809")))
            .expect(1)
            .mount(&server)
            .await;
    }
    // The third link must never be fetched.
    Mock::given(method("GET"))
        .and(path("/product/three-P3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(json_ld_page("850029397809")))
        .expect(0)
        .mount(&server)
        .await;

    // --- 2. Act ---
    let candidates = test_source(&server).search_by_identifier(&query()).await;

    // --- 3. Assert ---
    assert_eq!(candidates.len(), 2);
}

#[tokio::test]
async fn duplicate_links_are_fetched_once() {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(search_page(&[
            "/product/lip-liner-P1",
            "/product/lip-liner-P1",
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/lip-liner-P1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(json_ld_page("850029397809")))
        .expect(1)
        .mount(&server)
        .await;

    // --- 2. Act ---
    let candidates = test_source(&server).search_by_identifier(&query()).await;

    // --- 3. Assert ---
    assert_eq!(candidates.len(), 1);
}

#[tokio::test]
async fn empty_search_results_yield_no_candidates() {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .mount(&server)
        .await;

    // --- 2. Act ---
    let candidates = test_source(&server).search_by_identifier(&query()).await;

    // --- 3. Assert ---
    assert!(candidates.is_empty());
}
