//! # Product Cache Tests
//!
//! Round-trips enriched records through the SQLite-backed cache.

use enrich::pipeline::ProductCache;
use enrich::types::{EnrichedRecord, ProductQuery, SourceRef};
use enrich_server::cache::TursoCache;
use tempfile::tempdir;

fn query() -> ProductQuery {
    ProductQuery {
        identifier: "850029397809".to_string(),
        brand: "DIBS Beauty".to_string(),
        name: "No Pressure Lip Liner".to_string(),
        size: None,
        color: None,
    }
}

fn verified_record() -> EnrichedRecord {
    let mut record = EnrichedRecord::empty(&query(), "VERIFIED: Exact match");
    record.confidence = 95;
    record.msrp = Some(18.0);
    record.sources = vec![
        SourceRef {
            name: "upcitemdb".to_string(),
            url: "https://example.com/upc".to_string(),
            identifier_matched: true,
        },
        SourceRef {
            name: "storefront".to_string(),
            url: "https://example.com/p1".to_string(),
            identifier_matched: true,
        },
    ];
    record
}

#[tokio::test]
async fn lookup_misses_on_an_empty_database() {
    // --- 1. Arrange ---
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("cache.db");
    let cache = TursoCache::new(db_path.to_str().unwrap())
        .await
        .expect("cache opens");

    // --- 2. Act ---
    let result = cache.lookup("850029397809").await.expect("lookup works");

    // --- 3. Assert ---
    assert!(result.is_none());
}

#[tokio::test]
async fn saved_records_come_back_as_verified_cache_hits() {
    // --- 1. Arrange ---
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("cache.db");
    let cache = TursoCache::new(db_path.to_str().unwrap())
        .await
        .expect("cache opens");
    cache.save(&verified_record()).await.expect("save works");

    // --- 2. Act ---
    let hit = cache
        .lookup("850029397809")
        .await
        .expect("lookup works")
        .expect("record found");

    // --- 3. Assert ---
    assert_eq!(hit.confidence, 95);
    assert_eq!(hit.msrp, Some(18.0));
    assert_eq!(hit.reasoning, "Cached result from 2 verified sources");
    let verification = hit.verification.expect("synthetic verification");
    assert!(verification.is_exact_match);
    assert!(verification.mismatches.is_empty());
}

#[tokio::test]
async fn saving_twice_overwrites_the_previous_record() {
    // --- 1. Arrange ---
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("cache.db");
    let cache = TursoCache::new(db_path.to_str().unwrap())
        .await
        .expect("cache opens");

    let mut first = verified_record();
    first.msrp = Some(16.0);
    cache.save(&first).await.expect("save works");
    cache.save(&verified_record()).await.expect("save works");

    // --- 2. Act ---
    let hit = cache
        .lookup("850029397809")
        .await
        .expect("lookup works")
        .expect("record found");

    // --- 3. Assert ---
    assert_eq!(hit.msrp, Some(18.0));
}
