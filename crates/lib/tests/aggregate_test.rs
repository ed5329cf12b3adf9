//! Tests for verification-driven aggregation of raw candidates.

use enrich::aggregate::aggregate;
use enrich::types::{Candidate, ProductQuery};

fn query() -> ProductQuery {
    ProductQuery {
        identifier: "850029397809".to_string(),
        brand: "DIBS Beauty".to_string(),
        name: "No Pressure Lip Liner - #1 - On the Rose".to_string(),
        size: None,
        color: Some("#1".to_string()),
    }
}

fn candidate(source: &str, title: &str, price: Option<f64>, identifier_matched: bool) -> Candidate {
    Candidate {
        source: source.to_string(),
        url: format!("https://example.com/{source}"),
        identifier_matched,
        identifier: identifier_matched.then(|| "850029397809".to_string()),
        title: Some(title.to_string()),
        price,
        image_url: Some(format!("https://example.com/{source}.jpg")),
        description: None,
    }
}

#[test]
fn two_identifier_sources_yield_high_confidence() {
    // Both candidates carry the right barcode; one lists the wrong shade.
    let candidates = vec![
        candidate(
            "upcitemdb",
            "DIBS Beauty No Pressure Lip Liner - #1 - On the Rose",
            Some(18.0),
            true,
        ),
        candidate(
            "storefront",
            "DIBS Beauty No Pressure Lip Liner - #2 - Power Mauve",
            Some(18.0),
            true,
        ),
    ];

    let record = aggregate(candidates, &query());

    assert_eq!(record.confidence, 95);
    assert!(record.reasoning.starts_with("VERIFIED:"));
    assert_eq!(record.msrp, Some(18.0));
    assert_eq!(record.sources.len(), 2);
    let verification = record.verification.expect("verification present");
    assert!(verification.is_exact_match);
}

#[test]
fn single_exact_source_scores_85() {
    let candidates = vec![candidate(
        "storefront",
        "DIBS Beauty No Pressure Lip Liner - #1 - On the Rose",
        Some(18.0),
        true,
    )];

    let record = aggregate(candidates, &query());

    assert_eq!(record.confidence, 85);
    assert!(record.reasoning.contains("1 source(s)"));
}

#[test]
fn identifier_confirmed_price_dominates() {
    // The barcode-confirmed source says $10; a text-matched source says $50.
    // The authoritative price wins even though it is lower.
    let candidates = vec![
        candidate(
            "upcitemdb",
            "DIBS Beauty No Pressure Lip Liner - #1 - On the Rose",
            Some(10.0),
            true,
        ),
        candidate(
            "shopping",
            "DIBS Beauty No Pressure Lip Liner - #1 - On the Rose",
            Some(50.0),
            false,
        ),
    ];

    let record = aggregate(candidates, &query());

    assert_eq!(record.msrp, Some(10.0));
}

#[test]
fn bundle_prices_are_dropped_as_outliers() {
    // $90 is more than three times the median of the cluster around $15; it
    // is a multi-pack listing, not the unit price.
    let prices = [15.0, 16.0, 14.0, 90.0];
    let candidates: Vec<Candidate> = prices
        .iter()
        .enumerate()
        .map(|(i, price)| {
            candidate(
                &format!("shopping{i}"),
                "DIBS Beauty No Pressure Lip Liner - #1 - On the Rose",
                Some(*price),
                false,
            )
        })
        .collect();

    let record = aggregate(candidates, &query());

    // Three in-cluster samples remain, below the percentile threshold, so the
    // maximum reasonable price is selected.
    assert_eq!(record.msrp, Some(16.0));
}

#[test]
fn percentile_is_used_with_enough_samples() {
    let prices = [10.0, 11.0, 12.0, 13.0, 14.0];
    let candidates: Vec<Candidate> = prices
        .iter()
        .enumerate()
        .map(|(i, price)| {
            candidate(
                &format!("shopping{i}"),
                "DIBS Beauty No Pressure Lip Liner - #1 - On the Rose",
                Some(*price),
                false,
            )
        })
        .collect();

    let record = aggregate(candidates, &query());

    // 75th percentile of five ascending samples.
    assert_eq!(record.msrp, Some(13.0));
}

#[test]
fn no_candidates_yields_empty_record() {
    let record = aggregate(Vec::new(), &query());

    assert_eq!(record.confidence, 0);
    assert_eq!(record.reasoning, "No results found from any source");
    assert!(record.sources.is_empty());
    assert_eq!(record.msrp, None);
}

#[test]
fn garbage_only_candidates_are_rejected() {
    // Sources that echo the bare identifier back as the title carry no
    // information.
    let mut echo = candidate("upcitemdb", "850029397809", Some(12.0), true);
    echo.image_url = None;
    let record = aggregate(vec![echo], &query());

    assert_eq!(record.confidence, 0);
    assert_eq!(record.reasoning, "No valid results found (only garbage data)");
    // The rejected sources are still reported for transparency.
    assert_eq!(record.sources.len(), 1);
}

#[test]
fn failed_verification_reports_best_candidate() {
    let candidates = vec![candidate(
        "shopping",
        "Entirely Different Brand Lip Pencil",
        Some(9.0),
        false,
    )];

    let record = aggregate(candidates, &query());

    assert!(record.reasoning.starts_with("VERIFICATION FAILED:"));
    assert!(record.confidence < 70);
    assert_eq!(record.msrp, Some(9.0));
    assert_eq!(record.sources.len(), 1);
}

#[test]
fn longest_description_is_selected() {
    let mut short = candidate(
        "upcitemdb",
        "DIBS Beauty No Pressure Lip Liner - #1 - On the Rose",
        Some(18.0),
        true,
    );
    short.description = Some("Lip liner.".to_string());
    let mut long = candidate(
        "storefront",
        "DIBS Beauty No Pressure Lip Liner - #1 - On the Rose",
        Some(19.0),
        true,
    );
    long.description =
        Some("A long-wearing lip liner in a universally flattering rose shade.".to_string());

    let record = aggregate(vec![short, long], &query());

    assert!(record
        .description
        .expect("description present")
        .starts_with("A long-wearing"));
}
