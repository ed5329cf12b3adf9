//! # Aggregation
//!
//! Reduces a set of partially-matching, partially-wrong candidates to one
//! confidence-scored record. Candidates are verified individually, partitioned
//! into confidence tiers, and the best tier is aggregated: identifier-confirmed
//! prices dominate MSRP selection, and non-authoritative prices go through an
//! outlier filter first.

use crate::constants::{
    MSRP_PERCENTILE, MSRP_PERCENTILE_MIN_SAMPLES, NEAR_MATCH_CONFIDENCE, PRICE_OUTLIER_FACTOR,
};
use crate::types::{
    Candidate, EnrichedRecord, ProductQuery, SourceRef, VerificationSummary, VerificationVerdict,
};
use crate::verify::verify_match;
use tracing::debug;

/// Verifies and aggregates raw candidates into the final enriched record.
pub fn aggregate(candidates: Vec<Candidate>, query: &ProductQuery) -> EnrichedRecord {
    let input_size = query.normalized_size();
    let input_color = query.normalized_color();

    if candidates.is_empty() {
        return EnrichedRecord::empty(query, "No results found from any source");
    }

    // Garbage filter: some sources echo the bare identifier back as content.
    let valid: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| {
            let title = c.title.as_deref().unwrap_or_default().trim();
            let description = c.description.as_deref().unwrap_or_default().trim();
            if title == query.identifier || title.is_empty() {
                debug!(source = %c.source, "dropping candidate: title is empty or just the identifier");
                return false;
            }
            if description == query.identifier && title.len() < 10 {
                debug!(source = %c.source, "dropping candidate: no real content");
                return false;
            }
            true
        })
        .collect();

    if valid.is_empty() {
        let mut record =
            EnrichedRecord::empty(query, "No valid results found (only garbage data)");
        record.sources = candidates.iter().map(source_ref).collect();
        return record;
    }

    let mut verified: Vec<(&Candidate, VerificationVerdict)> = valid
        .into_iter()
        .map(|candidate| {
            let verdict = verify_match(
                &query.brand,
                &query.name,
                input_size,
                input_color,
                candidate.title.as_deref(),
                candidate.description.as_deref(),
                candidate.identifier_matched,
            );
            debug!(
                source = %candidate.source,
                exact = verdict.is_exact_match,
                confidence = verdict.confidence,
                identifier_matched = candidate.identifier_matched,
                mismatches = ?verdict.mismatches,
                "verified candidate"
            );
            (candidate, verdict)
        })
        .collect();

    verified.sort_by(|a, b| b.1.confidence.cmp(&a.1.confidence));

    let exact: Vec<&(&Candidate, VerificationVerdict)> =
        verified.iter().filter(|(_, v)| v.is_exact_match).collect();
    if !exact.is_empty() {
        return aggregate_tier(&exact, query, true);
    }

    let near: Vec<&(&Candidate, VerificationVerdict)> = verified
        .iter()
        .filter(|(_, v)| v.confidence >= NEAR_MATCH_CONFIDENCE)
        .collect();
    if !near.is_empty() {
        return aggregate_tier(&near, query, false);
    }

    // Results exist but none verified: report the single best as a
    // low-confidence failure.
    let (best, verdict) = &verified[0];
    EnrichedRecord {
        identifier: query.identifier.clone(),
        brand: query.brand.clone(),
        name: query.name.clone(),
        size: query.size.clone(),
        color: query.color.clone(),
        msrp: best.price.filter(|p| *p > 0.0),
        image_url: best.image_url.clone(),
        description: best.description.clone().or_else(|| best.title.clone()),
        confidence: verdict.confidence,
        reasoning: format!("VERIFICATION FAILED: {}", verdict.reasoning),
        sources: vec![source_ref(best)],
        verification: Some(summary(false, verdict)),
        image_verification: None,
    }
}

fn aggregate_tier(
    tier: &[&(&Candidate, VerificationVerdict)],
    query: &ProductQuery,
    is_exact: bool,
) -> EnrichedRecord {
    let best_verdict = &tier[0].1;

    let msrp = select_msrp(tier);
    let image_url = tier
        .iter()
        .find_map(|(c, _)| c.image_url.clone().filter(|u| !u.is_empty()));
    let description = tier
        .iter()
        .filter_map(|(c, _)| c.description.clone().or_else(|| c.title.clone()))
        .filter(|d| !d.is_empty())
        .max_by_key(String::len);

    let sources: Vec<SourceRef> = tier.iter().map(|(c, _)| source_ref(c)).collect();

    let (confidence, reasoning) = if is_exact {
        let confidence = if tier.len() >= 2 { 95 } else { 85 };
        (
            confidence,
            format!(
                "VERIFIED: Exact match confirmed on {} source(s) - {}",
                tier.len(),
                best_verdict.reasoning
            ),
        )
    } else {
        (
            best_verdict.confidence,
            format!("PARTIAL MATCH: {}", best_verdict.reasoning),
        )
    };

    EnrichedRecord {
        identifier: query.identifier.clone(),
        brand: query.brand.clone(),
        name: query.name.clone(),
        size: query.size.clone(),
        color: query.color.clone(),
        msrp,
        image_url,
        description,
        confidence,
        reasoning,
        sources,
        verification: Some(summary(is_exact, best_verdict)),
        image_verification: None,
    }
}

/// MSRP selection.
///
/// Identifier-confirmed sources are authoritative and MSRP is the highest
/// legitimate retail price, so the maximum identifier-confirmed price wins
/// outright. Otherwise non-authoritative prices are sorted, anything above
/// three times the median is dropped as a probable bundle, and the result is
/// the 75th-percentile value when enough samples remain (the maximum when
/// they do not).
fn select_msrp(tier: &[&(&Candidate, VerificationVerdict)]) -> Option<f64> {
    let identifier_prices: Vec<f64> = tier
        .iter()
        .filter(|(c, _)| c.identifier_matched)
        .filter_map(|(c, _)| c.price.filter(|p| *p > 0.0))
        .collect();

    if let Some(msrp) = max_price(&identifier_prices) {
        debug!(msrp, "using identifier-confirmed price");
        return Some(msrp);
    }

    let mut other_prices: Vec<f64> = tier
        .iter()
        .filter(|(c, _)| !c.identifier_matched)
        .filter_map(|(c, _)| c.price.filter(|p| *p > 0.0))
        .collect();
    if other_prices.is_empty() {
        return None;
    }
    other_prices.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let median = other_prices[other_prices.len() / 2];
    let reasonable: Vec<f64> = other_prices
        .iter()
        .copied()
        .filter(|p| *p <= median * PRICE_OUTLIER_FACTOR)
        .collect();

    let msrp = if reasonable.is_empty() {
        max_price(&other_prices)
    } else if reasonable.len() >= MSRP_PERCENTILE_MIN_SAMPLES {
        let idx = (reasonable.len() as f64 * MSRP_PERCENTILE) as usize;
        Some(reasonable[idx])
    } else {
        max_price(&reasonable)
    };
    debug!(?msrp, "using crawled price");
    msrp
}

fn max_price(prices: &[f64]) -> Option<f64> {
    prices.iter().copied().reduce(f64::max)
}

fn source_ref(candidate: &Candidate) -> SourceRef {
    SourceRef {
        name: candidate.source.clone(),
        url: candidate.url.clone(),
        identifier_matched: candidate.identifier_matched,
    }
}

fn summary(is_exact: bool, verdict: &VerificationVerdict) -> VerificationSummary {
    VerificationSummary {
        is_exact_match: is_exact,
        brand_match: verdict.brand_match,
        size_match: verdict.size_match,
        color_match: verdict.color_match,
        mismatches: verdict.mismatches.clone(),
    }
}
