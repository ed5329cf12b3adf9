//! # Enrichment Pipeline
//!
//! The end-to-end flow for one request: cache lookup, concurrent fan-out,
//! verification-driven aggregation, image-oracle confidence adjustment,
//! price-floor enforcement, and cache write-back for verified results.
//!
//! Nothing in this flow is fatal: the worst outcome of a request is a low-
//! or zero-confidence record.

use crate::aggregate::aggregate;
use crate::constants::CACHE_CONFIDENCE;
use crate::errors::EnrichError;
use crate::oracle::ImageOracle;
use crate::orchestrate::Orchestrator;
use crate::pricing::min_expected_price;
use crate::types::{EnrichedRecord, ImageVerdict, ProductQuery};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Read-through cache keyed by product identifier.
///
/// A hit short-circuits the entire pipeline. Records are saved only when the
/// final confidence reaches the cache threshold and the verdict was exact.
#[async_trait]
pub trait ProductCache: Send + Sync {
    async fn lookup(&self, identifier: &str) -> Result<Option<EnrichedRecord>, EnrichError>;
    async fn save(&self, record: &EnrichedRecord) -> Result<(), EnrichError>;
}

/// Wires the orchestrator, cache, and image oracle into one enrich call.
pub struct EnrichmentPipeline {
    orchestrator: Orchestrator,
    cache: Option<Arc<dyn ProductCache>>,
    oracle: Option<Arc<dyn ImageOracle>>,
}

impl EnrichmentPipeline {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            cache: None,
            oracle: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ProductCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn ImageOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Enriches one product query into a confidence-scored record.
    pub async fn enrich(&self, query: &ProductQuery) -> Result<EnrichedRecord, EnrichError> {
        query.validate()?;

        if let Some(cache) = &self.cache {
            match cache.lookup(&query.identifier).await {
                Ok(Some(record)) => {
                    info!(identifier = %query.identifier, "cache hit");
                    return Ok(record);
                }
                Ok(None) => info!(identifier = %query.identifier, "cache miss, searching"),
                // A broken cache degrades to a miss; the pipeline still runs.
                Err(e) => warn!(error = %e, "cache lookup failed, continuing without cache"),
            }
        }

        let candidates = self.orchestrator.search_all(query).await;
        let mut record = aggregate(candidates, query);

        self.apply_price_floor(query, &mut record);
        self.verify_image(query, &mut record).await;

        let is_exact = record
            .verification
            .as_ref()
            .map(|v| v.is_exact_match)
            .unwrap_or(false);
        if record.confidence >= CACHE_CONFIDENCE && is_exact {
            if let Some(cache) = &self.cache {
                if let Err(e) = cache.save(&record).await {
                    warn!(error = %e, "failed to cache enriched record");
                } else {
                    info!(
                        identifier = %record.identifier,
                        confidence = record.confidence,
                        "cached verified record"
                    );
                }
            }
        }

        Ok(record)
    }

    /// Raises a suspiciously low MSRP to the product-type floor.
    ///
    /// Identifier-confirmed prices are authoritative and exempt.
    fn apply_price_floor(&self, query: &ProductQuery, record: &mut EnrichedRecord) {
        let Some(msrp) = record.msrp else { return };
        let has_identifier_price = record.sources.iter().any(|s| s.identifier_matched);
        if has_identifier_price {
            return;
        }
        let floor = min_expected_price(&query.name);
        if msrp < floor {
            info!(msrp, floor, "price below floor for product type, raising");
            record.msrp = Some(floor);
        }
    }

    /// Asks the image oracle about the selected image, when both exist, and
    /// adjusts the final confidence by its verdict.
    async fn verify_image(&self, query: &ProductQuery, record: &mut EnrichedRecord) {
        let (Some(oracle), Some(image_url)) = (&self.oracle, record.image_url.clone()) else {
            return;
        };
        let verdict = oracle
            .verify_image(
                &image_url,
                &query.brand,
                &query.name,
                query.normalized_color(),
                query.normalized_size(),
            )
            .await;
        if let Some(verdict) = verdict {
            record.confidence = adjust_confidence(record.confidence, &verdict);
            info!(
                verified = verdict.verified,
                oracle_confidence = verdict.confidence,
                final_confidence = record.confidence,
                "image verification applied"
            );
            record.image_verification = Some(verdict);
        }
    }
}

/// A confirming verdict nudges confidence up, a refuting one pulls it down,
/// and an uncertain one changes nothing.
fn adjust_confidence(confidence: u8, verdict: &ImageVerdict) -> u8 {
    if verdict.verified && verdict.confidence > 70 {
        confidence.saturating_add(5).min(100)
    } else if !verdict.verified && verdict.confidence < 50 {
        confidence.saturating_sub(10)
    } else {
        confidence
    }
}
