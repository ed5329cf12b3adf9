//! Core data model for the enrichment pipeline.

use crate::errors::EnrichError;
use serde::{Deserialize, Serialize};

/// A bare product identity to be enriched.
///
/// The identifier is a barcode-like code (UPC-A, UPC-E, or EAN-13) and acts
/// as the authoritative cross-source join key. Size and color are optional
/// declared attributes; when present they become hard requirements during
/// verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductQuery {
    pub identifier: String,
    pub brand: String,
    pub name: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl ProductQuery {
    /// Validates the query at the request boundary.
    pub fn validate(&self) -> Result<(), EnrichError> {
        if !self.identifier.chars().all(|c| c.is_ascii_digit()) {
            return Err(EnrichError::InvalidQuery(
                "identifier must contain only digits".to_string(),
            ));
        }
        if ![8, 12, 13].contains(&self.identifier.len()) {
            return Err(EnrichError::InvalidQuery(
                "identifier must be 8, 12, or 13 digits".to_string(),
            ));
        }
        if self.brand.trim().is_empty() {
            return Err(EnrichError::InvalidQuery("brand must not be empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(EnrichError::InvalidQuery("name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Declared size with frontend "null"/"None" placeholders treated as absent.
    pub fn normalized_size(&self) -> Option<&str> {
        normalize_optional(self.size.as_deref())
    }

    /// Declared color/shade with frontend "null"/"None" placeholders treated as absent.
    pub fn normalized_color(&self) -> Option<&str> {
        normalize_optional(self.color.as_deref())
    }

    /// Core product name with trailing size/variant suffixes stripped:
    /// "No Pressure Lip Liner - #1 - On the Rose" -> "No Pressure Lip Liner".
    pub fn core_name(&self) -> &str {
        let name = self.name.split('-').next().unwrap_or(&self.name).trim();
        name.split('/').next().unwrap_or(name).trim()
    }
}

/// Treats empty strings and the literal strings "null"/"None" (which some
/// frontends send for absent fields) as `None`.
pub fn normalize_optional(value: Option<&str>) -> Option<&str> {
    match value {
        Some(v) if !v.trim().is_empty() && v != "null" && v != "None" => Some(v),
        _ => None,
    }
}

/// One source's raw claim about a product, prior to verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Source label, possibly with a seller parenthetical, e.g. "shopping (Seller X)".
    pub source: String,
    pub url: String,
    /// The adapter confirmed the queried identifier on the source itself
    /// (e.g. a matching barcode), independent of any text heuristics.
    pub identifier_matched: bool,
    pub identifier: Option<String>,
    pub title: Option<String>,
    /// Currency-less decimal price as listed by the source.
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

/// A source that contributed to the final record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub name: String,
    pub url: String,
    pub identifier_matched: bool,
}

/// Outcome of verifying one candidate against the queried product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub is_exact_match: bool,
    /// 0-100; an exact match is always at least 80.
    pub confidence: u8,
    pub brand_match: bool,
    pub size_match: bool,
    pub color_match: bool,
    /// Human-readable mismatch reasons, in the order detected.
    pub mismatches: Vec<String>,
    pub reasoning: String,
}

/// Verification details carried on the final record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub is_exact_match: bool,
    pub brand_match: bool,
    pub size_match: bool,
    pub color_match: bool,
    pub mismatches: Vec<String>,
}

/// Verdict from the external image-similarity oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageVerdict {
    pub verified: bool,
    pub confidence: u8,
    pub reasoning: String,
}

/// The final enriched record: the echoed input plus the aggregated answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub identifier: String,
    pub brand: String,
    pub name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    /// Selected MSRP; strictly positive when present.
    pub msrp: Option<f64>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub confidence: u8,
    pub reasoning: String,
    /// Sources that survived the garbage filter, in aggregation order.
    pub sources: Vec<SourceRef>,
    pub verification: Option<VerificationSummary>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image_verification: Option<ImageVerdict>,
}

impl EnrichedRecord {
    /// A zero-confidence record carrying only the echoed input.
    pub fn empty(query: &ProductQuery, reasoning: &str) -> Self {
        Self {
            identifier: query.identifier.clone(),
            brand: query.brand.clone(),
            name: query.name.clone(),
            size: query.size.clone(),
            color: query.color.clone(),
            msrp: None,
            image_url: None,
            description: None,
            confidence: 0,
            reasoning: reasoning.to_string(),
            sources: Vec::new(),
            verification: None,
            image_verification: None,
        }
    }
}
