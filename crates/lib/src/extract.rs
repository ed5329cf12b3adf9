//! # Attribute Extraction
//!
//! Deterministic, rule-based extraction of product attributes from free text.
//! Each category (size, color/shade, gift set) tries an ordered list of
//! patterns and the first match wins. All matching is case-insensitive.
//!
//! Malformed text never fails extraction; it just produces fewer attributes.

use crate::constants::{ML_PER_L, ML_PER_OZ};
use regex::Regex;
use std::sync::LazyLock;

/// Attributes parsed out of a product title or description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedAttributes {
    /// The raw size text as matched, e.g. "1 fl oz".
    pub size: Option<String>,
    /// Size normalized to milliliters where the unit permits conversion.
    pub size_ml: Option<f64>,
    pub color: Option<String>,
    /// Digits-only shade identifier, e.g. "190" from "#190".
    pub shade_number: Option<String>,
    pub is_gift_set: bool,
    pub piece_count: Option<u32>,
}

struct SizePattern {
    re: Regex,
    /// Multiplier to milliliters; `None` for count-based sizes that have no
    /// meaningful volume.
    to_ml: Option<f64>,
}

impl SizePattern {
    fn new(pattern: &str, to_ml: Option<f64>) -> Self {
        Self {
            re: Regex::new(pattern).expect("static size pattern"),
            to_ml,
        }
    }
}

static SIZE_PATTERNS: LazyLock<Vec<SizePattern>> = LazyLock::new(|| {
    vec![
        SizePattern::new(r"(?i)(\d+(?:\.\d+)?)\s*ml\b", Some(1.0)),
        SizePattern::new(r"(?i)(\d+(?:\.\d+)?)\s*g\b", Some(1.0)),
        SizePattern::new(r"(?i)(\d+(?:\.\d+)?)\s*oz\b", Some(ML_PER_OZ)),
        SizePattern::new(r"(?i)(\d+(?:\.\d+)?)\s*fl\.?\s*oz\b", Some(ML_PER_OZ)),
        SizePattern::new(r"(?i)(\d+(?:\.\d+)?)\s*L\b", Some(ML_PER_L)),
        SizePattern::new(r"(?i)(\d+)\s*(?:pairs?|pcs?|pieces?|count)\b", None),
        SizePattern::new(r"(?i)(\d+)\s*x\s*(\d+(?:\.\d+)?)\s*(?:ml|g|oz)", None),
    ]
});

static COLOR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"#(\d+)",
        r"(?i)shade\s*[#:]?\s*(\d+)",
        r"(?i)shade\s*[#:]?\s*([a-zA-Z0-9\s\-]+)",
        r"(?i)color\s*[#:]?\s*([a-zA-Z0-9\s\-]+)",
        r"-\s*#(\d+)\s*-",
        r"(?i)in\s+([a-zA-Z0-9\s]+)\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static color pattern"))
    .collect()
});

static GIFT_SET_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bgift\s*set\b",
        r"(?i)\bset\b",
        r"(?i)\bkit\b",
        r"(?i)\bduo\b",
        r"(?i)\btrio\b",
        r"(?i)(\d+)\s*(?:pc|piece|pcs)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static gift set pattern"))
    .collect()
});

/// Extracts product attributes from title/description text.
pub fn extract(text: &str) -> ExtractedAttributes {
    if text.trim().is_empty() {
        return ExtractedAttributes::default();
    }

    let (size, size_ml) = extract_size(text);
    let (color, shade_number) = extract_color(text);
    let (is_gift_set, piece_count) = detect_gift_set(text);

    ExtractedAttributes {
        size,
        size_ml,
        color,
        shade_number,
        is_gift_set,
        piece_count,
    }
}

fn extract_size(text: &str) -> (Option<String>, Option<f64>) {
    for pattern in SIZE_PATTERNS.iter() {
        if let Some(caps) = pattern.re.captures(text) {
            let matched = caps.get(0).map(|m| m.as_str().to_string());
            let normalized = pattern
                .to_ml
                .and_then(|multiplier| caps[1].parse::<f64>().ok().map(|v| v * multiplier));
            return (matched, normalized);
        }
    }
    (None, None)
}

fn extract_color(text: &str) -> (Option<String>, Option<String>) {
    for pattern in COLOR_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            let value = caps[1].trim().to_string();
            if value.is_empty() {
                continue;
            }
            // A purely numeric capture is a shade number, not a color name.
            if value.chars().all(|c| c.is_ascii_digit()) {
                return (None, Some(value));
            }
            return (Some(value), None);
        }
    }
    (None, None)
}

fn detect_gift_set(text: &str) -> (bool, Option<u32>) {
    for pattern in GIFT_SET_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            let piece_count = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
            return (true, piece_count);
        }
    }
    (false, None)
}
