//! # Match Verification
//!
//! Decides whether a candidate result actually denotes the same physical
//! product as the queried input: same brand, same size/volume (if declared),
//! same color/shade (if declared).
//!
//! A confirmed identifier is authoritative. Attribute extraction from noisy
//! listing text can be flaky, so when the source itself matched the barcode
//! and the brand checks out, size/color disagreements are recorded but do not
//! flip the verdict.

use crate::constants::SIZE_TOLERANCE;
use crate::extract::{extract, ExtractedAttributes};
use crate::types::{normalize_optional, VerificationVerdict};
use regex::Regex;
use std::sync::LazyLock;

static SHADE_IN_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#?(\d+)").expect("static shade pattern"));

static NON_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d.]").expect("static non-numeric pattern"));

/// Verifies a candidate's title/description against the queried product.
#[allow(clippy::too_many_arguments)]
pub fn verify_match(
    input_brand: &str,
    input_name: &str,
    input_size: Option<&str>,
    input_color: Option<&str>,
    found_title: Option<&str>,
    found_description: Option<&str>,
    identifier_matched: bool,
) -> VerificationVerdict {
    let input_size = normalize_optional(input_size);
    let input_color = normalize_optional(input_color);

    let found_text = format!(
        "{} {}",
        found_title.unwrap_or_default(),
        found_description.unwrap_or_default()
    )
    .trim()
    .to_string();

    if found_text.is_empty() {
        // No text to analyze. A confirmed identifier still stands on its own.
        if identifier_matched {
            return VerificationVerdict {
                is_exact_match: true,
                confidence: 85,
                brand_match: true,
                size_match: true,
                color_match: true,
                mismatches: Vec::new(),
                reasoning: "Identifier matched - product verified by barcode".to_string(),
            };
        }
        return VerificationVerdict {
            is_exact_match: false,
            confidence: 0,
            brand_match: false,
            size_match: false,
            color_match: false,
            mismatches: vec!["No product information found".to_string()],
            reasoning: "No product title or description available".to_string(),
        };
    }

    let found_attrs = extract(&found_text);
    let input_attrs = extract(&format!(
        "{input_name} {} {}",
        input_size.unwrap_or_default(),
        input_color.unwrap_or_default()
    ));

    let mut mismatches: Vec<String> = Vec::new();

    let brand_match = brand_matches(input_brand, &found_text);
    if !brand_match {
        mismatches.push(format!("Brand mismatch: expected '{input_brand}'"));
    }

    let mut size_match = true;
    if let Some(size) = input_size {
        size_match = size_matches(&input_attrs, &found_attrs);
        if !size_match {
            mismatches.push(format!(
                "Size mismatch: expected '{size}', found '{}'",
                found_attrs.size.as_deref().unwrap_or("none")
            ));
        }
    }

    let mut color_match = true;
    if let Some(color) = input_color {
        color_match = color_matches(color, &input_attrs, &found_attrs);
        if !color_match {
            let found = found_attrs
                .color
                .as_deref()
                .or(found_attrs.shade_number.as_deref())
                .unwrap_or("none");
            mismatches.push(format!(
                "Color/shade mismatch: expected '{color}', found '{found}'"
            ));
        }
    }

    // Identifier authority: barcode match plus brand match outranks any
    // attribute heuristic.
    if identifier_matched && brand_match {
        let attrs_ok = size_match && color_match;
        let reasoning = if mismatches.is_empty() {
            "Identifier verified".to_string()
        } else {
            format!("Identifier verified (note: {})", mismatches.join("; "))
        };
        return VerificationVerdict {
            is_exact_match: true,
            confidence: if attrs_ok { 90 } else { 80 },
            brand_match,
            size_match,
            color_match,
            mismatches: if attrs_ok { Vec::new() } else { mismatches },
            reasoning,
        };
    }

    let is_exact_match = brand_match && size_match && color_match;
    let confidence = calculate_confidence(
        brand_match,
        size_match,
        color_match,
        input_size.is_some(),
        input_color.is_some(),
    );
    let reasoning = build_reasoning(brand_match, size_match, color_match, &mismatches);

    VerificationVerdict {
        is_exact_match,
        confidence,
        brand_match,
        size_match,
        color_match,
        mismatches,
        reasoning,
    }
}

/// True if the brand (or a common variant of it) appears in the text.
fn brand_matches(expected_brand: &str, found_text: &str) -> bool {
    let expected = expected_brand.to_lowercase().trim().to_string();
    let found = found_text.to_lowercase();

    if found.contains(&expected) {
        return true;
    }
    brand_variants(&expected)
        .iter()
        .any(|variant| found.contains(variant))
}

/// Common variations of a brand name: stripped affixes, `&`/`and` swaps,
/// spacing and hyphen differences.
fn brand_variants(brand: &str) -> Vec<String> {
    vec![
        brand.replace(" beauty", ""),
        brand.replace("the ", ""),
        brand.replace('&', "and"),
        brand.replace(" and ", " & "),
        brand.replace(' ', ""),
        brand.replace('-', " "),
        brand.replace('-', ""),
    ]
}

fn size_matches(input_attrs: &ExtractedAttributes, found_attrs: &ExtractedAttributes) -> bool {
    // Both sides normalized: compare volumes with tolerance for rounding.
    if let (Some(input_ml), Some(found_ml)) = (input_attrs.size_ml, found_attrs.size_ml) {
        let ratio = input_ml / found_ml;
        return (1.0 - SIZE_TOLERANCE..=1.0 + SIZE_TOLERANCE).contains(&ratio);
    }

    // Both sides raw: compare the digits only.
    if let (Some(input_size), Some(found_size)) = (&input_attrs.size, &found_attrs.size) {
        return NON_NUMERIC.replace_all(input_size, "") == NON_NUMERIC.replace_all(found_size, "");
    }

    // Declared size but nothing extracted from the candidate: cannot verify.
    if input_attrs.size.is_some() && found_attrs.size.is_none() {
        return false;
    }

    true
}

fn color_matches(
    input_color: &str,
    input_attrs: &ExtractedAttributes,
    found_attrs: &ExtractedAttributes,
) -> bool {
    let mut expected_shade = input_attrs.shade_number.clone();
    let expected_color = input_color;

    // A declared color like "#1" or "Shade 190" carries a shade number.
    if let Some(caps) = SHADE_IN_COLOR.captures(input_color) {
        expected_shade = Some(caps[1].to_string());
    }

    // Shade numbers require exact equality.
    if let (Some(expected), Some(found)) = (&expected_shade, &found_attrs.shade_number) {
        return expected == found;
    }

    if let Some(found_color) = &found_attrs.color {
        return fuzzy_color_match(expected_color, found_color);
    }

    // Declared color/shade but the candidate produced neither.
    if found_attrs.shade_number.is_none() && found_attrs.color.is_none() {
        return false;
    }

    true
}

/// Fuzzy color-name comparison: equality, containment either direction, or
/// equality after stripping stop words and collapsing whitespace.
fn fuzzy_color_match(expected: &str, found: &str) -> bool {
    let mut expected = expected.to_lowercase().trim().to_string();
    let mut found = found.to_lowercase().trim().to_string();

    if expected == found || expected.contains(&found) || found.contains(&expected) {
        return true;
    }

    for stop_word in ["the", "in", "shade", "color", "-", "#"] {
        expected = expected.replace(stop_word, " ");
        found = found.replace(stop_word, " ");
    }

    let expected_clean = expected.split_whitespace().collect::<Vec<_>>().join(" ");
    let found_clean = found.split_whitespace().collect::<Vec<_>>().join(" ");

    expected_clean == found_clean
}

fn calculate_confidence(
    brand_match: bool,
    size_match: bool,
    color_match: bool,
    size_required: bool,
    color_required: bool,
) -> u8 {
    // Brand is non-negotiable.
    if !brand_match {
        return 20;
    }

    let mut confidence: i32 = 60;

    if size_required {
        confidence += if size_match { 20 } else { -30 };
    } else {
        confidence += 10;
    }

    if color_required {
        confidence += if color_match { 20 } else { -30 };
    } else {
        confidence += 10;
    }

    confidence.clamp(0, 100) as u8
}

fn build_reasoning(
    brand_match: bool,
    size_match: bool,
    color_match: bool,
    mismatches: &[String],
) -> String {
    if mismatches.is_empty() {
        let mut confirmed = Vec::new();
        if brand_match {
            confirmed.push("brand");
        }
        if size_match {
            confirmed.push("size");
        }
        if color_match {
            confirmed.push("color/shade");
        }
        format!("Exact match verified: {} confirmed", confirmed.join(", "))
    } else {
        format!("Verification failed: {}", mismatches.join("; "))
    }
}
