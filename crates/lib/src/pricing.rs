//! # Price Floors
//!
//! Minimum plausible prices by product type. A selected price below the floor
//! for its type is treated as a sale listing or data error rather than the
//! MSRP, and only applies when no identifier-confirmed price was used.
//!
//! These are empirically tuned values with no principled derivation; they are
//! kept as a configurable table rather than scattered assumptions.

/// Ordered most-specific-first; the first matching substring wins.
pub const PRICE_FLOORS: &[(&str, f64)] = &[
    ("mud mask", 24.0),
    ("sheet mask", 15.0),
    ("face mask", 22.0),
    ("mask", 20.0),
    ("lip liner", 14.0),
    ("lip gloss", 14.0),
    ("lipstick", 14.0),
    ("lip", 14.0),
    ("foundation", 25.0),
    ("mascara", 14.0),
    ("eyeshadow", 18.0),
    ("cleanser", 18.0),
    ("moisturizer", 22.0),
    ("serum", 30.0),
    ("eau de parfum", 60.0),
    ("eau de toilette", 45.0),
    ("fragrance", 50.0),
    ("perfume", 50.0),
    ("cologne", 45.0),
    ("gift set", 45.0),
    ("palette", 25.0),
    ("primer", 20.0),
    ("concealer", 16.0),
    ("blush", 18.0),
    ("bronzer", 20.0),
    ("highlighter", 20.0),
    ("setting spray", 18.0),
    ("setting powder", 20.0),
];

/// Conservative default for product types not in the table.
pub const DEFAULT_PRICE_FLOOR: f64 = 15.0;

/// Minimum expected price for a product, by substring match on its name.
pub fn min_expected_price(product_name: &str) -> f64 {
    let name = product_name.to_lowercase();
    for (pattern, floor) in PRICE_FLOORS {
        if name.contains(pattern) {
            return *floor;
        }
    }
    DEFAULT_PRICE_FLOOR
}
