//! # Shared Constants
//!
//! Centralized tuning values for the enrichment pipeline. Several of these
//! are empirically tuned heuristics rather than derived quantities; they live
//! here as named constants so that changing one is a deliberate act.

/// Fallback request rate for domains without an explicit throttle entry.
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 0.5;

/// Fallback concurrency cap for domains without an explicit throttle entry.
pub const DEFAULT_MAX_CONCURRENT: usize = 2;

/// Overall wall-time bound for one fan-out across all sources.
pub const DEFAULT_FANOUT_DEADLINE_SECS: u64 = 30;

/// Randomized pre-dispatch delay range, in milliseconds.
pub const FETCH_JITTER_MS: (u64, u64) = (100, 300);

/// Milliliters per (fluid) ounce, used when normalizing sizes.
pub const ML_PER_OZ: f64 = 29.5735;

/// Milliliters per liter.
pub const ML_PER_L: f64 = 1000.0;

/// Relative tolerance when comparing normalized volumes.
pub const SIZE_TOLERANCE: f64 = 0.05;

/// Verification confidence at or above which a non-exact candidate still
/// counts as a high-confidence near-match.
pub const NEAR_MATCH_CONFIDENCE: u8 = 70;

/// Final confidence at or above which a verified record is cached.
pub const CACHE_CONFIDENCE: u8 = 85;

/// Prices above this multiple of the median are dropped as bundle/outlier
/// listings before MSRP selection.
pub const PRICE_OUTLIER_FACTOR: f64 = 3.0;

/// Percentile drawn from the filtered price list when enough samples exist.
pub const MSRP_PERCENTILE: f64 = 0.75;

/// Minimum number of filtered prices before the percentile rule applies;
/// below this the maximum of the filtered set is used instead.
pub const MSRP_PERCENTILE_MIN_SAMPLES: usize = 4;
