//! # Application Configuration
//!
//! Configuration for `enrich-server`, loaded from environment variables (with
//! a `.env` file honored in development). Top-level keys map to plain
//! variables like `PORT` and `DB_URL`; nested keys use the `ENRICH_` prefix
//! with `__` as the separator, e.g.
//! `ENRICH_RATE_LIMITS__SEPHORA.COM__REQUESTS_PER_SECOND=0.25`.

use config::{Config as ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;
use std::collections::HashMap;

/// The root configuration structure.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT`.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The path to the SQLite database file. Loaded from `DB_URL`.
    #[serde(default = "default_db_url")]
    pub db_url: String,
    /// Overall deadline for one enrichment fan-out, in seconds.
    #[serde(default = "default_fanout_deadline_secs")]
    pub fanout_deadline_secs: u64,
    /// Base URL of the image verification service. Absent means image
    /// verification is skipped entirely.
    #[serde(default)]
    pub image_oracle_url: Option<String>,
    /// Per-domain politeness limits for outbound crawling.
    #[serde(default = "default_rate_limits")]
    pub rate_limits: HashMap<String, RateLimitConfig>,
}

/// Politeness limits for one remote domain.
#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub requests_per_second: f64,
    pub max_concurrent: usize,
}

fn default_port() -> u16 {
    8080
}

fn default_db_url() -> String {
    "db/enrich.db".to_string()
}

fn default_fanout_deadline_secs() -> u64 {
    30
}

/// Conservative defaults for the retail domains the bundled sources crawl.
fn default_rate_limits() -> HashMap<String, RateLimitConfig> {
    HashMap::from([
        (
            "sephora.com".to_string(),
            RateLimitConfig {
                requests_per_second: 0.5,
                max_concurrent: 2,
            },
        ),
        (
            "ulta.com".to_string(),
            RateLimitConfig {
                requests_per_second: 1.0,
                max_concurrent: 2,
            },
        ),
        (
            "google.com".to_string(),
            RateLimitConfig {
                requests_per_second: 0.2,
                max_concurrent: 1,
            },
        ),
    ])
}

/// Loads the application configuration from environment variables.
pub fn get_config() -> Result<AppConfig, ConfigError> {
    let settings = ConfigBuilder::builder()
        // Top-level keys like PORT and DB_URL.
        .add_source(Environment::default())
        // Prefixed variables for nested overrides.
        .add_source(
            Environment::with_prefix("ENRICH")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rate_limits_cover_bundled_sources() {
        let limits = default_rate_limits();
        assert!(limits.contains_key("sephora.com"));
        assert!(limits.contains_key("google.com"));
        assert!(limits["google.com"].requests_per_second < 1.0);
    }
}
