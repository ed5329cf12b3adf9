//! # Application State
//!
//! The shared application state (`AppState`) and the logic for building it at
//! startup: the shared HTTP client, the per-domain throttle, the three
//! bundled source adapters, the SQLite cache, and the optional image oracle,
//! all wired into one `EnrichmentPipeline`.

use crate::cache::TursoCache;
use crate::config::AppConfig;
use enrich::oracle::HttpImageOracle;
use enrich::orchestrate::Orchestrator;
use enrich::pipeline::EnrichmentPipeline;
use enrich::source::Source;
use enrich::throttle::{RateLimit, Throttle};
use enrich_shopping::ShoppingSource;
use enrich_storefront::StorefrontSource;
use enrich_upcdb::UpcDbSource;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<EnrichmentPipeline>,
}

/// Builds the shared application state from the configuration.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let limits: HashMap<String, RateLimit> = config
        .rate_limits
        .iter()
        .map(|(domain, limit)| {
            (
                domain.clone(),
                RateLimit {
                    requests_per_second: limit.requests_per_second,
                    max_concurrent: limit.max_concurrent,
                },
            )
        })
        .collect();
    let throttle = Arc::new(Throttle::new(limits));

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(20))
        .build()?;

    let sources: Vec<Arc<dyn Source>> = vec![
        Arc::new(UpcDbSource::new(client.clone(), Arc::clone(&throttle))),
        Arc::new(ShoppingSource::new(client.clone(), Arc::clone(&throttle))),
        Arc::new(StorefrontSource::new(client.clone(), Arc::clone(&throttle))),
    ];

    let orchestrator = Orchestrator::new(sources)
        .with_deadline(Duration::from_secs(config.fanout_deadline_secs));

    let cache = TursoCache::new(&config.db_url).await?;
    let mut pipeline = EnrichmentPipeline::new(orchestrator).with_cache(Arc::new(cache));

    if let Some(oracle_url) = &config.image_oracle_url {
        let oracle = HttpImageOracle::new(oracle_url.clone())?;
        // The probe result is cached by the oracle; an unreachable service
        // is logged and enrichment continues without image verification.
        oracle.is_available().await;
        pipeline = pipeline.with_oracle(Arc::new(oracle));
    } else {
        info!("no image oracle configured, skipping image verification");
    }

    Ok(AppState {
        config: Arc::new(config),
        pipeline: Arc::new(pipeline),
    })
}
