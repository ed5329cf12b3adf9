//! # Source Adapter Contract
//!
//! The trait every external product source implements, plus the shared
//! throttle-gated fetch helper adapters route their outbound requests through.
//!
//! Adapters never fail: any transport or parse problem is logged and surfaced
//! as zero candidates for that attempt.

use crate::constants::FETCH_JITTER_MS;
use crate::throttle::Throttle;
use crate::types::{Candidate, ProductQuery};
use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, warn};

/// A single external product source.
///
/// Adding a source means implementing this trait in its own crate; the
/// orchestrator treats all sources polymorphically and is never touched.
#[async_trait]
pub trait Source: Send + Sync {
    /// Short source label, e.g. "upcdb".
    fn name(&self) -> &str;

    /// Searches the source by the product identifier (barcode).
    async fn search_by_identifier(&self, query: &ProductQuery) -> Vec<Candidate>;

    /// Whether this source supports free-text brand+name search.
    fn supports_name_search(&self) -> bool {
        false
    }

    /// Searches the source by brand and product name, where supported.
    async fn search_by_name(&self, _brand: &str, _name: &str) -> Vec<Candidate> {
        Vec::new()
    }
}

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Fetches a page through the per-domain throttle.
///
/// Applies a short randomized delay before dispatch and returns the body only
/// on a success status. Every failure path logs and yields `None`, which
/// callers treat as "no content for this attempt".
pub async fn fetch_page(client: &Client, throttle: &Throttle, url: &str) -> Option<String> {
    let domain = match Url::parse(url).ok().and_then(|u| u.host_str().map(String::from)) {
        Some(domain) => domain,
        None => {
            warn!(%url, "could not determine domain for throttling");
            return None;
        }
    };

    // Permit held for the whole request so the concurrency cap covers the
    // in-flight call, not just its dispatch.
    let _permit = throttle.acquire(&domain).await;

    let (jitter, user_agent) = {
        let mut rng = rand::thread_rng();
        (
            rng.gen_range(FETCH_JITTER_MS.0..=FETCH_JITTER_MS.1),
            USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())],
        )
    };
    tokio::time::sleep(Duration::from_millis(jitter)).await;

    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, user_agent)
        .header(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
        .send()
        .await;

    match response {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(%url, error = %e, "failed to read response body");
                None
            }
        },
        Ok(response) => {
            debug!(%url, status = %response.status(), "non-success status");
            None
        }
        Err(e) => {
            warn!(%url, error = %e, "fetch failed");
            None
        }
    }
}
