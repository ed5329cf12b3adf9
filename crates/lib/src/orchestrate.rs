//! # Orchestration
//!
//! Fans a query out to every source adapter concurrently, bounds the whole
//! batch with one wall-time deadline, tolerates individual adapter failures,
//! and deduplicates the combined results.
//!
//! A slow or hung adapter degrades completeness, never the latency or
//! correctness of the whole call: stragglers are signalled to cancel at the
//! deadline and their results are simply ignored.

use crate::constants::DEFAULT_FANOUT_DEADLINE_SECS;
use crate::source::Source;
use crate::types::{Candidate, ProductQuery};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Fans queries out across a fixed set of source adapters.
pub struct Orchestrator {
    sources: Vec<Arc<dyn Source>>,
    deadline: Duration,
}

impl Orchestrator {
    pub fn new(sources: Vec<Arc<dyn Source>>) -> Self {
        Self {
            sources,
            deadline: Duration::from_secs(DEFAULT_FANOUT_DEADLINE_SECS),
        }
    }

    /// Overrides the overall fan-out deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Searches all adapters and returns deduplicated candidates.
    ///
    /// Identifier-based searches go to every adapter; when brand and name are
    /// both present, name-based searches (core name with trailing variant
    /// suffixes stripped, then the full name) additionally go to adapters
    /// that support them, concurrently. Identifier results are more
    /// authoritative and are concatenated before name results; the combined
    /// list is deduplicated by (source name without parenthetical, price),
    /// keeping the first occurrence.
    pub async fn search_all(&self, query: &ProductQuery) -> Vec<Candidate> {
        info!(identifier = %query.identifier, "starting fan-out");
        let token = CancellationToken::new();
        let mut handles: Vec<JoinHandle<Vec<Candidate>>> = Vec::new();

        for source in &self.sources {
            let source = Arc::clone(source);
            let query = query.clone();
            let token = token.clone();
            handles.push(tokio::spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => Vec::new(),
                    candidates = source.search_by_identifier(&query) => candidates,
                }
            }));
        }

        if !query.brand.trim().is_empty() && !query.name.trim().is_empty() {
            let core_name = query.core_name().to_string();
            for source in self.sources.iter().filter(|s| s.supports_name_search()) {
                for name in [core_name.clone(), query.name.clone()] {
                    let source = Arc::clone(source);
                    let brand = query.brand.clone();
                    let token = token.clone();
                    handles.push(tokio::spawn(async move {
                        tokio::select! {
                            _ = token.cancelled() => Vec::new(),
                            candidates = source.search_by_name(&brand, &name) => candidates,
                        }
                    }));
                }
            }
        }

        let deadline = Instant::now() + self.deadline;
        let mut identifier_count = 0usize;
        let mut all: Vec<Candidate> = Vec::new();
        let mut deadline_hit = false;

        for (i, mut handle) in handles.into_iter().enumerate() {
            // timeout_at polls the handle before the timer: a task that
            // finished while earlier handles were collected still delivers
            // its candidates after the deadline. Only unfinished tasks are
            // dropped.
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(candidates)) => {
                    if i < self.sources.len() {
                        identifier_count += candidates.len();
                    }
                    all.extend(candidates);
                }
                Ok(Err(e)) => {
                    // An adapter task failing (or panicking) must not fail the batch.
                    warn!(error = %e, "source task failed");
                }
                Err(_) => {
                    if !deadline_hit {
                        deadline_hit = true;
                        warn!("fan-out deadline reached; dropping unfinished sources");
                        token.cancel();
                    }
                    handle.abort();
                }
            }
        }

        let unique = dedup_candidates(all);
        info!(
            total = unique.len(),
            from_identifier_search = identifier_count,
            "fan-out complete"
        );
        unique
    }
}

/// Stable dedup by (source name without parenthetical, price).
///
/// This collapses same-source near-duplicates (e.g. the same aggregator
/// listing two sellers at one price) without discarding distinct sources that
/// happen to share a price. Two genuinely distinct products from one source
/// at the same price also collapse; that is accepted behavior.
fn dedup_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: HashSet<(String, Option<i64>)> = HashSet::new();
    let mut unique = Vec::new();
    for candidate in candidates {
        let base_source = candidate
            .source
            .split('(')
            .next()
            .unwrap_or(&candidate.source)
            .trim()
            .to_string();
        let price_cents = candidate.price.map(|p| (p * 100.0).round() as i64);
        if seen.insert((base_source, price_cents)) {
            unique.push(candidate);
        }
    }
    unique
}
