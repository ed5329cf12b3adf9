//! # Per-Domain Throttle
//!
//! Admission control for outbound requests, keyed by domain. Each domain gets
//! a concurrency cap (semaphore) and a minimum interval between dispatches
//! derived from its configured request rate. Domains are fully independent:
//! requests to different domains never wait on each other.
//!
//! The throttle itself never fails; the only way out of `acquire` without a
//! permit is the caller being cancelled while waiting.

use crate::constants::{DEFAULT_MAX_CONCURRENT, DEFAULT_REQUESTS_PER_SECOND};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Rate limit configuration for one domain.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub requests_per_second: f64,
    pub max_concurrent: usize,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl RateLimit {
    fn min_interval(&self) -> Duration {
        if self.requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / self.requests_per_second)
        } else {
            Duration::ZERO
        }
    }
}

struct DomainLimiter {
    semaphore: Arc<Semaphore>,
    /// Instant of the last dispatch. Held across the rate-interval sleep so
    /// that concurrent acquirers space out rather than stampede.
    last_dispatch: Mutex<Option<Instant>>,
    min_interval: Duration,
}

/// Permission to make one request; dropping it returns the concurrency slot.
#[must_use = "the concurrency slot is released when the permit is dropped"]
pub struct ThrottlePermit {
    _permit: OwnedSemaphorePermit,
}

/// Per-domain rate and concurrency limiter.
///
/// Constructed once at startup and passed by handle into every adapter;
/// limiters for unseen domains are created lazily with the fallback config.
pub struct Throttle {
    limits: HashMap<String, RateLimit>,
    limiters: Mutex<HashMap<String, Arc<DomainLimiter>>>,
}

impl Throttle {
    pub fn new(limits: HashMap<String, RateLimit>) -> Self {
        Self {
            limits,
            limiters: Mutex::new(HashMap::new()),
        }
    }

    /// Blocks until a request to `domain` is admissible: within the domain's
    /// concurrency cap and at least the minimum interval since the domain's
    /// last dispatch. Updates the last-dispatch instant exactly once.
    pub async fn acquire(&self, domain: &str) -> ThrottlePermit {
        let limiter = self.limiter(domain).await;

        let permit = limiter
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("throttle semaphore is never closed");

        let mut last = limiter.last_dispatch.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < limiter.min_interval {
                tokio::time::sleep(limiter.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
        drop(last);

        ThrottlePermit { _permit: permit }
    }

    async fn limiter(&self, domain: &str) -> Arc<DomainLimiter> {
        let mut limiters = self.limiters.lock().await;
        if let Some(limiter) = limiters.get(domain) {
            return Arc::clone(limiter);
        }
        // Hosts carry their subdomains ("www.sephora.com"); limits are keyed
        // by the registrable domain.
        let config = self
            .limits
            .get(domain)
            .copied()
            .or_else(|| {
                self.limits
                    .iter()
                    .find(|(key, _)| domain.ends_with(key.as_str()))
                    .map(|(_, limit)| *limit)
            })
            .unwrap_or_default();
        let limiter = Arc::new(DomainLimiter {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            last_dispatch: Mutex::new(None),
            min_interval: config.min_interval(),
        });
        limiters.insert(domain.to_string(), Arc::clone(&limiter));
        limiter
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}
