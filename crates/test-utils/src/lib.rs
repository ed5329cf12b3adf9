//! Shared test doubles for the enrichment workspace: a programmable source
//! adapter, an image oracle with a fixed verdict, and an in-memory cache.

use async_trait::async_trait;
use enrich::oracle::ImageOracle;
use enrich::pipeline::ProductCache;
use enrich::source::Source;
use enrich::types::{Candidate, EnrichedRecord, ImageVerdict, ProductQuery};
use enrich::EnrichError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A programmable source adapter.
///
/// Returns fixed candidate lists, optionally after a delay (to exercise the
/// fan-out deadline) or not at all (a hung adapter).
pub struct MockSource {
    name: String,
    identifier_results: Vec<Candidate>,
    name_results: Vec<Candidate>,
    supports_name_search: bool,
    delay: Option<Duration>,
    hang: bool,
}

impl MockSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            identifier_results: Vec::new(),
            name_results: Vec::new(),
            supports_name_search: false,
            delay: None,
            hang: false,
        }
    }

    pub fn with_identifier_results(mut self, candidates: Vec<Candidate>) -> Self {
        self.identifier_results = candidates;
        self
    }

    pub fn with_name_results(mut self, candidates: Vec<Candidate>) -> Self {
        self.name_results = candidates;
        self.supports_name_search = true;
        self
    }

    /// Delays every search by `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Never answers; simulates a hung adapter.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    async fn stall(&self) {
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Source for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search_by_identifier(&self, _query: &ProductQuery) -> Vec<Candidate> {
        self.stall().await;
        self.identifier_results.clone()
    }

    fn supports_name_search(&self) -> bool {
        self.supports_name_search
    }

    async fn search_by_name(&self, _brand: &str, _name: &str) -> Vec<Candidate> {
        self.stall().await;
        self.name_results.clone()
    }
}

/// Builds a candidate with the given source label and price; the remaining
/// fields get plausible defaults that individual tests override as needed.
pub fn candidate(source: &str, price: Option<f64>) -> Candidate {
    Candidate {
        source: source.to_string(),
        url: format!("https://example.com/{source}"),
        identifier_matched: false,
        identifier: None,
        title: Some("DIBS Beauty No Pressure Lip Liner".to_string()),
        price,
        image_url: None,
        description: None,
    }
}

/// An image oracle that always returns the same verdict (or none).
pub struct MockOracle {
    verdict: Option<ImageVerdict>,
    calls: Mutex<Vec<String>>,
}

impl MockOracle {
    pub fn new(verdict: Option<ImageVerdict>) -> Self {
        Self {
            verdict,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Image URLs the oracle was asked about.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageOracle for MockOracle {
    async fn verify_image(
        &self,
        image_url: &str,
        _expected_brand: &str,
        _expected_name: &str,
        _expected_color: Option<&str>,
        _expected_size: Option<&str>,
    ) -> Option<ImageVerdict> {
        self.calls.lock().unwrap().push(image_url.to_string());
        self.verdict.clone()
    }
}

/// An in-memory `ProductCache` backed by a mutexed map.
#[derive(Default)]
pub struct MemoryCache {
    records: Arc<Mutex<HashMap<String, EnrichedRecord>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the cache with a record, as if a prior request had saved it.
    pub fn insert(&self, record: EnrichedRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.identifier.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl ProductCache for MemoryCache {
    async fn lookup(&self, identifier: &str) -> Result<Option<EnrichedRecord>, EnrichError> {
        Ok(self.records.lock().unwrap().get(identifier).cloned())
    }

    async fn save(&self, record: &EnrichedRecord) -> Result<(), EnrichError> {
        self.records
            .lock()
            .unwrap()
            .insert(record.identifier.clone(), record.clone());
        Ok(())
    }
}
