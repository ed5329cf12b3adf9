//! # enrich-upcdb: Barcode Database Adapter
//!
//! Source adapter for public barcode lookup APIs, as a plugin for the
//! `enrich` pipeline. It queries two services: a UPC item database (titles,
//! descriptions, retail offers) and an open product-facts database (titles
//! and images, no prices). Both key their data directly by barcode, so every
//! candidate they produce is identifier-confirmed.

use async_trait::async_trait;
use enrich::source::{fetch_page, Source};
use enrich::throttle::Throttle;
use enrich::types::{Candidate, ProductQuery};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

const SOURCE_ITEMDB: &str = "upcitemdb";
const SOURCE_FACTS: &str = "openfoodfacts";

// --- UPC item database response structures ---

#[derive(Deserialize)]
struct ItemDbResponse {
    #[serde(default)]
    code: String,
    #[serde(default)]
    items: Vec<ItemDbItem>,
}

#[derive(Deserialize)]
struct ItemDbItem {
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    offers: Vec<ItemDbOffer>,
}

#[derive(Deserialize)]
struct ItemDbOffer {
    price: Option<f64>,
}

// --- Product-facts response structures ---

#[derive(Deserialize)]
struct FactsResponse {
    #[serde(default)]
    status: i64,
    product: Option<FactsProduct>,
}

#[derive(Deserialize)]
struct FactsProduct {
    product_name: Option<String>,
    product_name_en: Option<String>,
    generic_name: Option<String>,
    image_url: Option<String>,
    image_front_url: Option<String>,
}

/// Adapter for barcode database APIs.
pub struct UpcDbSource {
    client: Client,
    throttle: Arc<Throttle>,
    itemdb_base: String,
    facts_base: String,
}

impl UpcDbSource {
    pub fn new(client: Client, throttle: Arc<Throttle>) -> Self {
        Self {
            client,
            throttle,
            itemdb_base: "https://api.upcitemdb.com".to_string(),
            facts_base: "https://world.openfoodfacts.org".to_string(),
        }
    }

    /// Overrides the API base URLs (for tests against a mock server).
    pub fn with_base_urls(mut self, itemdb_base: String, facts_base: String) -> Self {
        self.itemdb_base = itemdb_base;
        self.facts_base = facts_base;
        self
    }

    async fn search_itemdb(&self, identifier: &str) -> Option<Candidate> {
        let url = format!("{}/prod/trial/lookup?upc={identifier}", self.itemdb_base);
        let body = fetch_page(&self.client, &self.throttle, &url).await?;

        let response: ItemDbResponse = match serde_json::from_str(&body) {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "invalid item database response");
                return None;
            }
        };
        if response.code != "OK" {
            return None;
        }
        let item = response.items.into_iter().next()?;

        // MSRP is usually the highest offered price.
        let price = item
            .offers
            .iter()
            .filter_map(|o| o.price)
            .reduce(f64::max);

        Some(Candidate {
            source: SOURCE_ITEMDB.to_string(),
            url: format!("https://www.upcitemdb.com/upc/{identifier}"),
            identifier_matched: true,
            identifier: Some(identifier.to_string()),
            title: item.title,
            price,
            image_url: item.images.into_iter().next(),
            description: item.description,
        })
    }

    async fn search_facts(&self, identifier: &str) -> Option<Candidate> {
        let url = format!("{}/api/v0/product/{identifier}.json", self.facts_base);
        let body = fetch_page(&self.client, &self.throttle, &url).await?;

        // Products missing from the database produce a non-JSON or status-0
        // body; both are ordinary "not found" outcomes.
        let response: FactsResponse = serde_json::from_str(&body).ok()?;
        if response.status != 1 {
            return None;
        }
        let product = response.product?;

        Some(Candidate {
            source: SOURCE_FACTS.to_string(),
            url: format!("https://world.openfoodfacts.org/product/{identifier}"),
            identifier_matched: true,
            identifier: Some(identifier.to_string()),
            title: product.product_name.or(product.product_name_en),
            price: None,
            image_url: product.image_url.or(product.image_front_url),
            description: product.generic_name,
        })
    }
}

#[async_trait]
impl Source for UpcDbSource {
    fn name(&self) -> &str {
        "upcdb"
    }

    async fn search_by_identifier(&self, query: &ProductQuery) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        if let Some(candidate) = self.search_itemdb(&query.identifier).await {
            candidates.push(candidate);
        }
        if let Some(candidate) = self.search_facts(&query.identifier).await {
            candidates.push(candidate);
        }

        info!(
            identifier = %query.identifier,
            count = candidates.len(),
            "barcode database search complete"
        );
        candidates
    }
}
