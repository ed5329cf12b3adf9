//! # enrich-storefront: Retailer Storefront Adapter
//!
//! Source adapter that crawls a beauty retailer's storefront: a keyword
//! search narrows to product pages, and each product page is read through
//! its JSON-LD structured data block. Structured data carries the product's
//! GTIN, so a match against the queried identifier upgrades the candidate to
//! identifier-confirmed. Pages without usable JSON-LD fall back to CSS
//! scraping of the visible title, price, and image.

use async_trait::async_trait;
use enrich::source::{fetch_page, Source};
use enrich::throttle::Throttle;
use enrich::types::{Candidate, ProductQuery};
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+(?:\.\d{2})?)").expect("price regex is valid"));

/// Product pages fetched per search. Search ordering puts the best match
/// first; anything past the second link is usually an accessory or refill.
const MAX_PRODUCT_PAGES: usize = 2;

// JSON-LD Product blocks, with only the fields the pipeline consumes. The
// `@type` discriminator is checked by hand since pages mix Product blocks
// with breadcrumbs and organization markup.

#[derive(Deserialize)]
struct JsonLdProduct {
    #[serde(rename = "@type", default)]
    schema_type: String,
    name: Option<String>,
    description: Option<String>,
    image: Option<JsonLdImage>,
    gtin13: Option<String>,
    gtin12: Option<String>,
    gtin: Option<String>,
    offers: Option<JsonLdOffers>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonLdImage {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonLdOffers {
    One(JsonLdOffer),
    Many(Vec<JsonLdOffer>),
}

#[derive(Deserialize)]
struct JsonLdOffer {
    price: Option<serde_json::Value>,
}

/// Adapter for a retailer storefront.
pub struct StorefrontSource {
    client: Client,
    throttle: Arc<Throttle>,
    base_url: String,
}

impl StorefrontSource {
    pub fn new(client: Client, throttle: Arc<Throttle>) -> Self {
        Self {
            client,
            throttle,
            base_url: "https://www.sephora.com".to_string(),
        }
    }

    /// Overrides the storefront base URL (for tests against a mock server).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl Source for StorefrontSource {
    fn name(&self) -> &str {
        "storefront"
    }

    async fn search_by_identifier(&self, query: &ProductQuery) -> Vec<Candidate> {
        let search_url = format!("{}/search?keyword={}", self.base_url, query.identifier);
        let Some(body) = fetch_page(&self.client, &self.throttle, &search_url).await else {
            return Vec::new();
        };

        let links = product_links(&body, &self.base_url);
        if links.is_empty() {
            debug!(identifier = %query.identifier, "no product links in search results");
            return Vec::new();
        }

        let mut candidates = Vec::new();
        for url in links.into_iter().take(MAX_PRODUCT_PAGES) {
            if let Some(page) = fetch_page(&self.client, &self.throttle, &url).await {
                if let Some(candidate) = parse_product_page(&page, &url, &query.identifier) {
                    candidates.push(candidate);
                }
            }
        }

        info!(
            identifier = %query.identifier,
            count = candidates.len(),
            "storefront search complete"
        );
        candidates
    }
}

/// Extracts product page links from a search results page, in page order,
/// deduplicated.
fn product_links(body: &str, base_url: &str) -> Vec<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse(r#"a[href*="/product/"]"#).expect("link selector is valid");

    let mut links = Vec::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let url = if href.starts_with('/') {
            format!("{base_url}{href}")
        } else {
            href.to_string()
        };
        if !links.contains(&url) {
            links.push(url);
        }
    }
    links
}

fn parse_product_page(body: &str, url: &str, identifier: &str) -> Option<Candidate> {
    let document = Html::parse_document(body);
    parse_json_ld(&document, url, identifier).or_else(|| parse_css(&document, url))
}

/// Reads the page's JSON-LD Product block, if it has one.
fn parse_json_ld(document: &Html, url: &str, identifier: &str) -> Option<Candidate> {
    let selector =
        Selector::parse(r#"script[type="application/ld+json"]"#).expect("selector is valid");

    for script in document.select(&selector) {
        let raw = script.text().collect::<String>();
        let Ok(product) = serde_json::from_str::<JsonLdProduct>(&raw) else {
            continue;
        };
        if product.schema_type != "Product" {
            continue;
        }

        let gtin = product
            .gtin13
            .as_deref()
            .or(product.gtin12.as_deref())
            .or(product.gtin.as_deref());
        let identifier_matched = gtin == Some(identifier);

        let price = product.offers.as_ref().and_then(offer_price);
        let image_url = product.image.map(|image| match image {
            JsonLdImage::One(url) => url,
            JsonLdImage::Many(urls) => urls.into_iter().next().unwrap_or_default(),
        });

        return Some(Candidate {
            source: "storefront".to_string(),
            url: url.to_string(),
            identifier_matched,
            identifier: gtin.map(str::to_string),
            title: product.name,
            price,
            image_url: image_url.filter(|u| !u.is_empty()),
            description: product.description,
        });
    }
    None
}

/// Prices in JSON-LD arrive as either a number or a string.
fn offer_price(offers: &JsonLdOffers) -> Option<f64> {
    let offer = match offers {
        JsonLdOffers::One(offer) => offer,
        JsonLdOffers::Many(list) => list.first()?,
    };
    match offer.price.as_ref()? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Visible-markup fallback for pages without structured data. These
/// candidates can never be identifier-confirmed.
fn parse_css(document: &Html, url: &str) -> Option<Candidate> {
    let title_selector =
        Selector::parse(r#"h1[data-at="product_name"]"#).expect("selector is valid");
    let price_selector = Selector::parse(r#"div[data-at="price"]"#).expect("selector is valid");
    let image_selector =
        Selector::parse(r#"img[data-at="product_image"]"#).expect("selector is valid");

    let title = document
        .select(&title_selector)
        .next()
        .map(|h1| h1.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())?;

    let price = document.select(&price_selector).next().and_then(|div| {
        let text = div.text().collect::<String>();
        PRICE_RE
            .captures(&text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    });

    let image_url = document
        .select(&image_selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string);

    Some(Candidate {
        source: "storefront".to_string(),
        url: url.to_string(),
        identifier_matched: false,
        identifier: None,
        title: Some(title),
        price,
        image_url,
        description: None,
    })
}
