//! # enrich-shopping: Shopping Results Adapter
//!
//! Source adapter that scrapes a shopping search results page. Result cards
//! carry a title, a listed price, a thumbnail, and a seller name; none of
//! them are keyed by barcode, so candidates from this source are never
//! identifier-confirmed and rely entirely on downstream verification.
//!
//! Result-page markup changes without notice. The parser tries the current
//! card layout first, then older layouts, then falls back to scanning the
//! whole page for the most frequently listed price.

use async_trait::async_trait;
use enrich::source::{fetch_page, Source};
use enrich::throttle::Throttle;
use enrich::types::{Candidate, ProductQuery};
use regex::Regex;
use reqwest::{Client, Url};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+(?:\.\d{2})?)").expect("price regex is valid"));

/// Listing cards beyond this are sponsored noise and repeats.
const MAX_CARDS: usize = 5;

/// Adapter for a shopping search results page.
pub struct ShoppingSource {
    client: Client,
    throttle: Arc<Throttle>,
    base_url: String,
}

impl ShoppingSource {
    pub fn new(client: Client, throttle: Arc<Throttle>) -> Self {
        Self {
            client,
            throttle,
            base_url: "https://www.google.com".to_string(),
        }
    }

    /// Overrides the search base URL (for tests against a mock server).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    async fn search(&self, query_text: &str) -> Vec<Candidate> {
        let url = match self.search_url(query_text) {
            Some(url) => url,
            None => {
                warn!(base = %self.base_url, "invalid shopping base url");
                return Vec::new();
            }
        };
        let Some(body) = fetch_page(&self.client, &self.throttle, url.as_str()).await else {
            return Vec::new();
        };

        let candidates = parse_results(&body, &self.base_url, query_text);
        info!(
            query = query_text,
            count = candidates.len(),
            "shopping search complete"
        );
        candidates
    }

    fn search_url(&self, query_text: &str) -> Option<Url> {
        let mut url = Url::parse(&self.base_url).ok()?;
        url.set_path("/search");
        url.query_pairs_mut()
            .append_pair("tbm", "shop")
            .append_pair("q", query_text);
        Some(url)
    }
}

#[async_trait]
impl Source for ShoppingSource {
    fn name(&self) -> &str {
        "shopping"
    }

    async fn search_by_identifier(&self, query: &ProductQuery) -> Vec<Candidate> {
        self.search(&query.identifier).await
    }

    fn supports_name_search(&self) -> bool {
        true
    }

    async fn search_by_name(&self, brand: &str, name: &str) -> Vec<Candidate> {
        self.search(&format!("{brand} {name}")).await
    }
}

/// Parses result cards out of a shopping results page.
///
/// Synchronous on purpose: the parsed DOM is not `Send` and must not be held
/// across an await point.
fn parse_results(body: &str, base_url: &str, query_text: &str) -> Vec<Candidate> {
    let document = Html::parse_document(body);

    let card_selectors = [
        "div.sh-dgr__content",
        "div.sh-dlr__list-result",
        r#"div[class*="sh-"]"#,
    ];
    for css in card_selectors {
        let selector = Selector::parse(css).expect("card selector is valid");
        let cards: Vec<ElementRef> = document.select(&selector).collect();
        if cards.is_empty() {
            continue;
        }
        let candidates: Vec<Candidate> = cards
            .iter()
            .take(MAX_CARDS)
            .filter_map(|card| parse_card(card, base_url))
            .collect();
        if !candidates.is_empty() {
            return candidates;
        }
    }

    debug!("no result cards recognized, falling back to page-wide price scan");
    common_price_fallback(&document, base_url, query_text)
        .into_iter()
        .collect()
}

fn parse_card(card: &ElementRef, base_url: &str) -> Option<Candidate> {
    let title = first_text(card, &["h3", "h4", "a"])?;

    let price = PRICE_RE
        .captures(&card.text().collect::<String>())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());

    let image_url = select_first(card, "img").and_then(|img| {
        img.value()
            .attr("src")
            .or_else(|| img.value().attr("data-src"))
            .map(str::to_string)
    });

    let url = select_first(card, "a[href]")
        .and_then(|a| a.value().attr("href"))
        .map(|href| {
            if href.starts_with('/') {
                format!("{base_url}{href}")
            } else {
                href.to_string()
            }
        })
        .unwrap_or_else(|| base_url.to_string());

    let seller = first_text(card, &["div.aULzUe", "div.E5ocAb"]);
    let source = match seller {
        Some(seller) => format!("shopping ({seller})"),
        None => "shopping".to_string(),
    };

    Some(Candidate {
        source,
        url,
        identifier_matched: false,
        identifier: None,
        title: Some(title),
        price,
        image_url,
        description: None,
    })
}

/// When no card layout matches, the most frequently listed price on the page
/// is still a usable signal. One low-trust candidate carries it.
fn common_price_fallback(
    document: &Html,
    base_url: &str,
    query_text: &str,
) -> Option<Candidate> {
    let text = document.root_element().text().collect::<String>();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for capture in PRICE_RE.captures_iter(&text) {
        *counts.entry(capture[1].to_string()).or_default() += 1;
    }
    let (price_text, _) = counts.into_iter().max_by_key(|(_, count)| *count)?;
    let price = price_text.parse::<f64>().ok()?;

    Some(Candidate {
        source: "shopping".to_string(),
        url: base_url.to_string(),
        identifier_matched: false,
        identifier: None,
        title: Some(query_text.to_string()),
        price: Some(price),
        image_url: None,
        description: None,
    })
}

fn select_first<'a>(card: &ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).expect("selector is valid");
    card.select(&selector).next()
}

fn first_text(card: &ElementRef, selectors: &[&str]) -> Option<String> {
    for css in selectors {
        if let Some(element) = select_first(card, css) {
            let text = element.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}
