//! # Image Oracle
//!
//! Optional external image-similarity service that can confirm or refute a
//! candidate image against the expected product. Its absence never fails the
//! pipeline: every failure path degrades to "no image verification".

use crate::errors::EnrichError;
use crate::types::ImageVerdict;
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{info, warn};

/// Confirms or refutes a product image.
#[async_trait]
pub trait ImageOracle: Send + Sync {
    /// Returns `None` when no verdict could be obtained (service down,
    /// transport error, malformed reply); the pipeline then skips any
    /// confidence adjustment.
    async fn verify_image(
        &self,
        image_url: &str,
        expected_brand: &str,
        expected_name: &str,
        expected_color: Option<&str>,
        expected_size: Option<&str>,
    ) -> Option<ImageVerdict>;
}

#[derive(Serialize)]
struct VerifyImageRequest<'a> {
    image_url: &'a str,
    expected_brand: &'a str,
    expected_product: &'a str,
    expected_color: Option<&'a str>,
    expected_size: Option<&'a str>,
}

#[derive(Deserialize)]
struct VerifyImageResponse {
    verification: VerificationBody,
}

#[derive(Deserialize)]
struct VerificationBody {
    #[serde(default)]
    is_verified: bool,
    #[serde(default)]
    confidence: u8,
    #[serde(default)]
    reasoning: String,
}

/// HTTP client for an external image verification service.
pub struct HttpImageOracle {
    client: ReqwestClient,
    base_url: String,
    available: OnceCell<bool>,
}

impl HttpImageOracle {
    pub fn new(base_url: String) -> Result<Self, EnrichError> {
        let client = ReqwestClient::builder()
            // Generous timeout; the service may be loading its model.
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(EnrichError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            base_url,
            available: OnceCell::new(),
        })
    }

    /// Probes the service's health endpoint once and caches the answer.
    pub async fn is_available(&self) -> bool {
        *self
            .available
            .get_or_init(|| async {
                match self.client.get(format!("{}/health", self.base_url)).send().await {
                    Ok(response) if response.status().is_success() => {
                        info!(base_url = %self.base_url, "image oracle available");
                        true
                    }
                    _ => {
                        warn!(base_url = %self.base_url, "image oracle not available");
                        false
                    }
                }
            })
            .await
    }
}

#[async_trait]
impl ImageOracle for HttpImageOracle {
    async fn verify_image(
        &self,
        image_url: &str,
        expected_brand: &str,
        expected_name: &str,
        expected_color: Option<&str>,
        expected_size: Option<&str>,
    ) -> Option<ImageVerdict> {
        if image_url.is_empty() || !self.is_available().await {
            return None;
        }

        let request = VerifyImageRequest {
            image_url,
            expected_brand,
            expected_product: expected_name,
            expected_color,
            expected_size,
        };

        let response = match self
            .client
            .post(format!("{}/verify-image", self.base_url))
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "image oracle request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "image oracle returned an error");
            return None;
        }

        match response.json::<VerifyImageResponse>().await {
            Ok(body) => Some(ImageVerdict {
                verified: body.verification.is_verified,
                confidence: body.verification.confidence.min(100),
                reasoning: body.verification.reasoning,
            }),
            Err(e) => {
                warn!(error = %e, "failed to parse image oracle response");
                None
            }
        }
    }
}
