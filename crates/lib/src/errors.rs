use thiserror::Error;

/// Custom error types for the enrichment library.
///
/// Source adapters deliberately do not appear here: a failing adapter
/// surfaces as zero candidates, never as an error. What remains are the
/// conditions a caller can actually act on.
#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),

    #[error("Invalid product query: {0}")]
    InvalidQuery(String),

    #[error("Cache operation failed: {0}")]
    Cache(String),

    #[error("An unexpected internal error occurred: {0}")]
    Internal(#[from] anyhow::Error),
}
