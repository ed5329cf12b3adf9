//! Request handlers for the enrichment API.

use crate::{errors::AppError, state::AppState};
use axum::{extract::State, Json};
use enrich::types::{EnrichedRecord, ProductQuery};
use tracing::info;

/// The root handler.
pub async fn root() -> &'static str {
    "enrich server is running."
}

/// The health check handler.
pub async fn health_check() -> &'static str {
    "OK"
}

/// The handler for the `/api/enrich` endpoint.
///
/// Takes a bare product identity and returns the enriched, confidence-scored
/// record. Queries that fail validation produce a 400; everything downstream
/// of validation degrades to a low-confidence record rather than an error.
pub async fn enrich_handler(
    State(app_state): State<AppState>,
    Json(query): Json<ProductQuery>,
) -> Result<Json<EnrichedRecord>, AppError> {
    info!(
        identifier = %query.identifier,
        brand = %query.brand,
        name = %query.name,
        "Received enrich request"
    );

    let record = app_state.pipeline.enrich(&query).await?;
    Ok(Json(record))
}
