use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use enrich::EnrichError;
use serde_json::json;
use tracing::error;

/// A custom error type for the server application.
///
/// This enum encapsulates different kinds of errors that can occur within the
/// server, allowing them to be converted into appropriate HTTP responses.
pub enum AppError {
    /// Errors originating from the enrichment library.
    Enrich(EnrichError),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<EnrichError> for AppError {
    fn from(err: EnrichError) -> Self {
        AppError::Enrich(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::Enrich(err) => {
                error!("EnrichError: {:?}", err);
                match err {
                    EnrichError::InvalidQuery(msg) => (StatusCode::BAD_REQUEST, msg),
                    EnrichError::ReqwestClientBuild(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to build HTTP client: {e}"),
                    ),
                    EnrichError::Cache(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Cache operation failed: {e}"),
                    ),
                    EnrichError::Internal(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Enrichment failed: {e}"),
                    ),
                }
            }
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
