use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Boundary errors, surfaced to the caller
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,

    // Provider errors, contained at the orchestrator loop
    #[error("Generator produced an unusable response: {0}")]
    MalformedGeneration(String),
    #[error("Failed to submit message for delivery")]
    DeliverySubmission(#[source] anyhow::Error),
    #[error("Failed to cancel scheduled delivery")]
    DeliveryCancel(#[source] anyhow::Error),

    // Database errors
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MalformedGeneration(_)
            | Self::DeliverySubmission(_)
            | Self::DeliveryCancel(_)
            | Self::Database(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            // Internal detail stays in the logs
            tracing::error!("Request failed: {:?}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(json!({ "error": message }))
    }
}
