use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use super::validation::ValidationErrors;
use crate::db::RepositoryError;
use crate::renderer::RenderError;
use crate::storage::StorageError;
use crate::ErrorResponse;

/// Failure categories of the issuance and verification endpoints.
#[derive(Debug, Error)]
pub enum IssuanceError {
    #[error("invalid input data: {0}")]
    Validation(ValidationErrors),
    #[error("email not authorized")]
    NotAuthorized,
    #[error("provided details do not match stored record")]
    DetailMismatch,
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("certificate rendering failed: {0}")]
    RenderFailure(String),
    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl From<ValidationErrors> for IssuanceError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<RepositoryError> for IssuanceError {
    fn from(error: RepositoryError) -> Self {
        Self::StorageUnavailable(error.to_string())
    }
}

impl From<StorageError> for IssuanceError {
    fn from(error: StorageError) -> Self {
        Self::StorageUnavailable(error.to_string())
    }
}

impl From<RenderError> for IssuanceError {
    fn from(error: RenderError) -> Self {
        Self::RenderFailure(error.to_string())
    }
}

impl IssuanceError {
    /// Message shown to the requester. Internal causes stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Invalid input data",
            Self::NotAuthorized => "Email not authorized. Please contact support for assistance.",
            Self::DetailMismatch => {
                "Provided details do not match our records. Please verify your name and college information."
            }
            Self::StorageUnavailable(_) => {
                "Certificate storage is temporarily unavailable. Please try again later."
            }
            Self::RenderFailure(_) => {
                "Failed to generate certificate PDF. Please try again later."
            }
            Self::Unknown(_) => {
                "An unexpected error occurred while generating your certificate. Please try again later."
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::NotAuthorized => "NotAuthorized",
            Self::DetailMismatch => "DetailMismatch",
            Self::StorageUnavailable(_) => "StorageUnavailable",
            Self::RenderFailure(_) => "RenderFailure",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl ResponseError for IssuanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::DetailMismatch => StatusCode::BAD_REQUEST,
            Self::NotAuthorized => StatusCode::NOT_FOUND,
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::RenderFailure(_) | Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = ErrorResponse::new(self.kind(), self.public_message());
        if let Self::Validation(errors) = self {
            body = body.with_details(errors.messages());
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}
