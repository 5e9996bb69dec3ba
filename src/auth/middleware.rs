use actix_web::error::InternalError;
use actix_web::{Error, HttpRequest, HttpResponse};

use super::model::SessionClaims;
use super::session::{SessionGate, SESSION_COOKIE_NAME};

/// Extract the session token from the admin cookie
pub fn extract_session_token(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

fn unauthorized(message: &'static str) -> Error {
    InternalError::from_response(
        message,
        HttpResponse::Unauthorized().json(crate::ErrorResponse::new("Unauthorized", message)),
    )
    .into()
}

/// Validate the session cookie on a request and return its claims
pub fn validate_request_session(req: &HttpRequest, gate: &SessionGate) -> Result<SessionClaims, Error> {
    let token = extract_session_token(req).ok_or_else(|| unauthorized("Unauthorized access"))?;

    gate.validate_at(&token, chrono::Utc::now()).map_err(|e| {
        log::warn!("Session validation failed: {}", e);
        unauthorized("Unauthorized access")
    })
}
