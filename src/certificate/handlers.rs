use actix_web::{web, HttpResponse, Responder, ResponseError};
use log::{error, info, warn};

use super::error::IssuanceError;
use super::models::{
    CertificateRequest, CertificateResponse, StudentSummary, VerifyStudentRequest,
    VerifyStudentResponse,
};
use crate::{AppState, ErrorResponse};

#[utoipa::path(
    post,
    path = "/api/generate-certificate",
    tag = "Certificate",
    request_body = CertificateRequest,
    responses(
        (status = 200, description = "Download link for a new or existing certificate", body = CertificateResponse),
        (status = 400, description = "Invalid input or details do not match records", body = ErrorResponse),
        (status = 404, description = "Email not authorized", body = ErrorResponse),
        (status = 500, description = "Certificate rendering failed", body = ErrorResponse),
        (status = 503, description = "Record store or blob store unavailable", body = ErrorResponse)
    )
)]
pub async fn generate_certificate(
    state: web::Data<AppState>,
    body: web::Json<CertificateRequest>,
) -> impl Responder {
    info!("Executing generate_certificate handler");
    match state.issue_certificate(&body).await {
        Ok(issued) => HttpResponse::Ok().json(CertificateResponse::from(issued)),
        Err(e) => {
            match &e {
                IssuanceError::Validation(_)
                | IssuanceError::NotAuthorized
                | IssuanceError::DetailMismatch => warn!("Certificate request rejected: {}", e),
                _ => error!("Error generating certificate: {}", e),
            }
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/verify-student",
    tag = "Certificate",
    request_body = VerifyStudentRequest,
    responses(
        (status = 200, description = "Student found", body = VerifyStudentResponse),
        (status = 400, description = "Invalid email format", body = ErrorResponse),
        (status = 404, description = "Email not registered", body = ErrorResponse),
        (status = 503, description = "Record store unavailable", body = ErrorResponse)
    )
)]
pub async fn verify_student(
    state: web::Data<AppState>,
    body: web::Json<VerifyStudentRequest>,
) -> impl Responder {
    if let Err(errors) = body.validate() {
        return IssuanceError::Validation(errors).error_response();
    }

    info!("Verifying student email: {}", body.email.trim());
    match state.verify_student(&body.email).await {
        Ok(Some(record)) => {
            info!("Student verified: {} from {}", record.name, record.college);
            HttpResponse::Ok().json(VerifyStudentResponse {
                verified: true,
                student: StudentSummary::from(record),
            })
        }
        Ok(None) => {
            info!("Student not found: {}", body.email.trim());
            HttpResponse::NotFound().json(ErrorResponse::not_found(
                "Email not registered. Please contact support for assistance.",
            ))
        }
        Err(e) => {
            error!("Error verifying student: {}", e);
            e.error_response()
        }
    }
}

/// Configure certificate routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/generate-certificate", web::post().to(generate_certificate))
        .route("/verify-student", web::post().to(verify_student));
}
