use actix_web::{web, HttpResponse, Responder};

use super::model::{LoginRequest, LoginResponse, LogoutResponse};
use crate::certificate::validation::{validate_required, ValidationErrors};
use crate::AppState;

/// Admin login endpoint
#[utoipa::path(
    post,
    path = "/api/admin/login",
    tag = "Admin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = LoginResponse),
        (status = 400, description = "Missing username or password", body = crate::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::ErrorResponse)
    )
)]
pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> impl Responder {
    log::info!("Admin login attempt for username: {}", body.username);

    let mut errors = ValidationErrors::new();
    validate_required(&body.username, "username", "Username", &mut errors);
    validate_required(&body.password, "password", "Password", &mut errors);
    if let Err(errors) = errors.into_result() {
        return HttpResponse::BadRequest().json(
            crate::ErrorResponse::bad_request("Invalid input data").with_details(errors.messages()),
        );
    }

    if !state.sessions.verify(&body.username, &body.password) {
        log::warn!("Invalid admin credentials");
        return HttpResponse::Unauthorized().json(crate::ErrorResponse::new(
            "Unauthorized",
            "Invalid username or password",
        ));
    }

    let token = match state.sessions.issue_token() {
        Ok(t) => t,
        Err(e) => {
            log::error!("Failed to generate session token: {:?}", e);
            return HttpResponse::InternalServerError().json(crate::ErrorResponse::internal_error(
                "An unexpected error occurred during login",
            ));
        }
    };

    log::info!("Admin login successful");
    HttpResponse::Ok()
        .cookie(state.sessions.session_cookie(token))
        .json(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
            expires_in: "24 hours".to_string(),
        })
}

/// Admin logout endpoint
#[utoipa::path(
    post,
    path = "/api/admin/logout",
    tag = "Admin",
    responses(
        (status = 200, description = "Session cookie cleared", body = LogoutResponse)
    )
)]
pub async fn logout(state: web::Data<AppState>) -> impl Responder {
    log::info!("Admin logout");
    HttpResponse::Ok()
        .cookie(state.sessions.removal_cookie())
        .json(LogoutResponse {
            success: true,
            message: "Logout successful".to_string(),
        })
}
