use actix_web::{web, HttpRequest, HttpResponse, Responder};

use super::model::StatsResponse;
use crate::auth::validate_request_session;
use crate::AppState;

/// Aggregate certificate statistics (requires admin session cookie)
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "Admin",
    responses(
        (status = 200, description = "Aggregate statistics", body = StatsResponse),
        (status = 401, description = "Missing or expired session", body = crate::ErrorResponse),
        (status = 503, description = "Record store unavailable", body = crate::ErrorResponse)
    )
)]
pub async fn get_stats(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    if let Err(e) = validate_request_session(&req, &state.sessions) {
        log::warn!("Unauthorized admin stats access attempt");
        return e.error_response();
    }

    match state.admin_stats(chrono::Utc::now().date_naive()).await {
        Ok(data) => HttpResponse::Ok().json(StatsResponse {
            success: true,
            data,
        }),
        Err(e) => {
            log::error!("Error fetching admin stats: {}", e);
            HttpResponse::ServiceUnavailable().json(crate::ErrorResponse::new(
                "StorageUnavailable",
                "Database connection failed. Please try again later.",
            ))
        }
    }
}

/// Configure admin routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/login", web::post().to(crate::auth::login))
            .route("/logout", web::post().to(crate::auth::logout))
            .route("/stats", web::get().to(get_stats)),
    );
}
