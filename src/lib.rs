use actix_cors::Cors;
use actix_web::error::InternalError;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpResponse, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod admin;
pub mod auth;
pub mod certificate;
pub mod config;
pub mod db;
pub mod renderer;
pub mod storage;

pub use crate::db::AppState;

const JSON_BODY_LIMIT: usize = 16 * 1024;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = Some(details);
        self
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::certificate::handlers::generate_certificate,
        crate::certificate::handlers::verify_student,
        crate::auth::handlers::login,
        crate::auth::handlers::logout,
        crate::admin::handlers::get_stats
    ),
    components(
        schemas(
            certificate::models::CertificateRequest,
            certificate::models::CertificateResponse,
            certificate::models::VerifyStudentRequest,
            certificate::models::VerifyStudentResponse,
            certificate::models::StudentSummary,
            certificate::models::InternRecord,
            auth::model::LoginRequest,
            auth::model::LoginResponse,
            auth::model::LogoutResponse,
            admin::model::AdminStats,
            admin::model::FieldCount,
            admin::model::RecentIntern,
            admin::model::StatsResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Certificate", description = "Certificate issuance and identity verification."),
        (name = "Admin", description = "Admin session and statistics endpoints.")
    )
)]
pub struct ApiDoc;

/// JSON extractor settings: malformed bodies get the shared error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            let detail = err.to_string();
            InternalError::from_response(
                err,
                HttpResponse::BadRequest().json(
                    ErrorResponse::new("ValidationError", "Invalid input data")
                        .with_details(vec![detail]),
                ),
            )
            .into()
        })
}

/// Register every API route under `/api`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(certificate::handlers::config)
            .configure(admin::handlers::config),
    );
}

pub async fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config::AppConfig::from_env()?;

    let repository = match db::PgInternRepository::connect(&config.database_url).await {
        Ok(repository) => repository,
        Err(e) => {
            log::error!("Failed to connect to database. Please check DATABASE_URL in .env and ensure the database is running. Error: {}", e);
            return Err(e.into());
        }
    };
    repository.migrate().await?;

    let app_state = web::Data::new(
        AppState::new_with_config(&config, Arc::new(repository.clone()))
            .map_err(|e| anyhow::anyhow!(e))?,
    );

    let prometheus = PrometheusMetricsBuilder::new("intern_certificate_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create Prometheus metrics middleware: {}", e))?;

    let allowed_origins = config.cors_allowed_origins.clone();
    log::info!(
        "Starting server at http://{}:{}",
        config.bind_address,
        config.port
    );

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);
        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(cors)
            .app_data(app_state.clone())
            .app_data(json_config())
            .configure(configure_routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await?;

    repository.disconnect().await;
    Ok(())
}
