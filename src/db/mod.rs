//! Database module - AppState and the record store
//!
//! - `intern` - Postgres implementation of [`InternRepository`]

mod intern;

pub use intern::PgInternRepository;

use async_trait::async_trait;
use chrono::NaiveDate;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::admin::model::{AdminStats, FieldCount};
use crate::auth::SessionGate;
use crate::certificate::allow_list::AllowList;
use crate::certificate::models::{InternRecord, NewInternRecord};
use crate::config::{AppConfig, IssuanceMode, ProgramConfig};
use crate::renderer::{CertificateRenderer, TypstCertificateRenderer};
use crate::storage::{ObjectStorage, SupabaseStorage};

const STATS_CACHE_TTL_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("no intern record for {0}")]
    RecordNotFound(String),
    #[error("database unavailable: {0}")]
    Unavailable(String),
}

/// Keyed store of intern eligibility records. Emails are matched
/// case-insensitively after trimming.
#[async_trait]
pub trait InternRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<InternRecord>, RepositoryError>;

    /// Insert a record, or return the stored one if the email already exists.
    async fn create(&self, record: &NewInternRecord) -> Result<InternRecord, RepositoryError>;

    async fn set_certificate_key(&self, email: &str, key: &str) -> Result<(), RepositoryError>;

    async fn count_all(&self) -> Result<i64, RepositoryError>;

    async fn count_with_certificate(&self) -> Result<i64, RepositoryError>;

    /// Records holding a certificate whose program ended on or after `cutoff`.
    async fn count_certificates_ending_since(
        &self,
        cutoff: NaiveDate,
    ) -> Result<i64, RepositoryError>;

    /// Certificate counts grouped by internship field.
    async fn field_breakdown(&self) -> Result<Vec<FieldCount>, RepositoryError>;

    /// Newest records first.
    async fn most_recent(&self, limit: i64) -> Result<Vec<InternRecord>, RepositoryError>;
}

/// Knobs the issuance workflow reads on every request.
#[derive(Debug, Clone)]
pub struct IssuanceSettings {
    pub mode: IssuanceMode,
    pub program: ProgramConfig,
    pub signed_url_expiry_secs: u64,
}

impl Default for IssuanceSettings {
    fn default() -> Self {
        Self {
            mode: IssuanceMode::AllowList,
            program: ProgramConfig::default(),
            signed_url_expiry_secs: 3600,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub interns: Arc<dyn InternRepository + Send + Sync>,
    pub storage: Arc<dyn ObjectStorage + Send + Sync>,
    pub renderer: Arc<dyn CertificateRenderer + Send + Sync>,
    pub allow_list: Arc<AllowList>,
    pub sessions: Arc<SessionGate>,
    pub stats_cache: Cache<String, AdminStats>,
    pub settings: Arc<IssuanceSettings>,
}

impl AppState {
    pub fn new(
        interns: Arc<dyn InternRepository + Send + Sync>,
        storage: Arc<dyn ObjectStorage + Send + Sync>,
        renderer: Arc<dyn CertificateRenderer + Send + Sync>,
        allow_list: AllowList,
        sessions: SessionGate,
        settings: IssuanceSettings,
    ) -> Self {
        let stats_cache = Cache::builder()
            .time_to_live(Duration::from_secs(STATS_CACHE_TTL_SECS))
            .max_capacity(1)
            .build();

        AppState {
            interns,
            storage,
            renderer,
            allow_list: Arc::new(allow_list),
            sessions: Arc::new(sessions),
            stats_cache,
            settings: Arc::new(settings),
        }
    }

    /// Wire the production collaborators around an already connected
    /// repository.
    pub fn new_with_config(
        config: &AppConfig,
        interns: Arc<dyn InternRepository + Send + Sync>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(900))
            .user_agent("intern-certificate-server/1.0")
            .build()?;

        let storage = Arc::new(SupabaseStorage::new(config.supabase.clone(), http_client));
        let renderer = Arc::new(TypstCertificateRenderer::new(
            config.program.clone(),
            config.typst_bin.clone(),
        )?);

        let allow_list =
            AllowList::from_sources(config.verified_emails_file.as_deref(), &config.verified_emails)?;
        log::info!("Loaded {} allow-listed emails", allow_list.len());

        let sessions = SessionGate::new(
            config.admin_username.clone(),
            config.admin_password.clone(),
            &config.session_secret,
            config.production,
        );

        let settings = IssuanceSettings {
            mode: config.issuance_mode,
            program: config.program.clone(),
            signed_url_expiry_secs: config.signed_url_expiry_secs,
        };

        Ok(Self::new(
            interns, storage, renderer, allow_list, sessions, settings,
        ))
    }
}
