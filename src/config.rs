//! Process configuration loaded from the environment.
//!
//! Everything is read once at startup into an [`AppConfig`] which is then
//! handed to the constructors that need it.

use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

use crate::storage::SupabaseConfig;

const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_SESSION_SECRET: &str = "intern-certificate-session-secret-change-in-production";
const DEFAULT_SIGNED_URL_EXPIRY_SECS: u64 = 3600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Whether unknown emails may be provisioned from the allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuanceMode {
    /// Emails without a record are accepted when they appear on the allow-list.
    AllowList,
    /// Only emails with an existing record may request a certificate.
    RegisteredOnly,
}

impl IssuanceMode {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "allow-list" | "allowlist" | "allow_list" => Ok(Self::AllowList),
            "registered-only" | "registered_only" | "registered" => Ok(Self::RegisteredOnly),
            other => Err(ConfigError::Invalid {
                name: "ISSUANCE_MODE",
                value: other.to_string(),
                reason: "expected 'allow-list' or 'registered-only'".to_string(),
            }),
        }
    }
}

/// Static program metadata printed on every certificate and used as defaults
/// for records provisioned from the allow-list.
#[derive(Debug, Clone)]
pub struct ProgramConfig {
    pub field: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub coordinator_name: String,
    pub coordinator_title: String,
    pub company_name: String,
    pub company_full_name: String,
    pub company_address: String,
    pub company_website: String,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            field: "Web Development".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 7, 2).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2025, 7, 16).unwrap_or_default(),
            coordinator_name: "Harshdeepsinh".to_string(),
            coordinator_title: "Internship Coordinator".to_string(),
            company_name: "LinkVerse".to_string(),
            company_full_name: "LinkVerse Labs Private LTD".to_string(),
            company_address: "E-703, Ganesh Glory 11, SG Highway, Ahmedabad".to_string(),
            company_website: "www.linkverselabs.com".to_string(),
        }
    }
}

impl ProgramConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            field: env_or("PROGRAM_FIELD", defaults.field),
            start_date: date_env("PROGRAM_START_DATE", defaults.start_date)?,
            end_date: date_env("PROGRAM_END_DATE", defaults.end_date)?,
            coordinator_name: env_or("PROGRAM_COORDINATOR", defaults.coordinator_name),
            coordinator_title: env_or("PROGRAM_COORDINATOR_TITLE", defaults.coordinator_title),
            company_name: env_or("COMPANY_NAME", defaults.company_name),
            company_full_name: env_or("COMPANY_FULL_NAME", defaults.company_full_name),
            company_address: env_or("COMPANY_ADDRESS", defaults.company_address),
            company_website: env_or("COMPANY_WEBSITE", defaults.company_website),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub supabase: SupabaseConfig,
    pub signed_url_expiry_secs: u64,
    pub admin_username: String,
    pub admin_password: String,
    pub session_secret: String,
    pub production: bool,
    pub issuance_mode: IssuanceMode,
    pub verified_emails_file: Option<PathBuf>,
    pub verified_emails: Vec<String>,
    pub program: ProgramConfig,
    pub cors_allowed_origins: Vec<String>,
    pub bind_address: String,
    pub port: u16,
    pub typst_bin: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let admin_username = env::var("ADMIN_USERNAME").unwrap_or_else(|_| {
            log::warn!("ADMIN_USERNAME not set, using default username");
            DEFAULT_ADMIN_USERNAME.to_string()
        });
        let admin_password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
            log::warn!("ADMIN_PASSWORD not set, using default password. SET THIS IN PRODUCTION!");
            DEFAULT_ADMIN_PASSWORD.to_string()
        });
        let session_secret = env::var("SESSION_SECRET").unwrap_or_else(|_| {
            log::warn!("SESSION_SECRET not set, using default secret. SET THIS IN PRODUCTION!");
            DEFAULT_SESSION_SECRET.to_string()
        });

        let signed_url_expiry_secs = match env::var("SIGNED_URL_EXPIRY_SECS") {
            Ok(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    name: "SIGNED_URL_EXPIRY_SECS",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
            Err(_) => DEFAULT_SIGNED_URL_EXPIRY_SECS,
        };

        let port = match env::var("PORT") {
            Ok(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    name: "PORT",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
            Err(_) => 8080,
        };

        let issuance_mode = match env::var("ISSUANCE_MODE") {
            Ok(raw) => IssuanceMode::parse(&raw)?,
            Err(_) => IssuanceMode::AllowList,
        };

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|raw| split_list(&raw))
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                    "http://127.0.0.1:8080".to_string(),
                ]
            });

        Ok(Self {
            database_url,
            supabase: SupabaseConfig::from_env()?,
            signed_url_expiry_secs,
            admin_username,
            admin_password,
            session_secret,
            production: env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            issuance_mode,
            verified_emails_file: env::var("VERIFIED_EMAILS_FILE").ok().map(PathBuf::from),
            verified_emails: env::var("VERIFIED_EMAILS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            program: ProgramConfig::from_env()?,
            cors_allowed_origins,
            bind_address: env_or("BIND_ADDRESS", "0.0.0.0".to_string()),
            port,
            typst_bin: env_or("TYPST_BIN", "typst".to_string()),
        })
    }
}

fn env_or(name: &str, default: String) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}

fn date_env(name: &'static str, default: NaiveDate) -> Result<NaiveDate, ConfigError> {
    match env::var(name) {
        Ok(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
            ConfigError::Invalid {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            }
        }),
        Err(_) => Ok(default),
    }
}

pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
