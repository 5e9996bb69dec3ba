//! Certificate blob storage backed by Supabase Storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigError;

const DEFAULT_BUCKET_NAME: &str = "certificates";
const PDF_CONTENT_TYPE: &str = "application/pdf";

lazy_static! {
    static ref UNSAFE_KEY_CHARS: Regex = Regex::new(r"[^a-zA-Z0-9.-]").unwrap();
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cloud storage request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("cloud storage returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("cloud storage returned an unexpected response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub supabase_url: String,
    pub supabase_key: String,
    pub bucket_name: String,
}

impl SupabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let supabase_url = env::var("SUPABASE_URL").map_err(|_| ConfigError::Missing("SUPABASE_URL"))?;
        let supabase_key = env::var("SUPABASE_SERVICE_KEY")
            .map_err(|_| ConfigError::Missing("SUPABASE_SERVICE_KEY"))?;
        let bucket_name = env::var("BUCKET_NAME").unwrap_or_else(|_| DEFAULT_BUCKET_NAME.to_string());

        Ok(Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_key,
            bucket_name,
        })
    }
}

/// Blob store holding rendered certificates.
#[async_trait]
pub trait ObjectStorage {
    /// Store a new object. Existing objects are never overwritten.
    async fn upload_file(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    async fn object_exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Produce a time-limited URL for one object. With `download` set the URL
    /// forces an attachment download instead of inline display.
    async fn create_signed_url(
        &self,
        key: &str,
        expires_in_secs: u64,
        download: bool,
    ) -> Result<String, StorageError>;
}

/// Derive a fresh storage key for a certificate belonging to `email`.
///
/// Keys look like `certificates/2025-07-16/alice_x.edu_1a2b3c4d.pdf`; the suffix
/// comes from a v4 UUID so repeated issuances never collide.
pub fn certificate_key(email: &str, now: DateTime<Utc>) -> String {
    let date = now.format("%Y-%m-%d");
    let unique = Uuid::new_v4().simple().to_string();
    format!(
        "certificates/{}/{}_{}.pdf",
        date,
        sanitize_email(email),
        &unique[..8]
    )
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_email(email: &str) -> String {
    UNSAFE_KEY_CHARS.replace_all(email, "_").into_owned()
}

#[derive(Serialize)]
struct SignRequest {
    #[serde(rename = "expiresIn")]
    expires_in: u64,
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

pub struct SupabaseStorage {
    config: SupabaseConfig,
    client: reqwest::Client,
}

impl SupabaseStorage {
    pub fn new(config: SupabaseConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.supabase_url, self.config.bucket_name, key
        )
    }

    fn authenticated_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/authenticated/{}/{}",
            self.config.supabase_url, self.config.bucket_name, key
        )
    }

    fn sign_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.config.supabase_url, self.config.bucket_name, key
        )
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.config.supabase_key)
            .header("apikey", &self.config.supabase_key)
    }

    /// Turn the relative `signedURL` returned by Supabase into an absolute URL.
    fn absolute_signed_url(&self, signed_path: &str, download: bool) -> String {
        let mut url = format!("{}/storage/v1{}", self.config.supabase_url, signed_path);
        if download {
            let separator = if url.contains('?') { '&' } else { '?' };
            url.push(separator);
            url.push_str("download=");
        }
        url
    }
}

async fn error_from_response(response: reqwest::Response) -> StorageError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    StorageError::Status { status, body }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload_file(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        log::debug!("Uploading {} bytes to {}", data.len(), key);
        let response = self
            .authorize(self.client.post(self.object_url(key)))
            .header(reqwest::header::CONTENT_TYPE, PDF_CONTENT_TYPE)
            .header("x-upsert", "false")
            .body(data.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }

    async fn object_exists(&self, key: &str) -> Result<bool, StorageError> {
        let response = self
            .authorize(self.client.head(self.authenticated_url(key)))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Ok(false),
            _ => Err(error_from_response(response).await),
        }
    }

    async fn create_signed_url(
        &self,
        key: &str,
        expires_in_secs: u64,
        download: bool,
    ) -> Result<String, StorageError> {
        let response = self
            .authorize(self.client.post(self.sign_url(key)))
            .json(&SignRequest {
                expires_in: expires_in_secs,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;
        Ok(self.absolute_signed_url(&signed.signed_url, download))
    }
}
