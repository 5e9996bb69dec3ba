//! Certificate issuance workflow.
//!
//! Steps run strictly in order with no locking between concurrent requests:
//! two simultaneous first-time requests for one email may both render and
//! upload, and whichever key is written last wins. The other blob stays
//! reachable through the URL returned to its own requester.

use chrono::Utc;

use super::error::IssuanceError;
use super::models::{
    fields_match, normalize_email, CertificateRequest, InternRecord, IssuedCertificate,
    NewInternRecord,
};
use crate::config::IssuanceMode;
use crate::db::AppState;
use crate::renderer::{is_pdf, CertificateData};
use crate::storage::{certificate_key, StorageError};

struct SignedUrls {
    download: String,
    preview: String,
}

impl AppState {
    /// Verify the requester against the record store and hand back a signed
    /// link to their certificate, rendering it only when no stored copy exists.
    pub async fn issue_certificate(
        &self,
        request: &CertificateRequest,
    ) -> Result<IssuedCertificate, IssuanceError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        log::info!("Processing certificate request for: {}", email);

        let intern = self.resolve_intern(request, &email).await?;

        if let Some(existing_key) = intern.certificate_key.as_deref() {
            log::info!("Checking existing certificate: {}", existing_key);
            match self.reuse_existing(existing_key).await {
                Ok(Some(urls)) => {
                    log::info!("Certificate already exists, generated new links");
                    return Ok(IssuedCertificate {
                        download_url: urls.download,
                        preview_url: urls.preview,
                        certificate_key: existing_key.to_string(),
                        student_name: intern.name.clone(),
                        is_existing: true,
                    });
                }
                Ok(None) => {
                    log::warn!(
                        "Certificate key {} recorded but blob not found, regenerating",
                        existing_key
                    );
                }
                Err(e) => {
                    log::warn!("Error checking existing certificate {}: {}", existing_key, e);
                }
            }
        }

        log::info!("Generating PDF certificate for {}", intern.name);
        let pdf = self.renderer.render(&CertificateData::from(&intern)).await?;
        if !is_pdf(&pdf) {
            return Err(IssuanceError::RenderFailure(
                "renderer produced invalid PDF output".to_string(),
            ));
        }

        let key = certificate_key(&intern.email, Utc::now());
        log::info!("Uploading certificate to storage: {}", key);
        self.storage.upload_file(&key, &pdf).await?;

        self.interns.set_certificate_key(&intern.email, &key).await?;
        self.stats_cache.invalidate_all();
        log::info!("Certificate key stored for {}", intern.email);

        let urls = self.signed_urls(&key).await?;
        log::info!("Certificate generation completed for {}", intern.name);

        Ok(IssuedCertificate {
            download_url: urls.download,
            preview_url: urls.preview,
            certificate_key: key,
            student_name: intern.name,
            is_existing: false,
        })
    }

    /// Identity pre-check: return the stored record for `email`.
    pub async fn verify_student(&self, email: &str) -> Result<Option<InternRecord>, IssuanceError> {
        let record = self.interns.find_by_email(&normalize_email(email)).await?;
        Ok(record)
    }

    /// Find the stored record matching the request, provisioning one from the
    /// allow-list when permitted.
    async fn resolve_intern(
        &self,
        request: &CertificateRequest,
        email: &str,
    ) -> Result<InternRecord, IssuanceError> {
        let intern = match self.interns.find_by_email(email).await? {
            Some(record) => record,
            None => {
                let allowed = self.settings.mode == IssuanceMode::AllowList
                    && self.allow_list.contains(email);
                if !allowed {
                    log::info!("Email not authorized: {}", email);
                    return Err(IssuanceError::NotAuthorized);
                }

                log::info!("Email on allow-list, creating intern record: {}", email);
                let program = &self.settings.program;
                self.interns
                    .create(&NewInternRecord {
                        email: email.to_string(),
                        name: request.name.trim().to_string(),
                        college: request.college.trim().to_string(),
                        field: program.field.clone(),
                        start_date: program.start_date,
                        end_date: program.end_date,
                    })
                    .await?
            }
        };

        // The stored identity always wins over what the client sent.
        if !fields_match(&request.name, &intern.name)
            || !fields_match(&request.college, &intern.college)
        {
            log::info!("Provided details don't match records for: {}", email);
            return Err(IssuanceError::DetailMismatch);
        }

        Ok(intern)
    }

    async fn reuse_existing(&self, key: &str) -> Result<Option<SignedUrls>, StorageError> {
        if !self.storage.object_exists(key).await? {
            return Ok(None);
        }
        self.signed_urls(key).await.map(Some)
    }

    async fn signed_urls(&self, key: &str) -> Result<SignedUrls, StorageError> {
        let expiry = self.settings.signed_url_expiry_secs;
        let download = self.storage.create_signed_url(key, expiry, true).await?;
        let preview = self.storage.create_signed_url(key, expiry, false).await?;
        Ok(SignedUrls { download, preview })
    }
}
