//! Shared fakes for the integration tests: an in-memory record store, an
//! in-memory blob store and a renderer that counts its invocations.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use intern_certificate_server::admin::model::FieldCount;
use intern_certificate_server::auth::SessionGate;
use intern_certificate_server::certificate::models::{InternRecord, NewInternRecord};
use intern_certificate_server::certificate::AllowList;
use intern_certificate_server::config::{IssuanceMode, ProgramConfig};
use intern_certificate_server::db::{InternRepository, IssuanceSettings, RepositoryError};
use intern_certificate_server::renderer::{CertificateData, CertificateRenderer, RenderError};
use intern_certificate_server::storage::{ObjectStorage, StorageError};
use intern_certificate_server::AppState;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct-horse";
pub const SESSION_SECRET: &str = "test-session-secret";

pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n% fake certificate\n%%EOF";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Record store kept in a vector. Can be switched into a failing mode to
/// simulate an outage.
#[derive(Default)]
pub struct InMemoryInternRepository {
    records: Mutex<Vec<InternRecord>>,
    next_id: AtomicI64,
    failing: AtomicBool,
}

impl InMemoryInternRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn insert(&self, record: InternRecord) {
        self.records.lock().await.push(record);
    }

    pub async fn get(&self, email: &str) -> Option<InternRecord> {
        self.records
            .lock()
            .await
            .iter()
            .find(|r| r.email == email)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "simulated connection failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl InternRepository for InMemoryInternRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<InternRecord>, RepositoryError> {
        self.check()?;
        Ok(self.get(email).await)
    }

    async fn create(&self, record: &NewInternRecord) -> Result<InternRecord, RepositoryError> {
        self.check()?;
        let mut records = self.records.lock().await;
        if let Some(existing) = records.iter().find(|r| r.email == record.email) {
            return Ok(existing.clone());
        }
        let created = InternRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            email: record.email.clone(),
            name: record.name.clone(),
            college: record.college.clone(),
            field: record.field.clone(),
            start_date: record.start_date,
            end_date: record.end_date,
            certificate_key: None,
            created_at: Utc::now(),
        };
        records.push(created.clone());
        Ok(created)
    }

    async fn set_certificate_key(&self, email: &str, key: &str) -> Result<(), RepositoryError> {
        self.check()?;
        let mut records = self.records.lock().await;
        match records.iter_mut().find(|r| r.email == email) {
            Some(record) => {
                record.certificate_key = Some(key.to_string());
                Ok(())
            }
            None => Err(RepositoryError::RecordNotFound(email.to_string())),
        }
    }

    async fn count_all(&self) -> Result<i64, RepositoryError> {
        self.check()?;
        Ok(self.records.lock().await.len() as i64)
    }

    async fn count_with_certificate(&self) -> Result<i64, RepositoryError> {
        self.check()?;
        let records = self.records.lock().await;
        Ok(records.iter().filter(|r| r.certificate_key.is_some()).count() as i64)
    }

    async fn count_certificates_ending_since(
        &self,
        cutoff: NaiveDate,
    ) -> Result<i64, RepositoryError> {
        self.check()?;
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .filter(|r| r.certificate_key.is_some() && r.end_date >= cutoff)
            .count() as i64)
    }

    async fn field_breakdown(&self) -> Result<Vec<FieldCount>, RepositoryError> {
        self.check()?;
        let records = self.records.lock().await;
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for record in records.iter().filter(|r| r.certificate_key.is_some()) {
            *counts.entry(record.field.clone()).or_default() += 1;
        }
        let mut breakdown: Vec<FieldCount> = counts
            .into_iter()
            .map(|(field, count)| FieldCount { field, count })
            .collect();
        breakdown.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.field.cmp(&b.field)));
        Ok(breakdown)
    }

    async fn most_recent(&self, limit: i64) -> Result<Vec<InternRecord>, RepositoryError> {
        self.check()?;
        let mut records = self.records.lock().await.clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        records.truncate(limit.max(0) as usize);
        Ok(records)
    }
}

/// Blob store kept in a map, with switches for upload and existence-check
/// failures.
#[derive(Default)]
pub struct MockObjectStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
    uploads: AtomicUsize,
    fail_uploads: AtomicBool,
    fail_exists: AtomicBool,
}

impl MockObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn has_file(&self, key: &str) -> bool {
        self.files.lock().await.contains_key(key)
    }

    pub async fn remove_file(&self, key: &str) {
        self.files.lock().await.remove(key);
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_exists(&self, fail: bool) {
        self.fail_exists.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStorage for MockObjectStorage {
    async fn upload_file(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Status {
                status: 503,
                body: "bucket offline".to_string(),
            });
        }
        let mut files = self.files.lock().await;
        if files.contains_key(key) {
            return Err(StorageError::Status {
                status: 409,
                body: "The resource already exists".to_string(),
            });
        }
        files.insert(key.to_string(), data.to_vec());
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn object_exists(&self, key: &str) -> Result<bool, StorageError> {
        if self.fail_exists.load(Ordering::SeqCst) {
            return Err(StorageError::InvalidResponse(
                "simulated lookup failure".to_string(),
            ));
        }
        Ok(self.has_file(key).await)
    }

    async fn create_signed_url(
        &self,
        key: &str,
        expires_in_secs: u64,
        download: bool,
    ) -> Result<String, StorageError> {
        let mut url = format!(
            "https://storage.test/object/sign/certificates/{}?token=t&expires={}",
            key, expires_in_secs
        );
        if download {
            url.push_str("&download=");
        }
        Ok(url)
    }
}

/// Renderer that records how often it runs and returns canned bytes.
pub struct CountingRenderer {
    calls: AtomicUsize,
    output: Vec<u8>,
    fail: bool,
    rendered: Mutex<Vec<CertificateData>>,
}

impl CountingRenderer {
    pub fn new() -> Self {
        Self::with_output(FAKE_PDF.to_vec())
    }

    pub fn with_output(output: Vec<u8>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            output,
            fail: false,
            rendered: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn last_rendered(&self) -> Option<CertificateData> {
        self.rendered.lock().await.last().cloned()
    }
}

#[async_trait]
impl CertificateRenderer for CountingRenderer {
    async fn render(&self, data: &CertificateData) -> Result<Vec<u8>, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rendered.lock().await.push(data.clone());
        if self.fail {
            return Err(RenderError::TypstExit(1));
        }
        Ok(self.output.clone())
    }
}

pub struct TestHarness {
    pub state: AppState,
    pub interns: Arc<InMemoryInternRepository>,
    pub storage: Arc<MockObjectStorage>,
    pub renderer: Arc<CountingRenderer>,
}

pub fn program() -> ProgramConfig {
    ProgramConfig::default()
}

pub fn harness(allow_list: &[&str], mode: IssuanceMode) -> TestHarness {
    harness_with_renderer(allow_list, mode, CountingRenderer::new())
}

pub fn harness_with_renderer(
    allow_list: &[&str],
    mode: IssuanceMode,
    renderer: CountingRenderer,
) -> TestHarness {
    let interns = Arc::new(InMemoryInternRepository::new());
    let storage = Arc::new(MockObjectStorage::new());
    let renderer = Arc::new(renderer);

    let state = AppState::new(
        interns.clone(),
        storage.clone(),
        renderer.clone(),
        AllowList::new(allow_list.iter().copied()),
        SessionGate::new(
            ADMIN_USERNAME.to_string(),
            ADMIN_PASSWORD.to_string(),
            SESSION_SECRET,
            false,
        ),
        IssuanceSettings {
            mode,
            program: program(),
            signed_url_expiry_secs: 3600,
        },
    );

    TestHarness {
        state,
        interns,
        storage,
        renderer,
    }
}

pub fn record(id: i64, email: &str, name: &str, college: &str) -> InternRecord {
    let program = program();
    InternRecord {
        id,
        email: email.to_string(),
        name: name.to_string(),
        college: college.to_string(),
        field: program.field,
        start_date: program.start_date,
        end_date: program.end_date,
        certificate_key: None,
        created_at: Utc::now(),
    }
}

pub fn record_created_at(
    id: i64,
    email: &str,
    field: &str,
    end_date: NaiveDate,
    certificate_key: Option<&str>,
    created_at: DateTime<Utc>,
) -> InternRecord {
    InternRecord {
        id,
        email: email.to_string(),
        name: format!("Intern {}", id),
        college: "Test College".to_string(),
        field: field.to_string(),
        start_date: end_date - chrono::Days::new(14),
        end_date,
        certificate_key: certificate_key.map(str::to_string),
        created_at,
    }
}
