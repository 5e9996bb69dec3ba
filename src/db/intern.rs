//! Intern record database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use super::{InternRepository, RepositoryError};
use crate::admin::model::FieldCount;
use crate::certificate::models::{normalize_email, InternRecord, NewInternRecord};

const RECORD_COLUMNS: &str =
    "id, email, name, college, field, start_date, end_date, certificate_key, created_at";

/// Postgres-backed record store.
///
/// Owns its pool explicitly: open it with [`PgInternRepository::connect`] at
/// startup and release it with [`PgInternRepository::disconnect`] on shutdown.
#[derive(Clone)]
pub struct PgInternRepository {
    pool: PgPool,
}

impl PgInternRepository {
    pub async fn connect(database_url: &str) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(900))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await?;
        log::info!("Database connected successfully");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn disconnect(&self) {
        self.pool.close().await;
        log::info!("Database disconnected successfully");
    }
}

#[async_trait]
impl InternRepository for PgInternRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<InternRecord>, RepositoryError> {
        let sql = format!("SELECT {} FROM interns WHERE email = $1", RECORD_COLUMNS);
        let record = sqlx::query_as::<_, InternRecord>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn create(&self, record: &NewInternRecord) -> Result<InternRecord, RepositoryError> {
        // A concurrent request may have provisioned the same email first; in
        // that case the stored row is returned unchanged.
        let sql = format!(
            r#"
            INSERT INTO interns (email, name, college, field, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING {}
            "#,
            RECORD_COLUMNS
        );
        let created = sqlx::query_as::<_, InternRecord>(&sql)
            .bind(normalize_email(&record.email))
            .bind(record.name.trim())
            .bind(record.college.trim())
            .bind(&record.field)
            .bind(record.start_date)
            .bind(record.end_date)
            .fetch_one(&self.pool)
            .await?;
        log::info!("Intern record created: {}", created.email);
        Ok(created)
    }

    async fn set_certificate_key(&self, email: &str, key: &str) -> Result<(), RepositoryError> {
        let email = normalize_email(email);
        let result = sqlx::query("UPDATE interns SET certificate_key = $1 WHERE email = $2")
            .bind(key)
            .bind(&email)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::RecordNotFound(email));
        }
        Ok(())
    }

    async fn count_all(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM interns")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_with_certificate(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM interns WHERE certificate_key IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_certificates_ending_since(
        &self,
        cutoff: NaiveDate,
    ) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM interns WHERE certificate_key IS NOT NULL AND end_date >= $1",
        )
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn field_breakdown(&self) -> Result<Vec<FieldCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, FieldCount>(
            r#"
            SELECT field, COUNT(*) AS count
            FROM interns
            WHERE certificate_key IS NOT NULL
            GROUP BY field
            ORDER BY count DESC, field
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn most_recent(&self, limit: i64) -> Result<Vec<InternRecord>, RepositoryError> {
        let sql = format!(
            "SELECT {} FROM interns ORDER BY created_at DESC, id DESC LIMIT $1",
            RECORD_COLUMNS
        );
        let rows = sqlx::query_as::<_, InternRecord>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
