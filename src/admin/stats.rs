//! Read-only reporting over the record store.

use chrono::{Days, NaiveDate};

use super::model::{AdminStats, RecentIntern};
use crate::config::IssuanceMode;
use crate::db::{AppState, RepositoryError};

const STATS_CACHE_KEY: &str = "admin_stats";
const RECENT_WINDOW_DAYS: u64 = 30;
const RECENT_INTERNS_LIMIT: i64 = 10;

/// `round(100 * with_certificate / total)`, or 0 when there is nobody to count.
pub fn completion_rate(with_certificate: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (100.0 * with_certificate as f64 / total as f64).round() as i64
}

impl AppState {
    /// Aggregate statistics for the admin dashboard, served from a short-lived
    /// cache when possible.
    pub async fn admin_stats(&self, today: NaiveDate) -> Result<AdminStats, RepositoryError> {
        if let Some(stats) = self.stats_cache.get(STATS_CACHE_KEY).await {
            log::debug!("Serving admin stats from cache");
            return Ok(stats);
        }

        let stats = self.compute_admin_stats(today).await?;
        self.stats_cache
            .insert(STATS_CACHE_KEY.to_string(), stats.clone())
            .await;
        Ok(stats)
    }

    pub async fn compute_admin_stats(&self, today: NaiveDate) -> Result<AdminStats, RepositoryError> {
        let total_interns = match self.settings.mode {
            IssuanceMode::AllowList => self.allow_list.len() as i64,
            IssuanceMode::RegisteredOnly => self.interns.count_all().await?,
        };

        let interns_with_certificates = self.interns.count_with_certificate().await?;

        let cutoff = today
            .checked_sub_days(Days::new(RECENT_WINDOW_DAYS))
            .unwrap_or(NaiveDate::MIN);
        let recent_certificates = self.interns.count_certificates_ending_since(cutoff).await?;

        let field_breakdown = self.interns.field_breakdown().await?;
        let recent_interns = self
            .interns
            .most_recent(RECENT_INTERNS_LIMIT)
            .await?
            .into_iter()
            .map(RecentIntern::from)
            .collect();

        log::info!(
            "Stats generated: {}/{} certificates",
            interns_with_certificates,
            total_interns
        );

        Ok(AdminStats {
            total_interns,
            interns_with_certificates,
            interns_without_certificates: total_interns - interns_with_certificates,
            recent_certificates,
            completion_rate: completion_rate(interns_with_certificates, total_interns),
            field_breakdown,
            recent_interns,
        })
    }
}
