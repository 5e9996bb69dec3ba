use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::certificate::models::InternRecord;

/// Certificates issued for one internship field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct FieldCount {
    #[schema(example = "Web Development")]
    pub field: String,
    #[schema(example = 12)]
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentIntern {
    pub id: i64,
    pub name: String,
    pub college: String,
    pub email: String,
    pub field: String,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub certificate_key: Option<String>,
    pub has_certificate: bool,
}

impl From<InternRecord> for RecentIntern {
    fn from(record: InternRecord) -> Self {
        Self {
            id: record.id,
            has_certificate: record.certificate_key.is_some(),
            name: record.name,
            college: record.college,
            email: record.email,
            field: record.field,
            start_date: record.start_date,
            end_date: record.end_date,
            certificate_key: record.certificate_key,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_interns: i64,
    pub interns_with_certificates: i64,
    pub interns_without_certificates: i64,
    /// Certificates whose program ended within the last 30 days.
    pub recent_certificates: i64,
    /// Percentage of eligible interns holding a certificate, rounded.
    pub completion_rate: i64,
    pub field_breakdown: Vec<FieldCount>,
    pub recent_interns: Vec<RecentIntern>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub success: bool,
    pub data: AdminStats,
}
