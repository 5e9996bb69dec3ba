use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Canonical form of an email used for lookups and storage.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Case-insensitive, whitespace-trimmed comparison used for identity checks.
pub fn fields_match(submitted: &str, stored: &str) -> bool {
    submitted.trim().to_lowercase() == stored.trim().to_lowercase()
}

/// One eligible intern as stored in the record repository.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InternRecord {
    #[schema(example = 42)]
    pub id: i64,
    #[schema(example = "alice@x.edu")]
    pub email: String,
    #[schema(example = "Alice Smith")]
    pub name: String,
    #[schema(example = "X University")]
    pub college: String,
    #[schema(example = "Web Development")]
    pub field: String,
    #[schema(value_type = String, format = "date", example = "2025-07-02")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date", example = "2025-07-16")]
    pub end_date: NaiveDate,
    #[schema(example = "certificates/2025-07-16/alice_x.edu_1a2b3c4d.pdf")]
    pub certificate_key: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

/// Fields for a record provisioned on first request.
#[derive(Debug, Clone)]
pub struct NewInternRecord {
    pub email: String,
    pub name: String,
    pub college: String,
    pub field: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CertificateRequest {
    #[schema(example = "Alice Smith")]
    pub name: String,
    #[schema(example = "X University")]
    pub college: String,
    #[schema(example = "alice@x.edu")]
    pub email: String,
}

/// Outcome of the issuance workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedCertificate {
    pub download_url: String,
    pub preview_url: String,
    pub certificate_key: String,
    pub student_name: String,
    pub is_existing: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResponse {
    pub success: bool,
    #[schema(example = "Certificate generated successfully.")]
    pub message: String,
    pub download_url: String,
    pub preview_url: String,
    pub is_existing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
}

impl From<IssuedCertificate> for CertificateResponse {
    fn from(issued: IssuedCertificate) -> Self {
        if issued.is_existing {
            Self {
                success: true,
                message: "Certificate already exists. Download link generated.".to_string(),
                download_url: issued.download_url,
                preview_url: issued.preview_url,
                is_existing: true,
                certificate_id: None,
                student_name: None,
            }
        } else {
            Self {
                success: true,
                message: "Certificate generated successfully.".to_string(),
                download_url: issued.download_url,
                preview_url: issued.preview_url,
                is_existing: false,
                certificate_id: Some(issued.certificate_key),
                student_name: Some(issued.student_name),
            }
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyStudentRequest {
    #[schema(example = "alice@x.edu")]
    pub email: String,
}

/// Public view of a record returned by the identity pre-check.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub id: i64,
    pub name: String,
    pub college: String,
    pub email: String,
    pub field: String,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub has_existing_certificate: bool,
}

impl From<InternRecord> for StudentSummary {
    fn from(record: InternRecord) -> Self {
        Self {
            id: record.id,
            has_existing_certificate: record.certificate_key.is_some(),
            name: record.name,
            college: record.college,
            email: record.email,
            field: record.field,
            start_date: record.start_date,
            end_date: record.end_date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyStudentResponse {
    pub verified: bool,
    pub student: StudentSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@X.Edu "), "alice@x.edu");
    }

    #[test]
    fn test_fields_match_ignores_case_and_padding() {
        assert!(fields_match(" alice smith", "Alice Smith "));
        assert!(!fields_match("Alice Smyth", "Alice Smith"));
    }

    #[test]
    fn test_existing_certificate_response_omits_id() {
        let response = CertificateResponse::from(IssuedCertificate {
            download_url: "https://d".to_string(),
            preview_url: "https://p".to_string(),
            certificate_key: "certificates/k.pdf".to_string(),
            student_name: "Alice".to_string(),
            is_existing: true,
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["isExisting"], true);
        assert_eq!(json["downloadUrl"], "https://d");
        assert!(json.get("certificateId").is_none());
        assert!(json.get("studentName").is_none());
    }

    #[test]
    fn test_fresh_certificate_response_carries_id() {
        let response = CertificateResponse::from(IssuedCertificate {
            download_url: "https://d".to_string(),
            preview_url: "https://p".to_string(),
            certificate_key: "certificates/k.pdf".to_string(),
            student_name: "Alice".to_string(),
            is_existing: false,
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["isExisting"], false);
        assert_eq!(json["certificateId"], "certificates/k.pdf");
        assert_eq!(json["studentName"], "Alice");
        assert_eq!(json["previewUrl"], "https://p");
    }
}
