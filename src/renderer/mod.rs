//! Certificate rendering - turns a verified intern record into PDF bytes.
//!
//! A single strategy is used: a Typst template compiled by the Typst CLI.
//! - `common` - escaping, date and id helpers
//! - `engine` - low-level Typst compilation
//! - `certificate` - the certificate template renderer

pub mod certificate;
pub mod common;
pub mod engine;

pub use certificate::TypstCertificateRenderer;
pub use engine::TypstRenderEngine;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::certificate::models::InternRecord;

/// Errors that can occur while rendering a certificate.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to load Typst template: {0}")]
    TemplateIo(#[source] std::io::Error),
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to write Typst source: {0}")]
    WriteTypst(#[source] std::io::Error),
    #[error("Typst CLI execution failed: {0}")]
    TypstIo(#[source] std::io::Error),
    #[error("Typst CLI exited with status {0}")]
    TypstExit(i32),
    #[error("failed to read generated PDF: {0}")]
    ReadPdf(#[source] std::io::Error),
    #[error("invalid certificate data: {0}")]
    InvalidData(String),
    #[error("renderer produced invalid PDF output")]
    InvalidOutput,
    #[error("render task failed: {0}")]
    Task(String),
}

/// Values printed on one certificate.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateData {
    pub student_name: String,
    pub college: String,
    pub email: String,
    pub field: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<&InternRecord> for CertificateData {
    fn from(record: &InternRecord) -> Self {
        Self {
            student_name: record.name.clone(),
            college: record.college.clone(),
            email: record.email.clone(),
            field: record.field.clone(),
            start_date: record.start_date,
            end_date: record.end_date,
        }
    }
}

impl CertificateData {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.student_name.trim().is_empty() {
            return Err(RenderError::InvalidData(
                "student name must be a non-empty string".to_string(),
            ));
        }
        if self.college.trim().is_empty() {
            return Err(RenderError::InvalidData(
                "college name must be a non-empty string".to_string(),
            ));
        }
        if self.field.trim().is_empty() {
            return Err(RenderError::InvalidData(
                "field must be a non-empty string".to_string(),
            ));
        }
        if self.start_date >= self.end_date {
            return Err(RenderError::InvalidData(
                "start date must be before end date".to_string(),
            ));
        }
        Ok(())
    }
}

/// Renders certificate PDFs.
#[async_trait]
pub trait CertificateRenderer {
    async fn render(&self, data: &CertificateData) -> Result<Vec<u8>, RenderError>;
}

/// True when `bytes` starts with the PDF magic header.
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}
