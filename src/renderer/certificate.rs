//! Internship completion certificate rendered from `static/certificate.typ`.
//!
//! The template body refers to a `cert` dictionary; the renderer prepends a
//! definition of that dictionary holding the escaped values for one intern.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fs;

use super::common::{
    escape_typst_string, format_long_date, generate_certificate_id, get_static_dir,
    sanitize_filename,
};
use super::engine::TypstRenderEngine;
use super::{is_pdf, CertificateData, CertificateRenderer, RenderError};
use crate::config::ProgramConfig;

const TEMPLATE_FILE: &str = "certificate.typ";

pub struct TypstCertificateRenderer {
    template: String,
    program: ProgramConfig,
    engine: TypstRenderEngine,
}

impl TypstCertificateRenderer {
    /// Load the template from the static directory.
    pub fn new(program: ProgramConfig, typst_bin: impl Into<String>) -> Result<Self, RenderError> {
        let template_path = get_static_dir().join(TEMPLATE_FILE);
        let template = fs::read_to_string(&template_path).map_err(RenderError::TemplateIo)?;
        Ok(Self::with_template(template, program, TypstRenderEngine::new(typst_bin)))
    }

    pub fn with_template(template: String, program: ProgramConfig, engine: TypstRenderEngine) -> Self {
        Self {
            template,
            program,
            engine,
        }
    }

    /// Full Typst source for one certificate.
    pub fn render_source(
        &self,
        data: &CertificateData,
        issued_at: DateTime<Utc>,
        certificate_id: &str,
    ) -> String {
        let program = &self.program;
        format!(
            r#"#let cert = (
  name: "{}",
  college: "{}",
  field: "{}",
  start_date: "{}",
  end_date: "{}",
  issue_date: "{}",
  certificate_id: "{}",
  coordinator_name: "{}",
  coordinator_title: "{}",
  company_name: "{}",
  company_full_name: "{}",
  company_address: "{}",
  company_website: "{}",
)

{}"#,
            escape_typst_string(data.student_name.trim()),
            escape_typst_string(data.college.trim()),
            escape_typst_string(data.field.trim()),
            escape_typst_string(&format_long_date(data.start_date)),
            escape_typst_string(&format_long_date(data.end_date)),
            escape_typst_string(&format_long_date(issued_at.date_naive())),
            escape_typst_string(certificate_id),
            escape_typst_string(&program.coordinator_name),
            escape_typst_string(&program.coordinator_title),
            escape_typst_string(&program.company_name),
            escape_typst_string(&program.company_full_name),
            escape_typst_string(&program.company_address),
            escape_typst_string(&program.company_website),
            self.template,
        )
    }
}

#[async_trait]
impl CertificateRenderer for TypstCertificateRenderer {
    async fn render(&self, data: &CertificateData) -> Result<Vec<u8>, RenderError> {
        data.validate()?;

        let issued_at = Utc::now();
        let certificate_id = generate_certificate_id(issued_at);
        let source = self.render_source(data, issued_at, &certificate_id);
        let source_filename = format!("certificate-{}.typ", sanitize_filename(&data.email, "intern"));
        let engine = self.engine.clone();

        log::debug!("Compiling certificate {} for {}", certificate_id, data.email);
        let pdf = tokio::task::spawn_blocking(move || engine.render(&source_filename, &source))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))??;

        if !is_pdf(&pdf) {
            return Err(RenderError::InvalidOutput);
        }
        log::info!("PDF certificate generated ({} bytes)", pdf.len());
        Ok(pdf)
    }
}
