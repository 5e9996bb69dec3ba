//! Request validation, run before any I/O happens.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use super::models::{CertificateRequest, VerifyStudentRequest};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_COLLEGE_LEN: usize = 200;

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$").unwrap();
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} is required", label))
    }

    pub fn too_long(field: &str, label: &str, max: usize) -> Self {
        Self::new(field, format!("{} too long (max {} characters)", label, max))
    }

    pub fn invalid_email(field: &str) -> Self {
        Self::new(field, "Invalid email format")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// One `field: message` line per error.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join("; "))
    }
}

pub fn validate_required(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, label));
    }
}

pub fn validate_max_len(
    value: &str,
    field: &str,
    label: &str,
    max: usize,
    errors: &mut ValidationErrors,
) {
    if value.chars().count() > max {
        errors.add(ValidationError::too_long(field, label, max));
    }
}

pub fn validate_email(value: &str, field: &str, errors: &mut ValidationErrors) {
    if !EMAIL_PATTERN.is_match(value.trim()) {
        errors.add(ValidationError::invalid_email(field));
    }
}

impl CertificateRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        validate_required(&self.name, "name", "Name", &mut errors);
        validate_max_len(&self.name, "name", "Name", MAX_NAME_LEN, &mut errors);
        validate_required(&self.college, "college", "College", &mut errors);
        validate_max_len(
            &self.college,
            "college",
            "College name",
            MAX_COLLEGE_LEN,
            &mut errors,
        );
        validate_email(&self.email, "email", &mut errors);

        errors.into_result()
    }
}

impl VerifyStudentRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_email(&self.email, "email", &mut errors);
        errors.into_result()
    }
}
