use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::models::normalize_email;

/// Emails pre-authorized for issuance without an existing record.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    emails: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emails = emails
            .into_iter()
            .map(|e| normalize_email(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        Self { emails }
    }

    /// Build from an optional file (one email per line, `#` starts a comment)
    /// plus any extra entries.
    pub fn from_sources(file: Option<&Path>, extra: &[String]) -> std::io::Result<Self> {
        let mut entries: Vec<String> = extra.to_vec();

        if let Some(path) = file {
            let contents = fs::read_to_string(path)?;
            entries.extend(parse_lines(&contents));
        }

        Ok(Self::new(entries))
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&normalize_email(email))
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

fn parse_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}
