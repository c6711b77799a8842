use crate::ValidationError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const DEFAULT_AUTHOR: &str = "Annex 9 Generator";
pub const DEFAULT_SUBJECT: &str = "Bon de commande d'un service de taxis collectifs";

/// Caller-supplied document metadata.
///
/// `created_at` is never read from the clock inside a render: the same
/// metadata always yields the same document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderMetadata {
    /// Order reference, e.g. `TC-2024-000042`.
    pub reference: String,
    pub created_at: NaiveDateTime,
    pub author: String,
    pub title: String,
    pub subject: String,
}

impl RenderMetadata {
    pub fn new(reference: impl Into<String>, created_at: NaiveDateTime) -> Self {
        let reference = reference.into();
        Self {
            title: format!("Bon de commande - {reference}"),
            author: DEFAULT_AUTHOR.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
            reference,
            created_at,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.reference.trim().is_empty() {
            return Err(ValidationError::new("reference", "order reference is empty"));
        }
        Ok(())
    }

    /// `D:YYYYMMDDHHmmSS`, the PDF date string of `created_at`.
    pub fn pdf_date(&self) -> String {
        self.created_at.format("D:%Y%m%d%H%M%S").to_string()
    }

    /// `YYYYMMDD`, used in output file names.
    pub fn date_stamp(&self) -> String {
        self.created_at.format("%Y%m%d").to_string()
    }
}
