use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal parse failures. Everything else degrades into
/// [`RegistryDocument::errors`](crate::RegistryDocument) as a [`ParseNote`].
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("No extractable text layer: {0}")]
    ExtractionFailure(String),

    #[error("Parse exceeded time budget of {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteSeverity {
    Info,
    Warning,
}

/// A non-fatal condition recorded during parsing.
///
/// The parse never fails because of one of these; the affected row or
/// section is emitted with whatever could be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseNote {
    pub severity: NoteSeverity,
    pub code: String,
    pub message: String,
}

impl ParseNote {
    pub fn section_not_found(section: &str) -> Self {
        Self {
            severity: NoteSeverity::Warning,
            code: "section_not_found".into(),
            message: format!("expected section heading not found: {section}"),
        }
    }

    pub fn pattern_mismatch(rank: &str, text: &str) -> Self {
        let preview: String = text.chars().take(40).collect();
        Self {
            severity: NoteSeverity::Info,
            code: "pattern_mismatch".into(),
            message: format!("row {rank}: no registration-type rule matched: {preview}"),
        }
    }

    pub fn dropped_leading_row(section: &str) -> Self {
        Self {
            severity: NoteSeverity::Info,
            code: "dropped_leading_row".into(),
            message: format!("first row of {section} block has no rank number, dropped"),
        }
    }

    pub fn text_too_short(len: usize) -> Self {
        Self {
            severity: NoteSeverity::Warning,
            code: "text_too_short".into(),
            message: format!("extracted text unusually short ({len} chars), possibly scanned PDF"),
        }
    }
}
