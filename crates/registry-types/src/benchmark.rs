//! Records persisted by the accuracy benchmark.

use serde::{Deserialize, Serialize};

/// Score breakdown for a single corpus file.
///
/// Section scores are `None` when that section has no ground-truth tokens
/// (e.g. a land certificate with no 을구), never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileScore {
    pub file: String,
    pub property_type: Option<String>,
    pub overall: f64,
    pub title: Option<f64>,
    pub section_a: Option<f64>,
    pub section_b: Option<f64>,
    pub gt_tokens: usize,
    pub matched_tokens: usize,
    /// Most frequent ground-truth tokens the parse missed, capped by the
    /// runner.
    pub missing_top: Vec<String>,
    pub errors: Vec<String>,
}

impl FileScore {
    /// Zero-score entry for a file whose parse failed outright.
    pub fn failed(file: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            property_type: None,
            overall: 0.0,
            title: None,
            section_a: None,
            section_b: None,
            gt_tokens: 0,
            matched_tokens: 0,
            missing_top: Vec::new(),
            errors: vec![error.into()],
        }
    }
}

/// One benchmark run of a parser version over the corpus. Saved to
/// `benchmark-history.json`, replacing any prior record for the same
/// version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub version: String,
    pub date: String,
    /// Number of corpus files scored, failures included.
    pub files: usize,
    pub overall: f64,
    pub title: Option<f64>,
    pub section_a: Option<f64>,
    pub section_b: Option<f64>,
    pub details: Vec<FileScore>,
}
