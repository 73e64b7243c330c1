//! Accuracy benchmark for registry certificate parsers.
//!
//! Scores structured parse output by token recall against the PDF's own
//! text layer: every word the document shows should reappear somewhere in
//! the parsed fields. No labeled data is required, so any certificate can
//! join the corpus.

pub mod collect;
pub mod ground_truth;
pub mod history;
pub mod report;
pub mod runner;
pub mod score;

pub use collect::ParsedTokens;
pub use ground_truth::GroundTruth;
pub use runner::{run_benchmark, score_file};
pub use score::{recall, tokenize, TokenCounts};
