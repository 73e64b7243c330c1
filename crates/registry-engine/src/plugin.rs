//! Versioned parser plugin interface.

use registry_types::{ParseError, RegistryDocument};

/// What a parser handles, surfaced by listing and detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentTypeInfo {
    pub type_id: &'static str,
    pub display_name: &'static str,
    pub sub_types: &'static [&'static str],
}

/// A versioned certificate parser. Implementations are stateless across
/// calls so a single instance can serve concurrent parses.
pub trait RegistryParser: Send + Sync {
    fn document_type_info(&self) -> DocumentTypeInfo;

    fn parser_version(&self) -> &'static str;

    /// Confidence in [0.0, 1.0] that this parser can handle the document,
    /// judged from the file head and a text sample without a full parse.
    fn can_parse(&self, pdf_head: &[u8], text_sample: &str) -> f32;

    fn parse(&self, pdf_bytes: &[u8]) -> Result<RegistryDocument, ParseError>;

    /// Copy of `doc` with personal data masked and entry lists truncated,
    /// for demo display.
    fn mask_for_demo(&self, doc: &RegistryDocument) -> RegistryDocument;
}
