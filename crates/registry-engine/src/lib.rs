//! Parsing engine for Korean real-estate registry certificates
//! (등기부등본).
//!
//! The pipeline: layout extraction (positioned chars, rulings, colors),
//! watermark filtering, table reconstruction, section segmentation
//! (표제부 / 갑구 / 을구), entry extraction with strike-through
//! cancellation detection, and 말소 back-reference propagation. Parsers are
//! versioned behind [`RegistryParser`] and resolved through
//! [`ParserRegistry`].

pub mod config;
pub mod plugin;
pub mod registry;
pub mod v1;

mod cancel;
mod deadline;
mod extract;
mod mask;
mod rows;
mod section;
mod textutil;

pub use config::{ConfigError, ParseConfig};
pub use deadline::Deadline;
pub use plugin::{DocumentTypeInfo, RegistryParser};
pub use registry::{Detection, ParserRegistry};
pub use v1::V1Parser;

pub use registry_types::{ParseError, RegistryDocument};

/// Parse one certificate with the default configuration and parser.
pub fn parse(pdf_bytes: &[u8]) -> Result<RegistryDocument, ParseError> {
    ParserRegistry::with_builtin(ParseConfig::default()).parse(pdf_bytes, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_facade_propagates_errors() {
        assert!(parse(b"not a pdf").is_err());
    }
}
