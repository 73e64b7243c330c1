//! Version-keyed parser registry with content-based detection.

use registry_types::{ParseError, RegistryDocument};

use crate::config::ParseConfig;
use crate::plugin::{DocumentTypeInfo, RegistryParser};
use crate::v1::V1Parser;

/// Detection outcome: the best-scoring parser for a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub type_info: DocumentTypeInfo,
    pub version: &'static str,
    pub confidence: f32,
}

pub struct ParserRegistry {
    parsers: Vec<Box<dyn RegistryParser>>,
    config: ParseConfig,
}

impl ParserRegistry {
    pub fn new(config: ParseConfig) -> Self {
        Self {
            parsers: Vec::new(),
            config,
        }
    }

    /// Registry with the built-in parsers registered.
    pub fn with_builtin(config: ParseConfig) -> Self {
        let mut registry = Self::new(config.clone());
        registry.register(Box::new(V1Parser::new(config)));
        registry
    }

    pub fn register(&mut self, parser: Box<dyn RegistryParser>) {
        self.parsers.push(parser);
    }

    pub fn get(&self, version: &str) -> Option<&dyn RegistryParser> {
        self.parsers
            .iter()
            .find(|p| p.parser_version() == version)
            .map(|p| p.as_ref())
    }

    /// Highest registered version.
    pub fn latest(&self) -> Option<&dyn RegistryParser> {
        self.parsers
            .iter()
            .max_by_key(|p| version_key(p.parser_version()))
            .map(|p| p.as_ref())
    }

    /// Parser named by the config's default version, falling back to the
    /// latest one.
    pub fn default_parser(&self) -> Option<&dyn RegistryParser> {
        self.get(&self.config.default_version).or_else(|| self.latest())
    }

    pub fn versions(&self) -> Vec<&'static str> {
        let mut versions: Vec<&'static str> =
            self.parsers.iter().map(|p| p.parser_version()).collect();
        versions.sort_by_key(|v| version_key(v));
        versions
    }

    /// Score every parser against the file head and a text sample; the best
    /// positive score wins.
    pub fn detect(&self, pdf_bytes: &[u8]) -> Option<Detection> {
        let head: &[u8] = &pdf_bytes[..pdf_bytes.len().min(8)];
        let sample = text_sample(pdf_bytes);

        self.parsers
            .iter()
            .map(|p| Detection {
                type_info: p.document_type_info(),
                version: p.parser_version(),
                confidence: p.can_parse(head, &sample),
            })
            .filter(|d| d.confidence > 0.0)
            .max_by(|a, b| {
                a.confidence
                    .partial_cmp(&b.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| version_key(a.version).cmp(&version_key(b.version)))
            })
    }

    /// Parse with a pinned version, or the default parser when `None`.
    pub fn parse(
        &self,
        pdf_bytes: &[u8],
        version: Option<&str>,
    ) -> Result<RegistryDocument, ParseError> {
        let parser = match version {
            Some(v) => self.get(v).ok_or_else(|| {
                ParseError::ExtractionFailure(format!(
                    "no parser registered for version {v} (available: {})",
                    self.versions().join(", ")
                ))
            })?,
            None => self.default_parser().ok_or_else(|| {
                ParseError::ExtractionFailure("no parsers registered".to_string())
            })?,
        };
        parser.parse(pdf_bytes)
    }
}

// "1.0.0" -> (1, 0, 0); malformed segments sort low.
fn version_key(version: &str) -> (u64, u64, u64) {
    let mut parts = version.split('.').map(|s| s.parse::<u64>().unwrap_or(0));
    (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}

// Quick extraction for detection only; the full parse goes through the
// layout pipeline instead.
fn text_sample(pdf_bytes: &[u8]) -> String {
    match pdf_extract::extract_text_from_mem(pdf_bytes) {
        Ok(text) => text.chars().take(3000).collect(),
        Err(e) => {
            tracing::debug!(error = %e, "text sample extraction failed");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_registration() {
        let registry = ParserRegistry::with_builtin(ParseConfig::default());
        assert_eq!(registry.versions(), vec!["1.0.0"]);
        assert!(registry.get("1.0.0").is_some());
        assert!(registry.get("9.9.9").is_none());
        assert_eq!(registry.latest().unwrap().parser_version(), "1.0.0");
        assert_eq!(registry.default_parser().unwrap().parser_version(), "1.0.0");
    }

    #[test]
    fn test_version_key_ordering() {
        assert!(version_key("1.0.1") > version_key("1.0.0"));
        assert!(version_key("2.0.0") > version_key("1.9.9"));
        assert_eq!(version_key("oops"), (0, 0, 0));
    }

    #[test]
    fn test_parse_with_unknown_version_fails() {
        let registry = ParserRegistry::with_builtin(ParseConfig::default());
        let err = registry.parse(b"%PDF-", Some("0.0.1")).unwrap_err();
        assert!(err.to_string().contains("0.0.1"));
        assert!(err.to_string().contains("1.0.0"));
    }

    #[test]
    fn test_detect_rejects_non_pdf() {
        let registry = ParserRegistry::with_builtin(ParseConfig::default());
        assert!(registry.detect(b"PK\x03\x04 not a pdf").is_none());
    }
}
