use registry_types::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    #[error("page index {index} out of range (0..{count})")]
    PageIndex { index: usize, count: usize },
}

impl From<LayoutError> for ParseError {
    fn from(e: LayoutError) -> Self {
        ParseError::ExtractionFailure(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_to_extraction_failure() {
        let err: ParseError = LayoutError::Parse("bad xref".into()).into();
        assert!(matches!(err, ParseError::ExtractionFailure(_)));
        assert!(err.to_string().contains("bad xref"));
    }
}
