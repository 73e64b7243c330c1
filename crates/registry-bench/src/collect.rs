//! Token collection from structured parse output.

use registry_types::RegistryDocument;
use serde_json::Value;

use crate::score::TokenCounts;

// Metadata fields that never correspond to document ink.
const EXCLUDED_KEYS: &[&str] = &[
    "raw_text",
    "parser_version",
    "parse_date",
    "errors",
    "counts",
    "is_cancelled",
    "property_type",
];

/// Per-section token counts of a parsed document. The title bucket also
/// carries the document-level unique number and address, which the title
/// table is scored against.
#[derive(Debug, Default)]
pub struct ParsedTokens {
    pub title: TokenCounts,
    pub section_a: TokenCounts,
    pub section_b: TokenCounts,
}

impl ParsedTokens {
    pub fn from_document(doc: &RegistryDocument) -> serde_json::Result<Self> {
        let mut parsed = Self::default();

        parsed.title.add_text(&doc.unique_number);
        parsed.title.add_text(&doc.property_address);
        collect_value(&serde_json::to_value(&doc.title_info)?, &mut parsed.title);
        collect_value(
            &serde_json::to_value(&doc.ownership_entries)?,
            &mut parsed.section_a,
        );
        collect_value(
            &serde_json::to_value(&doc.encumbrance_entries)?,
            &mut parsed.section_b,
        );
        Ok(parsed)
    }

    pub fn combined(&self) -> TokenCounts {
        let mut all = self.title.clone();
        all.merge(&self.section_a);
        all.merge(&self.section_b);
        all
    }
}

/// Walk a JSON value and tokenize everything a reader could see in the
/// document. Booleans and nulls carry no ink; excluded keys are metadata.
pub fn collect_value(value: &Value, counts: &mut TokenCounts) {
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                if !EXCLUDED_KEYS.contains(&key.as_str()) {
                    collect_value(v, counts);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_value(item, counts);
            }
        }
        Value::String(s) => counts.add_text(s),
        Value::Number(n) => {
            for form in numeric_forms(n) {
                counts.add_text(&form);
            }
        }
        Value::Bool(_) | Value::Null => {}
    }
}

/// Textual forms a number takes in the source. Amounts are printed with
/// thousands separators, so an integer ≥ 1000 also yields its comma form;
/// an integral float also yields its integer form.
fn numeric_forms(n: &serde_json::Number) -> Vec<String> {
    let mut forms = Vec::new();
    if let Some(i) = n.as_i64() {
        if i == 0 {
            return forms;
        }
        forms.push(i.to_string());
        if i.abs() >= 1000 {
            forms.push(comma_format(i));
        }
    } else if let Some(f) = n.as_f64() {
        if f == 0.0 {
            return forms;
        }
        forms.push(format!("{f}"));
        if f.fract() == 0.0 {
            let i = f as i64;
            forms.push(i.to_string());
            if i.abs() >= 1000 {
                forms.push(comma_format(i));
            }
        }
    }
    forms
}

fn comma_format(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        format!("-{out}")
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use registry_types::{OwnerInfo, OwnershipEntry};
    use serde_json::json;

    #[test]
    fn test_comma_format() {
        assert_eq!(comma_format(1000), "1,000");
        assert_eq!(comma_format(203_500_000), "203,500,000");
        assert_eq!(comma_format(999), "999");
        assert_eq!(comma_format(-1500), "-1,500");
    }

    #[test]
    fn test_numeric_forms() {
        let v = json!(360000000);
        let Value::Number(n) = v else { unreachable!() };
        assert_eq!(numeric_forms(&n), vec!["360000000", "360,000,000"]);

        let v = json!(84.97);
        let Value::Number(n) = v else { unreachable!() };
        assert_eq!(numeric_forms(&n), vec!["84.97"]);

        let v = json!(0);
        let Value::Number(n) = v else { unreachable!() };
        assert!(numeric_forms(&n).is_empty());
    }

    #[test]
    fn test_excluded_keys_skipped() {
        let mut counts = TokenCounts::default();
        collect_value(
            &json!({"raw_text": "비밀텍스트", "cause": "매매", "is_cancelled": true}),
            &mut counts,
        );
        assert_eq!(counts.count("비밀텍스트"), 0);
        assert_eq!(counts.count("매매"), 1);
    }

    #[test]
    fn test_from_document_partitions_sections() {
        let doc = RegistryDocument {
            unique_number: "1146-1996-020034".into(),
            property_address: "서울특별시 강남구 역삼동 123-4".into(),
            ownership_entries: vec![OwnershipEntry {
                rank_number: "1".into(),
                registration_type: "소유권보존".into(),
                owners: vec![OwnerInfo {
                    name: "홍길동".into(),
                    resident_number: None,
                    address: None,
                    share: None,
                    role: Some("소유자".into()),
                }],
                claim_amount: Some(203_500_000),
                ..Default::default()
            }],
            ..Default::default()
        };
        let parsed = ParsedTokens::from_document(&doc).unwrap();
        assert_eq!(parsed.title.count("1146"), 1);
        assert_eq!(parsed.title.count("강남구"), 1);
        assert_eq!(parsed.section_a.count("소유권보존"), 1);
        assert_eq!(parsed.section_a.count("홍길동"), 1);
        // comma form of the trade amount matches the source rendering
        assert_eq!(parsed.section_a.count("203"), 1);
        assert_eq!(parsed.section_b.total(), 0);
    }
}
