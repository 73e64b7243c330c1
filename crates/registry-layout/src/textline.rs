//! Baseline bucketing of chars into ordered text lines.

use serde::{Deserialize, Serialize};

use crate::page::Char;

const BASELINE_TOLERANCE: f64 = 3.0;
// Horizontal gap that becomes a space in the assembled text.
const WORD_GAP: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    pub top: f64,
    pub bottom: f64,
}

/// Bucket chars by baseline into top-to-bottom lines, left-to-right within
/// each line. The viewing-copy watermark token survives the grey filter in
/// some producers as near-black ink, so it is stripped here as well.
pub fn assemble_lines(chars: &[Char]) -> Vec<TextLine> {
    let mut sorted: Vec<&Char> = chars.iter().collect();
    sorted.sort_by(|a, b| {
        a.baseline()
            .partial_cmp(&b.baseline())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut lines: Vec<Vec<&Char>> = Vec::new();
    for ch in sorted {
        match lines.last_mut() {
            Some(line)
                if (ch.baseline() - line[0].baseline()).abs() <= BASELINE_TOLERANCE =>
            {
                line.push(ch);
            }
            _ => lines.push(vec![ch]),
        }
    }

    lines
        .into_iter()
        .filter_map(|mut line| {
            line.sort_by(|a, b| {
                a.bbox
                    .x0
                    .partial_cmp(&b.bbox.x0)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let mut text = String::new();
            let mut prev_x1: Option<f64> = None;
            let mut top = f64::MAX;
            let mut bottom = f64::MIN;
            for ch in &line {
                if let Some(px) = prev_x1 {
                    if ch.bbox.x0 - px > WORD_GAP {
                        text.push(' ');
                    }
                }
                text.push_str(&ch.text);
                prev_x1 = Some(ch.bbox.x1);
                top = top.min(ch.bbox.top);
                bottom = bottom.max(ch.bbox.bottom);
            }
            let text = text.replace("열람용", "");
            let text = text.trim().to_string();
            if text.is_empty() {
                None
            } else {
                Some(TextLine { text, top, bottom })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BBox, BLACK};
    use pretty_assertions::assert_eq;

    fn ch(text: &str, x0: f64, top: f64) -> Char {
        Char {
            text: text.into(),
            bbox: BBox::new(x0, top, x0 + 10.0, top + 12.0),
            color: BLACK,
        }
    }

    #[test]
    fn test_lines_ordered_top_to_bottom() {
        let chars = vec![ch("을", 50.0, 200.0), ch("갑", 50.0, 100.0)];
        let lines = assemble_lines(&chars);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "갑");
        assert_eq!(lines[1].text, "을");
    }

    #[test]
    fn test_gap_becomes_space() {
        let chars = vec![ch("갑", 50.0, 100.0), ch("구", 60.0, 100.0), ch("1", 120.0, 100.0)];
        let lines = assemble_lines(&chars);
        assert_eq!(lines[0].text, "갑구 1");
    }

    #[test]
    fn test_viewing_watermark_token_stripped() {
        let chars = vec![ch("열", 50.0, 100.0), ch("람", 60.0, 100.0), ch("용", 70.0, 100.0)];
        assert!(assemble_lines(&chars).is_empty());
    }

    #[test]
    fn test_jittered_baseline_same_line() {
        let chars = vec![ch("소", 50.0, 100.0), ch("유", 60.0, 101.5)];
        let lines = assemble_lines(&chars);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "소유");
    }
}
