//! Table-row normalization: header skipping and continuation-row merging.

use lazy_static::lazy_static;
use regex::Regex;
use registry_types::ParseNote;

use crate::textutil::compact;

lazy_static! {
    static ref RANK_RE: Regex = Regex::new(r"^\d+(?:-\d+)?").unwrap();
}

// Column headers of the four table layouts.
const COLUMN_HEADER_KEYWORDS: &[&str] = &["순위번호", "표시번호"];

// Fragments of the summary tables appended after the main sections. Rows
// carrying these belong to 주요 등기사항 요약 or the auction/sale lists and
// must never be parsed as entries.
const CONTAMINATING_KEYWORDS: &[&str] = &[
    "등기명의인",
    "주요등기사항",
    "대상소유자",
    "공동담보",
    "매각물건",
    "매매목록",
    "목록번호",
    "거래가액",
];

/// One table row as the layout pass produced it, tagged with its page and
/// vertical span so strike-through ink can be matched back to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub page: usize,
    pub top: f64,
    pub bottom: f64,
    pub cells: Vec<String>,
    pub is_cancelled: bool,
}

impl RawRow {
    /// Rank cell, first column by convention.
    pub fn rank_cell(&self) -> &str {
        self.cells.first().map(|c| c.trim()).unwrap_or("")
    }

    /// True when the rank cell opens with a rank number ("1", "2-1", ...).
    pub fn has_rank(&self) -> bool {
        RANK_RE.is_match(self.rank_cell())
    }

    pub fn joined(&self) -> String {
        self.cells
            .iter()
            .filter(|c| !c.trim().is_empty())
            .map(|c| c.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// Column-header row ("순위번호 등기목적 접수 ..." and friends).
pub fn is_column_header(row: &RawRow) -> bool {
    let text = compact(&row.joined());
    COLUMN_HEADER_KEYWORDS.iter().any(|k| text.contains(k))
}

/// Row leaked in from a summary or list table.
pub fn is_contaminating(row: &RawRow) -> bool {
    let text = compact(&row.joined());
    CONTAMINATING_KEYWORDS.iter().any(|k| text.contains(k))
}

/// Merge continuation rows into their parent entry row.
///
/// A row without a leading rank number continues the previous entry: its
/// cells are newline-joined column-wise and a strike-through on either part
/// marks the merged entry cancelled. A continuation with no parent is
/// dropped with a note, which happens when a section starts mid-entry on a
/// truncated document.
pub fn merge_continuation_rows(
    rows: Vec<RawRow>,
    section: &str,
    notes: &mut Vec<ParseNote>,
) -> Vec<RawRow> {
    let mut merged: Vec<RawRow> = Vec::new();
    for row in rows {
        if row.is_empty() {
            continue;
        }
        if row.has_rank() {
            merged.push(row);
            continue;
        }
        match merged.last_mut() {
            Some(parent) => {
                for (i, cell) in row.cells.iter().enumerate() {
                    let cell = cell.trim();
                    if cell.is_empty() {
                        continue;
                    }
                    if i >= parent.cells.len() {
                        parent.cells.resize(i + 1, String::new());
                    }
                    if parent.cells[i].is_empty() {
                        parent.cells[i] = cell.to_string();
                    } else {
                        parent.cells[i].push('\n');
                        parent.cells[i].push_str(cell);
                    }
                }
                parent.bottom = parent.bottom.max(row.bottom);
                parent.is_cancelled |= row.is_cancelled;
            }
            None => {
                notes.push(ParseNote::dropped_leading_row(section));
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(cells: &[&str]) -> RawRow {
        RawRow {
            page: 0,
            top: 0.0,
            bottom: 10.0,
            cells: cells.iter().map(|c| c.to_string()).collect(),
            is_cancelled: false,
        }
    }

    #[test]
    fn test_rank_detection() {
        assert!(row(&["1", "소유권보존"]).has_rank());
        assert!(row(&["2-1", "등기명의인표시변경"]).has_rank());
        assert!(!row(&["", "서울특별시"]).has_rank());
        assert!(!row(&["순위번호", "등기목적"]).has_rank());
    }

    #[test]
    fn test_column_header_and_contamination() {
        assert!(is_column_header(&row(&["순위번호", "등기목적", "접수"])));
        assert!(is_column_header(&row(&["표시번호", "접수", "소재지번"])));
        assert!(!is_column_header(&row(&["1", "소유권이전"])));
        assert!(is_contaminating(&row(&["등기명의인", "(주민)등록번호"])));
        assert!(!is_contaminating(&row(&["1", "근저당권설정"])));
    }

    #[test]
    fn test_continuation_merged_with_newline() {
        let rows = vec![
            row(&["2", "소유권이전", "2007년9월11일", "매매", "소유자 홍길동"]),
            row(&["", "", "", "", "서울특별시 강남구"]),
        ];
        let mut notes = Vec::new();
        let merged = merge_continuation_rows(rows, "갑구", &mut notes);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].cells[4], "소유자 홍길동\n서울특별시 강남구");
        assert!(notes.is_empty());
    }

    #[test]
    fn test_sub_rank_row_stays_distinct() {
        let rows = vec![
            row(&["1", "소유권보존"]),
            row(&["1-1", "등기명의인표시변경"]),
            row(&["", "서울특별시 강남구"]),
        ];
        let mut notes = Vec::new();
        let merged = merge_continuation_rows(rows, "갑구", &mut notes);
        let ranks: Vec<&str> = merged.iter().map(|r| r.rank_cell()).collect();
        assert_eq!(ranks, vec!["1", "1-1"]);
        // The blank-rank row continues 1-1, not 1
        assert_eq!(merged[1].cells[1], "등기명의인표시변경\n서울특별시 강남구");
        assert_eq!(merged[0].cells[1], "소유권보존");
        assert!(notes.is_empty());
    }

    #[test]
    fn test_cancelled_continuation_propagates() {
        let mut second = row(&["", "", "", "", "계속"]);
        second.is_cancelled = true;
        let merged = merge_continuation_rows(
            vec![row(&["3", "근저당권설정"]), second],
            "을구",
            &mut Vec::new(),
        );
        assert!(merged[0].is_cancelled);
    }

    #[test]
    fn test_orphan_continuation_dropped_with_note() {
        let mut notes = Vec::new();
        let merged = merge_continuation_rows(vec![row(&["", "이어진 내용"])], "갑구", &mut notes);
        assert!(merged.is_empty());
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].code, "dropped_leading_row");
    }

    #[test]
    fn test_empty_rows_skipped() {
        let merged = merge_continuation_rows(
            vec![row(&["", ""]), row(&["1", "소유권보존"])],
            "갑구",
            &mut Vec::new(),
        );
        assert_eq!(merged.len(), 1);
    }
}
