//! Table-cell reconstruction from ruling lines.
//!
//! Registry tables are fully ruled: every row and column boundary is drawn.
//! The grid is built from horizontal and vertical rulings, excluding red
//! strokes (strike-through marks are not structure), and chars are assigned
//! to cells by center containment.

use serde::{Deserialize, Serialize};

use crate::page::{LayoutOptions, PageLayout};

// Rulings closer than this are the same boundary drawn twice.
const CLUSTER_TOLERANCE: f64 = 2.0;
const BASELINE_TOLERANCE: f64 = 3.0;
const WORD_GAP: f64 = 2.0;

/// One table row: the vertical band between two horizontal rulings, with
/// one string per column. Multi-line cell content is newline-joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRow {
    pub top: f64,
    pub bottom: f64,
    pub cells: Vec<String>,
}

impl GridRow {
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }

    /// All cell text joined, for pattern matching over the whole row.
    pub fn joined(&self) -> String {
        self.cells
            .iter()
            .filter(|c| !c.trim().is_empty())
            .map(|c| c.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CellGrid {
    pub rows: Vec<GridRow>,
}

fn cluster(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut out: Vec<f64> = Vec::new();
    for v in values {
        match out.last() {
            Some(&last) if (v - last).abs() <= CLUSTER_TOLERANCE => {}
            _ => out.push(v),
        }
    }
    out
}

/// Build the cell grid for a page. Returns an empty grid when the page has
/// no recognizable table frame.
pub fn cell_grid(page: &PageLayout, opts: &LayoutOptions) -> CellGrid {
    let not_strike =
        |color: &crate::geometry::Rgb| !color.is_reddish(opts.strike_red_min, opts.strike_other_max);

    let mut ys: Vec<f64> = page
        .lines
        .iter()
        .filter(|l| l.is_horizontal() && not_strike(&l.color))
        .map(|l| l.y_mid())
        .collect();
    ys.extend(
        page.rects
            .iter()
            .filter(|r| r.is_thin_horizontal() && not_strike(&r.color))
            .map(|r| r.bbox.center_y()),
    );

    let mut xs: Vec<f64> = page
        .lines
        .iter()
        .filter(|l| l.is_vertical() && not_strike(&l.color))
        .map(|l| (l.x0 + l.x1) / 2.0)
        .collect();
    xs.extend(
        page.rects
            .iter()
            .filter(|r| r.is_thin_vertical() && not_strike(&r.color))
            .map(|r| r.bbox.center_x()),
    );

    let ys = cluster(ys);
    let xs = cluster(xs);
    if ys.len() < 2 || xs.len() < 2 {
        return CellGrid::default();
    }

    let ncols = xs.len() - 1;
    let mut rows = Vec::with_capacity(ys.len() - 1);
    for band in ys.windows(2) {
        let (top, bottom) = (band[0], band[1]);
        let mut cells: Vec<Vec<&crate::page::Char>> = vec![Vec::new(); ncols];
        for ch in &page.chars {
            let cy = ch.bbox.center_y();
            if cy < top || cy > bottom {
                continue;
            }
            let cx = ch.bbox.center_x();
            if let Some(col) = xs.windows(2).position(|b| cx >= b[0] && cx <= b[1]) {
                cells[col].push(ch);
            }
        }
        rows.push(GridRow {
            top,
            bottom,
            cells: cells.into_iter().map(cell_text).collect(),
        });
    }

    CellGrid { rows }
}

/// Order a cell's chars into newline-joined visual lines.
fn cell_text(mut chars: Vec<&crate::page::Char>) -> String {
    chars.sort_by(|a, b| {
        a.baseline()
            .partial_cmp(&b.baseline())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                a.bbox
                    .x0
                    .partial_cmp(&b.bbox.x0)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut line_baseline: Option<f64> = None;
    let mut prev_x1: Option<f64> = None;
    for ch in chars {
        let new_line = match line_baseline {
            Some(b) => (ch.baseline() - b).abs() > BASELINE_TOLERANCE,
            None => false,
        };
        if new_line {
            if !current.trim().is_empty() {
                lines.push(current.trim().to_string());
            }
            current = String::new();
            prev_x1 = None;
        }
        if let Some(px) = prev_x1 {
            if ch.bbox.x0 - px > WORD_GAP {
                current.push(' ');
            }
        }
        current.push_str(&ch.text);
        line_baseline = Some(ch.baseline());
        prev_x1 = Some(ch.bbox.x1);
    }
    if !current.trim().is_empty() {
        lines.push(current.trim().to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BBox, Rgb, BLACK};
    use crate::page::{Char, RuleLine};
    use pretty_assertions::assert_eq;

    fn hline(y: f64, color: Rgb) -> RuleLine {
        RuleLine {
            x0: 40.0,
            y0: y,
            x1: 560.0,
            y1: y,
            color,
        }
    }

    fn vline(x: f64) -> RuleLine {
        RuleLine {
            x0: x,
            y0: 100.0,
            x1: x,
            y1: 300.0,
            color: BLACK,
        }
    }

    fn ch(text: &str, x0: f64, top: f64) -> Char {
        Char {
            text: text.into(),
            bbox: BBox::new(x0, top, x0 + 10.0, top + 12.0),
            color: BLACK,
        }
    }

    fn table_page(chars: Vec<Char>, extra_lines: Vec<RuleLine>) -> PageLayout {
        let mut lines = vec![
            hline(100.0, BLACK),
            hline(200.0, BLACK),
            hline(300.0, BLACK),
            vline(40.0),
            vline(150.0),
            vline(560.0),
        ];
        lines.extend(extra_lines);
        PageLayout {
            index: 0,
            width: 595.0,
            height: 842.0,
            chars,
            lines,
            rects: Vec::new(),
        }
    }

    #[test]
    fn test_two_rows_two_columns() {
        let page = table_page(
            vec![ch("1", 60.0, 140.0), ch("갑", 200.0, 140.0), ch("2", 60.0, 240.0)],
            Vec::new(),
        );
        let grid = cell_grid(&page, &LayoutOptions::default());
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[0].cells, vec!["1".to_string(), "갑".to_string()]);
        assert_eq!(grid.rows[1].cells[0], "2");
        assert!(grid.rows[1].cells[1].is_empty());
    }

    #[test]
    fn test_red_strike_line_not_structural() {
        // A red line mid-row must not split the row band in two
        let page = table_page(
            vec![ch("1", 60.0, 140.0)],
            vec![hline(150.0, Rgb::new(1.0, 0.0, 0.0))],
        );
        let grid = cell_grid(&page, &LayoutOptions::default());
        assert_eq!(grid.rows.len(), 2);
    }

    #[test]
    fn test_duplicate_boundaries_clustered() {
        let page = table_page(vec![ch("1", 60.0, 140.0)], vec![hline(100.8, BLACK)]);
        let grid = cell_grid(&page, &LayoutOptions::default());
        assert_eq!(grid.rows.len(), 2);
    }

    #[test]
    fn test_no_frame_empty_grid() {
        let page = PageLayout {
            index: 0,
            width: 595.0,
            height: 842.0,
            chars: vec![ch("표", 60.0, 140.0)],
            lines: Vec::new(),
            rects: Vec::new(),
        };
        assert!(cell_grid(&page, &LayoutOptions::default()).rows.is_empty());
    }

    #[test]
    fn test_multiline_cell_newline_joined() {
        let page = table_page(vec![ch("서", 200.0, 120.0), ch("울", 200.0, 160.0)], Vec::new());
        let grid = cell_grid(&page, &LayoutOptions::default());
        assert_eq!(grid.rows[0].cells[1], "서\n울");
    }

    #[test]
    fn test_joined_skips_empty_cells() {
        let row = GridRow {
            top: 0.0,
            bottom: 10.0,
            cells: vec!["1".into(), "".into(), "소유권보존".into()],
        };
        assert_eq!(row.joined(), "1 소유권보존");
    }
}
