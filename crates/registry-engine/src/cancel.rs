//! Strike-through detection and cancellation propagation.
//!
//! A cancelled entry is struck through in red ink. Red ink is collected per
//! page as merged vertical ranges; a row whose band intersects one is
//! cancelled. Rank back-references in 말소 rows then propagate the state to
//! the entry they erase, which also covers documents rendered without the
//! red layer.

use lazy_static::lazy_static;
use regex::Regex;
use registry_layout::PageLayout;

use crate::config::ParseConfig;
use crate::rows::RawRow;

// Red ink within this distance of a row band marks the row.
const STRIKE_REACH: f64 = 6.0;

lazy_static! {
    static ref CANCEL_REF_RE: Regex = Regex::new(r"(\d+(?:-\d+)?)번?\S*말소").unwrap();
}

// Causes that terminate the referenced right even when the strike-through
// is missing.
const CANCEL_CAUSES: &[&str] = &["해지", "해제", "취하", "취소", "압류해제"];

#[derive(Debug, Default)]
pub struct CancellationDetector {
    // page index -> merged (lo, hi) ranges of red ink
    ranges: Vec<Vec<(f64, f64)>>,
}

impl CancellationDetector {
    pub fn from_pages(pages: &[PageLayout], cfg: &ParseConfig) -> Self {
        let reddish = |c: &registry_layout::Rgb| c.is_reddish(cfg.strike_red_min, cfg.strike_other_max);
        let mut ranges = Vec::with_capacity(pages.len());
        for page in pages {
            let mut ys: Vec<(f64, f64)> = Vec::new();
            for line in &page.lines {
                if reddish(&line.color) && line.is_horizontal() {
                    let y = line.y_mid();
                    ys.push((y - STRIKE_REACH, y + STRIKE_REACH));
                }
            }
            for rect in &page.rects {
                if reddish(&rect.color) {
                    ys.push((rect.bbox.top - STRIKE_REACH, rect.bbox.bottom + STRIKE_REACH));
                }
            }
            for ch in &page.chars {
                if reddish(&ch.color) {
                    let y = ch.baseline();
                    ys.push((y - STRIKE_REACH, y + STRIKE_REACH));
                }
            }
            ranges.push(merge_ranges(ys));
        }
        Self { ranges }
    }

    /// Any red ink touching the row's vertical band?
    pub fn is_row_cancelled(&self, page: usize, top: f64, bottom: f64) -> bool {
        self.ranges
            .get(page)
            .map(|rs| rs.iter().any(|&(lo, hi)| lo <= bottom && hi >= top))
            .unwrap_or(false)
    }

    /// Stamp the strike-through state onto freshly segmented rows.
    pub fn mark_rows(&self, rows: &mut [RawRow]) {
        for row in rows {
            row.is_cancelled = self.is_row_cancelled(row.page, row.top, row.bottom);
        }
    }
}

fn merge_ranges(mut ys: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    ys.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    let mut merged: Vec<(f64, f64)> = Vec::new();
    for (lo, hi) in ys {
        match merged.last_mut() {
            Some(last) if lo <= last.1 => last.1 = last.1.max(hi),
            _ => merged.push((lo, hi)),
        }
    }
    merged
}

/// Rank referenced by a 말소 registration ("2번근저당권설정등기말소" -> "2").
pub fn cancel_target(text: &str) -> Option<String> {
    CANCEL_REF_RE
        .captures(&text.split_whitespace().collect::<String>())
        .map(|c| c[1].to_string())
}

/// Entry-type-independent view used by cancellation propagation.
pub trait Cancellable {
    fn rank_number(&self) -> &str;
    fn registration_type(&self) -> &str;
    fn cause(&self) -> &str;
    fn cancels_rank_number(&self) -> Option<&str>;
    fn is_cancelled(&self) -> bool;
    fn set_cancelled(&mut self, by: Option<String>);
}

/// Propagate 말소 back-references: the entry a cancel row names becomes
/// cancelled and records who erased it. Applies when the row is a 말소
/// registration or carries a terminating cause.
pub fn map_cancellations<T: Cancellable>(entries: &mut [T]) {
    let mut cancelled: Vec<(String, String)> = Vec::new();
    for entry in entries.iter() {
        let Some(target) = entry.cancels_rank_number() else {
            continue;
        };
        let is_cancel_event = entry.registration_type().contains("말소")
            || CANCEL_CAUSES.iter().any(|c| entry.cause().contains(c));
        if is_cancel_event {
            cancelled.push((target.to_string(), entry.rank_number().to_string()));
        }
    }
    for (target, by) in cancelled {
        for entry in entries.iter_mut() {
            if entry.rank_number() == target {
                entry.set_cancelled(Some(by.clone()));
            }
        }
    }
}
