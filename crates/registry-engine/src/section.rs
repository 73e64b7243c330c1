//! Section segmentation.
//!
//! Certificates are one logical document flowing over many pages; a section
//! heading opens a block and every following table row belongs to it until
//! the next heading, across page boundaries. Headings appear either as the
//! first row of a table or as free-standing text above one.

use registry_layout::{CellGrid, TextLine};

use crate::rows::RawRow;
use crate::textutil::compact;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// 표제부 in any of its shapes.
    Title,
    /// 갑구, ownership.
    Ownership,
    /// 을구, encumbrances.
    Encumbrance,
    /// Summary and list tables that must not be parsed as entries.
    Skip,
}

/// Which 표제부 table a title block holds. Aggregate buildings carry up to
/// four of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitlePart {
    Land,
    Building,
    Exclusive,
    LandRightLand,
    LandRightRatio,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionBlock {
    pub kind: SectionKind,
    pub part: Option<TitlePart>,
    pub rows: Vec<RawRow>,
}

/// One page's extracted content, ready for segmentation.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub index: usize,
    pub lines: Vec<TextLine>,
    pub grid: CellGrid,
}

// Ordered, specific headings before general ones. 대지권의 목적인 토지 must
// win over the plain 토지의 표시, and 1동의 건물 over 건물의 표시.
fn detect_heading(text: &str) -> Option<(SectionKind, Option<TitlePart>)> {
    if text.contains("대지권의목적인토지의표시") {
        return Some((SectionKind::Title, Some(TitlePart::LandRightLand)));
    }
    if text.contains("대지권의표시") {
        return Some((SectionKind::Title, Some(TitlePart::LandRightRatio)));
    }
    if text.contains("전유부분의건물의표시") {
        return Some((SectionKind::Title, Some(TitlePart::Exclusive)));
    }
    if text.contains("1동의건물의표시") {
        return Some((SectionKind::Title, Some(TitlePart::Building)));
    }
    if text.contains("토지의표시") {
        return Some((SectionKind::Title, Some(TitlePart::Land)));
    }
    if text.contains("건물의표시") {
        return Some((SectionKind::Title, Some(TitlePart::Building)));
    }
    if text.contains("표제부") {
        return Some((SectionKind::Title, None));
    }
    if text.contains("【갑구】") || (text.contains("갑구") && text.contains("소유권에관한사항")) {
        return Some((SectionKind::Ownership, None));
    }
    if text.contains("【을구】")
        || (text.contains("을구") && text.contains("소유권이외의권리"))
    {
        return Some((SectionKind::Encumbrance, None));
    }
    if text.contains("공동담보목록")
        || text.contains("매각물건목록")
        || text.contains("매매목록")
        || text.contains("주요등기사항요약")
    {
        return Some((SectionKind::Skip, None));
    }
    None
}

// A bare 표제부 heading leaves the part open; the column-header row that
// follows settles it.
fn classify_columns(text: &str) -> Option<TitlePart> {
    if text.contains("대지권종류") || text.contains("대지권비율") {
        return Some(TitlePart::LandRightRatio);
    }
    if text.contains("건물번호") {
        return Some(TitlePart::Exclusive);
    }
    if text.contains("건물내역") {
        return Some(TitlePart::Building);
    }
    if text.contains("지목") {
        return Some(TitlePart::Land);
    }
    None
}

/// Walk the pages top to bottom and split their table rows into section
/// blocks. Rows seen before any heading are discarded (page banners sit
/// above the first table).
pub fn segment(pages: &[PageContent]) -> Vec<SectionBlock> {
    enum Event<'a> {
        Line(&'a TextLine),
        Row(usize, &'a registry_layout::GridRow),
    }

    let mut blocks: Vec<SectionBlock> = Vec::new();

    for page in pages {
        let mut events: Vec<(f64, Event)> = page
            .lines
            .iter()
            .map(|l| (l.top, Event::Line(l)))
            .chain(page.grid.rows.iter().map(|r| (r.top, Event::Row(page.index, r))))
            .collect();
        events.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        for (_, event) in events {
            match event {
                Event::Line(line) => {
                    if let Some((kind, part)) = detect_heading(&compact(&line.text)) {
                        open_block(&mut blocks, kind, part);
                    }
                }
                Event::Row(page_index, row) => {
                    let text = compact(&row.joined());
                    if let Some((kind, part)) = detect_heading(&text) {
                        open_block(&mut blocks, kind, part);
                        continue;
                    }
                    let Some(block) = blocks.last_mut() else {
                        continue;
                    };
                    if block.kind == SectionKind::Title && block.part.is_none() {
                        block.part = classify_columns(&text);
                    }
                    block.rows.push(RawRow {
                        page: page_index,
                        top: row.top,
                        bottom: row.bottom,
                        cells: row.cells.clone(),
                        is_cancelled: false,
                    });
                }
            }
        }
    }

    blocks
}

fn open_block(blocks: &mut Vec<SectionBlock>, kind: SectionKind, part: Option<TitlePart>) {
    // A repeated heading on the next page continues the same block.
    if let Some(last) = blocks.last() {
        if last.kind == kind && last.part == part {
            return;
        }
    }
    blocks.push(SectionBlock {
        kind,
        part,
        rows: Vec::new(),
    });
}
