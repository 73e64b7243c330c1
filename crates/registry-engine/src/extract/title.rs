//! 표제부 extraction.
//!
//! Title blocks are folded in document order: a later description row
//! supersedes an earlier one, and struck-through rows are skipped, so the
//! surviving description wins. Aggregate buildings contribute up to four
//! blocks (1동, 전유부분, 대지권의 목적인 토지, 대지권).

use lazy_static::lazy_static;
use regex::Regex;
use registry_types::{FloorArea, ParseNote, TitleInfo};

use crate::rows::{self, RawRow};
use crate::section::{SectionBlock, TitlePart};
use crate::textutil::{clean_text, compact};

// Ordered, compound structures before their substrings.
const STRUCTURES: &[&str] = &[
    "철골철근콘크리트구조",
    "철골철근콘크리트조",
    "철근콘크리트구조",
    "철근콘크리트조",
    "경량철골구조",
    "일반철골구조",
    "철골조",
    "연와조",
    "시멘트벽돌조",
    "벽돌조",
    "블록조",
    "목구조",
    "목조",
    "석조",
];

const ROOFS: &[&str] = &[
    "평슬래브지붕",
    "슬래브지붕",
    "슬라브지붕",
    "스라브지붕",
    "기와지붕",
    "콘크리트지붕",
];

const BUILDING_TYPES: &[&str] = &[
    "아파트",
    "다세대주택",
    "연립주택",
    "다가구주택",
    "단독주택",
    "오피스텔",
    "근린생활시설",
    "공동주택",
    "업무시설",
    "숙박시설",
    "판매시설",
    "창고",
    "공장",
    "주택",
];

lazy_static! {
    static ref FLOOR_RE: Regex = Regex::new(r"(지하)?\s*(\d+)층").unwrap();
    static ref AREA_RE: Regex =
        Regex::new(r"((?:지하)?\d+층|옥탑\d*층|옥탑)\s*([\d,]+(?:\.\d+)?)㎡").unwrap();
    static ref PLAIN_AREA_RE: Regex = Regex::new(r"([\d,]+(?:\.\d+)?)㎡").unwrap();
    static ref RATIO_RE: Regex = Regex::new(r"([\d,.]+)\s*분의\s*([\d,.]+)").unwrap();
    static ref ROAD_ADDRESS_RE: Regex =
        Regex::new(r"\[도로명주소\]\s*([^\n\[【]+)").unwrap();
    static ref BUILDING_NAME_RE: Regex = Regex::new(
        "([가-힣A-Za-z0-9]+(?:아파트|빌라|빌리지|빌딩|타워|오피스텔|맨션|하이츠|\
캐슬|팰리스|파크|프라자|플라자|시티|뷰|힐스))"
    )
    .unwrap();
    static ref LAND_TYPE_RE: Regex = Regex::new(r"^(대|전|답|임야|잡종지|도로|공장용지|학교용지|주차장|창고용지|하천|구거|유지|과수원|목장용지)$").unwrap();
}

// Exclusion marker must sit this close (in chars) to an area figure.
const EXCLUSION_WINDOW: usize = 50;

/// Fold all title blocks into one [`TitleInfo`]. Unique number, property
/// type and the banner address are filled in by the caller.
pub fn extract(blocks: &[&SectionBlock], notes: &mut Vec<ParseNote>) -> TitleInfo {
    let mut info = TitleInfo::default();

    for block in blocks {
        let data_rows: Vec<RawRow> = block
            .rows
            .iter()
            .filter(|r| !rows::is_column_header(r) && !rows::is_contaminating(r))
            .cloned()
            .collect();
        let merged = rows::merge_continuation_rows(data_rows, "표제부", notes);

        for row in merged.iter().filter(|r| !r.is_cancelled) {
            match block.part {
                Some(TitlePart::Land) => fold_land(&mut info, row, true),
                Some(TitlePart::Building) => fold_building(&mut info, row),
                Some(TitlePart::Exclusive) => fold_exclusive(&mut info, row),
                Some(TitlePart::LandRightLand) => fold_land(&mut info, row, false),
                Some(TitlePart::LandRightRatio) => fold_ratio(&mut info, row),
                None => fold_building(&mut info, row),
            }
        }
    }

    info.total_floor_area = info
        .areas
        .iter()
        .filter(|a| !a.is_excluded)
        .map(|a| a.area)
        .sum::<f64>();
    info.total_floor_area = (info.total_floor_area * 100.0).round() / 100.0;
    info
}

// Land rows: 표시번호 접수 소재지번 지목 면적 등기원인. The 대지권의 목적인
// 토지 table describes the underlying lot and must not overwrite the main
// description.
fn fold_land(info: &mut TitleInfo, row: &RawRow, primary: bool) {
    let cell = |i: usize| row.cells.get(i).map(|c| clean_text(c)).unwrap_or_default();
    let (addr_idx, type_idx, area_idx) = if row.cells.len() >= 6 { (2, 3, 4) } else { (1, 2, 3) };

    let address = cell(addr_idx);
    if primary && !address.is_empty() {
        info.address = address;
    }
    let land_type = cell(type_idx);
    if LAND_TYPE_RE.is_match(&land_type) && (primary || info.land_type.is_none()) {
        info.land_type = Some(land_type);
    }
    let area = cell(area_idx);
    if PLAIN_AREA_RE.is_match(&area) && (primary || info.land_area.is_none()) {
        info.land_area = Some(area);
    }
}

// Building rows: 표시번호 접수 소재지번및건물번호 건물내역 등기원인.
fn fold_building(info: &mut TitleInfo, row: &RawRow) {
    let addr_cell = row.cells.get(2).map(|c| c.as_str()).unwrap_or("");
    let detail_cell = row.cells.get(3).map(|c| c.as_str()).unwrap_or("");

    if let Some(caps) = ROAD_ADDRESS_RE.captures(addr_cell) {
        info.road_address = Some(clean_text(&caps[1]));
    }
    let address_part = addr_cell.split("[도로명주소").next().unwrap_or("");
    let address = clean_text(address_part);
    if !address.is_empty() {
        info.address = address;
    }
    // On spaced text the name is a single token; compact text would let the
    // greedy prefix swallow the whole address.
    if let Some(caps) = BUILDING_NAME_RE.captures(&clean_text(addr_cell)) {
        info.building_name = Some(caps[1].to_string());
    }

    fold_building_detail(info, detail_cell);
}

fn fold_building_detail(info: &mut TitleInfo, detail: &str) {
    let text = compact(detail);
    if let Some(s) = STRUCTURES.iter().find(|s| text.contains(*s)) {
        info.structure = Some(s.to_string());
    }
    if let Some(r) = ROOFS.iter().find(|r| text.contains(*r)) {
        info.roof_type = Some(r.to_string());
    }
    if let Some(t) = BUILDING_TYPES.iter().find(|t| text.contains(*t)) {
        info.building_type = Some(t.to_string());
    }

    let floors = FLOOR_RE
        .captures_iter(&text)
        .filter(|c| c.get(1).is_none())
        .filter_map(|c| c[2].parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    if floors > info.floors {
        info.floors = floors;
    }

    let areas = extract_floor_areas(&text);
    if !areas.is_empty() {
        info.areas = areas;
    }
}

fn extract_floor_areas(text: &str) -> Vec<FloorArea> {
    AREA_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0).unwrap();
            let area: f64 = caps[2].replace(',', "").parse().ok()?;
            let window = char_window(text, whole.start(), whole.end(), EXCLUSION_WINDOW);
            Some(FloorArea {
                floor: caps[1].to_string(),
                area,
                is_excluded: window.contains("연면적제외"),
            })
        })
        .collect()
}

// Char-boundary-safe slice of `n` chars either side of a byte range.
fn char_window(text: &str, start: usize, end: usize, n: usize) -> &str {
    let lo = text[..start]
        .char_indices()
        .rev()
        .take(n)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let hi = text[end..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    &text[lo..hi]
}

// Exclusive rows: 표시번호 접수 건물번호 건물내역 등기원인.
fn fold_exclusive(info: &mut TitleInfo, row: &RawRow) {
    let number_cell = row.cells.get(2).map(|c| clean_text(c)).unwrap_or_default();
    let detail_cell = row.cells.get(3).map(|c| c.as_str()).unwrap_or("");

    if !number_cell.is_empty() && !info.address.is_empty() && !info.address.contains(&number_cell) {
        info.address = format!("{} {}", info.address, number_cell);
    }

    let text = compact(detail_cell);
    if info.structure.is_none() {
        info.structure = STRUCTURES.iter().find(|s| text.contains(*s)).map(|s| s.to_string());
    }
    if let Some(caps) = PLAIN_AREA_RE.captures(&text) {
        if let Ok(area) = caps[1].replace(',', "").parse::<f64>() {
            info.exclusive_area = Some(area);
        }
    }
}

// Ratio rows: 표시번호 대지권종류 대지권비율 등기원인.
fn fold_ratio(info: &mut TitleInfo, row: &RawRow) {
    let ratio_cell = row.cells.get(2).map(|c| clean_text(c)).unwrap_or_default();
    if let Some(caps) = RATIO_RE.captures(&ratio_cell) {
        info.land_right_ratio = Some(format!("{}분의 {}", &caps[1], &caps[2]));
    }
}
