//! The 1.0.0 certificate parser: layout extraction, section segmentation,
//! entry building, cancellation propagation.

use lazy_static::lazy_static;
use regex::Regex;
use registry_layout::{assemble_lines, cell_grid, LayoutDocument};
use registry_types::{
    EncumbranceEntry, OwnershipEntry, ParseError, ParseNote, PropertyType, RegistryDocument,
};

use crate::cancel::CancellationDetector;
use crate::config::ParseConfig;
use crate::deadline::Deadline;
use crate::extract::{encumbrance, ownership, title};
use crate::mask;
use crate::plugin::{DocumentTypeInfo, RegistryParser};
use crate::rows::{self, RawRow};
use crate::section::{self, PageContent, SectionBlock, SectionKind, TitlePart};
use crate::textutil::{clean_text, compact, normalize_timestamp};

pub const VERSION: &str = "1.0.0";

// Below this the text layer is present but suspiciously thin.
const SHORT_TEXT_WARN: usize = 1000;

lazy_static! {
    static ref UNIQUE_NUMBER_RE: Regex = Regex::new(r"고유번호\s*([\d-]+)").unwrap();
    static ref BANNER_RE: Regex =
        Regex::new(r"\[\s*(토지|건물|집합건물)\s*\]\s*([^\n]+)").unwrap();
    static ref VIEWED_AT_RE: Regex = Regex::new(r"열람일시\s*[:：]?\s*([^\n]+)").unwrap();
    static ref ISSUED_AT_RE: Regex =
        Regex::new(r"(?:발행일시|발급일시)\s*[:：]?\s*([^\n]+)").unwrap();
}

// Detection keyword weights, capped at 1.0.
const DETECTION_WEIGHTS: &[(&str, f32)] = &[
    ("고유번호", 0.3),
    ("표제부", 0.2),
    ("갑구", 0.2),
    ("을구", 0.1),
    ("등기사항전부증명서", 0.15),
    ("등기부등본", 0.15),
    ("[토지]", 0.05),
    ("[건물]", 0.05),
    ("[집합건물]", 0.05),
];

pub struct V1Parser {
    config: ParseConfig,
}

impl V1Parser {
    pub fn new(config: ParseConfig) -> Self {
        Self { config }
    }
}

impl RegistryParser for V1Parser {
    fn document_type_info(&self) -> DocumentTypeInfo {
        DocumentTypeInfo {
            type_id: "registry",
            display_name: "등기부등본",
            sub_types: &["land", "building", "aggregate_building"],
        }
    }

    fn parser_version(&self) -> &'static str {
        VERSION
    }

    fn can_parse(&self, pdf_head: &[u8], text_sample: &str) -> f32 {
        if !pdf_head.starts_with(b"%PDF") {
            return 0.0;
        }
        let sample = compact(text_sample);
        let score: f32 = DETECTION_WEIGHTS
            .iter()
            .filter(|(k, _)| sample.contains(&compact(k)))
            .map(|(_, w)| w)
            .sum();
        score.min(1.0)
    }

    fn parse(&self, pdf_bytes: &[u8]) -> Result<RegistryDocument, ParseError> {
        let deadline = Deadline::new(self.config.timeout());
        tracing::info!(bytes = pdf_bytes.len(), version = VERSION, "starting parse");

        let doc = LayoutDocument::load(pdf_bytes)?;
        let opts = self.config.layout_options();

        let mut layouts = Vec::with_capacity(doc.page_count());
        let mut contents = Vec::with_capacity(doc.page_count());
        let mut page_texts = Vec::with_capacity(doc.page_count());
        for index in 0..doc.page_count() {
            deadline.check()?;
            let page = doc.extract_page(index, &opts)?;
            let lines = assemble_lines(&page.chars);
            let grid = cell_grid(&page, &opts);
            page_texts.push(
                lines
                    .iter()
                    .map(|l| l.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
            contents.push(PageContent { index, lines, grid });
            layouts.push(page);
        }
        let raw_text = page_texts.join("\n");

        let char_count = raw_text.chars().count();
        if char_count < self.config.min_text_chars {
            return Err(ParseError::ExtractionFailure(format!(
                "text layer has {char_count} chars, document appears to be scanned"
            )));
        }
        let mut notes: Vec<ParseNote> = Vec::new();
        if char_count < SHORT_TEXT_WARN {
            notes.push(ParseNote::text_too_short(char_count));
        }

        deadline.check()?;
        let detector = CancellationDetector::from_pages(&layouts, &self.config);
        let mut blocks = section::segment(&contents);
        for block in &mut blocks {
            detector.mark_rows(&mut block.rows);
        }

        deadline.check()?;
        let title_blocks: Vec<&SectionBlock> = blocks
            .iter()
            .filter(|b| b.kind == SectionKind::Title)
            .collect();
        if title_blocks.is_empty() {
            notes.push(ParseNote::section_not_found("표제부"));
        }
        let mut title_info = title::extract(&title_blocks, &mut notes);

        deadline.check()?;
        let (ownership_entries, encumbrance_entries) = build_entries(&blocks, &mut notes);

        let banner = banner_info(&raw_text);
        let property_type = match banner.as_ref().map(|(t, _)| *t) {
            // A 건물 banner on a document with aggregate title blocks is the
            // plain-building form of an aggregate certificate.
            Some(PropertyType::Building) if has_aggregate_parts(&blocks) => {
                PropertyType::AggregateBuilding
            }
            Some(t) => t,
            None => property_type_from_blocks(&blocks),
        };
        let property_address = banner
            .map(|(_, addr)| addr)
            .unwrap_or_else(|| title_info.address.clone());

        let unique_number = UNIQUE_NUMBER_RE
            .captures(&raw_text)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        title_info.unique_number = unique_number.clone();
        title_info.property_type = property_type;
        if title_info.address.is_empty() {
            title_info.address = property_address.clone();
        }

        let viewed_at = VIEWED_AT_RE
            .captures(&raw_text)
            .map(|c| normalize_timestamp(clean_text(&c[1]).as_str()));
        let issued_at = ISSUED_AT_RE
            .captures(&raw_text)
            .map(|c| normalize_timestamp(clean_text(&c[1]).as_str()));

        tracing::info!(
            address = %property_address,
            ownership = ownership_entries.len(),
            encumbrance = encumbrance_entries.len(),
            notes = notes.len(),
            elapsed = ?deadline.elapsed(),
            "parse complete"
        );

        Ok(RegistryDocument {
            unique_number,
            property_type,
            property_address,
            title_info,
            ownership_entries,
            encumbrance_entries,
            viewed_at,
            issued_at,
            raw_text,
            parse_date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            parser_version: VERSION.to_string(),
            errors: notes,
        })
    }

    fn mask_for_demo(&self, doc: &RegistryDocument) -> RegistryDocument {
        mask::mask_document(doc)
    }
}

/// Entry lists for both main sections. A section whose heading never
/// appeared yields an empty list and a section_not_found note.
fn build_entries(
    blocks: &[SectionBlock],
    notes: &mut Vec<ParseNote>,
) -> (Vec<OwnershipEntry>, Vec<EncumbranceEntry>) {
    let ownership = match entry_rows(blocks, SectionKind::Ownership, "갑구", notes) {
        Some(rows) => ownership::extract_entries(&rows, notes),
        None => {
            notes.push(ParseNote::section_not_found("갑구"));
            Vec::new()
        }
    };
    let encumbrance = match entry_rows(blocks, SectionKind::Encumbrance, "을구", notes) {
        Some(rows) => encumbrance::extract_entries(&rows, notes),
        None => {
            notes.push(ParseNote::section_not_found("을구"));
            Vec::new()
        }
    };
    (ownership, encumbrance)
}

/// Rows of all blocks of one kind, headers filtered, continuations merged.
/// None when the section never appeared.
fn entry_rows(
    blocks: &[SectionBlock],
    kind: SectionKind,
    label: &str,
    notes: &mut Vec<ParseNote>,
) -> Option<Vec<RawRow>> {
    let mut found = false;
    let section_rows: Vec<RawRow> = blocks
        .iter()
        .filter(|b| b.kind == kind)
        .inspect(|_| found = true)
        .flat_map(|b| b.rows.iter())
        .filter(|r| !rows::is_column_header(r) && !rows::is_contaminating(r))
        .cloned()
        .collect();
    if !found {
        return None;
    }
    Some(rows::merge_continuation_rows(section_rows, label, notes))
}

fn banner_info(raw_text: &str) -> Option<(PropertyType, String)> {
    let caps = BANNER_RE.captures(raw_text)?;
    let property_type = match &caps[1] {
        "토지" => PropertyType::Land,
        "집합건물" => PropertyType::AggregateBuilding,
        _ => PropertyType::Building,
    };
    // The banner line trails the unique number on some layouts.
    let address = clean_text(caps[2].split("고유번호").next().unwrap_or(""));
    Some((property_type, address))
}

fn has_aggregate_parts(blocks: &[SectionBlock]) -> bool {
    blocks.iter().any(|b| {
        matches!(
            b.part,
            Some(TitlePart::Exclusive) | Some(TitlePart::LandRightRatio) | Some(TitlePart::LandRightLand)
        )
    })
}

fn property_type_from_blocks(blocks: &[SectionBlock]) -> PropertyType {
    if has_aggregate_parts(blocks) {
        return PropertyType::AggregateBuilding;
    }
    let has_building = blocks.iter().any(|b| b.part == Some(TitlePart::Building));
    let has_land = blocks.iter().any(|b| b.part == Some(TitlePart::Land));
    match (has_building, has_land) {
        (false, true) => PropertyType::Land,
        _ => PropertyType::Building,
    }
}
