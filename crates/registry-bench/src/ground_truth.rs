//! Ground-truth token extraction straight from the PDF text layer.
//!
//! The reference is the document itself: every visible line, minus page
//! chrome, bucketed into the section it belongs to. No hand-labeled data
//! is involved, so the whole corpus is usable as ground truth.

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use registry_layout::{assemble_lines, LayoutDocument, LayoutOptions};

use crate::score::TokenCounts;

lazy_static! {
    // Page chrome: footers, page numbers, boilerplate notices.
    static ref CHROME_RES: Vec<Regex> = vec![
        Regex::new(r"^열람일시").unwrap(),
        Regex::new(r"^발행일시").unwrap(),
        Regex::new(r"^출력일시").unwrap(),
        Regex::new(r"^\d+/\d+$").unwrap(),
        Regex::new(r"이\s*하\s*여\s*백").unwrap(),
        Regex::new(r"^관할등기소").unwrap(),
        Regex::new(r"^인터넷등기소").unwrap(),
        Regex::new(r"^대법원").unwrap(),
        Regex::new(r"수수료").unwrap(),
        Regex::new(r"위변조").unwrap(),
        Regex::new(r"^기록사항\s*없음").unwrap(),
    ];
    static ref SECTION_A_RE: Regex = Regex::new(r"갑\s*구").unwrap();
    static ref SECTION_B_RE: Regex = Regex::new(r"을\s*구").unwrap();
    static ref TITLE_RE: Regex = Regex::new(r"표\s*제\s*부").unwrap();
    static ref SKIP_RE: Regex =
        Regex::new(r"주요\s*등기사항\s*요약|공동담보목록|매각물건목록|매매목록").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Bucket {
    Title,
    SectionA,
    SectionB,
    Skip,
}

/// Ground-truth token counts per section.
#[derive(Debug, Default)]
pub struct GroundTruth {
    pub title: TokenCounts,
    pub section_a: TokenCounts,
    pub section_b: TokenCounts,
}

impl GroundTruth {
    /// Extract from the PDF with the same layout settings the parser uses,
    /// so watermark filtering cannot skew the comparison.
    pub fn from_pdf(pdf_bytes: &[u8], opts: &LayoutOptions) -> anyhow::Result<Self> {
        let doc = LayoutDocument::load(pdf_bytes).context("loading PDF for ground truth")?;
        let mut gt = Self::default();
        // Banner and unique number precede the first heading.
        let mut bucket = Bucket::Title;

        for index in 0..doc.page_count() {
            let page = doc
                .extract_page(index, opts)
                .with_context(|| format!("extracting page {index}"))?;
            for line in assemble_lines(&page.chars) {
                if CHROME_RES.iter().any(|re| re.is_match(&line.text)) {
                    continue;
                }
                if let Some(next) = classify_heading(&line.text) {
                    bucket = next;
                    continue;
                }
                match bucket {
                    Bucket::Title => gt.title.add_text(&line.text),
                    Bucket::SectionA => gt.section_a.add_text(&line.text),
                    Bucket::SectionB => gt.section_b.add_text(&line.text),
                    Bucket::Skip => {}
                }
            }
        }
        Ok(gt)
    }

    pub fn combined(&self) -> TokenCounts {
        let mut all = self.title.clone();
        all.merge(&self.section_a);
        all.merge(&self.section_b);
        all
    }
}

fn classify_heading(text: &str) -> Option<Bucket> {
    if SKIP_RE.is_match(text) {
        return Some(Bucket::Skip);
    }
    // Headings are bracketed; a plain mention inside an entry must not
    // switch buckets.
    if !text.contains('【') && !text.contains('(') {
        return None;
    }
    if TITLE_RE.is_match(text) {
        return Some(Bucket::Title);
    }
    if SECTION_A_RE.is_match(text) {
        return Some(Bucket::SectionA);
    }
    if SECTION_B_RE.is_match(text) {
        return Some(Bucket::SectionB);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_heading() {
        assert_eq!(
            classify_heading("【 갑 구 】 ( 소유권에 관한 사항 )"),
            Some(Bucket::SectionA)
        );
        assert_eq!(
            classify_heading("【 을 구 】 ( 소유권 이외의 권리에 관한 사항 )"),
            Some(Bucket::SectionB)
        );
        assert_eq!(
            classify_heading("【 표 제 부 】 ( 건물의 표시 )"),
            Some(Bucket::Title)
        );
        assert_eq!(
            classify_heading("주요 등기사항 요약 (참고용)"),
            Some(Bucket::Skip)
        );
        // entry text mentioning a section is not a heading
        assert_eq!(classify_heading("2번 갑구 등기 말소"), None);
    }

    #[test]
    fn test_chrome_lines_filtered() {
        assert!(CHROME_RES.iter().any(|re| re.is_match("열람일시 : 2025년04월01일 13시06분16초")));
        assert!(CHROME_RES.iter().any(|re| re.is_match("3/5")));
        assert!(CHROME_RES.iter().any(|re| re.is_match("-- 이 하 여 백 --")));
        assert!(!CHROME_RES.iter().any(|re| re.is_match("소유자 홍길동")));
    }
}
