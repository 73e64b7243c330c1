//! Text parsing helpers shared by the entity extractors.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref AMOUNT_RE: Regex = Regex::new(r"금\s*([\d,]+)\s*원정?").unwrap();
    static ref DATE_KOREAN_RE: Regex =
        Regex::new(r"(\d{4})년\s*(\d{1,2})월\s*(\d{1,2})일").unwrap();
    static ref DATE_DOTTED_RE: Regex = Regex::new(r"(\d{4})\.(\d{1,2})\.(\d{1,2})").unwrap();
    static ref DATE_ISO_RE: Regex = Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").unwrap();
    static ref RECEIPT_DATE_KOREAN_RE: Regex =
        Regex::new(r"(\d{4}년\s*\d{1,2}월\s*\d{1,2}일)").unwrap();
    static ref RECEIPT_DATE_DOTTED_RE: Regex = Regex::new(r"(\d{4}\.\d{1,2}\.\d{1,2})").unwrap();
    static ref RECEIPT_DATE_ISO_RE: Regex = Regex::new(r"(\d{4}-\d{1,2}-\d{1,2})").unwrap();
    static ref RECEIPT_NUMBER_RE: Regex = Regex::new(r"제?\s*(\d+호)").unwrap();
    // Masked personal numbers first, then corporate forms
    static ref RESIDENT_MASKED_RE: Regex =
        Regex::new(r"(\d{6})-([*○●]{7}|\d{7}|\d{1,6}[*○●]+)").unwrap();
    static ref CORPORATE_RE: Regex = Regex::new(r"(\d{3}-\d{2}-\d{5})").unwrap();
    static ref TIME_RE: Regex =
        Regex::new(r"(오전|오후)?\s*(\d{1,2})시\s*(\d{1,2})분\s*(\d{1,2})초").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Remove all whitespace. Registry headings and legal compounds get split
/// by PDF line breaks, so matching happens on the compact form.
pub fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Parse a 금 N원 amount into won. Tolerates the 원정 variant.
pub fn parse_amount(text: &str) -> Option<i64> {
    let caps = AMOUNT_RE.captures(text)?;
    caps[1].replace(',', "").parse().ok()
}

/// Parse Korean, dotted, and ISO dates, normalized to "YYYY년 MM월 DD일".
pub fn parse_date_korean(text: &str) -> Option<String> {
    let caps = DATE_KOREAN_RE
        .captures(text)
        .or_else(|| DATE_DOTTED_RE.captures(text))
        .or_else(|| DATE_ISO_RE.captures(text))?;
    Some(format!(
        "{}년 {:0>2}월 {:0>2}일",
        &caps[1], &caps[2], &caps[3]
    ))
}

/// Pull the receipt date and receipt number out of a 접수 cell.
/// Either half may be missing; the other is still returned.
pub fn extract_receipt_info(text: &str) -> (String, String) {
    let date = RECEIPT_DATE_KOREAN_RE
        .captures(text)
        .or_else(|| RECEIPT_DATE_DOTTED_RE.captures(text))
        .or_else(|| RECEIPT_DATE_ISO_RE.captures(text))
        .map(|c| c[1].to_string())
        .unwrap_or_default();
    let number = RECEIPT_NUMBER_RE
        .captures(text)
        .map(|c| c[1].to_string())
        .unwrap_or_default();
    (date, number)
}

/// Extract a resident or corporate registration number, masked digits
/// included (e.g. "650603-*******").
pub fn parse_resident_number(text: &str) -> Option<String> {
    if let Some(caps) = RESIDENT_MASKED_RE.captures(text) {
        return Some(format!("{}-{}", &caps[1], &caps[2]));
    }
    CORPORATE_RE.captures(text).map(|c| c[1].to_string())
}

/// Normalize a footer timestamp to "YYYY년 MM월 DD일 HH시 MM분 SS초",
/// converting 오전/오후 to 24-hour time. Unrecognized input is returned
/// unchanged.
pub fn normalize_timestamp(text: &str) -> String {
    let Some(date) = DATE_KOREAN_RE.captures(text) else {
        return text.to_string();
    };
    let Some(time) = TIME_RE.captures(text) else {
        return text.to_string();
    };

    let mut hour: u32 = time[2].parse().unwrap_or(0);
    match time.get(1).map(|m| m.as_str()) {
        Some("오후") if hour < 12 => hour += 12,
        Some("오전") if hour == 12 => hour = 0,
        _ => {}
    }

    format!(
        "{}년 {:0>2}월 {:0>2}일 {:02}시 {:0>2}분 {:0>2}초",
        &date[1], &date[2], &date[3], hour, &time[3], &time[4]
    )
}

lazy_static! {
    // Address ends at legal citations, dates, or the next role keyword
    static ref ADDRESS_STOP_RE: Regex = Regex::new(
        r"(?:부동산|민법|상법|형법|세법|등기)\S*법|제\d+조|규정에\s*의하여|전산이기|\
매매목록|공동담보목록|\d{4}년\s*\d{1,2}월\s*\d{1,2}일|\
근저당권자|저당권자|채권자|채무자|소유자|공유자|권리자|\
임차권자|전세권자|지상권자|가등기권자|수탁자|처분청"
    )
    .unwrap();
    static ref ADDRESS_RE: Regex = Regex::new(
        r"((?:서울|부산|대구|인천|광주|대전|울산|세종|경기|강원|충청|전라|경상|제주)\
(?:특별시|광역시|특별자치시|도|특별자치도)?\S*(?:\s+\S+){1,8})"
    )
    .unwrap();
    static ref ADDRESS_DISTRICT_RE: Regex =
        Regex::new(r"(\S+[군구시읍면동리]\s+\S+(?:\s+\S+){0,6})").unwrap();
    static ref SHARE_RE: Regex = Regex::new(r"(\d+)분의\s*([\d.]+)").unwrap();
}

/// Extract the address that follows a role keyword match, plus any trailing
/// remarks (legal citations and the like) cut off by the stop pattern.
pub fn extract_address_after(text: &str, pos: usize) -> (Option<String>, Option<String>) {
    let end = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .find(|&i| i >= pos + 600)
        .unwrap_or(text.len())
        .min(text.len());
    let mut remaining = &text[pos.min(text.len())..end];
    let mut remarks = None;

    if let Some(m) = ADDRESS_STOP_RE.find(remaining) {
        let tail = clean_text(&remaining[m.start()..]);
        if !tail.is_empty() {
            remarks = Some(tail);
        }
        remaining = remaining[..m.start()].trim_end();
    }

    if let Some(caps) = ADDRESS_RE.captures(remaining) {
        return (Some(clean_text(&caps[1])), remarks);
    }
    if let Some(caps) = ADDRESS_DISTRICT_RE.captures(remaining) {
        return (Some(clean_text(&caps[1])), remarks);
    }
    (None, remarks)
}

/// Look for a co-ownership share ("N분의 M") near a position.
pub fn extract_share_near(text: &str, pos: usize) -> Option<String> {
    let start = text
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= pos.saturating_sub(100))
        .last()
        .unwrap_or(0);
    let end = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .find(|&i| i >= pos + 200)
        .unwrap_or(text.len());
    let nearby = &text[start..end.min(text.len())];

    if let Some(caps) = SHARE_RE.captures(nearby) {
        return Some(format!("{}분의 {}", &caps[1], &caps[2]));
    }
    if nearby.contains("단독소유") {
        return Some("단독소유".to_string());
    }
    None
}
