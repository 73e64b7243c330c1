//! Entity extraction from normalized section rows.

pub mod encumbrance;
pub mod ownership;
pub mod title;

use lazy_static::lazy_static;
use regex::Regex;

use crate::textutil::{self, clean_text};

lazy_static! {
    // Longest role first so 근저당권자 never matches as 저당권자.
    static ref ROLE_RE: Regex = Regex::new(
        "근저당권자|저당권자|전세권자|임차권자|지상권자|지역권자|가등기권자|\
채권자|채무자|수탁자|공유자|소유자|권리자|처분청"
    )
    .unwrap();
    static ref LEADING_SHARE_RE: Regex =
        Regex::new(r"^지분\s*(\d+분의\s*[\d.]+)\s*").unwrap();
    static ref REGION_START_RE: Regex = Regex::new(
        "^(?:서울|부산|대구|인천|광주|대전|울산|세종|경기|강원|충청|충북|충남|\
전라|전북|전남|경상|경북|경남|제주)"
    )
    .unwrap();
}

/// A rights holder pulled from a 권리자 및 기타사항 cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Party {
    pub role: String,
    pub name: String,
    pub resident_number: Option<String>,
    pub address: Option<String>,
    pub share: Option<String>,
    pub remarks: Option<String>,
}

/// Split a holder cell into parties. Each role keyword opens a party that
/// runs until the next role keyword: share prefix, name, masked number,
/// then the address.
pub(crate) fn parse_parties(cell: &str) -> Vec<Party> {
    let text = clean_text(cell);
    let matches: Vec<_> = ROLE_RE.find_iter(&text).collect();
    let mut parties = Vec::new();

    for (i, m) in matches.iter().enumerate() {
        let end = matches.get(i + 1).map(|n| n.start()).unwrap_or(text.len());
        let slice = text[m.end()..end].trim();

        let (share, slice) = match LEADING_SHARE_RE.captures(slice) {
            Some(caps) => {
                let stripped = slice[caps.get(0).unwrap().end()..].trim_start();
                (Some(caps[1].to_string()), stripped)
            }
            None => (None, slice),
        };

        let resident_number = textutil::parse_resident_number(slice);
        let (name, after_name) = match resident_number
            .as_deref()
            .and_then(|rn| slice.find(rn))
        {
            Some(pos) => (
                clean_text(&slice[..pos]),
                pos + resident_number.as_deref().map(str::len).unwrap_or(0),
            ),
            None => take_name(slice),
        };
        if name.is_empty() {
            continue;
        }

        let (address, remarks) = textutil::extract_address_after(slice, after_name);
        parties.push(Party {
            role: m.as_str().to_string(),
            name,
            resident_number,
            address,
            share,
            remarks,
        });
    }
    parties
}

// Name tokens run until a registration number, an address region, or the
// end of the slice. Corporate names span several tokens.
fn take_name(slice: &str) -> (String, usize) {
    let mut taken: Vec<&str> = Vec::new();
    let mut consumed = 0;
    for token in slice.split_whitespace() {
        if REGION_START_RE.is_match(token) || token.chars().next().is_some_and(|c| c.is_ascii_digit())
        {
            break;
        }
        let pos = slice[consumed..]
            .find(token)
            .map(|p| consumed + p + token.len())
            .unwrap_or(consumed);
        taken.push(token);
        consumed = pos;
        if taken.len() == 4 {
            break;
        }
    }
    (taken.join(" "), consumed)
}

/// First keyword from an ordered table contained in the compact purpose
/// text. Tables list specific compounds before their general substrings.
pub(crate) fn classify(purpose: &str, table: &[&str]) -> Option<String> {
    let compact = textutil::compact(purpose);
    table
        .iter()
        .find(|k| compact.contains(*k))
        .map(|k| k.to_string())
}

// Ordered cause keywords. Compounds precede their substrings: 매매예약
// before 매매, 압류해제 before 해제, 진정명의회복 before 회복.
const CAUSE_KEYWORDS: &[&str] = &[
    "협의분할에의한상속",
    "매매예약",
    "명의신탁해지",
    "압류해제",
    "임의경매로인한매각",
    "강제경매로인한매각",
    "진정명의회복",
    "계약양도",
    "확정판결",
    "공유물분할",
    "추가설정계약",
    "설정계약",
    "매매",
    "증여",
    "상속",
    "경락",
    "낙찰",
    "매각",
    "해지",
    "해제",
    "취하",
    "취소",
    "전거",
    "양도",
    "판결",
    "조정",
    "화해",
    "회복",
    "신탁",
];

lazy_static! {
    static ref DATE_PREFIX_RE: Regex =
        Regex::new(r"\d{4}년\s*\d{1,2}월\s*\d{1,2}일").unwrap();
}

/// Split a 등기원인 cell into the cause date and the cause itself. Unknown
/// causes fall back to the cleaned remainder after the date, which keeps
/// court-decision texts ("서울중앙지방법원의 가압류결정(...)") intact.
pub(crate) fn parse_cause(cell: &str) -> (Option<String>, String) {
    let cause_date = textutil::parse_date_korean(cell);
    let compact = textutil::compact(cell);

    if let Some(keyword) = CAUSE_KEYWORDS.iter().find(|k| compact.contains(*k)) {
        return (cause_date, keyword.to_string());
    }

    let remainder = clean_text(&DATE_PREFIX_RE.replace_all(cell, ""));
    (cause_date, remainder.chars().take(60).collect())
}

/// Amount in won following a keyword, e.g. ("청구금액", "청구금액 금5,000,000원").
pub(crate) fn amount_after(text: &str, keyword: &str) -> Option<i64> {
    let pos = text.find(keyword)?;
    textutil::parse_amount(&text[pos + keyword.len()..])
}

/// Date following a keyword, scanning a short window.
pub(crate) fn date_after(text: &str, keyword: &str) -> Option<String> {
    let pos = text.find(keyword)?;
    let rest = &text[pos + keyword.len()..];
    let end = rest
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(rest.len()))
        .find(|&i| i >= 40)
        .unwrap_or(rest.len());
    textutil::parse_date_korean(&rest[..end])
}
