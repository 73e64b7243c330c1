//! 갑구 entry extraction.

use registry_types::{CreditorInfo, OwnerInfo, OwnershipEntry, ParseNote};

use crate::cancel::{self, Cancellable};
use crate::rows::RawRow;
use crate::textutil::{clean_text, compact, extract_receipt_info};

use super::{amount_after, classify, parse_cause, parse_parties};

// Ordered registration types. Compounds sit above their substrings so
// 소유권이전청구권가등기 never classifies as 소유권이전.
const REGISTRATION_TYPES: &[&str] = &[
    "소유권이전청구권가등기",
    "소유권이전담보가등기",
    "소유권이전금지가처분",
    "소유권일부이전",
    "임의경매개시결정",
    "강제경매개시결정",
    "경매개시결정",
    "등기명의인표시변경",
    "등기명의인표시경정",
    "소유권보존",
    "소유권이전",
    "소유권변경",
    "소유권경정",
    "가압류",
    "압류",
    "가처분",
    "환매특약",
    "신탁",
    "가등기",
];

const FALLBACK_TYPE_LEN: usize = 40;

impl Cancellable for OwnershipEntry {
    fn rank_number(&self) -> &str {
        &self.rank_number
    }
    fn registration_type(&self) -> &str {
        &self.registration_type
    }
    fn cause(&self) -> &str {
        &self.cause
    }
    fn cancels_rank_number(&self) -> Option<&str> {
        self.cancels_rank_number.as_deref()
    }
    fn is_cancelled(&self) -> bool {
        self.is_cancelled
    }
    fn set_cancelled(&mut self, by: Option<String>) {
        self.is_cancelled = true;
        self.cancelled_by_rank = by;
    }
}

/// Build ownership entries from merged 갑구 rows, then propagate 말소
/// back-references.
pub fn extract_entries(rows: &[RawRow], notes: &mut Vec<ParseNote>) -> Vec<OwnershipEntry> {
    let mut entries: Vec<OwnershipEntry> = rows
        .iter()
        .map(|row| extract_entry(row, notes))
        .collect();
    cancel::map_cancellations(&mut entries);
    entries
}

fn extract_entry(row: &RawRow, notes: &mut Vec<ParseNote>) -> OwnershipEntry {
    let cell = |i: usize| row.cells.get(i).map(|c| c.as_str()).unwrap_or("");
    let rank_number = clean_text(row.rank_cell());
    let purpose = cell(1);
    let joined = row.joined();

    let (registration_type, cancels_rank_number) = match cancel::cancel_target(purpose) {
        Some(target) => (clean_text(&compact(purpose)), Some(target)),
        None => match classify(purpose, REGISTRATION_TYPES) {
            Some(kind) => (kind, None),
            None => {
                let fallback: String = compact(purpose).chars().take(FALLBACK_TYPE_LEN).collect();
                if !fallback.is_empty() {
                    notes.push(ParseNote::pattern_mismatch(&rank_number, purpose));
                }
                (fallback, None)
            }
        },
    };

    let (receipt_date, receipt_number) = extract_receipt_info(cell(2));
    let (cause_date, cause) = parse_cause(cell(3));

    let mut owners = Vec::new();
    let mut creditor = None;
    let mut remarks = None;
    for party in parse_parties(cell(4)) {
        match party.role.as_str() {
            "소유자" | "공유자" | "가등기권자" | "수탁자" => {
                if remarks.is_none() {
                    remarks = party.remarks.clone();
                }
                owners.push(OwnerInfo {
                    name: party.name,
                    resident_number: party.resident_number,
                    address: party.address,
                    share: party.share,
                    role: Some(party.role),
                });
            }
            "채권자" | "권리자" | "처분청" => {
                if creditor.is_none() {
                    creditor = Some(CreditorInfo {
                        name: party.name,
                        resident_number: party.resident_number,
                        address: party.address,
                    });
                }
            }
            _ => {}
        }
    }

    let claim_amount =
        amount_after(&joined, "청구금액").or_else(|| amount_after(&joined, "거래가액"));

    OwnershipEntry {
        rank_number,
        registration_type,
        receipt_date,
        receipt_number,
        cause,
        cause_date,
        owners,
        creditor,
        claim_amount,
        remarks,
        is_cancelled: row.is_cancelled,
        cancels_rank_number,
        cancelled_by_rank: None,
        raw_text: joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(cells: &[&str]) -> RawRow {
        RawRow {
            page: 0,
            top: 0.0,
            bottom: 20.0,
            cells: cells.iter().map(|c| c.to_string()).collect(),
            is_cancelled: false,
        }
    }

    #[test]
    fn test_preservation_entry() {
        let rows = vec![row(&[
            "1",
            "소유권보존",
            "2007년9월11일\n제14543호",
            "",
            "소유자 홍길동 650603-******* 서울특별시 강남구 역삼동 123-4",
        ])];
        let mut notes = Vec::new();
        let entries = extract_entries(&rows, &mut notes);
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.rank_number, "1");
        assert_eq!(e.registration_type, "소유권보존");
        assert_eq!(e.receipt_date, "2007년9월11일");
        assert_eq!(e.receipt_number, "14543호");
        assert_eq!(e.owners.len(), 1);
        assert_eq!(e.owners[0].name, "홍길동");
        assert!(!e.is_cancelled);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_transfer_with_trade_amount() {
        let rows = vec![row(&[
            "2",
            "소유권이전",
            "2015년3월2일\n제1234호",
            "2015년2월1일\n매매",
            "소유자 김갑동 600101-******* 서울특별시 서초구 서초동 10\n거래가액 금203,500,000원",
        ])];
        let entries = extract_entries(&rows, &mut Vec::new());
        let e = &entries[0];
        assert_eq!(e.registration_type, "소유권이전");
        assert_eq!(e.cause, "매매");
        assert_eq!(e.cause_date.as_deref(), Some("2015년 02월 01일"));
        assert_eq!(e.claim_amount, Some(203_500_000));
    }

    #[test]
    fn test_provisional_attachment_creditor() {
        let rows = vec![row(&[
            "3",
            "가압류",
            "2016년5월2일\n제555호",
            "2016년5월1일 서울중앙지방법원의 가압류결정(2016카단100)",
            "청구금액 금50,000,000원 채권자 주식회사우리은행 110111-1234567 서울특별시 중구 소공로 51",
        ])];
        let entries = extract_entries(&rows, &mut Vec::new());
        let e = &entries[0];
        assert_eq!(e.registration_type, "가압류");
        assert_eq!(e.claim_amount, Some(50_000_000));
        assert_eq!(e.creditor.as_ref().unwrap().name, "주식회사우리은행");
        assert!(e.cause.contains("가압류결정"));
    }

    #[test]
    fn test_cancel_row_back_reference() {
        let rows = vec![
            row(&["3", "가압류", "2016년5월2일\n제555호", "", "채권자 은행"]),
            row(&["4", "3번가압류등기말소", "2017년1월5일\n제77호", "2017년1월4일\n해제", ""]),
        ];
        let entries = extract_entries(&rows, &mut Vec::new());
        assert!(entries[0].is_cancelled);
        assert_eq!(entries[0].cancelled_by_rank.as_deref(), Some("4"));
        assert_eq!(entries[1].cancels_rank_number.as_deref(), Some("3"));
        assert_eq!(entries[1].registration_type, "3번가압류등기말소");
        assert!(!entries[1].is_cancelled);
    }

    #[test]
    fn test_gadeunggi_not_classified_as_transfer() {
        let rows = vec![row(&["5", "소유권이전청구권가등기", "", "2020년1월1일\n매매예약", ""])];
        let entries = extract_entries(&rows, &mut Vec::new());
        assert_eq!(entries[0].registration_type, "소유권이전청구권가등기");
        assert_eq!(entries[0].cause, "매매예약");
    }

    #[test]
    fn test_unknown_type_truncated_with_note() {
        let long = "알수없는등기목적".repeat(10);
        let rows = vec![row(&["6", &long, "", "", ""])];
        let mut notes = Vec::new();
        let entries = extract_entries(&rows, &mut notes);
        assert_eq!(entries[0].registration_type.chars().count(), 40);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].code, "pattern_mismatch");
    }

    #[test]
    fn test_co_owners_both_captured() {
        let rows = vec![row(&[
            "2",
            "소유권이전",
            "",
            "2010년1월1일\n매매",
            "공유자 지분 2분의 1 김갑동 600101-******* 서울특별시 서초구 서초동 10 \
공유자 지분 2분의 1 이을순 630202-******* 서울특별시 서초구 서초동 10",
        ])];
        let entries = extract_entries(&rows, &mut Vec::new());
        assert_eq!(entries[0].owners.len(), 2);
        assert_eq!(entries[0].owners[0].share.as_deref(), Some("2분의 1"));
        assert_eq!(entries[0].owners[1].role.as_deref(), Some("공유자"));
    }
}
