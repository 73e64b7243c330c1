//! 을구 entry extraction.

use registry_types::{CreditorInfo, EncumbranceEntry, LeaseTerm, LesseeInfo, OwnerInfo, ParseNote};

use crate::cancel::{self, Cancellable};
use crate::rows::RawRow;
use crate::textutil::{clean_text, compact, extract_receipt_info};

use super::{amount_after, classify, date_after, parse_cause, parse_parties};

const REGISTRATION_TYPES: &[&str] = &[
    "근저당권부채권질권",
    "근저당권설정",
    "근저당권이전",
    "근저당권변경",
    "근저당권경정",
    "저당권설정",
    "전세권설정",
    "전세권이전",
    "전세권변경",
    "전세권경정",
    "주택임차권",
    "임차권설정",
    "전전세",
    "지상권설정",
    "지역권설정",
    "질권설정",
];

const FALLBACK_TYPE_LEN: usize = 40;

impl Cancellable for EncumbranceEntry {
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

/// Build encumbrance entries from merged 을구 rows, then propagate 말소
/// back-references.
pub fn extract_entries(rows: &[RawRow], notes: &mut Vec<ParseNote>) -> Vec<EncumbranceEntry> {
    let mut entries: Vec<EncumbranceEntry> = rows
        .iter()
        .map(|row| extract_entry(row, notes))
        .collect();
    cancel::map_cancellations(&mut entries);
    entries
}

fn extract_entry(row: &RawRow, notes: &mut Vec<ParseNote>) -> EncumbranceEntry {
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

    let holder_cell = cell(4);
    let mut debtor = None;
    let mut mortgagee = None;
    let mut lessee = None;
    let mut remarks = None;
    for party in parse_parties(holder_cell) {
        match party.role.as_str() {
            "채무자" => {
                if debtor.is_none() {
                    debtor = Some(OwnerInfo {
                        name: party.name,
                        resident_number: party.resident_number,
                        address: party.address,
                        share: None,
                        role: Some(party.role),
                    });
                }
            }
            "임차권자" => {
                if lessee.is_none() {
                    lessee = Some(LesseeInfo {
                        name: party.name,
                        resident_number: party.resident_number,
                        address: party.address,
                    });
                }
            }
            "근저당권자" | "저당권자" | "전세권자" | "지상권자" | "지역권자" | "채권자" => {
                if mortgagee.is_none() {
                    if remarks.is_none() {
                        remarks = party.remarks.clone();
                    }
                    mortgagee = Some(CreditorInfo {
                        name: party.name,
                        resident_number: party.resident_number,
                        address: party.address,
                    });
                }
            }
            _ => {}
        }
    }

    let max_claim_amount = amount_after(&joined, "채권최고액");
    let deposit_amount = amount_after(&joined, "전세금")
        .or_else(|| amount_after(&joined, "임차보증금"))
        .or_else(|| amount_after(&joined, "보증금"));
    let monthly_rent = amount_after(&joined, "차임");
    let lease_term = extract_lease_term(&joined);

    EncumbranceEntry {
        rank_number,
        registration_type,
        receipt_date,
        receipt_number,
        cause,
        cause_date,
        max_claim_amount,
        debtor,
        mortgagee,
        deposit_amount,
        monthly_rent,
        lease_term,
        lessee,
        remarks,
        is_cancelled: row.is_cancelled,
        cancels_rank_number,
        cancelled_by_rank: None,
        raw_text: joined,
    }
}

// Each date is matched independently; a 주택임차권 entry rarely carries
// all four.
fn extract_lease_term(text: &str) -> Option<LeaseTerm> {
    let term = LeaseTerm {
        contract_date: date_after(text, "임대차계약일자"),
        registration_date: date_after(text, "주민등록일자"),
        possession_date: date_after(text, "점유개시일자").or_else(|| date_after(text, "점유개시일")),
        fixed_date: date_after(text, "확정일자"),
    };
    if term == LeaseTerm::default() {
        None
    } else {
        Some(term)
    }
}
