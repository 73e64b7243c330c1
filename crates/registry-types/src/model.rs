//! Structured parse output for registry certificates (등기부등본)

use serde::{Deserialize, Serialize};

use crate::error::ParseNote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Land,
    #[default]
    Building,
    AggregateBuilding,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Land => "land",
            PropertyType::Building => "building",
            PropertyType::AggregateBuilding => "aggregate_building",
        }
    }
}

/// Per-floor area line from the title block (e.g. "1층 84.97㎡").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorArea {
    pub floor: String,
    pub area: f64,
    /// Marked 연면적제외 in the source — excluded from the total floor area.
    pub is_excluded: bool,
}

/// Title block (표제부): the physical description of the property.
///
/// Which optional fields are populated depends on `property_type`:
/// land rows carry `land_type`/`land_area`, buildings carry structure and
/// floor areas, aggregate buildings additionally carry the exclusive area
/// and land-right ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TitleInfo {
    pub unique_number: String,
    pub property_type: PropertyType,
    pub address: String,
    pub road_address: Option<String>,
    pub building_name: Option<String>,
    pub structure: Option<String>,
    pub roof_type: Option<String>,
    pub floors: u32,
    pub building_type: Option<String>,
    pub areas: Vec<FloorArea>,
    pub total_floor_area: f64,
    pub land_type: Option<String>,
    pub land_area: Option<String>,
    pub exclusive_area: Option<f64>,
    pub land_right_ratio: Option<String>,
}

/// A rights holder in an ownership entry. `role` distinguishes 소유자,
/// 공유자, 가등기권자 and 수탁자 rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerInfo {
    pub name: String,
    /// Masked resident/corporate registration number, e.g. "650603-*******".
    pub resident_number: Option<String>,
    pub address: Option<String>,
    /// Co-ownership share, e.g. "3분의 1". None for sole ownership.
    pub share: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditorInfo {
    pub name: String,
    pub resident_number: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LesseeInfo {
    pub name: String,
    pub resident_number: Option<String>,
    pub address: Option<String>,
}

/// Lease-term dates attached to a 주택임차권 entry. Each field is matched
/// independently; absence is normal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LeaseTerm {
    pub contract_date: Option<String>,
    pub registration_date: Option<String>,
    pub possession_date: Option<String>,
    pub fixed_date: Option<String>,
}

/// 갑구 entry — ownership and ownership-affecting rights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OwnershipEntry {
    /// Rank number, may carry a sub-rank ("3-1").
    pub rank_number: String,
    pub registration_type: String,
    pub receipt_date: String,
    pub receipt_number: String,
    pub cause: String,
    pub cause_date: Option<String>,
    pub owners: Vec<OwnerInfo>,
    pub creditor: Option<CreditorInfo>,
    /// 청구금액/거래가액 in won.
    pub claim_amount: Option<i64>,
    pub remarks: Option<String>,
    pub is_cancelled: bool,
    /// Rank of the earlier entry this entry cancels (active direction).
    pub cancels_rank_number: Option<String>,
    /// Rank of the later entry that cancelled this one (passive direction).
    pub cancelled_by_rank: Option<String>,
    pub raw_text: String,
}

/// 을구 entry — rights other than ownership (mortgages, leases, jeonse).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EncumbranceEntry {
    pub rank_number: String,
    pub registration_type: String,
    pub receipt_date: String,
    pub receipt_number: String,
    pub cause: String,
    pub cause_date: Option<String>,
    /// 채권최고액 in won.
    pub max_claim_amount: Option<i64>,
    pub debtor: Option<OwnerInfo>,
    pub mortgagee: Option<CreditorInfo>,
    /// 보증금/전세금 in won.
    pub deposit_amount: Option<i64>,
    /// 차임 (monthly rent) in won.
    pub monthly_rent: Option<i64>,
    pub lease_term: Option<LeaseTerm>,
    pub lessee: Option<LesseeInfo>,
    pub remarks: Option<String>,
    pub is_cancelled: bool,
    pub cancels_rank_number: Option<String>,
    pub cancelled_by_rank: Option<String>,
    pub raw_text: String,
}

/// The parse result. Constructed once per call and never mutated after
/// return; independent parse calls share nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RegistryDocument {
    pub unique_number: String,
    pub property_type: PropertyType,
    pub property_address: String,
    pub title_info: TitleInfo,
    pub ownership_entries: Vec<OwnershipEntry>,
    pub encumbrance_entries: Vec<EncumbranceEntry>,
    /// 열람일시 from the page footer, normalized.
    pub viewed_at: Option<String>,
    /// 발행일시 from the page footer, normalized.
    pub issued_at: Option<String>,
    pub raw_text: String,
    pub parse_date: String,
    pub parser_version: String,
    pub errors: Vec<ParseNote>,
}

impl RegistryDocument {
    /// Entries not struck through, in parse order.
    pub fn active_ownership_entries(&self) -> impl Iterator<Item = &OwnershipEntry> {
        self.ownership_entries.iter().filter(|e| !e.is_cancelled)
    }

    pub fn active_encumbrance_entries(&self) -> impl Iterator<Item = &EncumbranceEntry> {
        self.encumbrance_entries.iter().filter(|e| !e.is_cancelled)
    }
}
