//! Demo masking: strip personal data, keep just enough structure to show
//! what the parser understood.

use registry_types::{OwnerInfo, RegistryDocument};

const MASKED_NUMBER: &str = "******-*******";
const MASKED_ADDRESS: &str = "***";

/// "홍길동" -> "홍*동", "김구" -> "김*". Single-char names pass through.
pub fn mask_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    match chars.len() {
        0 | 1 => name.to_string(),
        2 => format!("{}*", chars[0]),
        n => {
            let stars: String = "*".repeat(n - 2);
            format!("{}{}{}", chars[0], stars, chars[n - 1])
        }
    }
}

fn mask_owner(owner: &OwnerInfo) -> OwnerInfo {
    OwnerInfo {
        name: mask_name(&owner.name),
        resident_number: owner.resident_number.as_ref().map(|_| MASKED_NUMBER.to_string()),
        address: owner.address.as_ref().map(|_| MASKED_ADDRESS.to_string()),
        share: owner.share.clone(),
        role: owner.role.clone(),
    }
}

/// Masked copy: one floor area, one entry per section, names starred,
/// numbers and addresses replaced, amounts and counterparties dropped.
pub fn mask_document(doc: &RegistryDocument) -> RegistryDocument {
    let mut masked = doc.clone();

    masked.raw_text = String::new();
    masked.title_info.areas.truncate(1);

    masked.ownership_entries.truncate(1);
    for entry in &mut masked.ownership_entries {
        entry.owners = entry.owners.iter().map(mask_owner).collect();
        entry.creditor = None;
        entry.claim_amount = None;
        entry.raw_text = String::new();
    }

    masked.encumbrance_entries.truncate(1);
    for entry in &mut masked.encumbrance_entries {
        entry.max_claim_amount = None;
        entry.deposit_amount = None;
        entry.monthly_rent = None;
        entry.mortgagee = None;
        entry.lessee = None;
        entry.lease_term = None;
        entry.debtor = entry.debtor.as_ref().map(mask_owner);
        entry.raw_text = String::new();
    }

    masked
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use registry_types::{EncumbranceEntry, FloorArea, OwnershipEntry};

    #[test]
    fn test_mask_name() {
        assert_eq!(mask_name("홍길동"), "홍*동");
        assert_eq!(mask_name("남궁민수"), "남**수");
        assert_eq!(mask_name("김구"), "김*");
        assert_eq!(mask_name("김"), "김");
    }

    #[test]
    fn test_mask_document_truncates_and_scrubs() {
        let doc = RegistryDocument {
            raw_text: "비밀".into(),
            title_info: registry_types::TitleInfo {
                areas: vec![
                    FloorArea { floor: "1층".into(), area: 84.97, is_excluded: false },
                    FloorArea { floor: "2층".into(), area: 84.97, is_excluded: false },
                ],
                ..Default::default()
            },
            ownership_entries: vec![
                OwnershipEntry {
                    rank_number: "1".into(),
                    owners: vec![OwnerInfo {
                        name: "홍길동".into(),
                        resident_number: Some("650603-*******".into()),
                        address: Some("서울특별시 강남구".into()),
                        share: None,
                        role: Some("소유자".into()),
                    }],
                    claim_amount: Some(1000),
                    ..Default::default()
                },
                OwnershipEntry { rank_number: "2".into(), ..Default::default() },
            ],
            encumbrance_entries: vec![EncumbranceEntry {
                rank_number: "1".into(),
                max_claim_amount: Some(360_000_000),
                ..Default::default()
            }],
            ..Default::default()
        };

        let masked = mask_document(&doc);
        assert!(masked.raw_text.is_empty());
        assert_eq!(masked.title_info.areas.len(), 1);
        assert_eq!(masked.ownership_entries.len(), 1);
        let owner = &masked.ownership_entries[0].owners[0];
        assert_eq!(owner.name, "홍*동");
        assert_eq!(owner.resident_number.as_deref(), Some("******-*******"));
        assert_eq!(owner.address.as_deref(), Some("***"));
        assert_eq!(masked.ownership_entries[0].claim_amount, None);
        assert_eq!(masked.encumbrance_entries[0].max_claim_amount, None);
        // original untouched
        assert_eq!(doc.ownership_entries.len(), 2);
    }
}
