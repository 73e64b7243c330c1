//! Token-recall scoring.
//!
//! Recall asks one question: of the tokens visible in the document, how
//! many did the structured output retain? Extra parsed tokens are never
//! penalized, so a parser cannot lose points for enrichment, only for
//! dropping source content.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"[\w가-힣]+").unwrap();
}

// Boilerplate present in every certificate regardless of content. Counting
// these would reward parsers for echoing table chrome.
const NOISE_TOKENS: &[&str] = &[
    "등기사항전부증명서",
    "등기부등본",
    "표제부",
    "갑구",
    "을구",
    "표시번호",
    "순위번호",
    "등기목적",
    "등기원인",
    "접수",
    "소재지번",
    "건물내역",
    "건물번호",
    "권리자",
    "기타사항",
    "대지권",
    "비율",
    "종류",
    "면적",
    "지목",
    "사항",
    "현재",
    "유효사항",
    "말소사항",
    "포함",
];

/// Tokens with their occurrence counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenCounts {
    counts: HashMap<String, usize>,
}

impl TokenCounts {
    pub fn add(&mut self, token: &str) {
        *self.counts.entry(token.to_string()).or_insert(0) += 1;
    }

    pub fn add_text(&mut self, text: &str) {
        for token in tokenize(text) {
            self.add(&token);
        }
    }

    pub fn merge(&mut self, other: &TokenCounts) {
        for (token, n) in &other.counts {
            *self.counts.entry(token.clone()).or_insert(0) += n;
        }
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, token: &str) -> usize {
        self.counts.get(token).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(t, n)| (t.as_str(), *n))
    }
}

/// Word tokens of at least two chars, noise filtered.
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|t| t.chars().count() >= 2)
        .filter(|t| !NOISE_TOKENS.contains(&t.as_str()))
        .collect()
}

/// Recall in percent, rounded to one decimal. `None` when there is nothing
/// to recall.
pub fn recall(gt: &TokenCounts, parsed: &TokenCounts) -> Option<f64> {
    let total = gt.total();
    if total == 0 {
        return None;
    }
    let matched: usize = gt
        .iter()
        .map(|(token, n)| n.min(parsed.count(token)))
        .sum();
    Some(round1(100.0 * matched as f64 / total as f64))
}

/// Matched token occurrences, the numerator of [`recall`].
pub fn matched_count(gt: &TokenCounts, parsed: &TokenCounts) -> usize {
    gt.iter().map(|(token, n)| n.min(parsed.count(token))).sum()
}

/// Ground-truth tokens the parse missed entirely or partially, most
/// frequent first, capped at `limit`.
pub fn missing_top(gt: &TokenCounts, parsed: &TokenCounts, limit: usize) -> Vec<String> {
    let mut missing: Vec<(&str, usize)> = gt
        .iter()
        .filter_map(|(token, n)| {
            let gap = n.saturating_sub(parsed.count(token));
            (gap > 0).then_some((token, gap))
        })
        .collect();
    missing.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    missing.into_iter().take(limit).map(|(t, _)| t.to_string()).collect()
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn counts(tokens: &[&str]) -> TokenCounts {
        let mut c = TokenCounts::default();
        for t in tokens {
            c.add(t);
        }
        c
    }

    #[test]
    fn test_tokenize_filters_short_and_noise() {
        let tokens = tokenize("【 갑 구 】 소유자 홍길동 650603-*******");
        assert!(tokens.contains(&"소유자".to_string()));
        assert!(tokens.contains(&"홍길동".to_string()));
        assert!(tokens.contains(&"650603".to_string()));
        // single chars dropped
        assert!(!tokens.iter().any(|t| t == "갑" || t == "구"));
        let noise = tokenize("표제부 등기목적 접수");
        assert!(noise.is_empty());
    }

    #[test]
    fn test_recall_identity_and_disjoint() {
        let gt = counts(&["홍길동", "서울특별시", "홍길동"]);
        assert_eq!(recall(&gt, &gt), Some(100.0));
        assert_eq!(recall(&gt, &counts(&["김철수"])), Some(0.0));
        assert_eq!(recall(&counts(&[]), &gt), None);
    }

    #[test]
    fn test_recall_counts_multiplicity() {
        let gt = counts(&["홍길동", "홍길동"]);
        let parsed = counts(&["홍길동"]);
        assert_eq!(recall(&gt, &parsed), Some(50.0));
    }

    #[test]
    fn test_recall_rounded_to_one_decimal() {
        let gt = counts(&["하나", "둘", "셋"]);
        let parsed = counts(&["하나"]);
        assert_eq!(recall(&gt, &parsed), Some(33.3));
    }

    #[test]
    fn test_missing_top_ordered_by_gap() {
        let gt = counts(&["가득", "가득", "가득", "조금", "찾음"]);
        let parsed = counts(&["찾음"]);
        assert_eq!(missing_top(&gt, &parsed, 20), vec!["가득", "조금"]);
        assert_eq!(missing_top(&gt, &parsed, 1), vec!["가득"]);
    }

    proptest! {
        #[test]
        fn prop_recall_bounded(tokens in proptest::collection::vec("[가-힣]{2,4}", 1..30)) {
            let gt = {
                let mut c = TokenCounts::default();
                for t in &tokens { c.add(t); }
                c
            };
            let r = recall(&gt, &gt).unwrap();
            prop_assert!((r - 100.0).abs() < 1e-9);
            let empty = recall(&gt, &TokenCounts::default()).unwrap();
            prop_assert!(empty.abs() < 1e-9);
        }

        #[test]
        fn prop_recall_monotone_in_parsed(
            tokens in proptest::collection::vec("[가-힣]{2,4}", 1..20),
            keep in 0usize..20,
        ) {
            let mut gt = TokenCounts::default();
            for t in &tokens { gt.add(t); }
            let mut partial = TokenCounts::default();
            for t in tokens.iter().take(keep) { partial.add(t); }
            let partial_recall = recall(&gt, &partial).unwrap();
            let full_recall = recall(&gt, &gt).unwrap();
            prop_assert!(partial_recall <= full_recall + 1e-9);
        }
    }
}
