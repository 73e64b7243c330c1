//! Benchmark history persistence.

use std::path::Path;

use anyhow::Context;
use registry_types::BenchmarkRecord;

/// Records kept per file; the oldest fall off.
pub const MAX_HISTORY: usize = 5;

/// Load history; a missing file is an empty history.
pub fn load(path: &Path) -> anyhow::Result<Vec<BenchmarkRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Insert a record, replacing any previous run of the same version, and
/// cap the length. Re-running a version updates its entry instead of
/// inflating the history.
pub fn upsert(history: &mut Vec<BenchmarkRecord>, record: BenchmarkRecord) {
    history.retain(|r| r.version != record.version);
    history.push(record);
    if history.len() > MAX_HISTORY {
        let excess = history.len() - MAX_HISTORY;
        history.drain(..excess);
    }
}

pub fn save(path: &Path, history: &[BenchmarkRecord]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(history)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(version: &str, overall: f64) -> BenchmarkRecord {
        BenchmarkRecord {
            version: version.into(),
            date: "2026-08-29".into(),
            files: 1,
            overall,
            title: None,
            section_a: None,
            section_b: None,
            details: Vec::new(),
        }
    }

    #[test]
    fn test_upsert_replaces_same_version() {
        let mut history = vec![record("1.0.0", 80.0)];
        upsert(&mut history, record("1.0.0", 85.0));
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].overall, 85.0);
    }

    #[test]
    fn test_upsert_caps_length() {
        let mut history = Vec::new();
        for i in 0..7 {
            upsert(&mut history, record(&format!("1.0.{i}"), 80.0));
        }
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history[0].version, "1.0.2");
        assert_eq!(history.last().unwrap().version, "1.0.6");
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("benchmark-history.json");
        assert!(load(&path).unwrap().is_empty());

        let history = vec![record("1.0.0", 91.4)];
        save(&path, &history).unwrap();
        assert_eq!(load(&path).unwrap(), history);
    }
}
