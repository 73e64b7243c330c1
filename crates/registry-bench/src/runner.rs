//! Corpus scoring: parse, extract ground truth, compare.

use std::path::{Path, PathBuf};

use registry_engine::{ParseConfig, ParserRegistry};
use registry_types::{BenchmarkRecord, FileScore};

use crate::collect::ParsedTokens;
use crate::ground_truth::GroundTruth;
use crate::score::{self, matched_count, missing_top, recall};

const MISSING_LIMIT: usize = 20;

/// Score one corpus file. Never panics and never aborts a batch: any
/// failure becomes a zero-score entry with the error recorded.
pub fn score_file(
    path: &Path,
    registry: &ParserRegistry,
    version: Option<&str>,
    config: &ParseConfig,
) -> FileScore {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return FileScore::failed(file, format!("read failed: {e}")),
    };
    let doc = match registry.parse(&bytes, version) {
        Ok(doc) => doc,
        Err(e) => return FileScore::failed(file, e.to_string()),
    };
    let gt = match GroundTruth::from_pdf(&bytes, &config.layout_options()) {
        Ok(gt) => gt,
        Err(e) => return FileScore::failed(file, format!("ground truth failed: {e}")),
    };
    let parsed = match ParsedTokens::from_document(&doc) {
        Ok(parsed) => parsed,
        Err(e) => return FileScore::failed(file, format!("token collection failed: {e}")),
    };

    let gt_all = gt.combined();
    let parsed_all = parsed.combined();

    FileScore {
        file,
        property_type: Some(doc.property_type.as_str().to_string()),
        overall: recall(&gt_all, &parsed_all).unwrap_or(0.0),
        title: recall(&gt.title, &parsed.title),
        section_a: recall(&gt.section_a, &parsed.section_a),
        section_b: recall(&gt.section_b, &parsed.section_b),
        gt_tokens: gt_all.total(),
        matched_tokens: matched_count(&gt_all, &parsed_all),
        missing_top: missing_top(&gt_all, &parsed_all, MISSING_LIMIT),
        errors: doc.errors.iter().map(|n| n.message.clone()).collect(),
    }
}

/// Run one parser version over the corpus and aggregate. Failed files count
/// toward `files` but not toward the averages.
pub fn run_benchmark(
    paths: &[PathBuf],
    registry: &ParserRegistry,
    version: Option<&str>,
    config: &ParseConfig,
) -> BenchmarkRecord {
    let resolved_version = version
        .map(str::to_string)
        .or_else(|| {
            registry
                .default_parser()
                .map(|p| p.parser_version().to_string())
        })
        .unwrap_or_default();

    let mut details = Vec::with_capacity(paths.len());
    for path in paths {
        let detail = score_file(path, registry, version, config);
        tracing::info!(
            file = %detail.file,
            overall = detail.overall,
            failed = detail.gt_tokens == 0,
            "scored"
        );
        details.push(detail);
    }

    let valid: Vec<&FileScore> = details.iter().filter(|d| d.gt_tokens > 0).collect();

    BenchmarkRecord {
        version: resolved_version,
        date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        files: details.len(),
        overall: mean(valid.iter().map(|d| d.overall)).unwrap_or(0.0),
        title: mean(valid.iter().filter_map(|d| d.title)),
        section_a: mean(valid.iter().filter_map(|d| d.section_a)),
        section_b: mean(valid.iter().filter_map(|d| d.section_b)),
        details,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        return None;
    }
    Some(score::round1(values.iter().sum::<f64>() / values.len() as f64))
}
