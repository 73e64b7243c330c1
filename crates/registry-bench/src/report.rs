//! BENCHMARK.md rendering.

use std::fmt::Write as _;
use std::path::Path;

use registry_types::BenchmarkRecord;

fn pct(value: f64) -> String {
    format!("{value:.1}%")
}

fn opt_pct(value: Option<f64>) -> String {
    value.map(pct).unwrap_or_else(|| "-".to_string())
}

/// Render the full report from history, newest record last.
pub fn render(history: &[BenchmarkRecord]) -> String {
    let mut out = String::new();
    out.push_str("# Parser Accuracy Benchmark\n\n");
    out.push_str("Token recall against the PDF text layer, per section.\n\n");

    let Some(latest) = history.last() else {
        out.push_str("No benchmark runs recorded yet.\n");
        return out;
    };

    let _ = writeln!(out, "## Latest: v{} ({})\n", latest.version, latest.date);
    out.push_str("| Metric | Score |\n|--------|-------|\n");
    let _ = writeln!(out, "| Overall | {} |", pct(latest.overall));
    let _ = writeln!(out, "| 표제부 (Title) | {} |", opt_pct(latest.title));
    let _ = writeln!(out, "| 갑구 (Section A) | {} |", opt_pct(latest.section_a));
    let _ = writeln!(out, "| 을구 (Section B) | {} |", opt_pct(latest.section_b));
    let _ = writeln!(out, "| Files | {} |", latest.files);
    out.push('\n');

    if history.len() >= 2 {
        out.push_str("## Trend\n\n```mermaid\nxychart-beta\n    title \"Overall recall by version\"\n");
        let versions: Vec<String> = history.iter().map(|r| format!("v{}", r.version)).collect();
        let scores: Vec<String> = history.iter().map(|r| format!("{:.1}", r.overall)).collect();
        let _ = writeln!(out, "    x-axis [{}]", versions.join(", "));
        out.push_str("    y-axis \"Recall (%)\" 0 --> 100\n");
        let _ = writeln!(out, "    bar [{}]", scores.join(", "));
        out.push_str("```\n\n");
    }

    out.push_str("## Score Table\n\n");
    out.push_str("| Version | Date | Files | Overall | Title | 갑구 | 을구 |\n");
    out.push_str("|---------|------|-------|---------|-------|------|------|\n");
    for record in history.iter().rev() {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} |",
            record.version,
            record.date,
            record.files,
            pct(record.overall),
            opt_pct(record.title),
            opt_pct(record.section_a),
            opt_pct(record.section_b),
        );
    }
    out.push('\n');

    let _ = writeln!(out, "## File Details (v{})\n", latest.version);
    out.push_str("| File | Type | Overall | Title | 갑구 | 을구 | Errors |\n");
    out.push_str("|------|------|---------|-------|------|------|--------|\n");
    for detail in &latest.details {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} |",
            detail.file,
            detail.property_type.as_deref().unwrap_or("-"),
            pct(detail.overall),
            opt_pct(detail.title),
            opt_pct(detail.section_a),
            opt_pct(detail.section_b),
            if detail.errors.is_empty() {
                "-".to_string()
            } else {
                detail.errors.join("; ")
            },
        );
    }

    out
}

pub fn write(path: &Path, history: &[BenchmarkRecord]) -> anyhow::Result<()> {
    std::fs::write(path, render(history))
        .map_err(|e| anyhow::anyhow!("writing {}: {e}", path.display()))
}
