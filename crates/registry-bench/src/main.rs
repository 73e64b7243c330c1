//! Benchmark CLI.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use registry_bench::{history, report, runner};
use registry_engine::{ParseConfig, ParserRegistry};

#[derive(Parser, Debug)]
#[command(name = "registry-bench")]
#[command(version, about = "Token-recall benchmark for registry certificate parsers")]
struct Args {
    /// PDF file or corpus directory
    path: Option<PathBuf>,

    /// Pin a parser version instead of the default
    #[arg(long)]
    parser: Option<String>,

    /// Run every registered parser version
    #[arg(long)]
    all_parsers: bool,

    /// List registered parsers and exit
    #[arg(long)]
    list: bool,

    /// Emit the run as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Save the run into the history file
    #[arg(long)]
    save: bool,

    /// Regenerate the markdown report from history
    #[arg(long)]
    report: bool,

    /// Engine config TOML
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "benchmark-history.json")]
    history: PathBuf,

    #[arg(long, default_value = "BENCHMARK.md")]
    output: PathBuf,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => ParseConfig::load(path)?,
        None => ParseConfig::default(),
    };
    let registry = ParserRegistry::with_builtin(config.clone());

    if args.list {
        for version in registry.versions() {
            let parser = registry.get(version).expect("listed version is registered");
            let info = parser.document_type_info();
            println!("{version}  {} ({})", info.display_name, info.type_id);
        }
        return Ok(());
    }

    let path = args
        .path
        .as_deref()
        .context("PATH is required unless --list is given")?;
    let files = collect_pdfs(path)?;
    if files.is_empty() {
        bail!("no PDF files found under {}", path.display());
    }
    tracing::info!(files = files.len(), "corpus collected");

    let versions: Vec<Option<String>> = if args.all_parsers {
        registry.versions().iter().map(|v| Some(v.to_string())).collect()
    } else {
        vec![args.parser.clone()]
    };

    for version in versions {
        let record = runner::run_benchmark(&files, &registry, version.as_deref(), &config);

        if args.json {
            println!("{}", serde_json::to_string_pretty(&record)?);
        } else {
            print_summary(&record, args.verbose);
        }

        if args.save {
            let mut records = history::load(&args.history)?;
            history::upsert(&mut records, record);
            history::save(&args.history, &records)?;
            tracing::info!(path = %args.history.display(), "history updated");
        }
    }

    if args.report {
        let records = history::load(&args.history)?;
        report::write(&args.output, &records)?;
        tracing::info!(path = %args.output.display(), "report written");
    }

    Ok(())
}

fn collect_pdfs(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("{} is neither a file nor a directory", path.display());
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(path)
        .with_context(|| format!("reading directory {}", path.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn print_summary(record: &registry_types::BenchmarkRecord, verbose: bool) {
    let opt = |v: Option<f64>| v.map(|s| format!("{s:.1}%")).unwrap_or_else(|| "-".into());
    println!("version  : {}", record.version);
    println!("files    : {}", record.files);
    println!("overall  : {:.1}%", record.overall);
    println!("title    : {}", opt(record.title));
    println!("section A: {}", opt(record.section_a));
    println!("section B: {}", opt(record.section_b));
    for detail in &record.details {
        println!("{}", format_detail(detail, verbose));
    }
}

/// One per-file summary line; verbose mode appends the top ground-truth
/// tokens the parse missed.
fn format_detail(detail: &registry_types::FileScore, verbose: bool) -> String {
    let mut line = format!("  {:<40} {:>6.1}%", detail.file, detail.overall);
    if !detail.errors.is_empty() {
        line.push_str(&format!("  [{}]", detail.errors.join("; ")));
    }
    if verbose && !detail.missing_top.is_empty() {
        line.push_str(&format!("\n      missed: {}", detail.missing_top.join(" ")));
    }
    line
}
