//! Batch processing command for multiple documents.
//!
//! Documents are distributed across a worker pool; every worker shares the
//! same read-only catalog, and a failure on one file never aborts the rest
//! of the batch.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, warn};

use formscan_core::{FormParser, ParseOutcome};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: super::process::OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Template catalog file (default: embedded catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    outcome: Option<ParseOutcome>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "txt" | "text" | "ocr")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let parser = super::build_parser(config_path, args.catalog.as_deref())?;

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    // Worker pool: the parser and its catalog are shared read-only.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.max(1))
        .build()?;

    let results: Vec<ProcessResult> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let result = process_single_file(path, &parser);
                progress.inc(1);
                result
            })
            .collect()
    });

    progress.finish_with_message("Complete");

    let failed: Vec<&ProcessResult> = results.iter().filter(|r| r.error.is_some()).collect();
    if !failed.is_empty() && !args.continue_on_error {
        let first = &failed[0];
        anyhow::bail!(
            "Processing failed for {}: {}",
            first.path.display(),
            first.error.as_deref().unwrap_or("unknown error")
        );
    }

    // Write per-file outputs
    for result in &results {
        if let (Some(outcome), Some(output_dir)) = (&result.outcome, &args.output_dir) {
            let output_name = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("document");

            let extension = match args.format {
                super::process::OutputFormat::Json => "json",
                super::process::OutputFormat::Text => "txt",
            };

            let output_path = output_dir.join(format!("{}.{}", output_name, extension));
            let content = super::process::format_outcome(outcome, args.format)?;
            fs::write(&output_path, content)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    // Generate summary if requested
    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful = results.iter().filter(|r| r.outcome.is_some()).count();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Parse one file, catching its failure so the batch continues.
fn process_single_file(path: &PathBuf, parser: &FormParser) -> ProcessResult {
    let file_start = Instant::now();

    let parsed = fs::read(path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| parser.parse_bytes(&bytes).map_err(|e| e.to_string()));

    let processing_time_ms = file_start.elapsed().as_millis() as u64;

    match parsed {
        Ok(outcome) => ProcessResult {
            path: path.clone(),
            outcome: Some(outcome),
            error: None,
            processing_time_ms,
        },
        Err(error) => {
            warn!("Failed to process {}: {}", path.display(), error);
            ProcessResult {
                path: path.clone(),
                outcome: None,
                error: Some(error),
                processing_time_ms,
            }
        }
    }
}

fn write_summary(path: &PathBuf, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "fields",
        "matched",
        "match_ratio",
        "near_misses",
        "warnings",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(outcome) = &result.outcome {
            wtr.write_record([
                filename,
                "success",
                &outcome.stats.total_fields.to_string(),
                &outcome.stats.matched_fields.to_string(),
                &format!("{:.2}", outcome.stats.match_ratio),
                &outcome.stats.near_misses.len().to_string(),
                &outcome.warnings.len().to_string(),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
