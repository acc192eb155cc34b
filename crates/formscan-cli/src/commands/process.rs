//! Process command - extract fields from a single document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use formscan_core::ParseOutcome;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input text file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Template catalog file (default: embedded catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Show per-document statistics
    #[arg(long)]
    stats: bool,

    /// Show structural validation warnings
    #[arg(long)]
    validate: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let parser = super::build_parser(config_path, args.catalog.as_deref())?;
    let bytes = fs::read(&args.input)?;
    let outcome = parser.parse_bytes(&bytes)?;

    if args.validate && !outcome.warnings.is_empty() {
        eprintln!("{}", style("Validation warnings:").yellow());
        for warning in &outcome.warnings {
            eprintln!("  - {}", warning);
        }
    }

    let output = format_outcome(&outcome, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.stats {
        println!();
        println!(
            "{} {} fields, {} matched ({:.0}%)",
            style("ℹ").blue(),
            outcome.stats.total_fields,
            outcome.stats.matched_fields,
            outcome.stats.match_ratio * 100.0
        );
        for (section, count) in &outcome.stats.by_section {
            println!("   {}: {}", section, count);
        }
        if !outcome.stats.near_misses.is_empty() {
            println!("{}", style("Near misses:").yellow());
            for miss in &outcome.stats.near_misses {
                println!("   {:?} ~ {} ({:.2})", miss.title, miss.key, miss.score);
            }
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_outcome(outcome: &ParseOutcome, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&outcome.fields)?),
        OutputFormat::Text => Ok(format_text(outcome)),
    }
}

fn format_text(outcome: &ParseOutcome) -> String {
    let mut output = String::new();

    let mut section = None;
    for field in &outcome.fields {
        if section != Some(field.section) {
            section = Some(field.section);
            output.push_str(&format!("\n{}\n", field.section));
        }
        output.push_str(&format!(
            "  {:<32} [{}] {}\n",
            field.key,
            field.control.type_name(),
            field.title
        ));
        if let Some(options) = field.control.options() {
            for option in options {
                output.push_str(&format!("      - {}\n", option.name));
            }
        }
    }

    output
}
