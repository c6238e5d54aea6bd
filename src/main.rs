//! Reqsum CLI - batch summary generation for merit badge requirements
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use reqsum::agent::AnthropicClient;
use reqsum::driver::{self, BatchOptions, RunReport};
use reqsum::{input, output, CheckpointStore, Config};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "reqsum")]
#[command(author, version, about = "Generate 40-character summaries for merit badge requirements", long_about = None)]
struct Cli {
    /// Path to reqsum.toml (defaults to cwd, then ~/.config/reqsum/)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Raw requirements dump
    #[arg(long)]
    input: Option<PathBuf>,
    /// Checkpoint file
    #[arg(long)]
    checkpoint: Option<PathBuf>,
    /// Final lookup file
    #[arg(long)]
    output: Option<PathBuf>,
    /// Model identifier
    #[arg(long)]
    model: Option<String>,
    /// Save the checkpoint every N summaries
    #[arg(long)]
    batch_size: Option<usize>,
    /// Pause between API calls, in milliseconds
    #[arg(long)]
    sleep_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(path) = cli.input {
        config.paths.input = path;
    }
    if let Some(path) = cli.checkpoint {
        config.paths.checkpoint = path;
    }
    if let Some(path) = cli.output {
        config.paths.output = path;
    }
    if let Some(model) = cli.model {
        config.agent.model = model;
    }
    if let Some(size) = cli.batch_size {
        config.batch.size = size;
    }
    if let Some(sleep_ms) = cli.sleep_ms {
        config.batch.sleep_ms = sleep_ms;
    }

    // Missing credential is fatal before any work starts
    let api_key = config.api_key()?.to_string();
    let client = AnthropicClient::new(&api_key, &config.agent.model, config.agent.max_tokens)?;

    println!("Loading requirements...");
    let unique = input::load_requirements(&config.paths.input)
        .with_context(|| format!("reading {}", config.paths.input.display()))?;
    println!("Found {} unique requirement texts", unique.len());

    let store = CheckpointStore::new(&config.paths.checkpoint);
    let mut summaries = store
        .load()
        .with_context(|| format!("loading {}", config.paths.checkpoint.display()))?;
    println!("Loaded {} existing summaries from checkpoint", summaries.len());

    let pending = unique
        .keys()
        .filter(|text| !summaries.contains_key(*text))
        .count();
    println!("Need to generate {} new summaries", pending);

    let report = if pending == 0 {
        println!("All summaries already generated!");
        RunReport::default()
    } else {
        let opts = BatchOptions {
            batch_size: config.batch.size,
            sleep: Duration::from_millis(config.batch.sleep_ms),
        };
        driver::run(&client, &unique, &mut summaries, &store, &opts).await?
    };

    print_flagged_report(&report);

    println!("\nBuilding final output file...");
    let artifact = output::build_artifact(&summaries, chrono::Utc::now().date_naive());
    output::write_artifact(&config.paths.output, &artifact)?;

    println!(
        "Wrote {} summaries to {}",
        artifact.summaries.len(),
        config.paths.output.display()
    );
    println!("Flagged items: {}", artifact.flags.len());
    println!("Done!");

    Ok(())
}

/// Print every degraded summary from this run for human review.
/// Informational only: flagged items never affect the exit code.
fn print_flagged_report(report: &RunReport) {
    if report.flagged.is_empty() {
        return;
    }

    println!("\n{}", "=".repeat(60));
    println!(
        "{}",
        format!(
            "FLAGGED ITEMS ({} items may have lost critical meaning):",
            report.flagged.len()
        )
        .yellow()
        .bold()
    );
    println!("{}", "=".repeat(60));

    for item in &report.flagged {
        println!("\n{} {}:", item.badge.bold(), item.number);
        println!("  Original: {}", item.original);
        println!("  Summary:  {}", item.summary);
        println!("  Flag:     {}", item.flag.yellow());
    }
}
