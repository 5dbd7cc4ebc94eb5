//! Command implementations for the health export CLI
//!
//! This module contains the command execution logic, progress reporting
//! and terminal summaries. The extraction core is synchronous, so each
//! command runs it on a blocking thread.

use crate::cli::{Args, Command};
use crate::config::ExtractionConfig;
use crate::error::HealthError;
use crate::export::{CsvExporter, ExportedFile};
use crate::extractor::CategoryExtractor;
use crate::models::Category;
use crate::profile::ProfileRecord;
use crate::range::DateRange;
use crate::report::CollectionReport;
use crate::session::{GenerationSession, GenerationState};
use crate::store::RecordStore;
use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use tracing::{debug, info};

/// Main command runner
///
/// 1. Set up logging
/// 2. Build and validate the extraction configuration
/// 3. Run the selected command on a blocking thread
pub async fn run(args: Args) -> Result<()> {
    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    let config = args.to_config();
    config.validate().context("Invalid extraction settings")?;

    let Some(command) = args.command else {
        anyhow::bail!("No command given");
    };

    let show_progress = !args.quiet;
    tokio::task::spawn_blocking(move || match command {
        Command::Export { input, .. } => run_export(&input, &config, show_progress),
        Command::Profile { input } => run_profile(&input, &config),
        Command::Summary {
            input,
            start,
            end,
            start_time,
            end_time,
        } => {
            let range = DateRange::from_parts(
                &start,
                start_time.as_deref(),
                &end,
                end_time.as_deref(),
            )?;
            run_summary(&input, &config, &range)
        }
    })
    .await
    .map_err(|e| HealthError::TaskFailed {
        reason: e.to_string(),
    })?
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("health_export={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .context("Failed to install log subscriber")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to install log subscriber")?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

fn open_store(input: &std::path::Path, config: &ExtractionConfig) -> Result<RecordStore> {
    RecordStore::open_with_tag(input, &config.record_tag)
        .with_context(|| format!("Failed to load export {}", input.display()))
}

fn run_export(input: &std::path::Path, config: &ExtractionConfig, show_progress: bool) -> Result<()> {
    let start_time = Instant::now();
    let store = open_store(input, config)?;
    let counts = store.category_counts();
    info!(
        "Export holds {} category records across {} of {} categories",
        counts.values().sum::<usize>(),
        counts.len(),
        Category::ALL.len()
    );
    let exporter = CsvExporter::new(config);
    let extractor = CategoryExtractor::new(config.clone());

    let progress_bar = if show_progress {
        let pb = ProgressBar::new(Category::ALL.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );
        pb.set_message("Exporting categories...");
        Some(pb)
    } else {
        None
    };

    let report = exporter.export_categories(&store, &extractor, &Category::ALL, |category| {
        if let Some(pb) = &progress_bar {
            pb.inc(1);
            pb.set_message(format!("Exported {}", category));
        }
    })?;

    if let Some(pb) = &progress_bar {
        pb.finish_with_message("Export complete");
    }

    print_export_report(&exporter, &report);
    info!(
        "Export finished in {}ms",
        start_time.elapsed().as_millis()
    );

    Ok(())
}

fn print_export_report(exporter: &CsvExporter, report: &CollectionReport<ExportedFile>) {
    println!("\n{}", "Export Summary".bright_green().bold());
    println!(
        "  {} {}",
        "Output:".bright_cyan(),
        exporter.output_dir().display()
    );

    for outcome in report.outcomes() {
        match &outcome.result {
            Ok(file) => println!(
                "  {} {} {}",
                "✓".bright_green(),
                outcome.category.to_string().bright_white(),
                format!("({} rows -> {})", file.rows, file.path.display()).bright_black()
            ),
            Err(e) => println!(
                "  {} {} {}",
                "✗".bright_red(),
                outcome.category.to_string().bright_white(),
                format!("({})", e).bright_black()
            ),
        }
    }

    println!(
        "  {} {} written, {} skipped",
        "Files:".bright_cyan(),
        report.success_count().to_string().bright_white().bold(),
        report.failure_count().to_string().bright_white()
    );
}

fn run_profile(input: &std::path::Path, config: &ExtractionConfig) -> Result<()> {
    let store = open_store(input, config)?;
    let profile = ProfileRecord::extract(&store);

    println!("\n{}", profile.user_name().bright_green().bold());
    let rows = [
        ("Date of Birth", profile.date_of_birth().to_string()),
        ("Biological Sex", profile.biological_sex().to_string()),
        ("Blood Type", profile.blood_type().to_string()),
        ("Fitzpatrick Skin Type", profile.skin_type().to_string()),
        (
            "Cardio Fitness Medications Use",
            profile.medications_use().to_string(),
        ),
        ("Height", profile.height.to_string()),
        ("Body Mass", profile.body_mass.to_string()),
    ];
    for (label, value) in rows {
        println!("  {:<32} {}", label.bright_cyan(), value.bright_white());
    }

    Ok(())
}

fn run_summary(input: &std::path::Path, config: &ExtractionConfig, range: &DateRange) -> Result<()> {
    let mut session = GenerationSession::new(config.clone());
    session.stage_source(input);

    let state = session.generate(range)?;
    let report = match state {
        GenerationState::Done(report) => report,
        GenerationState::Failed(reason) => anyhow::bail!("Generation failed: {}", reason),
        other => anyhow::bail!("Generation ended in unexpected state: {}", other.label()),
    };

    println!("\n{}", "Category Summary".bright_green().bold());
    println!("  {} {}", "Range:".bright_cyan(), range);

    for outcome in report.outcomes() {
        match &outcome.result {
            Ok(view) => {
                let buckets = view
                    .hourly
                    .as_ref()
                    .map(|hourly| {
                        let dates = hourly.dates();
                        match (dates.first(), dates.last()) {
                            (Some(first), Some(last)) => format!(
                                ", {} hourly buckets over {} days {}-{}",
                                hourly.len(),
                                dates.len(),
                                first,
                                last
                            ),
                            _ => ", no hourly buckets".to_string(),
                        }
                    })
                    .unwrap_or_default();
                println!(
                    "  {} {} {}",
                    "✓".bright_green(),
                    outcome.category.to_string().bright_white(),
                    format!("({} rows{})", view.table.len(), buckets).bright_black()
                );
            }
            Err(e) => println!(
                "  {} {} {}",
                "✗".bright_red(),
                outcome.category.to_string().bright_white(),
                format!("({})", e).bright_black()
            ),
        }
    }

    Ok(())
}
