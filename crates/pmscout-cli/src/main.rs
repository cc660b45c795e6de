//! pmscout - find PubMed papers with pharmaceutical or biotech authors
//!
//! Searches PubMed, keeps the authors affiliated with companies, and writes
//! one row per paper to a CSV file or to the console.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use pmscout_core::{INTERRUPTED_EXIT_CODE, ProgressContext, fmt_num};
use pmscout_pubmed::Harvest;

mod config;

use config::Config;

/// Failed identifiers listed in the summary before truncating
const MAX_LISTED_FAILURES: usize = 10;

#[derive(Parser, Debug)]
#[command(name = "pmscout")]
#[command(about = "Find PubMed papers with pharmaceutical or biotech authors")]
#[command(version)]
struct Cli {
    /// PubMed query (full PubMed search syntax)
    query: String,

    /// Write results to this CSV file instead of printing them
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Config file path (default: ./pmscout.toml or ~/.config/pmscout/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let progress = ProgressContext::new();

    // Logging:
    //   TTY:     quiet (warn) unless --debug, the progress bar shows activity
    //   non-TTY: info unless --debug, logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = is_tty && !cli.debug;
    pmscout_core::init_logging(quiet, cli.debug, multi);

    if let Err(e) = pmscout_core::install_signal_handlers() {
        log::warn!("Cannot install signal handlers: {e}");
    }

    match run(&cli, &progress) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, progress: &ProgressContext) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    let classifier = config.classifier()?;
    let harvest_config = config.harvest_config();
    log::debug!(
        "base_url={} max_results={} batch_size={} workers={}",
        harvest_config.base_url,
        harvest_config.max_results,
        harvest_config.batch_size,
        harvest_config.workers
    );

    let harvest = pmscout_pubmed::harvest(&cli.query, &harvest_config, &classifier, progress)?;

    match &cli.file {
        Some(path) => {
            pmscout_pubmed::write_csv(&harvest.records, path)?;
        }
        None => {
            pmscout_pubmed::print_records(&harvest.records, std::io::stdout().lock())
                .context("Failed to write records to stdout")?;
        }
    }

    print_summary(&harvest, cli.file.as_deref());

    if harvest.interrupted {
        return Ok(ExitCode::from(INTERRUPTED_EXIT_CODE));
    }
    Ok(ExitCode::SUCCESS)
}

/// Print a key-value summary table on stderr
fn print_summary(harvest: &Harvest, file: Option<&Path>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("PubMed").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);

    table.add_row(vec!["Query", harvest.query.as_str()]);
    table.add_row(vec![
        "Matches",
        &format!(
            "{} ({} requested)",
            fmt_num(harvest.total_count),
            fmt_num(harvest.ids.len())
        ),
    ]);
    table.add_row(vec!["Records", &fmt_num(harvest.records.len())]);
    if !harvest.failures.is_empty() {
        table.add_row(vec![
            Cell::new("Failed"),
            Cell::new(failure_list(harvest)).fg(Color::Yellow),
        ]);
    }
    let destination = file.map_or_else(|| "stdout".to_string(), |p| p.display().to_string());
    table.add_row(vec!["Output", destination.as_str()]);
    table.add_row(vec![
        "Time",
        &format!("{:.1}s", harvest.elapsed.as_secs_f64()),
    ]);
    if harvest.interrupted {
        table.add_row(vec![
            Cell::new("Status"),
            Cell::new("interrupted").fg(Color::Red),
        ]);
    }

    eprintln!("\n{table}");
}

/// "3: 111, 222, 333", truncated after a few ids
fn failure_list(harvest: &Harvest) -> String {
    let ids: Vec<&str> = harvest
        .failures
        .iter()
        .take(MAX_LISTED_FAILURES)
        .map(|f| f.id.as_str())
        .collect();
    let more = harvest.failures.len().saturating_sub(MAX_LISTED_FAILURES);
    let mut list = format!("{}: {}", harvest.failures.len(), ids.join(", "));
    if more > 0 {
        list.push_str(&format!(", +{more} more"));
    }
    list
}
