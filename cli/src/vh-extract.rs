//! # vh-extract
//!
//! Pulls the volunteer history for a reporting window from the API and writes it
//! to `VolunteerHistory_<from>_to_<to>.xlsx` (or `.csv` when the spreadsheet
//! cannot be written).

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, ValueHint};
use lib_vmhistory::configs::config_vh::ExtractorConfig;
use lib_vmhistory::loggers::loggerlocal::{parse_level, setup_logging, LoggerOptions};
use lib_vmhistory::pipelines::extract::run_extraction;
use lib_vmhistory::DateWindow;
use log::{error, info};

/// CLI arguments for vh-extract.
#[derive(Parser)]
#[clap(
    name = "vh-extract",
    version = "1.0.0",
    author = "ckir",
    about = "Extracts volunteer history for a reporting window.",
    long_about = "Fetches every page of volunteer history from January 1st (or --start-date) up to the \
                  end of the report month and saves it as a spreadsheet."
)]
struct Cli {
    /// Report month (YYYY-MM). Defaults to the previous calendar month.
    #[clap(long, short = 'm')]
    report_month: Option<String>,

    /// First day to extract (YYYY-MM-DD). Defaults to January 1st of the report year.
    #[clap(long, short = 's')]
    start_date: Option<NaiveDate>,

    /// Directory for the extracted file.
    #[clap(long, short = 'o', value_hint = ValueHint::DirPath, default_value = ".")]
    output_dir: PathBuf,

    /// Directory for log files; console only when omitted.
    #[clap(long, env = "VH_LOG_DIR", value_hint = ValueHint::DirPath)]
    log_dir: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error).
    #[clap(long, env = "VH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[clap(flatten)]
    config: ExtractorConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let options = LoggerOptions {
        level: parse_level(&cli.log_level),
        log_dir: cli.log_dir.clone(),
        ..LoggerOptions::default()
    };
    if let Err(e) = setup_logging("vh-extract", &options) {
        eprintln!("Error: Failed to initialise logging.");
        eprintln!("Details: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        error!("Extraction failed: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("Volunteer History Extraction");
    info!("{}", "=".repeat(60));

    let config = ExtractorConfig::load(cli.config)?.resolve()?;

    let report_month = match &cli.report_month {
        Some(month) => DateWindow::parse_month(month)?,
        None => DateWindow::previous_month(Local::now().date_naive()),
    };
    let window = DateWindow::for_report_month(report_month, cli.start_date)?;

    let report = run_extraction(&config, &window, &cli.output_dir).await?;
    info!(
        "Saved {} rows ({} columns, {} pages) to {}",
        report.records,
        report.columns,
        report.pages,
        report.output.path.display()
    );
    Ok(())
}
