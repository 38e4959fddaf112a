//! # vh-validate
//!
//! Pre-flight check for vh-extract: reports whether the configuration still
//! holds placeholders and whether the reporting window is sane. Exits non-zero
//! when either check fails.

use chrono::{Local, NaiveDate};
use clap::Parser;
use lib_vmhistory::configs::config_vh::ExtractorConfig;
use lib_vmhistory::loggers::loggerlocal::{parse_level, setup_logging, LoggerOptions};
use lib_vmhistory::pipelines::validate::run_validation;
use lib_vmhistory::DateWindow;
use log::error;

/// CLI arguments for vh-validate.
#[derive(Parser)]
#[clap(
    name = "vh-validate",
    version = "1.0.0",
    author = "ckir",
    about = "Validates extractor configuration and the reporting window."
)]
struct Cli {
    /// Report month (YYYY-MM). Defaults to the previous calendar month.
    #[clap(long, short = 'm')]
    report_month: Option<String>,

    /// First day to extract (YYYY-MM-DD). Defaults to January 1st of the report year.
    #[clap(long, short = 's')]
    start_date: Option<NaiveDate>,

    /// Logging level (trace, debug, info, warn, error).
    #[clap(long, env = "VH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[clap(flatten)]
    config: ExtractorConfig,
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let options = LoggerOptions { level: parse_level(&cli.log_level), ..LoggerOptions::default() };
    if let Err(e) = setup_logging("vh-validate", &options) {
        eprintln!("Error: Failed to initialise logging.");
        eprintln!("Details: {}", e);
        std::process::exit(1);
    }

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Validation failed: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = ExtractorConfig::load(cli.config)?;

    let report_month = match &cli.report_month {
        Some(month) => DateWindow::parse_month(month)?,
        None => DateWindow::previous_month(Local::now().date_naive()),
    };
    let window = DateWindow::for_report_month(report_month, cli.start_date)?;

    Ok(run_validation(&config, &window).passed())
}
