//! # vh-prepare
//!
//! Cleans the newest extraction file and writes the monthly review material:
//! raw data without zero-hour rows, a summary report and optional deduplicated
//! views, all under `processed_data/`.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueHint};
use lib_vmhistory::cleaning::dedup::DedupMode;
use lib_vmhistory::loggers::loggerlocal::{parse_level, setup_logging, LoggerOptions};
use lib_vmhistory::pipelines::prepare::{run_preparation, PrepareOptions};
use lib_vmhistory::reports::summary::DEFAULT_TITLE;
use lib_vmhistory::tables::schema::{ColumnOverrides, ColumnRole};
use log::{error, info};

/// CLI arguments for vh-prepare.
#[derive(Parser)]
#[clap(
    name = "vh-prepare",
    version = "1.0.0",
    author = "ckir",
    about = "Prepares extracted volunteer history for monthly review."
)]
struct Cli {
    /// Directory searched for the newest VolunteerHistory_* file.
    #[clap(long, short = 'i', value_hint = ValueHint::DirPath, default_value = ".")]
    input_dir: PathBuf,

    /// Use this file instead of the newest one.
    #[clap(long, short = 'f', value_hint = ValueHint::FilePath)]
    input_file: Option<PathBuf>,

    /// Output directory.
    #[clap(long, short = 'o', value_hint = ValueHint::DirPath, default_value = "processed_data")]
    output_dir: PathBuf,

    /// Deduplicated view to write (activity, person, location). Repeatable.
    #[clap(long, short = 'd', value_name = "MODE", action = ArgAction::Append)]
    dedup: Vec<DedupMode>,

    /// Write all three deduplicated views.
    #[clap(long, action = ArgAction::SetTrue)]
    all_dedup: bool,

    /// Title line of the summary report.
    #[clap(long, default_value = DEFAULT_TITLE)]
    title: String,

    #[clap(long, env = "VH_HOURS_COLUMN")]
    hours_column: Option<String>,

    #[clap(long, env = "VH_DATE_COLUMN")]
    date_column: Option<String>,

    #[clap(long, env = "VH_ASSIGNMENT_COLUMN")]
    assignment_column: Option<String>,

    #[clap(long, env = "VH_LOCATION_COLUMN")]
    location_column: Option<String>,

    #[clap(long, env = "VH_VOLUNTEER_COLUMN")]
    volunteer_column: Option<String>,

    /// Directory for log files; console only when omitted.
    #[clap(long, env = "VH_LOG_DIR", value_hint = ValueHint::DirPath)]
    log_dir: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error).
    #[clap(long, env = "VH_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let options = LoggerOptions {
        level: parse_level(&cli.log_level),
        log_dir: cli.log_dir.clone(),
        ..LoggerOptions::default()
    };
    if let Err(e) = setup_logging("vh-prepare", &options) {
        eprintln!("Error: Failed to initialise logging.");
        eprintln!("Details: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli) {
        error!("Preparation failed: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut columns = ColumnOverrides::new();
    columns.set(ColumnRole::Hours, cli.hours_column);
    columns.set(ColumnRole::Date, cli.date_column);
    columns.set(ColumnRole::Assignment, cli.assignment_column);
    columns.set(ColumnRole::Location, cli.location_column);
    columns.set(ColumnRole::Volunteer, cli.volunteer_column);

    let dedup_modes = if cli.all_dedup {
        DedupMode::ALL.to_vec()
    } else {
        let mut modes: Vec<DedupMode> = Vec::new();
        for mode in cli.dedup {
            if !modes.contains(&mode) {
                modes.push(mode);
            }
        }
        modes
    };

    let options = PrepareOptions {
        input_dir: cli.input_dir,
        input_file: cli.input_file,
        output_dir: cli.output_dir,
        dedup_modes,
        columns,
        report_title: cli.title,
    };
    let report = run_preparation(&options)?;

    info!(
        "Prepared {} of {} rows from {}",
        report.cleaning.remaining_rows,
        report.cleaning.initial_rows,
        report.input.display()
    );
    for view in &report.dedup {
        info!("  • {}: {} rows", view.mode, view.rows);
    }
    Ok(())
}
