//! # Preparation Pipeline
//!
//! Turns the newest extraction file into review material: the zero-hours-free
//! raw data, the summary report and, on request, one deduplicated view per
//! counting method.

use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;

use crate::cleaning::dedup::{deduplicate, DedupMode};
use crate::cleaning::filter::{drop_zero_hours, CleaningReport};
use crate::error::Result;
use crate::reports::summary::{Summary, DEFAULT_TITLE};
use crate::tables::schema::{ColumnMapping, ColumnOverrides};
use crate::tables::tabular::{find_latest, load_table, save_table, SavedTable};

/// File patterns produced by the extraction pipeline.
pub const HISTORY_FILE_PATTERNS: [&str; 2] = ["VolunteerHistory_*.xlsx", "VolunteerHistory_*.csv"];

/// Inputs of a preparation run.
#[derive(Debug, Clone)]
pub struct PrepareOptions {
    /// Directory searched for the newest extraction file.
    pub input_dir: PathBuf,
    /// Explicit input, bypassing discovery.
    pub input_file: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub dedup_modes: Vec<DedupMode>,
    pub columns: ColumnOverrides,
    pub report_title: String,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            input_file: None,
            output_dir: PathBuf::from("processed_data"),
            dedup_modes: Vec::new(),
            columns: ColumnOverrides::new(),
            report_title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// One saved deduplicated view.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupOutput {
    pub mode: DedupMode,
    pub rows: usize,
    pub saved: SavedTable,
}

/// Everything a preparation run wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparationReport {
    pub input: PathBuf,
    pub cleaning: CleaningReport,
    pub raw_data: SavedTable,
    pub summary: Summary,
    pub summary_path: PathBuf,
    pub dedup: Vec<DedupOutput>,
}

pub fn run_preparation(options: &PrepareOptions) -> Result<PreparationReport> {
    info!("Volunteer Data Preparation");
    info!("{}", "=".repeat(60));

    let input = match &options.input_file {
        Some(path) => path.clone(),
        None => find_latest(&options.input_dir, &HISTORY_FILE_PATTERNS)?,
    };
    info!("Using file: {}", input.display());

    let table = load_table(&input)?;
    let mapping = ColumnMapping::resolve_with(table.columns(), &options.columns);

    let (cleaned, cleaning) = drop_zero_hours(&table, &mapping);

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let raw_data = save_table(&cleaned, &options.output_dir, &format!("Raw_Data_{timestamp}"))?;
    info!("Raw data saved: {}", raw_data.path.display());

    let summary = Summary::compute(&cleaned, &mapping);
    let summary_path = summary.write(&options.report_title, &options.output_dir)?;

    let mut dedup = Vec::new();
    for mode in &options.dedup_modes {
        let view = deduplicate(&cleaned, &mapping, *mode);
        let saved = save_table(&view, &options.output_dir, &format!("Dedup_{mode}_{timestamp}"))?;
        info!("Deduplicated ({mode}) data saved: {}", saved.path.display());
        dedup.push(DedupOutput { mode: *mode, rows: view.len(), saved });
    }

    log_next_steps(&options.output_dir);

    Ok(PreparationReport {
        input,
        cleaning,
        raw_data,
        summary,
        summary_path,
        dedup,
    })
}

fn log_next_steps(output_dir: &Path) {
    info!("Deduplication options available (--dedup <mode>):");
    info!("1. activity: one row per volunteer, date and assignment");
    info!("2. person: one row per volunteer and date");
    info!("3. location: one row per volunteer, date and branch");
    info!("Next Steps:");
    info!("1. Review the Raw Data file in {} for accuracy", output_dir.display());
    info!("2. Apply specific deduplication logic as needed");
    info!("3. Check monthly for reporting errors");
    info!("4. Apply manual adjustments for special programs");
}
