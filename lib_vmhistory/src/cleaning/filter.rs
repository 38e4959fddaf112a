//! # Zero-Hours Filter
//!
//! Volunteers who registered for an activity but never completed it show up with
//! zero hours. Those rows are removed before any counting happens.

use std::cmp::Ordering;

use log::{error, info};

use crate::tables::record::{as_number, display_value, RecordTable};
use crate::tables::schema::ColumnMapping;

/// What the filter did, for logging and reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct CleaningReport {
    pub hours_column: Option<String>,
    pub initial_rows: usize,
    pub removed_rows: usize,
    pub remaining_rows: usize,
    /// Hours value → number of rows, sorted by value (numbers first).
    pub distribution: Vec<(String, usize)>,
}

/// Removes every row whose hours value is numerically exactly zero.
///
/// Null, non-numeric and non-zero hours are kept as they are. Without an hours
/// column the table is returned unchanged and an error is logged.
pub fn drop_zero_hours(table: &RecordTable, mapping: &ColumnMapping) -> (RecordTable, CleaningReport) {
    let initial_rows = table.len();
    info!("Initial rows: {initial_rows}");

    let Some(hours_col) = mapping.hours() else {
        error!("No 'Hours' column found. Available columns: {:?}", table.columns());
        let report = CleaningReport {
            hours_column: None,
            initial_rows,
            removed_rows: 0,
            remaining_rows: initial_rows,
            distribution: Vec::new(),
        };
        return (table.clone(), report);
    };
    info!("Using Hours column: '{hours_col}'");

    let distribution = hours_distribution(table, hours_col);
    info!("Hours distribution:");
    for (hours, count) in &distribution {
        info!("  {hours} hours: {count} records");
    }

    let cleaned = table.filtered(|row| {
        !matches!(row.get(hours_col).and_then(as_number), Some(h) if h == 0.0)
    });

    let removed_rows = initial_rows - cleaned.len();
    info!("Data Cleaning Results:");
    info!("  • Removed {removed_rows} rows with 0 hours");
    info!("  • Remaining rows: {}", cleaned.len());
    info!("  • Volunteers with 0 hours only registered but did not complete the activity");

    let report = CleaningReport {
        hours_column: Some(hours_col.to_string()),
        initial_rows,
        removed_rows,
        remaining_rows: cleaned.len(),
        distribution,
    };
    (cleaned, report)
}

fn hours_distribution(table: &RecordTable, hours_col: &str) -> Vec<(String, usize)> {
    let mut counts: Vec<(Option<f64>, String, usize)> = Vec::new();
    for value in table.column_values(hours_col) {
        if value.is_null() {
            continue;
        }
        let label = display_value(value);
        match counts.iter_mut().find(|(_, l, _)| *l == label) {
            Some(entry) => entry.2 += 1,
            None => counts.push((as_number(value), label, 1)),
        }
    }
    counts.sort_by(|a, b| match (a.0, b.0) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.1.cmp(&b.1),
    });
    counts.into_iter().map(|(_, label, n)| (label, n)).collect()
}
