//! # Summary Report
//!
//! Aggregate statistics over a cleaned table and their plain-text rendering for
//! the monthly review.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{info, warn};
use serde_json::Value;

use crate::error::Result;
use crate::tables::record::{as_number, display_value, RecordTable};
use crate::tables::schema::ColumnMapping;

/// Default first line of the rendered report.
pub const DEFAULT_TITLE: &str = "Volunteer Data Summary Report";

/// Fixed reviewer notes appended to every report.
pub const REVIEW_NOTES: [&str; 5] = [
    "Check for reporting errors before pulling data",
    "Verify branch credit calculations",
    "Review manual adjustments for special programs (swim, etc.)",
    "Each data set requires its own deduplication logic",
    "Numbers vary depending on counting method (activity, person, location)",
];

/// Sum, mean and range of the hours column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoursStats {
    pub total: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Distinct and most frequent assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentStats {
    pub unique: usize,
    /// `None` when the table has no non-empty assignment.
    pub most_common: Option<String>,
}

/// # Summary
///
/// Everything the monthly report shows. Sections are `None` when the table has
/// no column for them.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_records: usize,
    /// Earliest and latest record date, as displayed in the source.
    pub date_range: Option<(String, String)>,
    pub hours: Option<HoursStats>,
    pub assignments: Option<AssignmentStats>,
}

impl Summary {
    /// Computes the summary of `table`.
    pub fn compute(table: &RecordTable, mapping: &ColumnMapping) -> Self {
        let date_range = match mapping.date() {
            Some(col) => date_range(table, col),
            None => {
                warn!("No date column found; date range omitted");
                None
            }
        };

        let hours = match mapping.hours() {
            Some(col) => {
                let stats = hours_stats(table, col);
                if stats.is_none() {
                    warn!("Hours column '{col}' holds no numeric values; hours statistics omitted");
                }
                stats
            }
            None => {
                warn!("No hours column found; hours statistics omitted");
                None
            }
        };

        let assignments = mapping.assignment().map(|col| assignment_stats(table, col));

        Self {
            total_records: table.len(),
            date_range,
            hours,
            assignments,
        }
    }

    /// The report's `Key: value` lines, in display order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = vec![("Total Records", self.total_records.to_string())];
        entries.push((
            "Date Range",
            match &self.date_range {
                Some((min, max)) => format!("{min} to {max}"),
                None => "N/A".to_string(),
            },
        ));
        if let Some(h) = &self.hours {
            entries.push(("Total Hours", format_number(h.total)));
            entries.push(("Average Hours per Record", format_number(round2(h.mean))));
            entries.push(("Min Hours", format_number(h.min)));
            entries.push(("Max Hours", format_number(h.max)));
        }
        if let Some(a) = &self.assignments {
            entries.push(("Unique Activities", a.unique.to_string()));
            entries.push((
                "Most Common Activity",
                a.most_common.clone().unwrap_or_else(|| "N/A".to_string()),
            ));
        }
        entries
    }

    /// Renders the report with an explicit generation timestamp.
    pub fn render(&self, title: &str, generated: NaiveDateTime) -> String {
        let mut out = String::new();
        out.push_str(title);
        out.push('\n');
        out.push_str(&"=".repeat(50));
        out.push('\n');
        out.push_str(&format!("Generated: {}\n\n", generated.format("%Y-%m-%d %H:%M:%S")));
        for (key, value) in self.entries() {
            out.push_str(&format!("{key}: {value}\n"));
        }
        out.push_str("\nNotes for Monthly Review:\n");
        for note in REVIEW_NOTES {
            out.push_str(&format!("• {note}\n"));
        }
        out
    }

    /// Writes `Summary_Report_<timestamp>.txt` into `output_dir`.
    pub fn write(&self, title: &str, output_dir: &Path) -> Result<PathBuf> {
        info!("Creating Summary Report...");
        fs::create_dir_all(output_dir)?;
        let now = Local::now().naive_local();
        let path = output_dir.join(format!("Summary_Report_{}.txt", now.format("%Y%m%d_%H%M%S")));
        fs::write(&path, self.render(title, now))?;
        info!("Summary report saved: {}", path.display());
        Ok(path)
    }
}

fn date_range(table: &RecordTable, col: &str) -> Option<(String, String)> {
    let mut dated: Vec<(NaiveDate, String)> = Vec::new();
    let mut undated: Vec<String> = Vec::new();
    for value in table.column_values(col) {
        if value.is_null() {
            continue;
        }
        let shown = display_value(value);
        match parse_date(&shown) {
            Some(d) => dated.push((d, shown)),
            None => undated.push(shown),
        }
    }

    if !dated.is_empty() {
        let min = dated.iter().min_by_key(|(d, _)| *d)?;
        let max = dated.iter().max_by_key(|(d, _)| *d)?;
        return Some((min.1.clone(), max.1.clone()));
    }
    let min = undated.iter().min()?;
    let max = undated.iter().max()?;
    Some((min.clone(), max.clone()))
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(text: &str) -> Option<NaiveDate> {
    let head = text.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn hours_stats(table: &RecordTable, col: &str) -> Option<HoursStats> {
    let values: Vec<f64> = table.column_values(col).filter_map(as_number).collect();
    if values.is_empty() {
        return None;
    }
    let total: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(HoursStats {
        total,
        mean: total / values.len() as f64,
        min,
        max,
    })
}

fn assignment_stats(table: &RecordTable, col: &str) -> AssignmentStats {
    // First-seen order doubles as the tie-break for the most common value.
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in table.column_values(col) {
        if is_blank(value) {
            continue;
        }
        let label = display_value(value);
        match counts.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 += 1,
            None => counts.push((label, 1)),
        }
    }

    let mut most_common: Option<&(String, usize)> = None;
    for entry in &counts {
        if most_common.map_or(true, |best| entry.1 > best.1) {
            most_common = Some(entry);
        }
    }

    AssignmentStats {
        unique: counts.len(),
        most_common: most_common.map(|(label, _)| label.clone()),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Whole numbers print without a fractional part.
fn format_number(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{x}")
    }
}
