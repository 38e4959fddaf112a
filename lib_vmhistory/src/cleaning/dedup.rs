//! # Deduplication
//!
//! The same cleaned table answers different reporting questions depending on
//! what counts as "one": an activity completion, a volunteer-day, or a
//! volunteer-day at a given branch. Each mode keeps the first row of every
//! equivalence class, in input order.
//!
//! | Mode | Key |
//! |---|---|
//! | `activity` | volunteer, date, assignment |
//! | `person` | volunteer, date |
//! | `location` | volunteer, date, location/branch (falls back to `activity`) |
//!
//! When no volunteer column can be resolved the key degrades to the remaining
//! fields, which matches exports that carry one row per person already.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use log::{error, info, warn};
use serde_json::Value;

use crate::tables::record::RecordTable;
use crate::tables::schema::ColumnMapping;

/// Counting method for deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DedupMode {
    Activity,
    Person,
    Location,
}

impl DedupMode {
    pub const ALL: [DedupMode; 3] = [DedupMode::Activity, DedupMode::Person, DedupMode::Location];

    pub fn as_str(self) -> &'static str {
        match self {
            DedupMode::Activity => "activity",
            DedupMode::Person => "person",
            DedupMode::Location => "location",
        }
    }
}

impl fmt::Display for DedupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DedupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "activity" => Ok(DedupMode::Activity),
            "person" => Ok(DedupMode::Person),
            "location" => Ok(DedupMode::Location),
            other => Err(format!(
                "Invalid deduplication method '{other}'. Use: 'activity', 'person', or 'location'"
            )),
        }
    }
}

/// Deduplicates by a mode given as text.
///
/// An unknown mode is not an error: it is logged and the input comes back
/// unchanged.
pub fn deduplicate_by_name(table: &RecordTable, mapping: &ColumnMapping, mode: &str) -> RecordTable {
    match mode.parse::<DedupMode>() {
        Ok(m) => deduplicate(table, mapping, m),
        Err(msg) => {
            error!("{msg}");
            table.clone()
        }
    }
}

/// Keeps the first row of every equivalence class under `mode`.
pub fn deduplicate(table: &RecordTable, mapping: &ColumnMapping, mode: DedupMode) -> RecordTable {
    info!("Deduplication by {mode}...");
    let key_columns = key_columns(mapping, mode);
    if key_columns.is_empty() {
        warn!("  • No key columns resolved for '{mode}'; every row collapses into one");
    }

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let deduped = table.filtered(|row| {
        let key: Vec<String> = key_columns
            .iter()
            .map(|c| key_part(row.get(c.as_str()).unwrap_or(&Value::Null)))
            .collect();
        seen.insert(key)
    });

    info!("  • Removed {} duplicate rows", table.len() - deduped.len());
    info!("  • Remaining rows: {}", deduped.len());
    deduped
}

fn key_columns(mapping: &ColumnMapping, mode: DedupMode) -> Vec<String> {
    let mut columns = Vec::new();

    match mapping.volunteer() {
        Some(v) => columns.push(v.to_string()),
        None => warn!("  • No volunteer column found; keys use date and activity fields only"),
    }
    match mapping.date() {
        Some(d) => columns.push(d.to_string()),
        None => warn!("  • No date column found; keys ignore the date"),
    }

    let push_assignment = |columns: &mut Vec<String>| match mapping.assignment() {
        Some(a) => columns.push(a.to_string()),
        None => warn!("  • No assignment column found; keys ignore the activity"),
    };

    match mode {
        DedupMode::Activity => {
            info!("  • Counting by activity: Each unique activity completion");
            push_assignment(&mut columns);
        }
        DedupMode::Person => {
            info!("  • Counting by person: Each unique volunteer per day");
        }
        DedupMode::Location => match mapping.location() {
            Some(loc) => {
                info!("  • Counting by location: Using column '{loc}'");
                columns.push(loc.to_string());
            }
            None => {
                warn!("  • No location/branch column found, using activity method");
                push_assignment(&mut columns);
            }
        },
    }
    columns
}

/// Serialized cell used as a hashable key component. `null` and a missing
/// field compare equal.
fn key_part(value: &Value) -> String {
    value.to_string()
}
