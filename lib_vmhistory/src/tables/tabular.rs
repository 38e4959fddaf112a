//! # Tabular Files
//!
//! Reading and writing record tables as spreadsheets (`.xlsx`) or delimited text
//! (`.csv`), plus discovery of the newest extraction file in a directory.
//!
//! ## Key Features:
//! - **Spreadsheet first**: `save_table` writes `.xlsx` and falls back to `.csv`
//!   with the same stem when the spreadsheet writer fails.
//! - **Union layout**: every column seen in any row is written; missing cells
//!   stay empty.
//! - **Typed cells on read**: numbers and booleans survive a round trip; empty
//!   cells read back as `null`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;
use log::{info, warn};
use rust_xlsxwriter::Workbook;
use serde_json::{Number, Value};

use crate::error::{Result, VolunteerError};
use crate::tables::record::{display_value, Record, RecordTable};

/// File format of a saved table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Xlsx,
    Csv,
}

impl TableFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TableFormat::Xlsx => "xlsx",
            TableFormat::Csv => "csv",
        }
    }

    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xls" | "ods" => Some(TableFormat::Xlsx),
            "csv" => Some(TableFormat::Csv),
            _ => None,
        }
    }
}

/// Where a table ended up and in which format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedTable {
    pub path: PathBuf,
    pub format: TableFormat,
}

/// Name of the extraction output for a window, without extension:
/// `VolunteerHistory_<start YYYY-MM>_to_<last covered day YYYY-MM>`.
pub fn history_file_stem(start: NaiveDate, last_day: NaiveDate) -> String {
    format!(
        "VolunteerHistory_{}_to_{}",
        start.format("%Y-%m"),
        last_day.format("%Y-%m")
    )
}

/// Saves `table` as `<dir>/<stem>.xlsx`, falling back to `<dir>/<stem>.csv` if the
/// spreadsheet cannot be written.
pub fn save_table(table: &RecordTable, dir: &Path, stem: &str) -> Result<SavedTable> {
    fs::create_dir_all(dir)?;
    let xlsx_path = dir.join(format!("{stem}.{}", TableFormat::Xlsx.extension()));

    match write_xlsx(table, &xlsx_path) {
        Ok(()) => Ok(SavedTable { path: xlsx_path, format: TableFormat::Xlsx }),
        Err(e) => {
            warn!("Spreadsheet export failed ({e}); falling back to CSV");
            if xlsx_path.exists() {
                if let Err(e) = fs::remove_file(&xlsx_path) {
                    warn!("Could not remove partial spreadsheet {}: {e}", xlsx_path.display());
                }
            }
            let csv_path = dir.join(format!("{stem}.{}", TableFormat::Csv.extension()));
            write_csv(table, &csv_path)?;
            Ok(SavedTable { path: csv_path, format: TableFormat::Csv })
        }
    }
}

/// Writes `table` as a single-sheet workbook with a header row.
pub fn write_xlsx(table: &RecordTable, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col_idx, name) in table.columns().iter().enumerate() {
        let col = column_index(col_idx)?;
        sheet.write_string(0, col, name.as_str()).map_err(spreadsheet_err)?;
    }

    for (row_idx, record) in table.rows().iter().enumerate() {
        let row = u32::try_from(row_idx + 1)
            .map_err(|_| VolunteerError::Spreadsheet(format!("row {row_idx} out of range")))?;
        for (col_idx, name) in table.columns().iter().enumerate() {
            let col = column_index(col_idx)?;
            match record.get(name) {
                None | Some(Value::Null) => {}
                Some(Value::Number(n)) => match n.as_f64() {
                    Some(f) => {
                        sheet.write_number(row, col, f).map_err(spreadsheet_err)?;
                    }
                    None => {
                        sheet.write_string(row, col, n.to_string()).map_err(spreadsheet_err)?;
                    }
                },
                Some(Value::Bool(b)) => {
                    sheet.write_boolean(row, col, *b).map_err(spreadsheet_err)?;
                }
                Some(other) => {
                    sheet.write_string(row, col, display_value(other)).map_err(spreadsheet_err)?;
                }
            }
        }
    }

    workbook.save(path).map_err(spreadsheet_err)?;
    Ok(())
}

/// Writes `table` as comma-separated text with a header row.
pub fn write_csv(table: &RecordTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(table.columns()).map_err(csv_err)?;
    for record in table.rows() {
        let cells: Vec<String> = table
            .columns()
            .iter()
            .map(|c| record.get(c).map(display_value).unwrap_or_default())
            .collect();
        writer.write_record(&cells).map_err(csv_err)?;
    }
    writer.flush()?;
    Ok(())
}

/// Loads a table from `.xlsx` / `.csv`, choosing the reader by extension.
pub fn load_table(path: &Path) -> Result<RecordTable> {
    let table = match TableFormat::from_path(path) {
        Some(TableFormat::Xlsx) => read_xlsx(path)?,
        Some(TableFormat::Csv) => read_csv(path)?,
        None => {
            return Err(VolunteerError::Config(format!(
                "unsupported table file: {}",
                path.display()
            )))
        }
    };
    info!("Loaded {} rows from {}", table.len(), path.display());
    info!("Columns: {:?}", table.columns());
    Ok(table)
}

/// Reads the first worksheet; the first row is the header.
pub fn read_xlsx(path: &Path) -> Result<RecordTable> {
    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| VolunteerError::Spreadsheet(format!("{} has no worksheets", path.display())))?
        .map_err(spreadsheet_err)?;

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|cell| cell.to_string()).collect(),
        None => return Ok(RecordTable::new()),
    };

    let records = rows.map(|cells| {
        let mut record = Record::new();
        for (name, cell) in columns.iter().zip(cells.iter()) {
            record.insert(name.clone(), cell_to_value(cell));
        }
        record
    });
    Ok(RecordTable::with_columns(columns.clone(), records.collect()))
}

/// Reads comma-separated text with a header row.
pub fn read_csv(path: &Path) -> Result<RecordTable> {
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let columns: Vec<String> = reader.headers().map_err(csv_err)?.iter().map(String::from).collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_err)?;
        let mut record = Record::new();
        for (name, cell) in columns.iter().zip(row.iter()) {
            record.insert(name.clone(), text_to_value(cell));
        }
        records.push(record);
    }
    Ok(RecordTable::with_columns(columns, records))
}

/// Finds the newest file in `dir` matching any of `patterns` (glob syntax,
/// relative to `dir`). Creation time is used where the platform reports it,
/// modification time otherwise.
pub fn find_latest(dir: &Path, patterns: &[&str]) -> Result<PathBuf> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;

    for pattern in patterns {
        let dir_text = dir.to_string_lossy();
        let full = Path::new(glob::Pattern::escape(&dir_text).as_str()).join(pattern);
        let full = full.to_string_lossy();
        let entries = glob::glob(&full)
            .map_err(|e| VolunteerError::Config(format!("bad file pattern {full}: {e}")))?;
        for path in entries.flatten() {
            let Ok(meta) = fs::metadata(&path) else { continue };
            if !meta.is_file() {
                continue;
            }
            let stamp = meta
                .created()
                .or_else(|_| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            if newest.as_ref().map_or(true, |(best, _)| stamp > *best) {
                newest = Some((stamp, path));
            }
        }
    }

    newest
        .map(|(_, path)| path)
        .ok_or_else(|| VolunteerError::NoInputFile(patterns.join(", ")))
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Bool(b) => Value::Bool(*b),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => float_to_value(*f),
        other => Value::String(other.to_string()),
    }
}

fn text_to_value(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = cell.parse::<f64>() {
        if f.is_finite() {
            return float_to_value(f);
        }
    }
    match cell {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(cell.to_string()),
    }
}

/// Whole floats come back as integers so `2` written to a spreadsheet reads as `2`.
fn float_to_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn column_index(idx: usize) -> Result<u16> {
    u16::try_from(idx).map_err(|_| VolunteerError::Spreadsheet(format!("column {idx} out of range")))
}

fn spreadsheet_err<E: std::fmt::Display>(e: E) -> VolunteerError {
    VolunteerError::Spreadsheet(e.to_string())
}

fn csv_err(e: csv::Error) -> VolunteerError {
    VolunteerError::Csv(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample() -> RecordTable {
        vec![
            json!({"volunteerDate": "2025-08-01", "assignment": "Swim", "hours": 2}),
            json!({"volunteerDate": "2025-08-02", "hours": 1.5, "branch": "North"}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect()
    }

    #[test]
    fn history_stem_uses_start_and_last_covered_month() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2025, 8, 31).unwrap();
        assert_eq!(history_file_stem(start, last), "VolunteerHistory_2025-01_to_2025-08");
    }

    #[test]
    fn csv_round_trip_keeps_layout_and_types() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.csv");
        write_csv(&sample(), &path).unwrap();

        let back = read_csv(&path).unwrap();
        assert_eq!(back.columns(), ["volunteerDate", "assignment", "hours", "branch"]);
        assert_eq!(back.rows()[0]["hours"], json!(2));
        assert_eq!(back.rows()[1]["hours"], json!(1.5));
        assert_eq!(back.rows()[1]["assignment"], Value::Null);
    }

    #[test]
    fn xlsx_round_trip_keeps_layout_and_types() {
        let dir = tempdir().unwrap();
        let saved = save_table(&sample(), dir.path(), "history").unwrap();
        assert_eq!(saved.format, TableFormat::Xlsx);

        let back = load_table(&saved.path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.columns(), ["volunteerDate", "assignment", "hours", "branch"]);
        assert_eq!(back.rows()[0]["hours"], json!(2));
        assert_eq!(back.rows()[1]["branch"], json!("North"));
    }

    #[test]
    fn oversized_cell_falls_back_to_csv() {
        let dir = tempdir().unwrap();
        let mut table = sample();
        let mut huge = Record::new();
        huge.insert("notes".into(), Value::String("x".repeat(40_000)));
        table.push(huge);

        let saved = save_table(&table, dir.path(), "history").unwrap();
        assert_eq!(saved.format, TableFormat::Csv);
        assert!(saved.path.ends_with("history.csv"));
        assert!(!dir.path().join("history.xlsx").exists());
    }

    #[test]
    fn latest_file_is_discovered_and_absence_reported() {
        let dir = tempdir().unwrap();
        let patterns = ["VolunteerHistory_*.xlsx", "VolunteerHistory_*.csv"];
        assert!(matches!(
            find_latest(dir.path(), &patterns),
            Err(VolunteerError::NoInputFile(_))
        ));

        fs::write(dir.path().join("VolunteerHistory_2025-01_to_2025-07.csv"), "a\n1\n").unwrap();
        fs::write(dir.path().join("unrelated.csv"), "a\n1\n").unwrap();
        let found = find_latest(dir.path(), &patterns).unwrap();
        assert!(found.ends_with("VolunteerHistory_2025-01_to_2025-07.csv"));
    }

    #[test]
    fn discovery_works_under_directories_with_glob_characters() {
        let root = tempdir().unwrap();
        let dir = root.path().join("exports [2025]*");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("VolunteerHistory_2025-01_to_2025-08.csv"), "a\n1\n").unwrap();

        let found = find_latest(&dir, &["VolunteerHistory_*.csv"]).unwrap();
        assert!(found.ends_with("VolunteerHistory_2025-01_to_2025-08.csv"));
    }
}
