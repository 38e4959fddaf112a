//! # Records and Record Tables
//!
//! A record is whatever JSON object the API returned for one history entry. The
//! table keeps rows in arrival order together with the union of their columns in
//! first-seen order, which is the column layout written to disk.

use serde_json::{Map, Value};

/// One row of volunteer-activity data, keyed by API field name.
pub type Record = Map<String, Value>;

/// # Record Table
///
/// An ordered sequence of records plus the ordered union of their field names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table with a fixed column layout, e.g. from a file header row.
    ///
    /// Columns found later in `rows` but absent from `columns` are appended.
    pub fn with_columns(columns: Vec<String>, rows: Vec<Record>) -> Self {
        let mut table = Self { columns, rows: Vec::with_capacity(rows.len()) };
        table.extend(rows);
        table
    }

    /// Appends one record, registering any column not seen before.
    pub fn push(&mut self, record: Record) {
        for key in record.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(record);
    }

    /// Appends records in order.
    pub fn extend<I: IntoIterator<Item = Record>>(&mut self, records: I) {
        for record in records {
            self.push(record);
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the value of `column` in every row; missing cells are `Null`.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().map(move |row| row.get(column).unwrap_or(&Value::Null))
    }

    /// Builds a new table with the same column layout, keeping the rows for which
    /// `keep` returns `true`.
    pub fn filtered<F>(&self, mut keep: F) -> RecordTable
    where
        F: FnMut(&Record) -> bool,
    {
        RecordTable {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

impl FromIterator<Record> for RecordTable {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut table = RecordTable::new();
        table.extend(iter);
        table
    }
}

/// Interprets a cell as a number when it holds one, either natively or as a
/// numeric string (spreadsheets and CSV files round-trip numbers that way).
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Renders a cell the way it should appear in a flat file or a report.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Python-style truthiness, used for pagination flags such as `hasNextPage`.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn columns_are_the_union_in_first_seen_order() {
        let table: RecordTable = vec![
            record(json!({"volunteerDate": "2025-08-01", "hours": 2})),
            record(json!({"hours": 1, "branch": "North"})),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.columns(), ["volunteerDate", "hours", "branch"]);
        let branches: Vec<&Value> = table.column_values("branch").collect();
        assert_eq!(branches, [&Value::Null, &json!("North")]);
    }

    #[test]
    fn numeric_strings_count_as_numbers() {
        assert_eq!(as_number(&json!(2.5)), Some(2.5));
        assert_eq!(as_number(&json!(" 3 ")), Some(3.0));
        assert_eq!(as_number(&json!("three")), None);
        assert_eq!(as_number(&Value::Null), None);
    }

    #[test]
    fn truthiness_matches_loose_json_flags() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("abc")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&Value::Null));
    }
}
