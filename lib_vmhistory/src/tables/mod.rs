//! # Tables Module
//!
//! Flat record tables and everything needed to move them on and off disk.
//!
//! ## Contained Modules:
//!
//! - **`record`**: the `Record` / `RecordTable` data model and cell helpers.
//! - **`schema`**: one-shot resolution of role columns (hours, date, ...) from
//!   partial names.
//! - **`tabular`**: `.xlsx` / `.csv` readers and writers with CSV fallback, and
//!   newest-file discovery. Requires the `tables` feature.

/// Records, record tables and cell helpers.
pub mod record;
/// Column role resolution.
pub mod schema;
/// Spreadsheet and CSV persistence.
#[cfg(feature = "tables")]
pub mod tabular;
