//! # lib_vmhistory
//!
//! Volunteer-history extraction and monthly reporting.
//!
//! ## Key Features
//! - **Retrieval** (`retrieve`, `history`): paginated fetch of the
//!   volunteer-history endpoint with classified exponential-backoff retry.
//! - **Tables** (`tables`): record tables, column discovery, spreadsheet and CSV
//!   files with a CSV fallback.
//! - **Cleaning and reports** (`cleaning`, `reports`): zero-hours filtering,
//!   three deduplication modes and the monthly summary.
//! - **Tooling** (`configs`, `loggers`, `pipelines`): layered configuration,
//!   console/file logging and the end-to-end workflows used by the binaries.
//!
//! Folder modules that pull in heavy dependencies are gated by Cargo features.

pub mod cleaning;
pub mod defaults;
pub mod error;
pub mod reports;
pub mod tables;
pub mod window;

#[cfg(feature = "configs")]
pub mod configs;

#[cfg(feature = "loggers")]
pub mod loggers;

#[cfg(feature = "retrieve")]
pub mod retrieve;

#[cfg(feature = "retrieve")]
pub mod history;

#[cfg(all(feature = "configs", feature = "retrieve", feature = "tables"))]
pub mod pipelines;

pub use error::{Result, VolunteerError};
pub use tables::record::{Record, RecordTable};
pub use window::DateWindow;
