//! # Pipelines
//!
//! The three end-to-end workflows behind the command-line tools.
//!
//! ## Contained Modules:
//!
//! - **`extract`**: API → `VolunteerHistory_<from>_to_<to>.xlsx`.
//! - **`prepare`**: newest history file → cleaned data, summary report and
//!   deduplicated views under `processed_data/`.
//! - **`validate`**: configuration and date-window checks.

pub mod extract;
pub mod prepare;
pub mod validate;
