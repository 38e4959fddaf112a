//! # Configuration Modules
//!
//! Settings for the volunteer-history tools, layered from defaults, a JSON file,
//! the environment and command-line flags.

/// Extractor settings, merging and placeholder validation.
pub mod config_vh;
