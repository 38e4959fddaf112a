//! # Reports Module
//!
//! Aggregate statistics over cleaned volunteer history.

/// Totals, ranges and the rendered monthly summary.
pub mod summary;
