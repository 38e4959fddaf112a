//! # Cleaning Module
//!
//! Pure functions over a `RecordTable`: dropping rows that never turned into
//! volunteering, and collapsing rows down to the unit a report counts.

/// Removal of zero-hour registrations.
pub mod filter;
/// Mode-selected deduplication.
pub mod dedup;
