//! # History Module
//!
//! Paginated retrieval of volunteer history for a date window.

/// Page-number and token cursors.
pub mod cursor;
/// Decoding of one page body.
pub mod page;
/// The paginated fetcher and its HTTP-backed page source.
pub mod fetcher;
