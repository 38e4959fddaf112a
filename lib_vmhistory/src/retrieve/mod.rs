//! # Data Retrieval Module
//!
//! Networking for the volunteer-history API, kept apart from pagination so the
//! fetcher only deals with pages and cursors.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: `ApiClient`, an authenticated JSON GET client on `reqwest`
//!   that classifies failures.
//! - **`retry`**: `RetryPolicy` and `execute_with_retry`, the exponential
//!   backoff wrapper applied to every page request.

/// Authenticated JSON client with classified errors.
pub mod ky_http;
/// Exponential backoff retry for transient failures.
pub mod retry;
