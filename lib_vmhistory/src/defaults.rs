//! Default extraction settings shared by the configuration layer and the
//! fetch/retry code.

/// Endpoint below the API root.
pub const ENDPOINT_PATH: &str = "volunteer-history";
/// `pageSize` query parameter.
pub const PAGE_SIZE: u32 = 1000;
/// Upper bound on requested pages per extraction.
pub const MAX_PAGES: u32 = 10_000;
/// Per-request timeout.
pub const TIMEOUT_SECS: u64 = 60;
/// Attempts per page, the first one included.
pub const MAX_ATTEMPTS: u32 = 3;
/// Base of the exponential retry delay.
pub const BACKOFF_BASE: f64 = 2.0;
