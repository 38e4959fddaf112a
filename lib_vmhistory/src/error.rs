//! # Error Types
//!
//! A single error enum shared by every module of the crate. Network failures are
//! classified here so the retry wrapper can decide whether another attempt makes
//! sense without knowing anything about `reqwest`.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VolunteerError>;

/// # Volunteer Error
///
/// Every failure the library can report. Missing columns are not errors; they
/// degrade the dependent computation and are only logged.
#[derive(Debug, Error)]
pub enum VolunteerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date range: start date ({start}) must be before end date ({end})")]
    DateRange { start: String, end: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP request to {url} failed with status {status}: {body}")]
    Http { status: u16, url: String, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    #[error("Pagination exceeded the limit of {0} pages")]
    TooManyPages(u32),

    #[error("Pagination cursor error: {0}")]
    Cursor(String),

    #[error("The API returned no records for the requested date range")]
    EmptyResult,

    #[error("No files matching {0} found")]
    NoInputFile(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Logger setup failed: {0}")]
    Logger(String),

    #[error("I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VolunteerError {
    /// Returns `true` for failures that are likely to go away on a second attempt:
    /// timeouts, transport faults, malformed bodies and 5xx / 408 / 429 responses.
    ///
    /// Other 4xx statuses (authentication, validation) are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            VolunteerError::Timeout(_)
            | VolunteerError::Transport(_)
            | VolunteerError::MalformedBody(_) => true,
            VolunteerError::Http { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> VolunteerError {
        VolunteerError::Http {
            status,
            url: "http://localhost/volunteer-history".into(),
            body: String::new(),
        }
    }

    #[test]
    fn server_errors_and_throttling_are_retryable() {
        assert!(http(500).is_retryable());
        assert!(http(503).is_retryable());
        assert!(http(429).is_retryable());
        assert!(http(408).is_retryable());
        assert!(VolunteerError::Timeout("slow".into()).is_retryable());
        assert!(VolunteerError::MalformedBody("<html>".into()).is_retryable());
    }

    #[test]
    fn client_errors_are_permanent() {
        assert!(!http(401).is_retryable());
        assert!(!http(404).is_retryable());
        assert!(!VolunteerError::EmptyResult.is_retryable());
    }
}
