//! Page cursor: either a page counter or an opaque token handed out by the server.

use serde_json::Value;

use crate::error::{Result, VolunteerError};

/// Position of the next page request.
#[derive(Debug, Clone, PartialEq)]
pub enum PageCursor {
    /// Sequential page numbers, starting at 1.
    ByNumber(u64),
    /// Server-provided `nextPage` value, sent back verbatim.
    ByToken(Value),
}

impl Default for PageCursor {
    fn default() -> Self {
        PageCursor::ByNumber(1)
    }
}

impl PageCursor {
    /// The `page` query parameter for this cursor. String tokens are sent
    /// without quotes, anything else in its JSON form.
    pub fn query_value(&self) -> String {
        match self {
            PageCursor::ByNumber(n) => n.to_string(),
            PageCursor::ByToken(Value::String(s)) => s.clone(),
            PageCursor::ByToken(other) => other.to_string(),
        }
    }

    /// Moves to the following page after a `hasNextPage` signal.
    ///
    /// # Errors
    /// `Cursor` when the current token is not an integer and cannot be counted
    /// forward.
    pub fn increment(&self) -> Result<PageCursor> {
        let current = match self {
            PageCursor::ByNumber(n) => Some(*n),
            PageCursor::ByToken(Value::Number(n)) => n.as_u64(),
            PageCursor::ByToken(Value::String(s)) => s.trim().parse::<u64>().ok(),
            PageCursor::ByToken(_) => None,
        };
        current
            .and_then(|n| n.checked_add(1))
            .map(PageCursor::ByNumber)
            .ok_or_else(|| {
                VolunteerError::Cursor(format!(
                    "cannot advance non-integer page token {}",
                    self.query_value()
                ))
            })
    }
}
