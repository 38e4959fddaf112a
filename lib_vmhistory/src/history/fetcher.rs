//! # Paginated Fetcher
//!
//! Walks the volunteer-history endpoint page by page for one date window and
//! accumulates every item into a `RecordTable`.
//!
//! ## Key Features
//! - **Transport seam**: pages come from a `PageSource`, the HTTP API in
//!   production and an in-memory script in tests.
//! - **Retry per page**: each page request goes through `execute_with_retry`.
//!   An exhausted page aborts the whole fetch; nothing partial is returned.
//! - **Continuation**: `hasNextPage` counts forward, `nextPage` switches to the
//!   server's token, an empty page or no signal stops.
//! - **Page cap**: `max_pages` bounds runaway pagination.

use log::{error, info};
use serde_json::Value;

use crate::error::{Result, VolunteerError};
use crate::history::cursor::PageCursor;
use crate::defaults;
use crate::history::page::{Continuation, Page};
use crate::retrieve::ky_http::ApiClient;
use crate::retrieve::retry::{execute_with_retry, RetryPolicy};
use crate::tables::record::RecordTable;
use crate::window::DateWindow;

/// Anything that can return the raw body of one history page.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_page(&self, window: &DateWindow, cursor: &PageCursor, page_size: u32) -> Result<Value>;
}

/// # Volunteer History Api
///
/// `PageSource` backed by the HTTP API.
#[derive(Debug, Clone)]
pub struct VolunteerHistoryApi {
    client: ApiClient,
    endpoint_path: String,
}

impl VolunteerHistoryApi {
    pub fn new(client: ApiClient, endpoint_path: impl Into<String>) -> Self {
        let endpoint_path = endpoint_path.into().trim_start_matches('/').to_string();
        Self { client, endpoint_path }
    }

    /// Query parameters for one page request.
    pub fn query(window: &DateWindow, cursor: &PageCursor, page_size: u32) -> Vec<(String, String)> {
        vec![
            ("startDate".to_string(), window.start.format("%Y-%m-%d").to_string()),
            ("endDate".to_string(), window.end.format("%Y-%m-%d").to_string()),
            ("page".to_string(), cursor.query_value()),
            ("pageSize".to_string(), page_size.to_string()),
        ]
    }
}

impl PageSource for VolunteerHistoryApi {
    async fn fetch_page(&self, window: &DateWindow, cursor: &PageCursor, page_size: u32) -> Result<Value> {
        let query = Self::query(window, cursor, page_size);
        self.client.get_json(&self.endpoint_path, &query).await
    }
}

/// Paging and retry knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchOptions {
    pub page_size: u32,
    /// `None` disables the cap.
    pub max_pages: Option<u32>,
    pub retry: RetryPolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: defaults::PAGE_SIZE,
            max_pages: Some(defaults::MAX_PAGES),
            retry: RetryPolicy::default(),
        }
    }
}

/// Result of a complete fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub table: RecordTable,
    /// Number of page requests that succeeded, the terminating one included.
    pub pages: u32,
}

/// Drives a `PageSource` until the server runs out of pages.
pub struct HistoryFetcher<S> {
    source: S,
    options: FetchOptions,
}

impl<S: PageSource> HistoryFetcher<S> {
    pub fn new(source: S, options: FetchOptions) -> Self {
        Self { source, options }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetches every page of `window`.
    ///
    /// # Errors
    /// The first page error that survives retrying, `TooManyPages` when the cap
    /// is reached, or `Cursor` when a token cannot be counted forward.
    pub async fn fetch_all(&self, window: &DateWindow) -> Result<FetchOutcome> {
        let mut cursor = PageCursor::default();
        let mut table = RecordTable::new();
        let mut pages: u32 = 0;

        loop {
            if let Some(cap) = self.options.max_pages {
                if pages >= cap {
                    error!("Stopping after {pages} pages: page limit of {cap} reached");
                    return Err(VolunteerError::TooManyPages(cap));
                }
            }

            let label = format!("page {}", cursor.query_value());
            info!("Fetching {label}...");
            let current = &cursor;
            let body = execute_with_retry(&self.options.retry, &label, || {
                self.source.fetch_page(window, current, self.options.page_size)
            })
            .await?;
            pages += 1;

            let page = Page::from_body(body);
            if page.items.is_empty() {
                info!("{label} returned no items; pagination complete");
                break;
            }

            info!("{label}: {} records", page.items.len());
            table.extend(page.items);

            cursor = match page.continuation {
                Continuation::Increment => cursor.increment()?,
                Continuation::Token(token) => PageCursor::ByToken(token),
                Continuation::Done => break,
            };
        }

        info!("Fetched {} records across {pages} page(s)", table.len());
        Ok(FetchOutcome { table, pages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Replays scripted responses and records the cursors it was asked for.
    struct Script {
        responses: RefCell<VecDeque<Result<Value>>>,
        seen: RefCell<Vec<String>>,
    }

    impl Script {
        fn new(responses: Vec<Result<Value>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl PageSource for Script {
        async fn fetch_page(&self, _: &DateWindow, cursor: &PageCursor, _: u32) -> Result<Value> {
            self.seen.borrow_mut().push(cursor.query_value());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({"items": []})))
        }
    }

    fn window() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
        )
    }

    fn options() -> FetchOptions {
        FetchOptions {
            retry: RetryPolicy { backoff_unit: Duration::from_millis(1), ..RetryPolicy::default() },
            ..FetchOptions::default()
        }
    }

    #[tokio::test]
    async fn empty_page_stops_before_continuation() {
        let script = Script::new(vec![
            Ok(json!({"items": [{"id": 1}, {"id": 2}], "hasNextPage": true})),
            Ok(json!({"items": [{"id": 3}], "hasNextPage": true})),
            Ok(json!({"items": [], "hasNextPage": true})),
        ]);
        let fetcher = HistoryFetcher::new(script, options());
        let outcome = fetcher.fetch_all(&window()).await.unwrap();

        assert_eq!(outcome.table.len(), 3);
        assert_eq!(outcome.pages, 3);
        assert_eq!(*fetcher.source().seen.borrow(), ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn next_page_tokens_are_followed_verbatim() {
        let script = Script::new(vec![
            Ok(json!({"results": [{"id": 1}], "nextPage": "abc"})),
            Ok(json!({"results": [{"id": 2}], "nextPage": 17})),
            Ok(json!({"results": [{"id": 3}]})),
        ]);
        let fetcher = HistoryFetcher::new(script, options());
        let outcome = fetcher.fetch_all(&window()).await.unwrap();

        assert_eq!(outcome.table.len(), 3);
        assert_eq!(*fetcher.source().seen.borrow(), ["1", "abc", "17"]);
    }

    #[tokio::test]
    async fn transient_failure_is_retried_within_a_page() {
        let script = Script::new(vec![
            Err(VolunteerError::Timeout("slow".into())),
            Ok(json!([{"id": 1}])),
        ]);
        let fetcher = HistoryFetcher::new(script, options());
        let outcome = fetcher.fetch_all(&window()).await.unwrap();

        assert_eq!(outcome.table.len(), 1);
        assert_eq!(*fetcher.source().seen.borrow(), ["1", "1"]);
    }

    #[tokio::test]
    async fn page_cap_aborts() {
        let pages: Vec<Result<Value>> = (0..5)
            .map(|i| Ok(json!({"items": [{"id": i}], "hasNextPage": true})))
            .collect();
        let fetcher = HistoryFetcher::new(
            Script::new(pages),
            FetchOptions { max_pages: Some(3), ..options() },
        );
        let err = fetcher.fetch_all(&window()).await.unwrap_err();
        assert!(matches!(err, VolunteerError::TooManyPages(3)));
    }

    #[tokio::test]
    async fn opaque_token_followed_by_has_next_page_is_a_cursor_error() {
        let script = Script::new(vec![
            Ok(json!({"items": [{"id": 1}], "nextPage": "opaque"})),
            Ok(json!({"items": [{"id": 2}], "hasNextPage": true})),
        ]);
        let fetcher = HistoryFetcher::new(script, options());
        let err = fetcher.fetch_all(&window()).await.unwrap_err();
        assert!(matches!(err, VolunteerError::Cursor(_)));
    }

    #[test]
    fn query_carries_window_and_cursor() {
        let query = VolunteerHistoryApi::query(&window(), &PageCursor::ByToken(json!("t")), 1000);
        assert_eq!(
            query,
            vec![
                ("startDate".to_string(), "2025-01-01".to_string()),
                ("endDate".to_string(), "2025-09-01".to_string()),
                ("page".to_string(), "t".to_string()),
                ("pageSize".to_string(), "1000".to_string()),
            ]
        );
    }
}
