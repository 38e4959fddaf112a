//! Interpretation of one page body: its items and how to continue.

use log::warn;
use serde_json::Value;

use crate::tables::record::{is_truthy, Record};

/// What the server said about the page after this one.
#[derive(Debug, Clone, PartialEq)]
pub enum Continuation {
    /// `hasNextPage` was truthy.
    Increment,
    /// `nextPage` carried a token.
    Token(Value),
    Done,
}

/// One decoded response page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Record>,
    pub continuation: Continuation,
}

impl Page {
    /// Decodes a response body.
    ///
    /// Items come from the first of `items` / `results` that is present and not
    /// null, or from a bare top-level array. A body without a usable list is an
    /// empty page.
    pub fn from_body(body: Value) -> Page {
        match body {
            Value::Array(list) => Page {
                items: records(list),
                continuation: Continuation::Done,
            },
            Value::Object(mut obj) => {
                let list = ["items", "results"]
                    .iter()
                    .find_map(|k| obj.remove(*k).filter(|v| !v.is_null()));
                let items = match list {
                    Some(Value::Array(list)) => records(list),
                    Some(other) => {
                        warn!("Page item list is not an array ({other}); treating page as empty");
                        Vec::new()
                    }
                    None => {
                        warn!("Page has no 'items' or 'results' list; treating page as empty");
                        Vec::new()
                    }
                };

                let continuation = if obj.get("hasNextPage").is_some_and(is_truthy) {
                    Continuation::Increment
                } else {
                    match obj.remove("nextPage") {
                        Some(token) if is_truthy(&token) => Continuation::Token(token),
                        _ => Continuation::Done,
                    }
                };
                Page { items, continuation }
            }
            other => {
                warn!("Unexpected page body {other}; treating page as empty");
                Page { items: Vec::new(), continuation: Continuation::Done }
            }
        }
    }
}

fn records(list: Vec<Value>) -> Vec<Record> {
    let total = list.len();
    let items: Vec<Record> = list
        .into_iter()
        .filter_map(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();
    if items.len() < total {
        warn!("Skipped {} non-object entries in page", total - items.len());
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn items_take_precedence_over_results() {
        let page = Page::from_body(json!({
            "items": [{"id": 1}],
            "results": [{"id": 2}, {"id": 3}],
        }));
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.continuation, Continuation::Done);
    }

    #[test]
    fn null_items_fall_through_to_results() {
        let page = Page::from_body(json!({"items": null, "results": [{"id": 2}], "nextPage": "t2"}));
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.continuation, Continuation::Token(json!("t2")));
    }

    #[test]
    fn bare_arrays_are_single_pages() {
        let page = Page::from_body(json!([{"id": 1}, {"id": 2}]));
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.continuation, Continuation::Done);
    }

    #[test]
    fn has_next_page_wins_over_next_page() {
        let page = Page::from_body(json!({"items": [{"id": 1}], "hasNextPage": true, "nextPage": 9}));
        assert_eq!(page.continuation, Continuation::Increment);

        let page = Page::from_body(json!({"items": [{"id": 1}], "hasNextPage": false, "nextPage": ""}));
        assert_eq!(page.continuation, Continuation::Done);
    }

    #[test]
    fn body_without_list_is_empty() {
        let page = Page::from_body(json!({"message": "ok"}));
        assert!(page.items.is_empty());
    }
}
