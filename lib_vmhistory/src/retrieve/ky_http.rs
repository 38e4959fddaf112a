//! # HTTP Retrieval Utilities
//!
//! A thin asynchronous API client around `reqwest`. It owns the base URL, the
//! Basic-Auth credentials and the fixed customer header, and turns every way a
//! GET can go wrong into a classified `VolunteerError`.
//!
//! Retrying is deliberately not done here; see `retrieve::retry`.

use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;
use serde_json::Value;

use crate::error::{Result, VolunteerError};

/// Header carrying the tenant identifier (`X-VM-Customer-Code`).
pub const CUSTOMER_CODE_HEADER: &str = "x-vm-customer-code";

/// Credentials sent with every request.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub customer_code: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .field("customer_code", &self.customer_code)
            .finish()
    }
}

/// # Api Client
///
/// A GET-only JSON client bound to one API root.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: reqwest::Client,
    /// Always ends with `/` so relative paths join below it.
    base_url: Url,
    credentials: Credentials,
}

impl ApiClient {
    /// Creates a client for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    /// `Config` when the base URL is not absolute or the customer code is not a
    /// valid header value.
    pub fn new(base_url: &str, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;

        let mut headers = HeaderMap::new();
        let code = HeaderValue::from_str(&credentials.customer_code)
            .map_err(|e| VolunteerError::Config(format!("Invalid customer code: {e}")))?;
        headers.insert(HeaderName::from_static(CUSTOMER_CODE_HEADER), code);

        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| VolunteerError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { inner, base_url, credentials })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Performs one authenticated GET of `path` with `query` and parses the body
    /// as JSON.
    ///
    /// # Errors
    /// * `Timeout` when the request exceeds the client timeout.
    /// * `Http` for any non-2xx status, with the response body attached.
    /// * `MalformedBody` when a 2xx body is not JSON.
    /// * `Transport` for everything else on the wire.
    pub async fn get_json(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| VolunteerError::Config(format!("Invalid endpoint path '{path}': {e}")))?;
        debug!("GET {url} {query:?}");

        let response = self
            .inner
            .get(url.clone())
            .basic_auth(&self.credentials.api_key, Some(&self.credentials.api_secret))
            .query(query)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let body = response.text().await.map_err(classify)?;

        if !status.is_success() {
            return Err(VolunteerError::Http {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| VolunteerError::MalformedBody(e.to_string()))
    }
}

/// Parses `raw` and makes sure the path ends with `/`, otherwise `Url::join`
/// would replace the last segment.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut text = raw.trim().to_string();
    if !text.ends_with('/') {
        text.push('/');
    }
    let url = Url::parse(&text)
        .map_err(|e| VolunteerError::Config(format!("Invalid base URL '{raw}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(VolunteerError::Config(format!("Base URL '{raw}' must be absolute")));
    }
    Ok(url)
}

fn classify(err: reqwest::Error) -> VolunteerError {
    if err.is_timeout() {
        VolunteerError::Timeout(err.to_string())
    } else if err.is_decode() {
        VolunteerError::MalformedBody(err.to_string())
    } else {
        VolunteerError::Transport(err.to_string())
    }
}
