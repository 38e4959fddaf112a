//! # Extractor Configuration
//!
//! Layered settings for the volunteer-history tools. Sources are merged in order
//! of increasing precedence:
//!
//! 1. Built-in defaults. Credentials default to `<...>` placeholder tokens.
//! 2. A JSON file (`--config-path` / `VH_CONFIG_PATH`, default `vmhistory.json`
//!    when it exists) using camelCase keys.
//! 3. Environment variables and command-line flags.
//!
//! A value that still contains a placeholder token, or is empty, fails
//! validation before any request is made.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Result, VolunteerError};
use crate::tables::schema::{ColumnOverrides, ColumnRole};

/// Config file looked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "vmhistory.json";

#[derive(Args, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractorConfig {
    #[arg(long, env = "VH_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[arg(long, env = "VH_BASE_URL", help = "API root, e.g. https://host/api/v3.")]
    pub base_url: Option<String>,

    #[arg(long, env = "VH_API_KEY", help = "Basic-Auth user name.")]
    pub api_key: Option<String>,

    #[arg(long, env = "VH_API_SECRET", help = "Basic-Auth password.")]
    pub api_secret: Option<String>,

    #[arg(long, env = "VH_CUSTOMER_CODE", help = "Value of the X-VM-Customer-Code header.")]
    pub customer_code: Option<String>,

    #[arg(long, env = "VH_ENDPOINT_PATH", help = "Endpoint below the API root.")]
    pub endpoint_path: Option<String>,

    #[arg(long, env = "VH_PAGE_SIZE", help = "Records requested per page.")]
    pub page_size: Option<u32>,

    #[arg(long, env = "VH_TIMEOUT_SECS", help = "Per-request timeout in seconds.")]
    pub timeout_secs: Option<u64>,

    #[arg(long, env = "VH_MAX_ATTEMPTS", help = "Attempts per page, the first one included.")]
    pub max_attempts: Option<u32>,

    #[arg(long, env = "VH_BACKOFF_BASE", help = "Base of the exponential retry delay, in seconds.")]
    pub backoff_base: Option<f64>,

    #[arg(long, env = "VH_MAX_PAGES", help = "Maximum pages per extraction; 0 disables the limit.")]
    pub max_pages: Option<u32>,

    #[arg(long, env = "VH_BLANKET_RETRY", help = "Retry every failed request, including 4xx responses.")]
    pub blanket_retry: Option<bool>,

    #[arg(long, env = "VH_HOURS_COLUMN", help = "Column holding volunteer hours.")]
    pub hours_column: Option<String>,

    #[arg(long, env = "VH_DATE_COLUMN", help = "Column holding the activity date.")]
    pub date_column: Option<String>,

    #[arg(long, env = "VH_ASSIGNMENT_COLUMN", help = "Column holding the activity name.")]
    pub assignment_column: Option<String>,

    #[arg(long, env = "VH_LOCATION_COLUMN", help = "Column holding the location or branch.")]
    pub location_column: Option<String>,

    #[arg(long, env = "VH_VOLUNTEER_COLUMN", help = "Column identifying the volunteer.")]
    pub volunteer_column: Option<String>,
}

impl ExtractorConfig {
    /// Built-in defaults, with placeholder credentials.
    pub fn defaults() -> Self {
        Self {
            base_url: Some("https://<your-volunteermatters-host>/api/v3".to_string()),
            api_key: Some("<API_KEY>".to_string()),
            api_secret: Some("<API_SECRET>".to_string()),
            customer_code: Some("<YOUR_CODE>".to_string()),
            endpoint_path: Some(defaults::ENDPOINT_PATH.to_string()),
            page_size: Some(defaults::PAGE_SIZE),
            timeout_secs: Some(defaults::TIMEOUT_SECS),
            max_attempts: Some(defaults::MAX_ATTEMPTS),
            backoff_base: Some(defaults::BACKOFF_BASE),
            max_pages: Some(defaults::MAX_PAGES),
            blanket_retry: Some(false),
            ..Default::default()
        }
    }

    // 'other' overrides 'self' for Some values
    pub fn merge(self, other: ExtractorConfig) -> ExtractorConfig {
        ExtractorConfig {
            config_path: other.config_path.or(self.config_path),
            base_url: other.base_url.or(self.base_url),
            api_key: other.api_key.or(self.api_key),
            api_secret: other.api_secret.or(self.api_secret),
            customer_code: other.customer_code.or(self.customer_code),
            endpoint_path: other.endpoint_path.or(self.endpoint_path),
            page_size: other.page_size.or(self.page_size),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            max_attempts: other.max_attempts.or(self.max_attempts),
            backoff_base: other.backoff_base.or(self.backoff_base),
            max_pages: other.max_pages.or(self.max_pages),
            blanket_retry: other.blanket_retry.or(self.blanket_retry),
            hours_column: other.hours_column.or(self.hours_column),
            date_column: other.date_column.or(self.date_column),
            assignment_column: other.assignment_column.or(self.assignment_column),
            location_column: other.location_column.or(self.location_column),
            volunteer_column: other.volunteer_column.or(self.volunteer_column),
        }
    }

    /// Reads a JSON config file.
    pub fn from_file(path: &Path) -> Result<ExtractorConfig> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            VolunteerError::Config(format!("Failed to parse config file {}: {e}", path.display()))
        })
    }

    /// Merges defaults, the config file and `cli` (which already carries the
    /// environment, courtesy of clap).
    ///
    /// A missing default file is fine; a file named explicitly must exist.
    pub fn load(cli: ExtractorConfig) -> Result<ExtractorConfig> {
        let mut config = ExtractorConfig::defaults();

        let (path, explicit) = match &cli.config_path {
            Some(p) => (p.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if path.exists() {
            config = config.merge(ExtractorConfig::from_file(&path)?);
            info!("Loaded configuration from {}", path.display());
        } else if explicit {
            return Err(VolunteerError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        } else {
            info!(
                "Config file not found at {}. Using defaults and environment/CLI variables.",
                path.display()
            );
        }

        Ok(config.merge(cli))
    }

    /// Checks every required setting, logging one error per problem.
    pub fn validate(&self) -> Result<()> {
        info!("Validating configuration...");
        let mut problems: Vec<String> = Vec::new();

        let required = [
            ("baseUrl", "VH_BASE_URL", &self.base_url),
            ("apiKey", "VH_API_KEY", &self.api_key),
            ("apiSecret", "VH_API_SECRET", &self.api_secret),
            ("customerCode", "VH_CUSTOMER_CODE", &self.customer_code),
            ("endpointPath", "VH_ENDPOINT_PATH", &self.endpoint_path),
        ];
        for (key, env, value) in required {
            match value.as_deref().map(str::trim) {
                None | Some("") => {
                    error!("{key} is not set (config file key '{key}' or {env})");
                    problems.push(key.to_string());
                }
                Some(v) if is_placeholder(v) => {
                    error!("{key} not configured - please replace the placeholder in '{v}'");
                    problems.push(key.to_string());
                }
                Some(_) => {}
            }
        }

        if self.page_size == Some(0) {
            error!("pageSize must be at least 1");
            problems.push("pageSize".to_string());
        }
        if self.timeout_secs == Some(0) {
            error!("timeoutSecs must be at least 1");
            problems.push("timeoutSecs".to_string());
        }
        if self.max_attempts == Some(0) {
            error!("maxAttempts must be at least 1");
            problems.push("maxAttempts".to_string());
        }
        if let Some(base) = self.backoff_base {
            if !base.is_finite() || base <= 0.0 {
                error!("backoffBase must be a positive number, got {base}");
                problems.push("backoffBase".to_string());
            }
        }

        if problems.is_empty() {
            info!("Configuration validation passed");
            Ok(())
        } else {
            Err(VolunteerError::Config(format!(
                "please update the following settings: {}",
                problems.join(", ")
            )))
        }
    }

    /// Validates and flattens the configuration, filling any gap from the
    /// defaults.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let merged = ExtractorConfig::defaults().merge(self.clone());
        merged.validate()?;

        let mut columns = ColumnOverrides::new();
        columns.set(ColumnRole::Hours, merged.hours_column.clone());
        columns.set(ColumnRole::Date, merged.date_column.clone());
        columns.set(ColumnRole::Assignment, merged.assignment_column.clone());
        columns.set(ColumnRole::Location, merged.location_column.clone());
        columns.set(ColumnRole::Volunteer, merged.volunteer_column.clone());

        let text = |v: Option<String>| v.map(|s| s.trim().to_string()).unwrap_or_default();
        Ok(ResolvedConfig {
            base_url: text(merged.base_url),
            api_key: text(merged.api_key),
            api_secret: text(merged.api_secret),
            customer_code: text(merged.customer_code),
            endpoint_path: text(merged.endpoint_path),
            page_size: merged.page_size.unwrap_or(defaults::PAGE_SIZE),
            timeout_secs: merged.timeout_secs.unwrap_or(defaults::TIMEOUT_SECS),
            max_attempts: merged.max_attempts.unwrap_or(defaults::MAX_ATTEMPTS),
            backoff_base: merged.backoff_base.unwrap_or(defaults::BACKOFF_BASE),
            max_pages: merged.max_pages.filter(|n| *n > 0),
            blanket_retry: merged.blanket_retry.unwrap_or(false),
            columns,
        })
    }
}

/// `true` when `value` still contains a `<...>` token.
pub fn is_placeholder(value: &str) -> bool {
    match value.find('<') {
        Some(open) => value[open..].contains('>'),
        None => false,
    }
}

/// Fully validated settings, every value present.
#[derive(Clone, PartialEq)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub customer_code: String,
    pub endpoint_path: String,
    pub page_size: u32,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_base: f64,
    /// `None` when the page limit is disabled.
    pub max_pages: Option<u32>,
    pub blanket_retry: bool,
    pub columns: ColumnOverrides,
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .field("customer_code", &self.customer_code)
            .field("endpoint_path", &self.endpoint_path)
            .field("page_size", &self.page_size)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_base", &self.backoff_base)
            .field("max_pages", &self.max_pages)
            .field("blanket_retry", &self.blanket_retry)
            .field("columns", &self.columns)
            .finish()
    }
}

#[cfg(feature = "retrieve")]
mod network {
    use std::time::Duration;

    use super::ResolvedConfig;
    use crate::history::fetcher::FetchOptions;
    use crate::retrieve::ky_http::Credentials;
    use crate::retrieve::retry::RetryPolicy;

    impl ResolvedConfig {
        pub fn credentials(&self) -> Credentials {
            Credentials {
                api_key: self.api_key.clone(),
                api_secret: self.api_secret.clone(),
                customer_code: self.customer_code.clone(),
            }
        }

        pub fn timeout(&self) -> Duration {
            Duration::from_secs(self.timeout_secs)
        }

        pub fn fetch_options(&self) -> FetchOptions {
            FetchOptions {
                page_size: self.page_size,
                max_pages: self.max_pages,
                retry: RetryPolicy {
                    max_attempts: self.max_attempts,
                    backoff_base: self.backoff_base,
                    blanket_retry: self.blanket_retry,
                    ..RetryPolicy::default()
                },
            }
        }
    }
}
