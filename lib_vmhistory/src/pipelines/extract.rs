//! # Extraction Pipeline
//!
//! Configuration in, one history file out: fetch every page for the window and
//! write the accumulated table. Any failure leaves the output directory
//! untouched.

use std::path::Path;

use log::{error, info};

use crate::configs::config_vh::ResolvedConfig;
use crate::error::{Result, VolunteerError};
use crate::history::fetcher::{FetchOptions, HistoryFetcher, PageSource, VolunteerHistoryApi};
use crate::retrieve::ky_http::ApiClient;
use crate::tables::tabular::{history_file_stem, save_table, SavedTable};
use crate::window::DateWindow;

/// What an extraction produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub output: SavedTable,
    pub records: usize,
    pub columns: usize,
    pub pages: u32,
}

/// Runs an extraction against the configured API.
pub async fn run_extraction(
    config: &ResolvedConfig,
    window: &DateWindow,
    output_dir: &Path,
) -> Result<ExtractionReport> {
    window.validate()?;
    let client = ApiClient::new(&config.base_url, config.credentials(), config.timeout())?;
    info!("Using endpoint {}{}", client.base_url(), config.endpoint_path);
    let api = VolunteerHistoryApi::new(client, config.endpoint_path.as_str());
    extract_from(api, config.fetch_options(), window, output_dir).await
}

/// Runs an extraction against any page source.
pub async fn extract_from<S: PageSource>(
    source: S,
    options: FetchOptions,
    window: &DateWindow,
    output_dir: &Path,
) -> Result<ExtractionReport> {
    info!(
        "Extracting volunteer history from {} to {} (exclusive)",
        window.start, window.end
    );

    let outcome = HistoryFetcher::new(source, options).fetch_all(window).await?;
    if outcome.table.is_empty() {
        error!("No data returned from API");
        return Err(VolunteerError::EmptyResult);
    }

    let stem = history_file_stem(window.start, window.last_day());
    let output = save_table(&outcome.table, output_dir, &stem)?;
    info!(
        "Wrote {} rows with {} columns to {}",
        outcome.table.len(),
        outcome.table.columns().len(),
        output.path.display()
    );

    Ok(ExtractionReport {
        output,
        records: outcome.table.len(),
        columns: outcome.table.columns().len(),
        pages: outcome.pages,
    })
}
