//! Pre-flight checks run before an extraction: configuration and date window.

use log::info;

use crate::configs::config_vh::ExtractorConfig;
use crate::window::DateWindow;

/// Outcome of the pre-flight checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationReport {
    pub config_valid: bool,
    pub window_valid: bool,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.config_valid && self.window_valid
    }
}

/// Checks `config` and `window`. Problems are logged, not returned as errors,
/// so both checks always run.
pub fn run_validation(config: &ExtractorConfig, window: &DateWindow) -> ValidationReport {
    info!("Testing validation functions...");

    let config_valid = ExtractorConfig::defaults().merge(config.clone()).validate().is_ok();
    info!("Configuration validation result: {config_valid}");

    let window_valid = window.validate().is_ok();
    info!("Date range validation result: {window_valid}");

    info!("Validation test completed!");
    ValidationReport { config_valid, window_valid }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn august_report() -> DateWindow {
        DateWindow::for_report_month(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(), None).unwrap()
    }

    #[test]
    fn placeholder_config_fails_but_window_passes() {
        let report = run_validation(&ExtractorConfig::default(), &august_report());
        assert!(!report.config_valid);
        assert!(report.window_valid);
        assert!(!report.passed());
    }

    #[test]
    fn filled_config_and_inverted_window() {
        let config = ExtractorConfig {
            base_url: Some("https://ymca.example.org/api/v3".into()),
            api_key: Some("k".into()),
            api_secret: Some("s".into()),
            customer_code: Some("c".into()),
            ..Default::default()
        };
        let inverted = DateWindow::new(
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        let report = run_validation(&config, &inverted);
        assert!(report.config_valid);
        assert!(!report.window_valid);
    }
}
