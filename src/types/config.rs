//! Explicit analysis configuration
//!
//! All tunables flow through this one value; the core components never read
//! environment variables or other ambient state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{CurError, Result};

/// Configuration for one report run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Originally requested date range; validated, never used to re-filter
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Top-N limit for grouped cost tables (None = all groups)
    pub top_n: Option<usize>,
    /// Z-score magnitude above which a point is flagged
    pub anomaly_threshold: f64,
    /// Short moving-average window (periods)
    pub short_window: usize,
    /// Long moving-average window (periods)
    pub long_window: usize,
    /// Minimum observations a group needs before anomaly analysis
    pub min_observations: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            date_range: None,
            top_n: Some(10),
            anomaly_threshold: 3.0,
            short_window: 7,
            long_window: 30,
            min_observations: 2,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some((start, end)) = self.date_range {
            if start > end {
                return Err(CurError::Config(format!(
                    "date range start {} is after end {}",
                    start, end
                )));
            }
        }
        if self.anomaly_threshold <= 0.0 {
            return Err(CurError::Config(format!(
                "anomaly threshold must be positive, got {}",
                self.anomaly_threshold
            )));
        }
        if self.short_window == 0 || self.long_window == 0 {
            return Err(CurError::Config("window sizes must be nonzero".into()));
        }
        if self.min_observations < 2 {
            return Err(CurError::Config(
                "min_observations must be at least 2".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_date_range_rejected() {
        let config = AnalysisConfig {
            date_range: Some((
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            )),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CurError::Config(_))));
    }

    #[test]
    fn test_nonpositive_threshold_rejected() {
        let config = AnalysisConfig {
            anomaly_threshold: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = AnalysisConfig {
            short_window: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
