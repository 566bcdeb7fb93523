//! curlens: cost aggregation, trend analysis, and anomaly detection for
//! AWS Cost and Usage Reports.
//!
//! The crate takes one materialized CUR table ([`reader::RawTable`]),
//! normalizes it onto a canonical schema regardless of which CUR
//! column-naming generation produced it, and computes the typed result
//! tables a report assembler renders: grouped cost aggregates, daily and
//! monthly series with moving averages, per-service z-score anomaly flags,
//! and discount/savings-plan effectiveness.
//!
//! ```no_run
//! use curlens::reader::RawTable;
//! use curlens::services::build_report;
//! use curlens::types::AnalysisConfig;
//!
//! # fn main() -> curlens::types::Result<()> {
//! let raw = RawTable::from_csv_path(std::path::Path::new("cur.csv"))?;
//! let bundle = build_report(&raw, &AnalysisConfig::default())?;
//! println!("total: ${:.2}", bundle.summary.total_cost);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod reader;
pub mod services;
pub mod types;
