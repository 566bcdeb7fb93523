//! Core analysis services: normalization, aggregation, trends, discounts

pub mod aggregator;
pub mod discounts;
pub mod pipeline;
pub mod schema;
pub mod trend;

pub use aggregator::{Aggregator, CostScope};
pub use discounts::DiscountAnalyzer;
pub use pipeline::{build_report, ReportBundle};
