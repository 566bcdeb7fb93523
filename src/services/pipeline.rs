//! Report pipeline: raw table in, one result bundle out
//!
//! The single entry point the CLI (and any report assembler) calls. Data
//! flows strictly forward: raw rows → normalized dataset → aggregates →
//! trend/anomaly annotations → discount summaries. Each stage produces a
//! new immutable result; nothing mutates upstream output.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::reader::RawTable;
use crate::services::aggregator::{
    Aggregator, CostBucket, DailyCost, GroupMonthlyCost, MatrixCell, MonthlyCost,
};
use crate::services::discounts::{
    DiscountAnalyzer, DiscountBucket, SavingsPlanPeriod, SavingsPlanService,
};
use crate::services::schema;
use crate::services::trend::{self, AnomalyPoint, TrendSeries};
use crate::types::{AnalysisConfig, NormalizedDataset, ReportSummary, Result};

/// Key of the overall (all-services) trend series
pub const TOTAL_SERIES: &str = "total";

/// Everything a report assembler needs for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBundle {
    pub summary: ReportSummary,
    pub cost_by_service: Vec<CostBucket>,
    pub cost_by_account: Vec<CostBucket>,
    pub cost_by_region: Vec<CostBucket>,
    pub account_service_matrix: Vec<MatrixCell>,
    pub daily_trend: Vec<DailyCost>,
    pub monthly_summary: Vec<MonthlyCost>,
    pub monthly_trend_by_service: Vec<GroupMonthlyCost>,
    pub monthly_trend_by_account: Vec<GroupMonthlyCost>,
    pub monthly_trend_by_region: Vec<GroupMonthlyCost>,
    /// Overall series first, then one series per service
    pub trend_series: Vec<TrendSeries>,
    pub anomalies: Vec<AnomalyPoint>,
    pub discounts_by_type: Vec<DiscountBucket>,
    pub discounts_by_service: Vec<DiscountBucket>,
    pub savings_plan_periods: Vec<SavingsPlanPeriod>,
    pub savings_plan_by_service: Vec<SavingsPlanService>,
}

/// Run the full analysis pipeline over one raw CUR table.
pub fn build_report(raw: &RawTable, config: &AnalysisConfig) -> Result<ReportBundle> {
    config.validate()?;

    let data = schema::normalize(raw)?;
    if data.skipped_rows() > 0 {
        debug!("dropped {} rows with unparseable dates", data.skipped_rows());
    }
    info!("normalized {} records", data.len());

    Ok(analyze(&data, config))
}

/// Analysis over an already-normalized dataset.
pub fn analyze(data: &NormalizedDataset, config: &AnalysisConfig) -> ReportBundle {
    let aggregator = Aggregator::new(data);
    let discounts = DiscountAnalyzer::new(data);

    let daily = aggregator.daily_trend();
    let per_service = trend::service_daily_series(data);

    let mut trend_series = Vec::with_capacity(per_service.len() + 1);
    trend_series.push(trend::trend_series(
        TOTAL_SERIES,
        &daily,
        config.short_window,
        config.long_window,
    ));
    for (service, series) in &per_service {
        trend_series.push(trend::trend_series(
            service,
            series,
            config.short_window,
            config.long_window,
        ));
    }

    let anomalies = trend::detect_anomalies(
        &per_service,
        config.anomaly_threshold,
        config.min_observations,
    );

    ReportBundle {
        summary: aggregator.summary(),
        cost_by_service: aggregator.cost_by_service(config.top_n),
        cost_by_account: aggregator.cost_by_account(config.top_n),
        cost_by_region: aggregator.cost_by_region(config.top_n),
        account_service_matrix: aggregator.account_service_matrix(),
        daily_trend: daily,
        monthly_summary: aggregator.monthly_summary(),
        monthly_trend_by_service: aggregator
            .monthly_trend_by_service(config.top_n.unwrap_or(usize::MAX)),
        monthly_trend_by_account: aggregator
            .monthly_trend_by_account(config.top_n.unwrap_or(usize::MAX)),
        monthly_trend_by_region: aggregator
            .monthly_trend_by_region(config.top_n.unwrap_or(usize::MAX)),
        trend_series,
        anomalies,
        discounts_by_type: discounts.discounts_by_type(),
        discounts_by_service: discounts.discounts_by_service(config.top_n),
        savings_plan_periods: discounts.savings_plan_effectiveness(),
        savings_plan_by_service: discounts.savings_plan_by_service(),
    }
}
