use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::reader::RawTable;
use crate::services::pipeline::{self, ReportBundle};
use crate::types::AnalysisConfig;

/// Cost aggregation and anomaly detection for AWS Cost and Usage Reports
#[derive(Parser)]
#[command(name = "curlens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a CUR CSV export
    #[arg(short, long, global = true, default_value = "cur.csv")]
    input: PathBuf,

    /// Start of the requested date range (YYYY-MM-DD)
    #[arg(long, global = true)]
    start: Option<NaiveDate>,

    /// End of the requested date range (YYYY-MM-DD)
    #[arg(long, global = true)]
    end: Option<NaiveDate>,

    /// Top-N limit for grouped cost tables
    #[arg(long, global = true, default_value_t = 10)]
    top_n: usize,

    /// Z-score magnitude for anomaly flagging
    #[arg(long, global = true, default_value_t = 3.0)]
    threshold: f64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show dashboard-level summary statistics
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the full cost report (default)
    Report {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show flagged cost anomalies
    Anomalies {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let config = AnalysisConfig {
            date_range: match (self.start, self.end) {
                (Some(start), Some(end)) => Some((start, end)),
                _ => None,
            },
            top_n: Some(self.top_n),
            anomaly_threshold: self.threshold,
            ..Default::default()
        };

        let raw = RawTable::from_csv_path(&self.input)?;
        let bundle = pipeline::build_report(&raw, &config)?;

        match self.command {
            None | Some(Commands::Report { json: false }) => print_report(&bundle),
            Some(Commands::Report { json: true }) => {
                println!("{}", serde_json::to_string_pretty(&bundle)?);
            }
            Some(Commands::Summary { json }) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&bundle.summary)?);
                } else {
                    print_summary(&bundle);
                }
            }
            Some(Commands::Anomalies { json }) => {
                let top = crate::services::trend::flagged(&bundle.anomalies);
                if json {
                    println!("{}", serde_json::to_string_pretty(&top)?);
                } else if top.is_empty() {
                    println!("No anomalies at threshold {:.1}", self.threshold);
                } else {
                    for point in &top {
                        println!(
                            "{}  {:<30} ${:>12.2}  z={:+.2}",
                            point.date, point.key, point.cost, point.z_score
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

fn print_summary(bundle: &ReportBundle) {
    let s = &bundle.summary;
    println!("Total cost (gross):  ${:.2}", s.total_cost);
    println!("Net cost:            ${:.2}", s.net_cost);
    println!("Total discounts:     ${:.2}", s.total_discounts);
    println!("Accounts:            {}", s.account_count);
    println!("Services:            {}", s.service_count);
    match (s.date_start, s.date_end) {
        (Some(start), Some(end)) => println!("Date range:          {} to {}", start, end),
        _ => println!("Date range:          n/a"),
    }
    println!("Records:             {}", s.record_count);
}

fn print_report(bundle: &ReportBundle) {
    print_summary(bundle);

    println!("\nCost by service:");
    for bucket in &bundle.cost_by_service {
        println!("  {:<40} ${:>12.2}", bucket.key, bucket.total_cost);
    }

    println!("\nCost by account:");
    for bucket in &bundle.cost_by_account {
        println!("  {:<40} ${:>12.2}", bucket.key, bucket.total_cost);
    }

    println!("\nCost by region:");
    for bucket in &bundle.cost_by_region {
        println!("  {:<40} ${:>12.2}", bucket.key, bucket.total_cost);
    }

    println!("\nMonthly summary:");
    for month in &bundle.monthly_summary {
        println!(
            "  {:<10} ${:>12.2}  ({} records)",
            month.month, month.total_cost, month.record_count
        );
    }

    if !bundle.discounts_by_type.is_empty() {
        println!("\nDiscounts by type:");
        for bucket in &bundle.discounts_by_type {
            println!(
                "  {} {:<28} ${:>12.2}  ({:.1}% of gross)",
                bucket.period,
                bucket.key,
                bucket.total_discount,
                bucket.ratio_of_gross * 100.0
            );
        }
    }

    if !bundle.savings_plan_periods.is_empty() {
        println!("\nSavings plan effectiveness:");
        for period in &bundle.savings_plan_periods {
            println!(
                "  {}  saved ${:.2} of ${:.2} on-demand ({:.1}%)",
                period.period,
                period.savings,
                period.on_demand_equivalent,
                period.effectiveness * 100.0
            );
        }
    }

    if !bundle.savings_plan_by_service.is_empty() {
        println!("\nSavings plan by service:");
        for entry in &bundle.savings_plan_by_service {
            println!(
                "  {:<40} saved ${:.2} of ${:.2} on-demand ({:.1}%)",
                entry.service,
                entry.savings,
                entry.on_demand_equivalent,
                entry.effectiveness * 100.0
            );
        }
    }
}
