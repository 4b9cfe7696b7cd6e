// Supply-chain order reporting: KPIs plus the series behind the revenue trend
// and lead-time distribution charts.
pub mod histogram;
pub mod monthly;

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;
use shared::models::Order;
use shared::utils::number_format::format_grouped;

use crate::data::csv_parser::OrderCsvParser;
use crate::data::order_store::OrderStore;
use crate::error::EngineError;

pub use histogram::{histogram, HistogramBin, DEFAULT_BINS};
pub use monthly::{monthly_revenue, MonthlyRevenue};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_sales: f64,
    pub total_orders: usize,
    /// None when there are no orders.
    pub avg_shipping_days: Option<f64>,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub lead_time_histogram: Vec<HistogramBin>,
}

impl DashboardSummary {
    pub fn from_orders(orders: &[Order]) -> Self {
        let total_sales: f64 = orders.iter().map(|o| o.sales).sum();
        let total_orders = orders.len();
        let avg_shipping_days = if orders.is_empty() {
            None
        } else {
            Some(orders.iter().map(|o| o.actual_shipping_days).sum::<f64>() / total_orders as f64)
        };
        let lead_times: Vec<f64> = orders.iter().map(|o| o.actual_shipping_days).collect();

        DashboardSummary {
            total_sales,
            total_orders,
            avg_shipping_days,
            monthly_revenue: monthly_revenue(orders),
            lead_time_histogram: histogram(&lead_times, DEFAULT_BINS),
        }
    }

    pub fn render(&self, source_name: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Total Revenue: {} €", format_grouped(self.total_sales, 2));
        let _ = writeln!(out, "Total Orders: {}", self.total_orders);
        match self.avg_shipping_days {
            Some(days) => {
                let _ = writeln!(out, "Avg. Shipping Days: {} Days (target: < 5 Days)", format_grouped(days, 1));
            }
            None => {
                let _ = writeln!(out, "Avg. Shipping Days: n/a");
            }
        }

        let _ = writeln!(out, "\nRevenue Trend (monthly):");
        for month in &self.monthly_revenue {
            let _ = writeln!(out, "  {}  {:>16} €", month.month_end, format_grouped(month.sales, 2));
        }

        let _ = writeln!(out, "\nLead Time Distribution (days to ship -> orders):");
        for bin in &self.lead_time_histogram {
            let _ = writeln!(out, "  {:>7.2} - {:<7.2} {}", bin.lower, bin.upper, bin.count);
        }

        let _ = write!(out, "\nData Source: {} | Records displayed: {}", source_name, self.total_orders);
        out
    }
}

/// Loads `path` and summarizes the orders of `markets` (all markets when empty).
pub fn build_report(path: &Path, markets: &[String]) -> Result<DashboardSummary, EngineError> {
    let store = OrderStore::from_orders(OrderCsvParser::load_orders(path)?);
    let summary = if markets.is_empty() {
        DashboardSummary::from_orders(store.orders())
    } else {
        DashboardSummary::from_orders(&store.filter_by_markets(markets)?)
    };
    tracing::info!(path = %path.display(), orders = summary.total_orders, "Order report built");
    Ok(summary)
}
