// Revenue per calendar month, labelled by month end.
use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use shared::models::Order;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    pub month_end: NaiveDate,
    pub sales: f64,
}

/// One entry per month from the first to the last order month; months
/// without orders are present with zero sales.
pub fn monthly_revenue(orders: &[Order]) -> Vec<MonthlyRevenue> {
    let mut totals: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for order in orders {
        *totals.entry(month_key(order.order_date)).or_insert(0.0) += order.sales;
    }

    let (first, last) = match (totals.keys().next(), totals.keys().next_back()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Vec::new(),
    };

    let mut series = Vec::new();
    let mut month = first;
    loop {
        if let Some(month_end) = month_end(month) {
            series.push(MonthlyRevenue {
                month_end,
                sales: totals.get(&month).copied().unwrap_or(0.0),
            });
        }
        if month == last {
            break;
        }
        month = next_month(month);
    }
    series
}

fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

fn next_month((year, month): (i32, u32)) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn month_end(month: (i32, u32)) -> Option<NaiveDate> {
    let (year, month) = next_month(month);
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(y: i32, m: u32, d: u32, sales: f64) -> Order {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        Order {
            order_date: date,
            shipping_date: date,
            market: "Europe".to_string(),
            sales,
            actual_shipping_days: 2.0,
        }
    }

    #[test]
    fn test_empty() {
        assert!(monthly_revenue(&[]).is_empty());
    }

    #[test]
    fn test_groups_by_month_and_fills_gaps() {
        let orders = vec![
            order(2023, 11, 3, 100.0),
            order(2023, 11, 29, 50.0),
            order(2024, 2, 10, 25.0),
        ];
        let series = monthly_revenue(&orders);
        let labels: Vec<String> = series.iter().map(|m| m.month_end.to_string()).collect();
        assert_eq!(labels, vec!["2023-11-30", "2023-12-31", "2024-01-31", "2024-02-29"]);
        let sales: Vec<f64> = series.iter().map(|m| m.sales).collect();
        assert_eq!(sales, vec![150.0, 0.0, 0.0, 25.0]);
    }

    #[test]
    fn test_unsorted_input() {
        let orders = vec![order(2024, 3, 1, 1.0), order(2024, 1, 1, 2.0)];
        let series = monthly_revenue(&orders);
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].sales, 2.0);
        assert_eq!(series[2].sales, 1.0);
    }
}
