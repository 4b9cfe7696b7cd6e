use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use shared::models::Order;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 5] = ["order_date", "shipping_date", "market", "sales", "actual_shipping_days"];

// Date handling for the cleaned export. Dates are ISO, sometimes with a time part.
pub mod date_format {
    use anyhow::{anyhow, Result};
    use chrono::{NaiveDate, NaiveDateTime};

    pub fn parse_date(s: &str) -> Result<NaiveDate> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(date);
        }
        for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(datetime.date());
            }
        }
        Err(anyhow!("Failed to parse date '{}'", s))
    }

}

pub struct OrderCsvParser;

impl OrderCsvParser {
    // Header: order_date,shipping_date,market,sales,actual_shipping_days (other columns ignored)
    // Example row: 2024-01-03,2024-01-07,Europe,249.90,4
    pub fn load_orders(file_path: &Path) -> Result<Vec<Order>> {
        let file = File::open(file_path)
            .with_context(|| format!("Failed to open CSV file '{}'", file_path.display()))?;
        let orders = Self::read_orders(BufReader::new(file))?;
        tracing::info!(path = %file_path.display(), count = orders.len(), "Loaded order data");
        Ok(orders)
    }

    pub fn read_orders<R: Read>(reader: R) -> Result<Vec<Order>> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|header| header == column) {
                return Err(anyhow!("Missing '{}' column in CSV header", column));
            }
        }

        let mut orders = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = result.map_err(|e| anyhow!("Error reading CSV record at line {}: {}", line, e))?;

            let order_date = date_format::parse_date(Self::field(&record, &headers, "order_date", line)?)
                .map_err(|e| anyhow!("Error parsing 'order_date' at line {}: {}", line, e))?;
            let shipping_date = date_format::parse_date(Self::field(&record, &headers, "shipping_date", line)?)
                .map_err(|e| anyhow!("Error parsing 'shipping_date' at line {}: {}", line, e))?;
            let market = Self::field(&record, &headers, "market", line)?;
            if market.is_empty() {
                return Err(anyhow!("Empty 'market' at line {}", line));
            }
            let sales = Self::number(&record, &headers, "sales", line)?;
            let actual_shipping_days = Self::number(&record, &headers, "actual_shipping_days", line)?;

            orders.push(Order {
                order_date,
                shipping_date,
                market: market.to_string(),
                sales,
                actual_shipping_days,
            });
        }
        Ok(orders)
    }

    fn number(record: &StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<f64> {
        let raw = Self::field(record, headers, name, line)?;
        let value: f64 = raw
            .parse()
            .map_err(|e| anyhow!("Error parsing '{}' at line {}: '{}' ({})", name, line, raw, e))?;
        if !value.is_finite() {
            return Err(anyhow!("Error parsing '{}' at line {}: '{}' is not finite", name, line, raw));
        }
        Ok(value)
    }

    // Columns are looked up by header name so reordered exports still load.
    fn field<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<&'a str> {
        headers
            .iter()
            .position(|header| header == name)
            .and_then(|pos| record.get(pos))
            .ok_or_else(|| anyhow!("Missing '{}' field in CSV record at line {}", name, line))
    }
}
