use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Validated-on-evaluation inputs of a liability check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiabilityInput {
    pub gross_weight_kg: f64,
    /// Declared value of the goods, in EUR.
    pub goods_value: f64,
    /// EUR per one SDR (XDR) unit.
    pub exchange_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageStatus {
    FullyCovered,
    UnderInsured,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiabilityResult {
    pub input: LiabilityInput,
    pub liability_limit: f64,
    /// goods_value - liability_limit, unrounded. Positive means under-insured.
    pub gap: f64,
    pub status: CoverageStatus,
}

impl LiabilityResult {
    pub fn is_covered(&self) -> bool {
        self.status == CoverageStatus::FullyCovered
    }
}

/// Where an exchange rate came from, so the UI can tell live data from a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateSource {
    Live,
    Fallback,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    pub rate: f64,
    pub source: RateSource,
}

impl RateQuote {
    pub fn live(rate: f64) -> Self {
        Self { rate, source: RateSource::Live }
    }

    pub fn fallback(rate: f64) -> Self {
        Self { rate, source: RateSource::Fallback }
    }

    pub fn manual(rate: f64) -> Self {
        Self { rate, source: RateSource::Manual }
    }

    pub fn is_live(&self) -> bool {
        self.source == RateSource::Live
    }
}

/// One row of the cleaned supply-chain order dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_date: NaiveDate,
    pub shipping_date: NaiveDate,
    pub market: String,
    pub sales: f64,
    pub actual_shipping_days: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_serializes_status_by_name() {
        let result = LiabilityResult {
            input: LiabilityInput { gross_weight_kg: 1.0, goods_value: 0.0, exchange_rate: 1.0 },
            liability_limit: 8.33,
            gap: -8.33,
            status: CoverageStatus::FullyCovered,
        };
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["status"], "FullyCovered");
        assert!(result.is_covered());
    }

    #[test]
    fn test_rate_quote_constructors() {
        assert!(RateQuote::live(1.2).is_live());
        assert_eq!(RateQuote::fallback(1.25).source, RateSource::Fallback);
        assert_eq!(RateQuote::manual(1.1).source, RateSource::Manual);
    }
}
