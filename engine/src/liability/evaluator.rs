// CMR liability limit and coverage gap.
use shared::models::{CoverageStatus, LiabilityInput, LiabilityResult};
use shared::utils::number_format;

use crate::error::EngineError;

/// SDR per kilogram of gross weight a road carrier is liable for (CMR art. 23).
pub const CMR_SDR_PER_KG: f64 = 8.33;

pub const FIELD_WEIGHT: &str = "gross weight";
pub const FIELD_GOODS_VALUE: &str = "goods value";
pub const FIELD_RATE: &str = "exchange rate";

/// Stateless; every call is independent and may run concurrently.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiabilityEvaluator;

impl LiabilityEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Parses one user-typed field, tagging failures with the field name.
    pub fn normalize_number(&self, field: &'static str, raw: &str) -> Result<f64, EngineError> {
        number_format::normalize_number(raw)
            .map_err(|source| EngineError::InvalidNumberFormat { field, source })
    }

    /// Computes limit, gap and status on unrounded values.
    ///
    /// A goods value exactly equal to the limit counts as fully covered.
    pub fn evaluate(&self, input: LiabilityInput) -> Result<LiabilityResult, EngineError> {
        require_positive(FIELD_WEIGHT, input.gross_weight_kg)?;
        require_non_negative(FIELD_GOODS_VALUE, input.goods_value)?;
        require_positive(FIELD_RATE, input.exchange_rate)?;

        let liability_limit = input.gross_weight_kg * CMR_SDR_PER_KG * input.exchange_rate;
        if !liability_limit.is_finite() {
            return Err(EngineError::InvalidInput {
                field: FIELD_WEIGHT,
                value: input.gross_weight_kg,
                reason: "liability limit out of range",
            });
        }
        let gap = input.goods_value - liability_limit;
        let status = if gap > 0.0 {
            CoverageStatus::UnderInsured
        } else {
            CoverageStatus::FullyCovered
        };

        Ok(LiabilityResult { input, liability_limit, gap, status })
    }

    /// Normalizes the three text fields (first bad field wins) and evaluates.
    pub fn evaluate_raw(&self, weight: &str, goods_value: &str, rate: &str) -> Result<LiabilityResult, EngineError> {
        let input = LiabilityInput {
            gross_weight_kg: self.normalize_number(FIELD_WEIGHT, weight)?,
            goods_value: self.normalize_number(FIELD_GOODS_VALUE, goods_value)?,
            exchange_rate: self.normalize_number(FIELD_RATE, rate)?,
        };
        self.evaluate(input)
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() {
        return Err(EngineError::InvalidInput { field, value, reason: "must be a finite number" });
    }
    if value <= 0.0 {
        return Err(EngineError::InvalidInput { field, value, reason: "must be greater than zero" });
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() {
        return Err(EngineError::InvalidInput { field, value, reason: "must be a finite number" });
    }
    if value < 0.0 {
        return Err(EngineError::InvalidInput { field, value, reason: "must not be negative" });
    }
    Ok(())
}
