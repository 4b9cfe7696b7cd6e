// The check form: three raw text fields, where the rate comes from, and what
// happens after a bad entry.
use std::sync::Arc;
use std::time::Duration;

use shared::models::{LiabilityInput, LiabilityResult, RateQuote};

use super::evaluator::{LiabilityEvaluator, FIELD_GOODS_VALUE, FIELD_RATE, FIELD_WEIGHT};
use crate::error::EngineError;
use crate::rates::{RateFeed, RateProvider};

/// Process exit status for input the user has to correct.
pub const EXIT_INVALID_INPUT: u8 = 2;

/// Raw text of the form fields. A missing weight or value is asked for;
/// a missing rate comes from the rate feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields {
    pub weight: Option<String>,
    pub value: Option<String>,
    pub rate: Option<String>,
}

/// What the front end does after one evaluation attempt.
#[derive(Debug)]
pub enum FormStep {
    Done { result: LiabilityResult, quote: RateQuote },
    /// Ask again for `field` only.
    Retry { error: EngineError, field: &'static str },
    /// Bad input with nobody to ask.
    Reject { error: EngineError },
}

impl FormStep {
    pub fn exit_code(&self) -> Option<u8> {
        match self {
            FormStep::Done { .. } => Some(0),
            FormStep::Retry { .. } => None,
            FormStep::Reject { .. } => Some(EXIT_INVALID_INPUT),
        }
    }
}

impl FormFields {
    /// Fields that have to be prompted for before evaluating.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.weight.is_none() {
            missing.push(FIELD_WEIGHT);
        }
        if self.value.is_none() {
            missing.push(FIELD_GOODS_VALUE);
        }
        missing
    }

    pub fn set(&mut self, field: &str, raw: String) {
        match field {
            FIELD_WEIGHT => self.weight = Some(raw),
            FIELD_GOODS_VALUE => self.value = Some(raw),
            FIELD_RATE => self.rate = Some(raw),
            _ => tracing::warn!(field, "Unknown form field ignored"),
        }
    }

    /// Picks the rate source: a typed rate or `offline` never fetches and
    /// `provider` is not built; otherwise the lookup starts in the background
    /// with `fallback` shown until it resolves.
    pub fn rate_feed<F>(&self, offline: bool, provider: F, fallback: f64, timeout: Duration) -> RateFeed
    where
        F: FnOnce() -> Option<Arc<dyn RateProvider>>,
    {
        if self.rate.is_some() || offline {
            return RateFeed::fixed(RateQuote::fallback(fallback));
        }
        match provider() {
            Some(provider) => RateFeed::start(provider, fallback, timeout),
            None => RateFeed::fixed(RateQuote::fallback(fallback)),
        }
    }

    /// Parses the fields in order weight, value, rate and evaluates them.
    /// A typed rate is tagged `Manual`; otherwise the feed is settled.
    pub async fn evaluate(
        &self,
        evaluator: &LiabilityEvaluator,
        feed: &mut RateFeed,
    ) -> Result<(LiabilityResult, RateQuote), EngineError> {
        let weight = evaluator.normalize_number(FIELD_WEIGHT, self.weight.as_deref().unwrap_or_default())?;
        let value = evaluator.normalize_number(FIELD_GOODS_VALUE, self.value.as_deref().unwrap_or_default())?;
        let quote = match self.rate.as_deref() {
            Some(raw) => RateQuote::manual(evaluator.normalize_number(FIELD_RATE, raw)?),
            None => feed.settle().await,
        };

        let result = evaluator.evaluate(LiabilityInput {
            gross_weight_kg: weight,
            goods_value: value,
            exchange_rate: quote.rate,
        })?;
        Ok((result, quote))
    }

    /// One evaluation attempt. Errors the user cannot fix are returned as `Err`.
    pub async fn step(
        &self,
        evaluator: &LiabilityEvaluator,
        feed: &mut RateFeed,
        interactive: bool,
    ) -> Result<FormStep, EngineError> {
        match self.evaluate(evaluator, feed).await {
            Ok((result, quote)) => Ok(FormStep::Done { result, quote }),
            Err(error) => next_step(error, interactive),
        }
    }
}

fn next_step(error: EngineError, interactive: bool) -> Result<FormStep, EngineError> {
    if !error.is_user_input() {
        return Err(error);
    }
    if !interactive {
        return Ok(FormStep::Reject { error });
    }
    match error.field() {
        Some(field) => Ok(FormStep::Retry { error, field }),
        None => Ok(FormStep::Reject { error }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::RateError;
    use async_trait::async_trait;
    use shared::models::{CoverageStatus, RateSource};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct LiveProvider(f64);

    #[async_trait]
    impl RateProvider for LiveProvider {
        fn name(&self) -> &str {
            "live"
        }

        async fn fetch_rate(&self) -> Result<f64, RateError> {
            Ok(self.0)
        }
    }

    fn fields(weight: &str, value: &str, rate: Option<&str>) -> FormFields {
        FormFields {
            weight: Some(weight.to_string()),
            value: Some(value.to_string()),
            rate: rate.map(str::to_string),
        }
    }

    fn live(rate: f64) -> Option<Arc<dyn RateProvider>> {
        let provider: Arc<dyn RateProvider> = Arc::new(LiveProvider(rate));
        Some(provider)
    }

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_typed_rate_is_manual_and_skips_lookup() {
        let form = fields("1000", "5000", Some("1,20"));
        let built = AtomicBool::new(false);
        let mut feed = form.rate_feed(
            false,
            || {
                built.store(true, Ordering::SeqCst);
                live(1.5)
            },
            1.25,
            TIMEOUT,
        );
        assert!(!built.load(Ordering::SeqCst));
        assert!(feed.is_settled());

        let (result, quote) = form.evaluate(&LiabilityEvaluator::new(), &mut feed).await.unwrap();
        assert_eq!(quote, RateQuote::manual(1.2));
        assert_eq!(result.input.exchange_rate, 1.2);
        assert_eq!(result.status, CoverageStatus::FullyCovered);
    }

    #[tokio::test]
    async fn test_offline_uses_fallback() {
        let form = fields("500", "6000", None);
        let mut feed = form.rate_feed(true, || live(1.5), 1.25, TIMEOUT);

        let (result, quote) = form.evaluate(&LiabilityEvaluator::new(), &mut feed).await.unwrap();
        assert_eq!(quote.source, RateSource::Fallback);
        assert_eq!(result.input.exchange_rate, 1.25);
    }

    #[tokio::test]
    async fn test_missing_provider_uses_fallback() {
        let form = fields("500", "6000", None);
        let mut feed = form.rate_feed(false, || None, 1.25, TIMEOUT);
        let (_, quote) = form.evaluate(&LiabilityEvaluator::new(), &mut feed).await.unwrap();
        assert_eq!(quote, RateQuote::fallback(1.25));
    }

    #[tokio::test]
    async fn test_online_settles_live_rate() {
        let form = fields("500", "6000", None);
        let mut feed = form.rate_feed(false, || live(1.1), 1.25, TIMEOUT);

        let (result, quote) = form.evaluate(&LiabilityEvaluator::new(), &mut feed).await.unwrap();
        assert_eq!(quote, RateQuote::live(1.1));
        assert_eq!(result.status, CoverageStatus::UnderInsured);
    }

    #[tokio::test]
    async fn test_bad_rate_retries_rate_field_only() {
        let form = fields("1000", "5000", Some("abc"));
        let mut feed = form.rate_feed(false, || None, 1.25, TIMEOUT);

        let step = form.step(&LiabilityEvaluator::new(), &mut feed, true).await.unwrap();
        match step {
            FormStep::Retry { field, ref error } => {
                assert_eq!(field, FIELD_RATE);
                assert!(matches!(error, EngineError::InvalidNumberFormat { .. }));
            }
            ref other => panic!("expected Retry, got {:?}", other),
        }
        assert_eq!(step.exit_code(), None);
    }

    #[tokio::test]
    async fn test_zero_weight_retries_weight_field() {
        let form = fields("0", "5000", Some("1.2"));
        let mut feed = form.rate_feed(false, || None, 1.25, TIMEOUT);

        let step = form.step(&LiabilityEvaluator::new(), &mut feed, true).await.unwrap();
        assert!(matches!(step, FormStep::Retry { field: FIELD_WEIGHT, .. }));
    }

    #[tokio::test]
    async fn test_non_interactive_bad_input_exits_with_status_two() {
        let form = fields("1000", "1.000,50€", None);
        let mut feed = form.rate_feed(true, || None, 1.25, TIMEOUT);

        let step = form.step(&LiabilityEvaluator::new(), &mut feed, false).await.unwrap();
        assert!(matches!(step, FormStep::Reject { .. }));
        assert_eq!(step.exit_code(), Some(EXIT_INVALID_INPUT));
    }

    #[tokio::test]
    async fn test_success_exits_with_zero() {
        let form = fields("1000", "5000", Some("1.2"));
        let mut feed = form.rate_feed(false, || None, 1.25, TIMEOUT);
        let step = form.step(&LiabilityEvaluator::new(), &mut feed, false).await.unwrap();
        assert_eq!(step.exit_code(), Some(0));
    }

    #[test]
    fn test_non_user_errors_are_not_retried() {
        let err = next_step(EngineError::ConfigError("bad".to_string()), true).unwrap_err();
        assert!(matches!(err, EngineError::ConfigError(_)));

        let user = EngineError::InvalidInput { field: FIELD_GOODS_VALUE, value: -1.0, reason: "must not be negative" };
        assert!(matches!(next_step(user, true), Ok(FormStep::Retry { field: FIELD_GOODS_VALUE, .. })));
    }

    #[test]
    fn test_missing_and_set() {
        let mut form = FormFields::default();
        assert_eq!(form.missing(), vec![FIELD_WEIGHT, FIELD_GOODS_VALUE]);

        form.set(FIELD_WEIGHT, "250kg".to_string());
        form.set(FIELD_RATE, "1.3".to_string());
        assert_eq!(form.missing(), vec![FIELD_GOODS_VALUE]);
        assert_eq!(form.rate.as_deref(), Some("1.3"));
    }
}
