// Reference SDR exchange rate: provider seam, degraded-mode lookup and the
// fetch-then-populate feed used by front ends.
pub mod er_api;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shared::models::RateQuote;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub use er_api::{ErApiClient, DEFAULT_RATE_URL};

/// Low-level failures of a rate provider. Never shown to the user as an error;
/// `fetch_reference_rate` folds them into `RateLookup::Unavailable`.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Currency {0} missing from response")]
    MissingCurrency(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// Outcome of a reference-rate lookup. `Unavailable` is a normal value, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum RateLookup {
    Live(f64),
    Unavailable { reason: String },
}

impl RateLookup {
    pub fn rate(&self) -> Option<f64> {
        match self {
            RateLookup::Live(rate) => Some(*rate),
            RateLookup::Unavailable { .. } => None,
        }
    }

    /// Live quote, or the fallback rate marked as such.
    pub fn into_quote(self, fallback: f64) -> RateQuote {
        match self {
            RateLookup::Live(rate) => RateQuote::live(rate),
            RateLookup::Unavailable { .. } => RateQuote::fallback(fallback),
        }
    }
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    fn name(&self) -> &str;
    /// Currency units per one SDR.
    async fn fetch_rate(&self) -> Result<f64, RateError>;
}

/// Queries `provider`, bounded by `timeout`. Any failure, or a rate that is not
/// a positive finite number, resolves to `Unavailable`.
pub async fn fetch_reference_rate(provider: &dyn RateProvider, timeout: Duration) -> RateLookup {
    let outcome = match tokio::time::timeout(timeout, provider.fetch_rate()).await {
        Ok(result) => result,
        Err(_) => Err(RateError::Timeout(timeout)),
    };

    match outcome {
        Ok(rate) if rate.is_finite() && rate > 0.0 => {
            tracing::info!(provider = provider.name(), rate, "Reference rate loaded");
            RateLookup::Live(rate)
        }
        Ok(rate) => {
            tracing::warn!(provider = provider.name(), rate, "Reference rate rejected: not a positive number");
            RateLookup::Unavailable { reason: format!("implausible rate {}", rate) }
        }
        Err(e) => {
            tracing::warn!(provider = provider.name(), error = %e, "Reference rate unavailable");
            RateLookup::Unavailable { reason: e.to_string() }
        }
    }
}

/// Rate shown by a form while the live rate is being fetched.
///
/// Starts out holding the fallback quote; a background task replaces it with
/// the live quote if the lookup succeeds within the timeout.
pub struct RateFeed {
    receiver: watch::Receiver<RateQuote>,
    task: Option<JoinHandle<RateLookup>>,
}

impl RateFeed {
    /// Must be called inside a tokio runtime.
    pub fn start(provider: Arc<dyn RateProvider>, fallback: f64, timeout: Duration) -> Self {
        let (sender, receiver) = watch::channel(RateQuote::fallback(fallback));
        let task = tokio::spawn(async move {
            let lookup = fetch_reference_rate(provider.as_ref(), timeout).await;
            if let RateLookup::Live(rate) = lookup {
                // No receivers left just means nobody is waiting for the update.
                let _ = sender.send(RateQuote::live(rate));
            }
            lookup
        });
        Self { receiver, task: Some(task) }
    }

    /// A feed that never fetches, e.g. when the user typed the rate.
    pub fn fixed(quote: RateQuote) -> Self {
        let (_sender, receiver) = watch::channel(quote);
        Self { receiver, task: None }
    }

    pub fn current(&self) -> RateQuote {
        *self.receiver.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RateQuote> {
        self.receiver.clone()
    }

    pub fn is_settled(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Waits for the background lookup (if any) and returns the final quote.
    pub async fn settle(&mut self) -> RateQuote {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Rate lookup task did not complete");
            }
        }
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::RateSource;

    struct FixedProvider(Result<f64, ()>);

    #[async_trait]
    impl RateProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch_rate(&self) -> Result<f64, RateError> {
            self.0.map_err(|_| RateError::NetworkError("connection refused".to_string()))
        }
    }

    struct SlowProvider(Duration);

    #[async_trait]
    impl RateProvider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        async fn fetch_rate(&self) -> Result<f64, RateError> {
            tokio::time::sleep(self.0).await;
            Ok(1.19)
        }
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let lookup = fetch_reference_rate(&FixedProvider(Ok(1.21)), Duration::from_secs(1)).await;
        assert_eq!(lookup, RateLookup::Live(1.21));
        assert_eq!(lookup.rate(), Some(1.21));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_unavailable() {
        let lookup = fetch_reference_rate(&FixedProvider(Err(())), Duration::from_secs(1)).await;
        assert!(matches!(lookup, RateLookup::Unavailable { .. }));
        assert_eq!(lookup.into_quote(1.25), RateQuote::fallback(1.25));
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_positive_rate() {
        for bad in [0.0, -1.0, f64::NAN] {
            let lookup = fetch_reference_rate(&FixedProvider(Ok(bad)), Duration::from_secs(1)).await;
            assert!(matches!(lookup, RateLookup::Unavailable { .. }));
        }
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let provider = SlowProvider(Duration::from_secs(5));
        let started = std::time::Instant::now();
        let lookup = fetch_reference_rate(&provider, Duration::from_millis(50)).await;
        assert!(started.elapsed() < Duration::from_secs(2));
        match lookup {
            RateLookup::Unavailable { reason } => assert!(reason.contains("Timed out")),
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_feed_starts_with_fallback_then_goes_live() {
        let mut feed = RateFeed::start(Arc::new(SlowProvider(Duration::from_millis(50))), 1.25, Duration::from_secs(2));
        assert_eq!(feed.current(), RateQuote::fallback(1.25));

        let quote = feed.settle().await;
        assert_eq!(quote, RateQuote::live(1.19));
        assert!(feed.is_settled());
    }

    #[tokio::test]
    async fn test_feed_keeps_fallback_on_timeout() {
        let mut feed = RateFeed::start(Arc::new(SlowProvider(Duration::from_secs(5))), 1.25, Duration::from_millis(50));
        let quote = feed.settle().await;
        assert_eq!(quote.source, RateSource::Fallback);
        assert_eq!(quote.rate, 1.25);
    }

    #[tokio::test]
    async fn test_feed_notifies_subscribers() {
        let feed = RateFeed::start(Arc::new(FixedProvider(Ok(1.3))), 1.25, Duration::from_secs(1));
        let mut updates = feed.subscribe();
        updates.changed().await.unwrap();
        assert_eq!(*updates.borrow(), RateQuote::live(1.3));
    }

    #[tokio::test]
    async fn test_fixed_feed_is_settled() {
        let mut feed = RateFeed::fixed(RateQuote::manual(1.1));
        assert!(feed.is_settled());
        assert_eq!(feed.settle().await, RateQuote::manual(1.1));
    }
}
