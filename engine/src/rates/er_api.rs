//! Client for the free open.er-api.com exchange rate service.
//!
//! `GET /v6/latest/XDR` answers with the value of one SDR in every listed
//! currency; we read a single entry (EUR by default) from `rates`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{RateError, RateProvider};
use crate::config::RateServiceSettings;

pub const DEFAULT_RATE_URL: &str = "https://open.er-api.com/v6/latest/XDR";
const USER_AGENT: &str = concat!("cmr-engine/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
pub struct LatestRatesResponse {
    /// "success" or "error".
    pub result: Option<String>,
    #[serde(rename = "error-type")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub rates: HashMap<String, f64>,
}

impl LatestRatesResponse {
    pub fn rate_for(&self, currency: &str) -> Result<f64, RateError> {
        if self.result.as_deref() == Some("error") {
            let detail = self.error_type.clone().unwrap_or_else(|| "unknown".to_string());
            return Err(RateError::ApiError(200, detail));
        }
        self.rates
            .get(currency)
            .copied()
            .ok_or_else(|| RateError::MissingCurrency(currency.to_string()))
    }
}

pub struct ErApiClient {
    http_client: reqwest::Client,
    url: String,
    currency: String,
}

impl ErApiClient {
    pub fn new(url: impl Into<String>, currency: impl Into<String>, timeout: Duration) -> Result<Self, RateError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| RateError::NetworkError(e.to_string()))?;

        Ok(Self::with_http_client(http_client, url, currency))
    }

    pub fn from_settings(settings: &RateServiceSettings) -> Result<Self, RateError> {
        Self::new(settings.url.clone(), settings.currency.clone(), settings.timeout())
    }

    /// Uses a preconfigured client; its timeout policy is the caller's.
    pub fn with_http_client(http_client: reqwest::Client, url: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            http_client,
            url: url.into(),
            currency: currency.into().to_uppercase(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RateProvider for ErApiClient {
    fn name(&self) -> &str {
        "open.er-api.com"
    }

    async fn fetch_rate(&self) -> Result<f64, RateError> {
        tracing::debug!(url = %self.url, currency = %self.currency, "Querying exchange rate API");

        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RateError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RateError::ApiError(status.as_u16(), error_text));
        }

        let body: LatestRatesResponse = response
            .json()
            .await
            .map_err(|e| RateError::ParseError(e.to_string()))?;

        body.rate_for(&self.currency)
    }
}
