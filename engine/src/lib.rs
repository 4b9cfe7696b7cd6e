// Engine library root: the liability check and everything a front end needs
// around it (reference rate, configuration, order reporting).

pub mod config;
pub mod data;
pub mod error;
pub mod liability;
pub mod rates;
pub mod reporting;

pub use error::EngineError;
pub use liability::{LiabilityEvaluator, LiabilityReport, Locale, CMR_SDR_PER_KG};
pub use rates::{fetch_reference_rate, RateFeed, RateLookup, RateProvider};
