// Liability check: the evaluator, the check form and how results are shown.
pub mod evaluator;
pub mod form;
pub mod presentation;

pub use evaluator::{LiabilityEvaluator, CMR_SDR_PER_KG, FIELD_GOODS_VALUE, FIELD_RATE, FIELD_WEIGHT};
pub use form::{FormFields, FormStep, EXIT_INVALID_INPUT};
pub use presentation::{rate_line, LiabilityReport, Locale};
