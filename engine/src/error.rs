use shared::utils::number_format::NumberFormatError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Raw text could not be turned into a number.
    #[error("Invalid number for {field}: {source}")]
    InvalidNumberFormat {
        field: &'static str,
        #[source]
        source: NumberFormatError,
    },

    /// Parsed fine, but outside the allowed domain (zero weight, negative value, ...).
    #[error("Invalid {field} {value}: {reason}")]
    InvalidInput {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("No market selected")]
    EmptySelection,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Order data could not be loaded (file, CSV structure or values).
    #[error("Order data error: {0:#}")]
    DataError(#[from] anyhow::Error),
}

impl EngineError {
    /// Errors the user can fix by typing a different value.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidNumberFormat { .. } | EngineError::InvalidInput { .. }
        )
    }

    /// Which input field is at fault, for re-prompting.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            EngineError::InvalidNumberFormat { field, .. } | EngineError::InvalidInput { field, .. } => {
                Some(*field)
            }
            _ => None,
        }
    }
}
