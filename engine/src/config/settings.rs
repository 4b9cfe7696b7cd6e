// Engine settings: embedded defaults, optionally overridden by a JSON file.
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::EngineError;
use crate::liability::Locale;
use crate::rates::DEFAULT_RATE_URL;

const DEFAULT_CONFIG: &str = include_str!("../../assets/config/default.json");

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub rate_service: RateServiceSettings,
    /// Used when the live rate cannot be fetched.
    pub fallback_rate: f64,
    /// "en" or "de".
    pub language: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RateServiceSettings {
    pub url: String,
    pub currency: String,
    pub timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            rate_service: RateServiceSettings::default(),
            fallback_rate: 1.25,
            language: "en".to_string(),
        }
    }
}

impl Default for RateServiceSettings {
    fn default() -> Self {
        RateServiceSettings {
            url: DEFAULT_RATE_URL.to_string(),
            currency: "EUR".to_string(),
            timeout_ms: 3000,
        }
    }
}

impl RateServiceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl EngineSettings {
    pub fn load_default() -> Result<Self, EngineError> {
        Self::from_json(DEFAULT_CONFIG)
    }

    /// Keys missing from the file keep their default values.
    pub fn load_from_file(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngineError::ConfigError(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let settings = Self::from_json(&content)?;
        tracing::info!(path = %path.display(), "Loaded configuration file");
        Ok(settings)
    }

    pub fn load(path: Option<&Path>) -> Result<Self, EngineError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load_default(),
        }
    }

    fn from_json(content: &str) -> Result<Self, EngineError> {
        let settings: EngineSettings = serde_json::from_str(content)
            .map_err(|e| EngineError::ConfigError(format!("Invalid configuration: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.fallback_rate.is_finite() || self.fallback_rate <= 0.0 {
            return Err(EngineError::ConfigError(format!(
                "fallback_rate must be a positive number, got {}",
                self.fallback_rate
            )));
        }
        if self.rate_service.timeout_ms == 0 {
            return Err(EngineError::ConfigError("rate_service.timeout_ms must be greater than zero".to_string()));
        }
        if self.rate_service.url.trim().is_empty() {
            return Err(EngineError::ConfigError("rate_service.url must not be empty".to_string()));
        }
        if self.rate_service.currency.trim().is_empty() {
            return Err(EngineError::ConfigError("rate_service.currency must not be empty".to_string()));
        }
        self.locale()?;
        Ok(())
    }

    pub fn locale(&self) -> Result<Locale, EngineError> {
        self.language.parse().map_err(EngineError::ConfigError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_embedded_defaults_match_default_impl() {
        assert_eq!(EngineSettings::load_default().unwrap(), EngineSettings::default());
    }

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.fallback_rate, 1.25);
        assert_eq!(settings.rate_service.timeout(), Duration::from_secs(3));
        assert_eq!(settings.locale().unwrap(), Locale::En);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config(r#"{ "language": "de", "rate_service": { "timeout_ms": 1500 } }"#);
        let settings = EngineSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.locale().unwrap(), Locale::De);
        assert_eq!(settings.rate_service.timeout_ms, 1500);
        assert_eq!(settings.rate_service.url, DEFAULT_RATE_URL);
        assert_eq!(settings.fallback_rate, 1.25);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for content in [
            r#"{ "fallback_rate": 0 }"#,
            r#"{ "fallback_rate": -1.5 }"#,
            r#"{ "rate_service": { "timeout_ms": 0 } }"#,
            r#"{ "language": "fr" }"#,
            r#"{ "rate_service": { "url": " " } }"#,
            r#"not json"#,
        ] {
            let file = write_config(content);
            let result = EngineSettings::load_from_file(file.path());
            assert!(matches!(result, Err(EngineError::ConfigError(_))), "accepted {}", content);
        }
    }

    #[test]
    fn test_missing_file() {
        let result = EngineSettings::load_from_file(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(EngineError::ConfigError(msg)) if msg.contains("Failed to read")));
    }
}
