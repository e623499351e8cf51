//! Configuration for the analysis service

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the AnalysisService
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Deadline for one analysis, retries and backoff included (seconds)
    pub analysis_timeout_secs: u64,
}

impl AnalyzerConfig {
    /// Get the analysis timeout as a Duration
    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.analysis_timeout_secs == 0 {
            return Err("analysis_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for AnalyzerConfig {
    /// Default configuration sized for short posts and paragraphs
    fn default() -> Self {
        Self {
            max_text_length: 2_000,
            analysis_timeout_secs: 120,
        }
    }
}

impl AnalyzerConfig {
    /// Strict preset: short inputs, short deadline
    pub fn strict() -> Self {
        Self {
            max_text_length: 500,
            analysis_timeout_secs: 30,
        }
    }

    /// Lenient preset: long inputs, long deadline
    pub fn lenient() -> Self {
        Self {
            max_text_length: 20_000,
            analysis_timeout_secs: 300,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(AnalyzerConfig::default().validate().is_ok());
        assert!(AnalyzerConfig::strict().validate().is_ok());
        assert!(AnalyzerConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_max_text_length() {
        let mut config = AnalyzerConfig::default();
        config.max_text_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_timeout() {
        let mut config = AnalyzerConfig::default();
        config.analysis_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AnalyzerConfig::lenient();
        let parsed = AnalyzerConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_toml_missing_field_is_error() {
        assert!(AnalyzerConfig::from_toml("max_text_length = 10").is_err());
    }
}
