//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use rhetor_analyzer::AnalyzerConfig;
use rhetor_llm::{ProviderSettings, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variables consulted for the API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["RHETOR_API_KEY", "OPENAI_API_KEY"];

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Completion provider
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Retry policy for completion calls
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Analysis limits
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Attempt database location
    #[serde(default)]
    pub storage: StorageSettings,

    /// Display settings
    #[serde(default)]
    pub settings: Settings,
}

/// Where attempts are stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite database path; defaults to `~/.rhetor/attempts.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Directory holding the config file and default database.
    pub fn home() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".rhetor"))
    }

    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::home()?.join("config.toml"))
    }

    /// Load configuration from a file, or defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Fill in the API key from the environment when the file has none.
    ///
    /// `lookup` is normally `std::env::var(..).ok()`.
    pub fn apply_env_key(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let has_key = self.provider.api_key.as_deref().is_some_and(|k| !k.is_empty());
        if has_key {
            return;
        }

        self.provider.api_key = API_KEY_VARS
            .iter()
            .filter_map(|var| lookup(var))
            .find(|key| !key.is_empty());
    }

    /// Database path: explicit override, then config, then the default.
    pub fn db_path(&self, override_path: Option<&Path>) -> Result<PathBuf> {
        match (override_path, &self.storage.db_path) {
            (Some(path), _) => Ok(path.to_path_buf()),
            (None, Some(path)) => Ok(path.clone()),
            (None, None) => Ok(Self::home()?.join("attempts.db")),
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.provider
            .validate()
            .map_err(|e| CliError::Config(format!("provider: {}", e)))?;
        self.retry
            .validate()
            .map_err(|e| CliError::Config(format!("retry: {}", e)))?;
        self.analyzer
            .validate()
            .map_err(|e| CliError::Config(format!("analyzer: {}", e)))?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhetor_llm::ProviderKind;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.kind, ProviderKind::OpenAi);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.analyzer.max_text_length, 2000);
        assert!(config.settings.color);
        assert_eq!(config.settings.format, OutputFormat::Table);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [provider]
            kind = "ollama"
            model = "llama3"

            [settings]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.kind, ProviderKind::Ollama);
        assert_eq!(config.provider.model, "llama3");
        assert_eq!(config.settings.format, OutputFormat::Json);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.analyzer.analysis_timeout_secs, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.analyzer = AnalyzerConfig::strict();
        config.storage.db_path = Some(dir.path().join("a.db"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.analyzer, AnalyzerConfig::strict());
        assert_eq!(loaded.storage.db_path, Some(dir.path().join("a.db")));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn test_env_key_order() {
        let mut config = Config::default();
        config.apply_env_key(|var| match var {
            "RHETOR_API_KEY" => Some("rhetor-key".to_string()),
            "OPENAI_API_KEY" => Some("openai-key".to_string()),
            _ => None,
        });
        assert_eq!(config.provider.api_key.as_deref(), Some("rhetor-key"));

        let mut config = Config::default();
        config.apply_env_key(|var| (var == "OPENAI_API_KEY").then(|| "openai-key".to_string()));
        assert_eq!(config.provider.api_key.as_deref(), Some("openai-key"));
    }

    #[test]
    fn test_file_key_wins_over_env() {
        let mut config = Config::default();
        config.provider.api_key = Some("file-key".to_string());
        config.apply_env_key(|_| Some("env-key".to_string()));
        assert_eq!(config.provider.api_key.as_deref(), Some("file-key"));
    }

    #[test]
    fn test_db_path_precedence() {
        let mut config = Config::default();
        config.storage.db_path = Some(PathBuf::from("/tmp/config.db"));

        assert_eq!(
            config.db_path(Some(Path::new("/tmp/flag.db"))).unwrap(),
            PathBuf::from("/tmp/flag.db")
        );
        assert_eq!(config.db_path(None).unwrap(), PathBuf::from("/tmp/config.db"));
    }

    #[test]
    fn test_hosted_openai_requires_key() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }
}
