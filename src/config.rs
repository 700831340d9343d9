use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use cron::Schedule;

use crate::content::{Catalog, CatalogError};
use crate::generator::{DEFAULT_BASE_URL, DEFAULT_MODEL, RetryPolicy};
use crate::scheduler::parse_schedule;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Catalog missing, unreadable, or too small for the daily word count.
    Catalog(CatalogError),
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Catalog(e) => write!(f, "{}", e),
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Catalog(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

impl From<CatalogError> for ConfigError {
    fn from(e: CatalogError) -> Self {
        Self::Catalog(e)
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    telegram_bot_token: String,
    /// Group that receives the daily posts.
    chat_id: i64,
    /// Empty runs the echo backend instead of calling the service.
    #[serde(default)]
    openai_api_key: String,
    #[serde(default = "default_model")]
    openai_model: String,
    #[serde(default = "default_base_url")]
    openai_base_url: String,
    /// Overrides the username reported by getMe.
    bot_username: Option<String>,
    #[serde(default = "default_timezone")]
    timezone: String,
    #[serde(default = "default_morning")]
    morning_time: String,
    #[serde(default = "default_midday")]
    midday_time: String,
    #[serde(default = "default_evening")]
    evening_time: String,
    #[serde(default = "default_words_per_day")]
    words_per_day: usize,
    #[serde(default = "default_quiz_questions")]
    quiz_questions: usize,
    #[serde(default = "default_timeout_secs")]
    generation_timeout_secs: u64,
    #[serde(default = "default_retries")]
    generation_retries: u32,
    #[serde(default = "default_backoff_ms")]
    generation_backoff_ms: u64,
    /// JSON catalog replacing the built-in words and grammar topics.
    catalog_path: Option<String>,
    /// Directory for logs. Defaults to current directory.
    data_dir: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timezone() -> String {
    "Asia/Baku".to_string()
}

fn default_morning() -> String {
    "10:00".to_string()
}

fn default_midday() -> String {
    "14:00".to_string()
}

fn default_evening() -> String {
    "19:00".to_string()
}

fn default_words_per_day() -> usize {
    10
}

fn default_quiz_questions() -> usize {
    3
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_retries() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    1000
}

pub struct Config {
    pub telegram_bot_token: String,
    pub chat_id: i64,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub bot_username: Option<String>,
    pub timezone: Tz,
    pub morning: Schedule,
    pub midday: Schedule,
    pub evening: Schedule,
    pub words_per_day: usize,
    pub quiz_questions: usize,
    pub retry: RetryPolicy,
    /// Validated against `words_per_day`.
    pub catalog: Catalog,
    /// Directory for state files (logs).
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        if file.telegram_bot_token.is_empty() {
            return Err(ConfigError::Validation("telegram_bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }
        if file.chat_id == 0 {
            return Err(ConfigError::Validation("chat_id is required".into()));
        }
        if file.quiz_questions == 0 {
            return Err(ConfigError::Validation("quiz_questions must be at least 1".into()));
        }

        let timezone: Tz = file
            .timezone
            .parse()
            .map_err(|_| ConfigError::Validation(format!("unknown timezone '{}'", file.timezone)))?;

        let morning = parse_schedule(&file.morning_time).map_err(ConfigError::Validation)?;
        let midday = parse_schedule(&file.midday_time).map_err(ConfigError::Validation)?;
        let evening = parse_schedule(&file.evening_time).map_err(ConfigError::Validation)?;
        // The evening quiz reads what the morning and midday jobs wrote, so
        // the three must never fire together.
        let times = [&file.morning_time, &file.midday_time, &file.evening_time];
        let exprs: Vec<String> = [&morning, &midday, &evening].iter().map(|s| s.to_string()).collect();
        if exprs[0] == exprs[1] || exprs[1] == exprs[2] || exprs[0] == exprs[2] {
            return Err(ConfigError::Validation(format!(
                "daily jobs must run at different times (got {:?})",
                times
            )));
        }

        let catalog = match file.catalog_path {
            Some(ref p) => Catalog::load(p)?,
            None => Catalog::builtin(),
        };
        catalog.ensure_word_capacity(file.words_per_day)?;

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            telegram_bot_token: file.telegram_bot_token,
            chat_id: file.chat_id,
            openai_api_key: file.openai_api_key,
            openai_model: file.openai_model,
            openai_base_url: file.openai_base_url,
            bot_username: file.bot_username.map(|u| u.trim_start_matches('@').to_string()),
            timezone,
            morning,
            midday,
            evening,
            words_per_day: file.words_per_day,
            quiz_questions: file.quiz_questions,
            retry: RetryPolicy {
                timeout: Duration::from_secs(file.generation_timeout_secs),
                retries: file.generation_retries,
                backoff: Duration::from_millis(file.generation_backoff_ms),
            },
            catalog,
            data_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn assert_err<T>(result: Result<T, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_valid_config_with_defaults() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdefGHIjklMNOpqrsTUVwxyz",
            "chat_id": -1001234567890
        }"#);
        let config = Config::load(file.path()).expect("should load valid config");
        assert_eq!(config.chat_id, -1001234567890);
        assert_eq!(config.words_per_day, 10);
        assert_eq!(config.quiz_questions, 3);
        assert_eq!(config.timezone, chrono_tz::Asia::Baku);
        assert_eq!(config.openai_model, DEFAULT_MODEL);
        assert!(config.openai_api_key.is_empty());
        assert_eq!(config.retry.retries, 2);
        assert_eq!(config.retry.timeout, Duration::from_secs(60));
        assert!(config.catalog.words.len() >= 10);
    }

    #[test]
    fn test_bot_username_strips_at() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "chat_id": 5,
            "bot_username": "@sozbot"
        }"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.bot_username.as_deref(), Some("sozbot"));
    }

    #[test]
    fn test_empty_token() {
        let file = write_config(r#"{
            "telegram_bot_token": "",
            "chat_id": 5
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("telegram_bot_token"));
    }

    #[test]
    fn test_invalid_token_format() {
        for token in ["invalid_token_no_colon", "notanumber:ABCdef", "123456789:"] {
            let file = write_config(&format!(
                r#"{{ "telegram_bot_token": "{token}", "chat_id": 5 }}"#
            ));
            let err = assert_err(Config::load(file.path()));
            assert!(matches!(err, ConfigError::Validation(_)), "token {token}");
        }
    }

    #[test]
    fn test_missing_chat_id() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "chat_id": 0
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("chat_id"));
    }

    #[test]
    fn test_words_per_day_exceeds_catalog() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "chat_id": 5,
            "words_per_day": 1000
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Catalog(CatalogError::Capacity(_))));
    }

    #[test]
    fn test_custom_catalog_too_small() {
        let mut catalog = NamedTempFile::new().unwrap();
        catalog
            .write_all(br#"{"words": [{"source": "Ev", "target": "x"}], "grammar": [{"source": "a", "target": "b"}]}"#)
            .unwrap();
        let file = write_config(&format!(
            r#"{{ "telegram_bot_token": "123456789:ABCdef", "chat_id": 5, "catalog_path": {:?} }}"#,
            catalog.path().display().to_string()
        ));
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Catalog(CatalogError::Capacity(_))));
    }

    #[test]
    fn test_invalid_timezone() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "chat_id": 5,
            "timezone": "Mars/Olympus"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("timezone"));
    }

    #[test]
    fn test_invalid_time() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "chat_id": 5,
            "evening_time": "7pm"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_overlapping_times_rejected() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "chat_id": 5,
            "midday_time": "19:00",
            "evening_time": "19:00"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("different times"));
    }

    #[test]
    fn test_file_not_found() {
        let err = assert_err(Config::load("/nonexistent/path/config.json"));
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_config("{ invalid json }");
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }
}
