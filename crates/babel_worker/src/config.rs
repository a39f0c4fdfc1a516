//! Worker configuration.
//!
//! Sources in order of precedence (later sources override earlier):
//! 1. Built-in defaults
//! 2. A TOML file (`babel.toml` in the working directory, or an explicit path)
//! 3. Environment variables, after `.env` has been loaded
//!
//! Environment variable names are the upper-case field names, e.g.
//! `DATABASE_URL`, `GEMINI_API_KEY`, `USE_MOCK_IMAGES`.

use crate::{CoordinatorSettings, ObservabilityConfig};
use babel_error::{BabelResult, ConfigError};
use babel_models::{DEFAULT_BASE_URL, DEFAULT_TTS_URL, GeneratorSettings, RetryPolicy};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How illustrations are requested.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ImageMode {
    /// All pages in one batched request ahead of narration
    #[default]
    Batch,
    /// One image per page, interleaved with narration
    PerPage,
}

/// Settings for the `babel-worker` process.
#[derive(Debug, Clone, Serialize, Deserialize, derive_getters::Getters)]
pub struct WorkerConfig {
    /// PostgreSQL connection string
    database_url: Option<String>,
    /// Maximum pooled connections
    database_pool_size: u32,
    /// Gemini / Imagen API key
    gemini_api_key: Option<String>,
    /// Generative Language API root
    gemini_base_url: String,
    /// Story text model
    text_model: String,
    /// Illustration model
    image_model: String,
    /// Narration model
    tts_model: String,
    /// Baseline speech endpoint used when premium narration fails
    tts_fallback_url: String,
    /// Use the offline template writer
    use_mock_stories: bool,
    /// Use placeholder images
    use_mock_images: bool,
    /// Use synthesized tones instead of speech
    use_mock_audio: bool,
    /// Mix a background bed into baseline narration
    enable_background_music: bool,
    /// Batched or per-page illustration
    image_mode: ImageMode,
    /// Images per Imagen call
    max_images_per_batch: usize,
    /// Sleep between empty polls, seconds
    job_check_interval_secs: f64,
    /// Sleep after a failed claim, seconds
    job_error_retry_delay_secs: f64,
    /// Throttle between pages, seconds
    page_processing_delay_secs: f64,
    /// Time allowed for the in-flight job after a shutdown signal, seconds
    shutdown_grace_period_secs: u64,
    /// Offload page assets to blob storage
    enable_blob_storage: bool,
    /// Directory blobs are written under
    blob_root: Option<PathBuf>,
    /// Base URL blobs are served from
    blob_public_url: Option<String>,
    /// Health/metrics bind address
    http_host: String,
    /// Health/metrics port
    http_port: u16,
    /// Default log filter when `RUST_LOG` is unset
    log_level: String,
    /// Emit JSON logs
    json_logs: bool,
    /// Retries for transient backend errors
    max_retries: usize,
    /// First retry delay, milliseconds
    retry_backoff_ms: u64,
}

impl WorkerConfig {
    /// Load configuration from defaults, an optional TOML file and the environment.
    ///
    /// Without an explicit `path`, `babel.toml` in the working directory is read if present.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the result fails validation.
    pub fn load(path: Option<&Path>) -> BabelResult<Self> {
        let _ = dotenvy::dotenv();

        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("babel").required(false),
        };

        let config = Self::defaults()?
            .add_source(file)
            .add_source(Environment::default().try_parsing(true))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {e}")))?
            .try_deserialize::<Self>()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text layered over the defaults, ignoring the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed or the result fails validation.
    pub fn from_toml_str(toml: &str) -> BabelResult<Self> {
        let config = Self::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {e}")))?
            .try_deserialize::<Self>()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let builder = Config::builder()
            .set_default("database_pool_size", 10)
            .and_then(|b| b.set_default("gemini_base_url", DEFAULT_BASE_URL))
            .and_then(|b| b.set_default("text_model", "gemini-2.0-flash"))
            .and_then(|b| b.set_default("image_model", "imagen-4.0-generate-001"))
            .and_then(|b| b.set_default("tts_model", "gemini-2.5-flash-preview-tts"))
            .and_then(|b| b.set_default("tts_fallback_url", DEFAULT_TTS_URL))
            .and_then(|b| b.set_default("use_mock_stories", false))
            .and_then(|b| b.set_default("use_mock_images", false))
            .and_then(|b| b.set_default("use_mock_audio", false))
            .and_then(|b| b.set_default("enable_background_music", true))
            .and_then(|b| b.set_default("image_mode", "batch"))
            .and_then(|b| b.set_default("max_images_per_batch", 4))
            .and_then(|b| b.set_default("job_check_interval_secs", 1.0))
            .and_then(|b| b.set_default("job_error_retry_delay_secs", 5.0))
            .and_then(|b| b.set_default("page_processing_delay_secs", 0.5))
            .and_then(|b| b.set_default("shutdown_grace_period_secs", 30))
            .and_then(|b| b.set_default("enable_blob_storage", false))
            .and_then(|b| b.set_default("http_host", "0.0.0.0"))
            .and_then(|b| b.set_default("http_port", 8000))
            .and_then(|b| b.set_default("log_level", "info"))
            .and_then(|b| b.set_default("json_logs", false))
            .and_then(|b| b.set_default("max_retries", 3))
            .and_then(|b| b.set_default("retry_backoff_ms", 1000))
            .map_err(|e| ConfigError::new(format!("Invalid default configuration: {e}")))?;
        Ok(builder)
    }

    /// Check cross-field rules.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bad_url = self
            .database_url
            .as_deref()
            .is_some_and(|url| !(url.starts_with("postgres://") || url.starts_with("postgresql://")));
        if bad_url {
            return Err(ConfigError::new(
                "DATABASE_URL must start with postgres:// or postgresql://",
            ));
        }

        if !self.all_mocked() {
            match &self.gemini_api_key {
                None => {
                    return Err(ConfigError::new(
                        "GEMINI_API_KEY is required unless every stage is mocked",
                    ));
                }
                Some(key) if key.trim().len() < 10 => {
                    return Err(ConfigError::new("GEMINI_API_KEY looks too short"));
                }
                Some(_) => {}
            }
        }

        if self.enable_blob_storage && (self.blob_root.is_none() || self.blob_public_url.is_none())
        {
            return Err(ConfigError::new(
                "BLOB_ROOT and BLOB_PUBLIC_URL are required when blob storage is enabled",
            ));
        }

        for (name, secs) in [
            ("JOB_CHECK_INTERVAL_SECS", self.job_check_interval_secs),
            ("JOB_ERROR_RETRY_DELAY_SECS", self.job_error_retry_delay_secs),
            ("PAGE_PROCESSING_DELAY_SECS", self.page_processing_delay_secs),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(ConfigError::new(format!(
                    "{name} must be a non-negative number of seconds"
                )));
            }
        }

        if self.max_images_per_batch == 0 {
            return Err(ConfigError::new("MAX_IMAGES_PER_BATCH must be at least 1"));
        }

        Ok(())
    }

    /// True if every generation stage is mocked.
    pub fn all_mocked(&self) -> bool {
        self.use_mock_stories && self.use_mock_images && self.use_mock_audio
    }

    /// The database URL, for commands that need one.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is unset.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::new("DATABASE_URL is required"))
    }

    /// Generator backend selection.
    pub fn generator_settings(&self) -> GeneratorSettings {
        GeneratorSettings {
            gemini_api_key: self.gemini_api_key.clone(),
            gemini_base_url: self.gemini_base_url.clone(),
            text_model: self.text_model.clone(),
            image_model: self.image_model.clone(),
            tts_model: self.tts_model.clone(),
            tts_fallback_url: self.tts_fallback_url.clone(),
            use_mock_stories: self.use_mock_stories,
            use_mock_images: self.use_mock_images,
            use_mock_audio: self.use_mock_audio,
            enable_background_music: self.enable_background_music,
            max_images_per_batch: self.max_images_per_batch,
            retry: RetryPolicy {
                max_retries: self.max_retries,
                initial_backoff_ms: Some(self.retry_backoff_ms),
            },
        }
    }

    /// Loop timing and image mode for the coordinator.
    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            idle_interval: Duration::from_secs_f64(self.job_check_interval_secs),
            error_backoff: Duration::from_secs_f64(self.job_error_retry_delay_secs),
            page_delay: Duration::from_secs_f64(self.page_processing_delay_secs),
            image_mode: self.image_mode,
        }
    }

    /// Logging setup.
    pub fn observability(&self) -> ObservabilityConfig {
        ObservabilityConfig {
            log_level: self.log_level.clone(),
            json_logs: self.json_logs,
            ..ObservabilityConfig::default()
        }
    }

    /// Grace period for the in-flight job on shutdown.
    pub fn shutdown_grace_period(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_period_secs)
    }

    /// Socket address string for the HTTP surface.
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}
