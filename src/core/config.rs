//! Configuration management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_LLM_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TRANSLATION_ENDPOINT: &str =
    "https://translation.googleapis.com/language/translate/v2";
const DEFAULT_MYMEMORY_ENDPOINT: &str = "https://api.mymemory.translated.net/get";

/// Configuration for the advisor pipeline and its collaborators
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    #[serde(skip_serializing)]
    pub google_api_key: Option<String>,
    pub llm_model: String,
    pub llm_endpoint: String,
    pub translation_endpoint: String,
    pub mymemory_endpoint: String,
    pub mymemory_email: Option<String>,
    pub enable_llm_translation: bool,
    pub chunk_chars: usize,
    pub max_document_chars: usize,
    pub max_question_chars: usize,
    pub max_response_chars: usize,
    pub max_response_tokens: u32,
    pub provider_timeout_ms: u64,
    pub llm_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub cache_capacity: usize,
    pub detection_min_chars: usize,
    pub detection_min_confidence: f64,
    pub max_upload_bytes: u64,
    pub daily_query_limit: usize,
    pub alert_threshold: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            llm_model: "gemini-2.5-flash-lite".to_string(),
            llm_endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
            translation_endpoint: DEFAULT_TRANSLATION_ENDPOINT.to_string(),
            mymemory_endpoint: DEFAULT_MYMEMORY_ENDPOINT.to_string(),
            mymemory_email: None,
            enable_llm_translation: true,
            chunk_chars: 2000,
            max_document_chars: 12_000,
            max_question_chars: 5000,
            max_response_chars: 2000,
            max_response_tokens: 1024,
            provider_timeout_ms: 10_000,
            llm_timeout_ms: 30_000,
            request_timeout_ms: 9_000,
            max_retries: 2,
            retry_delay_ms: 1000,
            cache_capacity: 256,
            detection_min_chars: 20,
            detection_min_confidence: 0.25,
            max_upload_bytes: 10 * 1024 * 1024,
            daily_query_limit: 1000,
            alert_threshold: 800,
        }
    }
}

impl fmt::Debug for AdvisorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvisorConfig")
            .field(
                "google_api_key",
                &self.google_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("llm_model", &self.llm_model)
            .field("llm_endpoint", &self.llm_endpoint)
            .field("enable_llm_translation", &self.enable_llm_translation)
            .field("chunk_chars", &self.chunk_chars)
            .field("max_document_chars", &self.max_document_chars)
            .field("provider_timeout_ms", &self.provider_timeout_ms)
            .field("llm_timeout_ms", &self.llm_timeout_ms)
            .field("cache_capacity", &self.cache_capacity)
            .field("daily_query_limit", &self.daily_query_limit)
            .finish_non_exhaustive()
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid value for {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

impl AdvisorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let google_api_key = std::env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        if google_api_key.is_none() {
            warn!("GOOGLE_API_KEY is not set; the LLM and cloud translation are unavailable");
        }

        let config = Self {
            google_api_key,
            llm_model: std::env::var("LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_endpoint: std::env::var("LLM_ENDPOINT").unwrap_or(defaults.llm_endpoint),
            translation_endpoint: std::env::var("TRANSLATION_ENDPOINT")
                .unwrap_or(defaults.translation_endpoint),
            mymemory_endpoint: std::env::var("MYMEMORY_ENDPOINT")
                .unwrap_or(defaults.mymemory_endpoint),
            mymemory_email: std::env::var("MYMEMORY_EMAIL").ok(),
            enable_llm_translation: env_or("ENABLE_LLM_TRANSLATION", defaults.enable_llm_translation)?,
            chunk_chars: env_or("CHUNK_CHARS", defaults.chunk_chars)?,
            max_document_chars: env_or("MAX_DOCUMENT_CHARS", defaults.max_document_chars)?,
            max_question_chars: env_or("MAX_QUESTION_CHARS", defaults.max_question_chars)?,
            max_response_chars: env_or("MAX_RESPONSE_CHARS", defaults.max_response_chars)?,
            max_response_tokens: env_or("MAX_RESPONSE_TOKENS", defaults.max_response_tokens)?,
            provider_timeout_ms: env_or("PROVIDER_TIMEOUT_MS", defaults.provider_timeout_ms)?,
            llm_timeout_ms: env_or("LLM_TIMEOUT_MS", defaults.llm_timeout_ms)?,
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", defaults.request_timeout_ms)?,
            max_retries: env_or("MAX_RETRIES", defaults.max_retries)?,
            retry_delay_ms: env_or("RETRY_DELAY_MS", defaults.retry_delay_ms)?,
            cache_capacity: env_or("CACHE_CAPACITY", defaults.cache_capacity)?,
            detection_min_chars: env_or("DETECTION_MIN_CHARS", defaults.detection_min_chars)?,
            detection_min_confidence: env_or(
                "DETECTION_MIN_CONFIDENCE",
                defaults.detection_min_confidence,
            )?,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            daily_query_limit: env_or("DAILY_QUERY_LIMIT", defaults.daily_query_limit)?,
            alert_threshold: env_or("ALERT_THRESHOLD", defaults.alert_threshold)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load from a config file (JSON, TOML or YAML), overridden by `ADVISOR_*` variables
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut config: Self = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("ADVISOR"))
            .build()?
            .try_deserialize()?;

        if config.google_api_key.is_none() {
            config.google_api_key = std::env::var("GOOGLE_API_KEY").ok();
        }

        info!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file. The API key is never written.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chunk_chars == 0 {
            return Err(anyhow::anyhow!("chunk_chars must be greater than 0"));
        }

        if self.max_document_chars == 0 {
            return Err(anyhow::anyhow!("max_document_chars must be greater than 0"));
        }

        if self.max_question_chars == 0 {
            return Err(anyhow::anyhow!("max_question_chars must be greater than 0"));
        }

        if self.provider_timeout_ms == 0 || self.llm_timeout_ms == 0 || self.request_timeout_ms == 0
        {
            return Err(anyhow::anyhow!("timeouts must be greater than 0"));
        }

        // Each attempt has to end before the overall LLM deadline or retries never run
        if self.max_retries > 0 && self.request_timeout_ms >= self.llm_timeout_ms {
            return Err(anyhow::anyhow!(
                "request_timeout_ms must be less than llm_timeout_ms when retries are enabled"
            ));
        }

        if self.cache_capacity == 0 {
            return Err(anyhow::anyhow!("cache_capacity must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.detection_min_confidence) {
            return Err(anyhow::anyhow!(
                "detection_min_confidence must be between 0 and 1"
            ));
        }

        if self.alert_threshold > self.daily_query_limit {
            return Err(anyhow::anyhow!(
                "alert_threshold must not exceed daily_query_limit"
            ));
        }

        if self.llm_endpoint.is_empty() {
            return Err(anyhow::anyhow!("LLM endpoint is required"));
        }

        Ok(())
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
