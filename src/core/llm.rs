//! Hosted LLM text completion with retry

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::core::config::AdvisorConfig;
use crate::core::errors::LlmError;

/// Black-box text completion service
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError>;
}

/// Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(config: &AdvisorConfig) -> Result<Self, LlmError> {
        let api_key = config
            .google_api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.llm_endpoint.trim_end_matches('/').to_string(),
            model: config.llm_model.clone(),
            api_key,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    async fn send_request(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "maxOutputTokens": max_tokens
            }
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();

            if status_code == 429 || error_text.contains("RESOURCE_EXHAUSTED") {
                return Err(LlmError::QuotaExceeded);
            }

            return Err(LlmError::ApiError {
                status: status_code,
                message: error_text,
            });
        }

        let json: serde_json::Value = response.json().await?;

        let text = json["candidates"]
            .get(0)
            .and_then(|c| c["content"]["parts"].as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(text)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!("Retry attempt {} for model {}", attempt, self.model);
                sleep(self.retry_delay * 2_u32.pow(attempt - 1)).await;
            }

            match self.send_request(prompt, max_tokens).await {
                Ok(text) => {
                    if attempt > 0 {
                        info!("LLM answered after {} retries", attempt);
                    }
                    return Ok(text);
                }
                Err(e) => {
                    warn!(model = %self.model, attempt, error = %e, "LLM request failed");
                    let retryable = match &e {
                        LlmError::QuotaExceeded | LlmError::MissingApiKey => false,
                        LlmError::ApiError { status, .. } => *status >= 500,
                        _ => true,
                    };
                    last_error = Some(e);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(last_error.unwrap_or(LlmError::EmptyResponse))
    }
}
