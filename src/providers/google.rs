//! Google Cloud Translation (v2 REST API)

use async_trait::async_trait;
use std::time::Duration;

use super::TranslationProvider;
use crate::core::errors::TranslationError;
use crate::core::models::Language;
use crate::processors::chunker::DEFAULT_CHUNK_CHARS;

/// Cloud translation API, first choice in the default chain
#[derive(Clone)]
pub struct GoogleTranslateProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_chunk_chars: usize,
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("endpoint", &self.endpoint)
            .field("max_chunk_chars", &self.max_chunk_chars)
            .finish_non_exhaustive()
    }
}

impl GoogleTranslateProvider {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TranslationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            max_chunk_chars: DEFAULT_CHUNK_CHARS,
        })
    }

    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars;
        self
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslateProvider {
    fn name(&self) -> &str {
        "google-cloud"
    }

    fn max_chunk_chars(&self) -> usize {
        self.max_chunk_chars
    }

    async fn translate_chunk(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslationError> {
        let body = serde_json::json!({
            "q": text,
            "source": source.code(),
            "target": target.code(),
            "format": "text",
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();

            if status_code == 429 || error_text.contains("quota") {
                return Err(TranslationError::QuotaExceededError);
            }

            return Err(TranslationError::ApiError {
                status: status_code,
                message: error_text,
            });
        }

        let json: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| TranslationError::InvalidResponseError {
                    message: e.to_string(),
                })?;

        json["data"]["translations"]
            .get(0)
            .and_then(|t| t["translatedText"].as_str())
            .map(str::to_string)
            .ok_or_else(|| TranslationError::InvalidResponseError {
                message: "No translation in response".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn provider(server: &MockServer) -> GoogleTranslateProvider {
        GoogleTranslateProvider::new(server.uri(), "test-key", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_translates_chunk() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "q": "Hello",
                "source": "en",
                "target": "es",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "translations": [{ "translatedText": "Hola" }] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider(&server)
            .await
            .translate_chunk("Hello", Language::En, Language::Es)
            .await
            .unwrap();
        assert_eq!(result, "Hola");
    }

    #[tokio::test]
    async fn test_quota_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = provider(&server)
            .await
            .translate_chunk("Hello", Language::En, Language::Es)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::QuotaExceededError));
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": {} })),
            )
            .mount(&server)
            .await;

        let err = provider(&server)
            .await
            .translate_chunk("Hello", Language::En, Language::Es)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::InvalidResponseError { .. }));
    }
}
