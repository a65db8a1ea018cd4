//! MyMemory public translation API, the keyless last resort

use async_trait::async_trait;
use std::time::Duration;

use super::TranslationProvider;
use crate::core::errors::TranslationError;
use crate::core::models::Language;

/// MyMemory rejects queries above 500 bytes
pub const MYMEMORY_MAX_CHUNK_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct MyMemoryProvider {
    client: reqwest::Client,
    endpoint: String,
    email: Option<String>,
}

impl MyMemoryProvider {
    pub fn new(
        endpoint: impl Into<String>,
        email: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TranslationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            email: email.filter(|e| !e.trim().is_empty()),
        })
    }
}

#[async_trait]
impl TranslationProvider for MyMemoryProvider {
    fn name(&self) -> &str {
        "mymemory"
    }

    // Characters, not bytes: multibyte chunks may still be rejected and fall through.
    fn max_chunk_chars(&self) -> usize {
        MYMEMORY_MAX_CHUNK_CHARS
    }

    async fn translate_chunk(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslationError> {
        let langpair = format!("{}|{}", source.code(), target.code());
        let mut query = vec![("q", text), ("langpair", langpair.as_str())];
        if let Some(email) = &self.email {
            query.push(("de", email.as_str()));
        }

        let response = self.client.get(&self.endpoint).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let json: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| TranslationError::InvalidResponseError {
                    message: e.to_string(),
                })?;

        // The API reports failures in-band with a 200 transport status.
        let api_status = json["responseStatus"]
            .as_u64()
            .or_else(|| json["responseStatus"].as_str().and_then(|s| s.parse().ok()))
            .unwrap_or(0);
        if api_status == 429 {
            return Err(TranslationError::QuotaExceededError);
        }
        if api_status != 200 {
            return Err(TranslationError::ApiError {
                status: api_status as u16,
                message: json["responseDetails"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
            });
        }

        json["responseData"]["translatedText"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| TranslationError::InvalidResponseError {
                message: "No translatedText in response".to_string(),
            })
    }
}
