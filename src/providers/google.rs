use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::errors::ProviderError;
use crate::providers::TranslationClient;

/// Client for Google's public translate endpoint.
///
/// Uses the unauthenticated `translate_a/single` endpoint with `client=gtx`
/// and automatic source-language detection, the same surface the
/// deep-translator ecosystem builds on. No API key required.
pub struct GoogleTranslate {
    /// HTTP client for API requests
    client: Client,
    /// Endpoint URL (optional, defaults to the public endpoint)
    endpoint: String,
}

impl Default for GoogleTranslate {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleTranslate {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            endpoint: String::new(),
        }
    }

    /// Override the endpoint, mainly for tests
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn api_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://translate.googleapis.com/translate_a/single".to_string()
        } else {
            self.endpoint.clone()
        }
    }

    /// The response is a nested JSON array; the translated text is the
    /// first element of each segment in the first array.
    fn extract_translation(value: &Value) -> Option<String> {
        let segments = value.get(0)?.as_array()?;
        let text: String = segments
            .iter()
            .filter_map(|segment| segment.get(0)?.as_str())
            .collect();

        if text.is_empty() { None } else { Some(text) }
    }
}

#[async_trait]
impl TranslationClient for GoogleTranslate {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(self.api_url())
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Translate request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Translate response: {}", e)))?;

        Self::extract_translation(&value).ok_or_else(|| {
            ProviderError::ParseError("Translate response contained no text".to_string())
        })
    }
}
