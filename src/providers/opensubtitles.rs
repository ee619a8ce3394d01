use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::{QuotaInfo, SubtitleSearchResult, SubtitleSource};
use crate::subtitle_processor::{SubtitleCollection, SubtitleEntry};

/// Client for the OpenSubtitles REST API (api.opensubtitles.com/api/v1)
pub struct OpenSubtitles {
    /// HTTP client for API requests
    client: Client,
    /// API key sent with every request
    api_key: String,
    /// User-Agent identifying this tool
    user_agent: String,
    /// API endpoint URL (optional, defaults to the public API)
    endpoint: String,
    /// Bearer token obtained at login
    token: Option<String>,
}

/// Login request body
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Login response
#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

/// `GET /infos/user` response envelope
#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    data: UserInfoData,
}

#[derive(Debug, Deserialize)]
struct UserInfoData {
    #[serde(default = "default_quota")]
    remaining_downloads: u32,
    #[serde(default = "default_quota")]
    allowed_downloads: u32,
    #[serde(default)]
    reset_time_utc: Option<String>,
}

// The API omits quota fields for some account types; assume the free tier.
fn default_quota() -> u32 {
    100
}

/// `GET /subtitles` response envelope
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchEntry>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    attributes: SearchAttributes,
}

#[derive(Debug, Deserialize)]
struct SearchAttributes {
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    release: Option<String>,
    #[serde(default)]
    files: Vec<SearchFile>,
}

#[derive(Debug, Deserialize)]
struct SearchFile {
    file_id: i64,
}

/// `POST /download` request and response
#[derive(Debug, Serialize)]
struct DownloadRequest {
    file_id: i64,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    link: String,
}

impl OpenSubtitles {
    /// Create a new client. No network traffic until `login` is called.
    pub fn new(api_key: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            user_agent: user_agent.into(),
            endpoint: String::new(),
            token: None,
        }
    }

    /// Override the API endpoint, mainly for tests
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn api_url(&self, path: &str) -> String {
        if self.endpoint.is_empty() {
            format!("https://api.opensubtitles.com/api/v1{}", path)
        } else {
            format!("{}{}", self.endpoint.trim_end_matches('/'), path)
        }
    }

    fn bearer_token(&self) -> Result<&str, ProviderError> {
        self.token.as_deref().ok_or_else(|| {
            ProviderError::AuthenticationError("Not logged in to OpenSubtitles".to_string())
        })
    }

    /// Authenticate and store the session token for subsequent calls
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .post(self.api_url("/login"))
            .header("Api-Key", &self.api_key)
            .header("User-Agent", &self.user_agent)
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Login request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenSubtitles login failed ({}): {}", status, message);
            return Err(ProviderError::AuthenticationError(format!(
                "Login rejected ({}): {}",
                status, message
            )));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Login response: {}", e)))?;

        self.token = Some(login.token);
        Ok(())
    }

    /// Parse the service's reset timestamp format (RFC 3339 with fractional
    /// seconds, e.g. `2024-01-01T12:00:00.000Z`)
    fn parse_reset_time(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[async_trait]
impl SubtitleSource for OpenSubtitles {
    async fn quota(&self) -> Result<QuotaInfo, ProviderError> {
        let token = self.bearer_token()?;

        let response = self
            .client
            .get(self.api_url("/infos/user"))
            .header("Api-Key", &self.api_key)
            .header("User-Agent", &self.user_agent)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Quota request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let info: UserInfoResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("User info response: {}", e)))?;

        Ok(QuotaInfo {
            remaining: info.data.remaining_downloads,
            total: info.data.allowed_downloads,
            reset_time_utc: info
                .data
                .reset_time_utc
                .as_deref()
                .and_then(Self::parse_reset_time),
        })
    }

    async fn search(
        &self,
        query: &str,
        language: &str,
    ) -> Result<Vec<SubtitleSearchResult>, ProviderError> {
        let token = self.bearer_token()?;

        let response = self
            .client
            .get(self.api_url("/subtitles"))
            .header("Api-Key", &self.api_key)
            .header("User-Agent", &self.user_agent)
            .bearer_auth(token)
            .query(&[("query", query), ("languages", language)])
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let results: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Search response: {}", e)))?;

        let results = results
            .data
            .into_iter()
            .filter_map(|entry| {
                let file = entry.attributes.files.first()?;
                Some(SubtitleSearchResult {
                    file_id: file.file_id,
                    release: entry.attributes.release.unwrap_or_default(),
                    language: entry
                        .attributes
                        .language
                        .unwrap_or_else(|| language.to_string()),
                })
            })
            .collect();

        Ok(results)
    }

    async fn download(
        &self,
        result: &SubtitleSearchResult,
    ) -> Result<Option<Vec<SubtitleEntry>>, ProviderError> {
        let token = self.bearer_token()?;

        // Resolve the download link. Each call counts against the quota;
        // the service never serves from a local cache.
        let response = self
            .client
            .post(self.api_url("/download"))
            .header("Api-Key", &self.api_key)
            .header("User-Agent", &self.user_agent)
            .bearer_auth(token)
            .json(&DownloadRequest {
                file_id: result.file_id,
            })
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Download request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let download: DownloadResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Download response: {}", e)))?;

        // Fetch the subtitle body itself
        let body = self
            .client
            .get(&download.link)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Subtitle fetch failed: {}", e)))?
            .bytes()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Subtitle body read failed: {}", e)))?;

        let content = String::from_utf8_lossy(&body);
        match SubtitleCollection::parse_srt_string(&content) {
            Ok(entries) => Ok(Some(entries)),
            Err(e) => {
                debug!("Downloaded subtitle for file_id {} was unusable: {}", result.file_id, e);
                Ok(None)
            }
        }
    }
}
