/*!
 * Client implementations for the remote services both pipelines depend on.
 *
 * - OpenSubtitles: subtitle search, quota queries, and downloads
 * - Google Translate: text translation with automatic source detection
 *
 * The pipelines consume these through the `SubtitleSource` and
 * `TranslationClient` traits so they can be exercised against mocks.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::ProviderError;
use crate::subtitle_processor::SubtitleEntry;

/// Download quota as reported by the subtitle service.
///
/// Transient: re-fetched before every download attempt, never cached
/// across files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaInfo {
    /// Downloads still available in the current window
    pub remaining: u32,

    /// Total downloads allowed per window
    pub total: u32,

    /// When the quota resets, if the service reports it
    pub reset_time_utc: Option<DateTime<Utc>>,
}

/// One ranked subtitle search result
#[derive(Debug, Clone)]
pub struct SubtitleSearchResult {
    /// File identifier used for the download request
    pub file_id: i64,

    /// Release name, for logging
    pub release: String,

    /// Language of the subtitle
    pub language: String,
}

/// A remote source of subtitles: quota queries, ranked search, and
/// download-and-parse of a single result.
#[async_trait]
pub trait SubtitleSource: Send + Sync {
    /// Query the current download quota
    async fn quota(&self) -> Result<QuotaInfo, ProviderError>;

    /// Search subtitles for a query string in the given language.
    /// Results are returned in the service's ranking order, best first.
    async fn search(
        &self,
        query: &str,
        language: &str,
    ) -> Result<Vec<SubtitleSearchResult>, ProviderError>;

    /// Download one search result and parse it into cues.
    /// Returns `None` when the downloaded payload contains nothing usable.
    async fn download(
        &self,
        result: &SubtitleSearchResult,
    ) -> Result<Option<Vec<SubtitleEntry>>, ProviderError>;
}

/// A remote translation service with automatic source-language detection
#[async_trait]
pub trait TranslationClient: Send + Sync {
    /// Translate `text` into `target_lang`, detecting the source language
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, ProviderError>;
}

pub mod google;
pub mod opensubtitles;
