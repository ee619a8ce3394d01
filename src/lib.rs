/*!
 * # subnfo - Subtitle fetching and NFO translation for media libraries
 *
 * A Rust library and CLI for two batch jobs over a media directory tree:
 *
 * - Fetch missing subtitles for video files from OpenSubtitles, written as
 *   `.srt` sidecar files next to each video
 * - Translate the text fields of NFO/XML metadata files into a target
 *   language, with per-field language detection so content already in the
 *   target language is left alone
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Run configuration and credential resolution
 * - `app_controller`: Directory-walk drivers for both pipelines
 * - `subtitle_processor`: SRT cue parsing and sidecar serialization
 * - `nfo_processor`: Metadata sanitizing and field translation
 * - `providers`: Clients for the remote services:
 *   - `providers::opensubtitles`: OpenSubtitles REST API client
 *   - `providers::google`: Google translate client
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities and language detection
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod nfo_processor;
pub mod providers;
pub mod subtitle_processor;

// Re-export main types for easier usage
pub use app_config::{Credentials, RunConfig};
pub use app_controller::{Controller, FileOutcome, RunSummary, SkipReason};
pub use errors::{MetadataError, ProviderError};
pub use language_utils::{LanguageDetector, StatisticalDetector, language_codes_match};
pub use providers::{QuotaInfo, SubtitleSource, TranslationClient};
pub use subtitle_processor::{SubtitleCollection, SubtitleEntry};
