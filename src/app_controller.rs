use std::fmt;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};

use crate::app_config::{METADATA_EXTENSIONS, RunConfig, VIDEO_EXTENSIONS};
use crate::file_utils::FileManager;
use crate::language_utils::LanguageDetector;
use crate::nfo_processor;
use crate::providers::{QuotaInfo, SubtitleSource, TranslationClient};
use crate::subtitle_processor::SubtitleCollection;

// @module: Pipeline drivers for both batch runs

/// Why a file was skipped without an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A sidecar subtitle file already exists next to the video
    SidecarExists,
    /// The search returned no results
    NoResults,
    /// The downloaded payload contained nothing usable
    UnusableDownload,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SkipReason::SidecarExists => write!(f, "subtitle already exists"),
            SkipReason::NoResults => write!(f, "no subtitles found"),
            SkipReason::UnusableDownload => write!(f, "downloaded subtitle was unusable"),
        }
    }
}

/// Outcome of processing one file. Per-file failures are values, not
/// errors: the walk driver records them and moves on to the next file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file was processed and its output written
    Processed,
    /// Processing was unnecessary or produced nothing to write
    Skipped(SkipReason),
    /// Processing failed; the run continues with the next file
    Failed(String),
}

/// Aggregated result of one pipeline run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Set when the run stopped early because the download quota was
    /// exhausted. This is a clean stop, not an error.
    pub quota_stop: Option<ChronoDuration>,
}

impl RunSummary {
    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Processed => self.processed += 1,
            FileOutcome::Skipped(_) => self.skipped += 1,
            FileOutcome::Failed(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} processed, {} skipped, {} errors",
            self.processed, self.skipped, self.failed
        )
    }
}

/// Evaluate the quota gate: `Some(wait)` when the quota is exhausted and the
/// service reported a reset time, `None` when the run may proceed.
///
/// The wait is floored at zero for reset times already in the past.
pub fn quota_wait(quota: &QuotaInfo, now: DateTime<Utc>) -> Option<ChronoDuration> {
    if quota.remaining > 0 {
        return None;
    }
    let reset = quota.reset_time_utc?;
    Some((reset - now).max(ChronoDuration::zero()))
}

/// Format a wait duration the way the quota log line reports it
pub fn format_wait(wait: ChronoDuration) -> String {
    let total_seconds = wait.num_seconds().max(0);
    format!("{}h {}m", total_seconds / 3600, (total_seconds % 3600) / 60)
}

/// Driver for both pipeline runs
pub struct Controller {
    // @field: Run configuration
    config: RunConfig,
}

impl Controller {
    // @method: Create a new controller with a validated configuration
    pub fn with_config(config: RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the subtitle pipeline: walk the root for video files, skip those
    /// with an existing sidecar, and fetch subtitles one file at a time.
    ///
    /// A quota-query failure aborts the whole run; quota exhaustion ends it
    /// cleanly with the wait recorded in the summary. A single file's
    /// failure never stops the run.
    pub async fn run_subtitles(&self, source: &dyn SubtitleSource) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mut summary = RunSummary::default();

        let video_files =
            FileManager::find_files_with_extensions(&self.config.root, VIDEO_EXTENSIONS);

        if video_files.is_empty() {
            warn!("No video files found in directory: {}", self.config.root.display());
            return Ok(summary);
        }

        let progress = folder_progress_bar(video_files.len());

        for video_file in &video_files {
            let file_name = video_file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            progress.set_message(format!("Processing: {}", file_name));

            // Skip policy: sidecar exists, no network call at all
            let sidecar = FileManager::sidecar_path(video_file, "srt");
            if FileManager::file_exists(&sidecar) {
                info!("Subtitle already exists: {}, skipping...", file_name);
                summary.record(&FileOutcome::Skipped(SkipReason::SidecarExists));
                progress.inc(1);
                continue;
            }

            // Quota gate: a failed query is fatal for the whole run
            let quota = source
                .quota()
                .await
                .context("Failed to retrieve quota info")?;
            info!("Remaining quota: {}/{}", quota.remaining, quota.total);

            if let Some(wait) = quota_wait(&quota, Utc::now()) {
                info!("Quota exhausted! Waiting {}...", format_wait(wait));
                summary.quota_stop = Some(wait);
                break;
            }

            let outcome = self.fetch_subtitle(source, video_file).await;
            if let FileOutcome::Failed(reason) = &outcome {
                error!("Error downloading subtitle for {}: {}", file_name, reason);
            }
            summary.record(&outcome);
            progress.inc(1);
        }

        progress.finish_and_clear();
        info!(
            "Subtitle run completed: {} - Duration: {}",
            summary,
            format_duration(start_time.elapsed())
        );

        Ok(summary)
    }

    /// Fetch and write the sidecar subtitle for one video file
    async fn fetch_subtitle(&self, source: &dyn SubtitleSource, video_file: &Path) -> FileOutcome {
        let stem = video_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        info!("Searching subtitles for: {}", stem);

        let results = match source.search(&stem, &self.config.language).await {
            Ok(results) => results,
            Err(e) => return FileOutcome::Failed(format!("Search failed: {}", e)),
        };

        // Trust the service's ranking: first result only
        let Some(best) = results.first() else {
            info!("No subtitles found for {}", stem);
            return FileOutcome::Skipped(SkipReason::NoResults);
        };

        let entries = match source.download(best).await {
            Ok(Some(entries)) => entries,
            Ok(None) => {
                info!("Error parsing subtitles for {}", stem);
                return FileOutcome::Skipped(SkipReason::UnusableDownload);
            }
            Err(e) => return FileOutcome::Failed(format!("Download failed: {}", e)),
        };

        let sidecar = FileManager::sidecar_path(video_file, "srt");
        let mut collection =
            SubtitleCollection::new(video_file.to_path_buf(), self.config.language.clone());
        collection.entries = entries;

        match collection.write_to_srt(&sidecar) {
            Ok(()) => {
                info!("Subtitle saved: {}", sidecar.display());
                FileOutcome::Processed
            }
            Err(e) => FileOutcome::Failed(format!("Write failed: {}", e)),
        }
    }

    /// Run the translation pipeline: walk the root for NFO/XML files and
    /// translate the allow-set fields of each into the target language.
    ///
    /// There is deliberately no skip policy here; idempotence comes from the
    /// per-field language check inside the field translator.
    pub async fn run_translate(
        &self,
        translator: &dyn TranslationClient,
        detector: &dyn LanguageDetector,
    ) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mut summary = RunSummary::default();

        let metadata_files =
            FileManager::find_files_with_extensions(&self.config.root, METADATA_EXTENSIONS);

        if metadata_files.is_empty() {
            warn!(
                "No metadata files found in directory: {}",
                self.config.root.display()
            );
            return Ok(summary);
        }

        let progress = folder_progress_bar(metadata_files.len());

        for metadata_file in &metadata_files {
            let file_name = metadata_file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            progress.set_message(format!("Processing: {}", file_name));
            info!("Processing file: {}", file_name);

            let outcome = match nfo_processor::process_file(
                metadata_file,
                translator,
                detector,
                &self.config.language,
            )
            .await
            {
                Ok(()) => FileOutcome::Processed,
                Err(e) => {
                    error!("Error processing {}: {}", file_name, e);
                    FileOutcome::Failed(e.to_string())
                }
            };

            summary.record(&outcome);
            progress.inc(1);
        }

        progress.finish_and_clear();
        info!(
            "Translation run completed: {} - Duration: {}",
            summary,
            format_duration(start_time.elapsed())
        );

        Ok(summary)
    }
}

/// Progress bar over the files of one folder run
fn folder_progress_bar(len: usize) -> ProgressBar {
    let progress = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress.set_style(style);
    progress
}

// Format duration in a human-readable format
fn format_duration(duration: std::time::Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, duration.subsec_millis())
    }
}
