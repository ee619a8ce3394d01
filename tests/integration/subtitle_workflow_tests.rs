/*!
 * End-to-end tests for the subtitle pipeline against a scripted source
 */

use std::fs;

use anyhow::Result;
use chrono::{Duration, Utc};
use subnfo::app_config::RunConfig;
use subnfo::app_controller::Controller;
use subnfo::providers::QuotaInfo;
use subnfo::subtitle_processor::SubtitleEntry;

use crate::common;
use crate::common::mock_providers::MockSubtitleSource;

fn test_cues() -> Vec<SubtitleEntry> {
    vec![
        SubtitleEntry::new(1, 1000, 2000, "First line".to_string()),
        SubtitleEntry::new(2, 3000, 4000, "Second line".to_string()),
        SubtitleEntry::new(3, 5000, 6000, "Third line".to_string()),
    ]
}

fn controller_for(root: &std::path::Path) -> Result<Controller> {
    Controller::with_config(RunConfig::new(root.to_path_buf(), "en".to_string()))
}

/// Test the happy path: one video in, one sidecar out
#[tokio::test]
async fn test_run_subtitles_withVideoFile_shouldWriteSidecar() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "movie.mkv", "fake video")?;

    let source = MockSubtitleSource::with_cues(test_cues());
    let controller = controller_for(temp_dir.path())?;

    let summary = controller.run_subtitles(&source).await?;

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.failed, 0);

    let sidecar = temp_dir.path().join("movie.srt");
    let content = fs::read_to_string(&sidecar)?;
    let blocks: Vec<&str> = content.split("\n\n").filter(|b| !b.is_empty()).collect();
    assert_eq!(blocks.len(), 3);
    assert!(blocks[0].starts_with("1\n00:00:01,000 --> 00:00:02,000\nFirst line"));

    Ok(())
}

/// Test that the search query is the video file stem
#[tokio::test]
async fn test_run_subtitles_withVideoFile_shouldSearchByFileStem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "Some.Movie.2023.mkv", "fake video")?;

    let source = MockSubtitleSource::with_cues(test_cues());
    let controller = controller_for(temp_dir.path())?;

    controller.run_subtitles(&source).await?;

    assert_eq!(source.recorded_searches(), vec!["Some.Movie.2023".to_string()]);

    Ok(())
}

/// Test the skip policy: an existing sidecar means no network call at all
#[tokio::test]
async fn test_run_subtitles_withExistingSidecar_shouldSkipWithoutSearching() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "movie.mkv", "fake video")?;
    common::create_test_subtitle(temp_dir.path(), "movie.srt")?;

    let source = MockSubtitleSource::with_cues(test_cues());
    let controller = controller_for(temp_dir.path())?;

    let summary = controller.run_subtitles(&source).await?;

    assert_eq!(summary.processed, 0);
    assert_eq!(summary.skipped, 1);
    assert!(source.recorded_searches().is_empty());
    assert_eq!(source.recorded_downloads(), 0);

    Ok(())
}

/// Test that an exhausted quota ends the run cleanly before any download
#[tokio::test]
async fn test_run_subtitles_withExhaustedQuota_shouldStopCleanly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "first.mkv", "fake video")?;
    common::create_test_file(temp_dir.path(), "second.mkv", "fake video")?;

    let mut source = MockSubtitleSource::with_cues(test_cues());
    source.quota = QuotaInfo {
        remaining: 0,
        total: 100,
        reset_time_utc: Some(Utc::now() + Duration::hours(3)),
    };
    let controller = controller_for(temp_dir.path())?;

    let summary = controller.run_subtitles(&source).await?;

    assert_eq!(summary.processed, 0);
    assert!(summary.quota_stop.is_some());
    assert_eq!(source.recorded_downloads(), 0);

    Ok(())
}

/// Test that a failed quota query aborts the whole run
#[tokio::test]
async fn test_run_subtitles_withQuotaQueryFailure_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "movie.mkv", "fake video")?;

    let mut source = MockSubtitleSource::new();
    source.quota_fails = true;
    let controller = controller_for(temp_dir.path())?;

    let result = controller.run_subtitles(&source).await;

    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Failed to retrieve quota info"));

    Ok(())
}

/// Test that files with no search results are skipped and the run continues
#[tokio::test]
async fn test_run_subtitles_withNoResults_shouldSkipAndContinue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "first.mkv", "fake video")?;
    common::create_test_file(temp_dir.path(), "second.mkv", "fake video")?;

    let source = MockSubtitleSource::new();
    let controller = controller_for(temp_dir.path())?;

    let summary = controller.run_subtitles(&source).await?;

    assert_eq!(summary.processed, 0);
    assert_eq!(summary.skipped, 2);
    assert_eq!(source.recorded_searches().len(), 2);
    assert!(!temp_dir.path().join("first.srt").exists());

    Ok(())
}

/// Test that an unusable download is a skip, not an error
#[tokio::test]
async fn test_run_subtitles_withUnusableDownload_shouldSkip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "movie.mkv", "fake video")?;

    let mut source = MockSubtitleSource::with_cues(test_cues());
    source.payload = None;
    let controller = controller_for(temp_dir.path())?;

    let summary = controller.run_subtitles(&source).await?;

    assert_eq!(summary.processed, 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);
    assert!(!temp_dir.path().join("movie.srt").exists());

    Ok(())
}

/// Test that an empty directory yields an empty summary
#[tokio::test]
async fn test_run_subtitles_withEmptyDirectory_shouldDoNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let source = MockSubtitleSource::new();
    let controller = controller_for(temp_dir.path())?;

    let summary = controller.run_subtitles(&source).await?;

    assert_eq!(summary.processed + summary.skipped + summary.failed, 0);
    assert!(source.recorded_searches().is_empty());

    Ok(())
}
