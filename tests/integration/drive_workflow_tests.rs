/*!
 * Integration tests for the drive workflow with a local work directory
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;

use phasewai::app_controller::Controller;
use phasewai::drive_sync::{DriveLayout, DriveOptions, DriveSync};
use phasewai::providers::mock::MockBackend;
use crate::common;

fn local_options() -> DriveOptions {
    DriveOptions {
        skip_sync: true,
        ..DriveOptions::default()
    }
}

#[tokio::test]
async fn test_run_withNewFile_shouldTranslateMarkAndSkipItNextTime() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let layout = DriveLayout::new("gdrive", "Lessons", temp_dir.path());
    common::create_test_file(&layout.input_dir(), "lesson.srt", common::LESSON_SRT)?;
    let sync = DriveSync::new(layout.clone());
    let controller = Controller::with_backend(common::local_config(4, 1), Arc::new(MockBackend::tagged()));

    let report = sync.run(&local_options(), Some(&controller)).await?;

    assert_eq!(report.selected.len(), 1);
    assert_eq!(report.translated.len(), 1);
    assert!(report.failed.is_empty());
    assert!(layout.output_dir().join("lesson_en.srt").exists());
    let review_log = fs::read_to_string(layout.output_dir().join("lesson_review.log"))?;
    assert!(review_log.contains("Phase boundary near subtitle 6"));
    let marker = fs::read_to_string(layout.marker_dir().join("lesson.srt.done"))?;
    assert_eq!(marker, "Processed: lesson.srt\n");

    let second = sync.run(&local_options(), Some(&controller)).await?;
    assert!(second.selected.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_run_withFailingBackend_shouldLeaveFileUnmarked() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let layout = DriveLayout::new("gdrive", "Lessons", temp_dir.path());
    let input = common::create_test_file(&layout.input_dir(), "lesson.srt", common::LESSON_SRT)?;
    let sync = DriveSync::new(layout.clone());
    let controller = Controller::with_backend(common::local_config(4, 1), Arc::new(MockBackend::failing()));

    let report = sync.run(&local_options(), Some(&controller)).await?;

    assert_eq!(report.failed, vec![input]);
    assert!(report.translated.is_empty());
    assert!(!layout.marker_dir().join("lesson.srt.done").exists());
    assert_eq!(sync.pending_files()?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_run_withDryRun_shouldOnlyList() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let layout = DriveLayout::new("gdrive", "Lessons", temp_dir.path());
    common::create_test_file(&layout.input_dir(), "lesson.srt", common::LESSON_SRT)?;
    let sync = DriveSync::new(layout.clone());
    let options = DriveOptions {
        dry_run: true,
        ..local_options()
    };

    let report = sync.run(&options, None).await?;

    assert_eq!(report.selected.len(), 1);
    assert!(report.translated.is_empty());
    assert!(!layout.output_dir().exists());
    Ok(())
}

#[tokio::test]
async fn test_run_withReprocess_shouldTranslateProcessedFileAgain() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let layout = DriveLayout::new("gdrive", "Lessons", temp_dir.path());
    common::create_test_file(&layout.input_dir(), "lesson.srt", common::LESSON_SRT)?;
    common::create_test_file(&layout.input_dir(), "other.srt", common::AMBIGUOUS_SRT)?;
    let sync = DriveSync::new(layout.clone());
    let controller = Controller::with_backend(common::local_config(4, 1), Arc::new(MockBackend::tagged()));
    sync.run(&local_options(), Some(&controller)).await?;

    let options = DriveOptions {
        reprocess: Some("lesson.srt".to_string()),
        ..local_options()
    };
    let report = sync.run(&options, Some(&controller)).await?;

    assert_eq!(report.translated, vec![layout.input_dir().join("lesson.srt")]);
    assert!(layout.marker_dir().join("lesson.srt.done").exists());
    Ok(())
}

#[tokio::test]
async fn test_run_withMissingRclone_shouldSuggestSkipSync() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let sync = DriveSync::new(DriveLayout::new("gdrive", "Lessons", temp_dir.path()))
        .with_rclone("phasewai-no-such-rclone");

    let error = sync.run(&DriveOptions::default(), None).await.unwrap_err();

    assert!(format!("{:#}", error).contains("--skip-sync"));
    Ok(())
}
