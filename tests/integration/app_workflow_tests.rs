/*!
 * Integration tests for the file and folder workflow of the controller
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;

use phasewai::app_controller::Controller;
use phasewai::providers::mock::MockBackend;
use phasewai::subtitle_processor::SrtCodec;
use crate::common;

fn mock_controller(backend: MockBackend) -> Controller {
    Controller::with_backend(common::local_config(4, 1), Arc::new(backend))
}

#[tokio::test]
async fn test_run_withSingleFile_shouldWriteTranslationNextToInput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "lesson.srt", common::LESSON_SRT)?;
    let backend = Arc::new(MockBackend::tagged());
    let controller = Controller::with_backend(common::local_config(4, 1), backend.clone());

    let summary = controller.run(&input, None, None, None).await?;

    let output = temp_dir.path().join("lesson_en.srt");
    assert_eq!(summary.outputs, vec![output.clone()]);
    assert_eq!(summary.flagged, 0);

    let translated = SrtCodec::read_file(&output)?;
    assert_eq!(translated.len(), 10);
    assert_eq!(translated[3].text, "[b1] 轻轻地勾勒轮廓");
    assert_eq!(translated[6].text, "[b2] 先调一点胭脂");
    assert_eq!(translated[9].end, "00:00:21,000");
    assert_eq!(backend.requests().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_run_withGlossary_shouldPassItToEveryBatch() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "lesson.srt", common::LESSON_SRT)?;
    let glossary = common::create_test_file(
        temp_dir.path(),
        "glossary.csv",
        "Chinese,English,Category,Notes\n胭脂,carmine,Pigments,\n",
    )?;
    let backend = Arc::new(MockBackend::tagged());
    let controller = Controller::with_backend(common::local_config(4, 1), backend.clone());

    controller.run(&input, None, Some(&glossary), None).await?;

    let requests = backend.requests();
    assert!(!requests.is_empty());
    assert!(requests.iter().all(|r| r.glossary_text.contains("- 胭脂 -> carmine")));
    Ok(())
}

#[tokio::test]
async fn test_run_withMissingGlossary_shouldFailBeforeTranslating() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "lesson.srt", common::LESSON_SRT)?;
    let backend = Arc::new(MockBackend::tagged());
    let controller = Controller::with_backend(common::local_config(4, 1), backend.clone());

    let result = controller
        .run(&input, None, Some(&temp_dir.path().join("missing.csv")), None)
        .await;

    assert!(result.is_err());
    assert!(backend.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_run_withAmbiguousFile_shouldWriteReviewLog() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "peony.srt", common::AMBIGUOUS_SRT)?;
    let output = temp_dir.path().join("out").join("peony_final.srt");
    let review_log = temp_dir.path().join("review.log");

    let summary = mock_controller(MockBackend::tagged())
        .run(&input, Some(&output), None, Some(&review_log))
        .await?;

    assert_eq!(summary.flagged, 1);
    assert!(output.exists());
    let log = fs::read_to_string(&review_log)?;
    assert!(log.starts_with("Phase detection: Entire file is pre-transition (sketch phase)"));
    assert!(log.contains("Flagged subtitles (1)"));
    assert!(log.contains("我们画这里"));
    Ok(())
}

#[tokio::test]
async fn test_run_withFolder_shouldTranslateEveryFileAndSectionTheReviewLog() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().join("input");
    common::create_test_file(&input_dir, "b.srt", common::AMBIGUOUS_SRT)?;
    common::create_test_file(&input_dir, "a.srt", common::LESSON_SRT)?;
    common::create_test_file(&input_dir, "notes.txt", "not a caption file")?;
    let output_dir = temp_dir.path().join("output");
    let review_log = temp_dir.path().join("review.log");

    let summary = mock_controller(MockBackend::tagged())
        .run(&input_dir, Some(&output_dir), None, Some(&review_log))
        .await?;

    assert_eq!(summary.outputs, vec![output_dir.join("a_en.srt"), output_dir.join("b_en.srt")]);
    assert_eq!(summary.flagged, 1);

    let log = fs::read_to_string(&review_log)?;
    let first = log.find("--- a.srt ---").unwrap();
    let second = log.find("--- b.srt ---").unwrap();
    assert!(first < second);
    assert!(log.contains("No subtitles flagged for review."));
    Ok(())
}

#[tokio::test]
async fn test_run_withFolderAndFailingFile_shouldTranslateTheRestAndFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().join("input");
    common::create_test_file(&input_dir, "a.srt", common::LESSON_SRT)?;
    common::create_test_file(&input_dir, "b.srt", common::AMBIGUOUS_SRT)?;
    let output_dir = temp_dir.path().join("output");
    // Only the ambiguous lesson mentions 结束
    let backend = MockBackend::scripted(|request| {
        if request.records.iter().any(|r| r.text == "结束") {
            "no JSON here".to_string()
        } else {
            let lines: Vec<String> = request
                .records
                .iter()
                .map(|r| format!("{{\"index\": {}, \"text\": \"EN{}\"}}", r.index, r.index))
                .collect();
            format!("[{}]", lines.join(","))
        }
    });

    let result = mock_controller(backend).run(&input_dir, Some(&output_dir), None, None).await;

    let error = result.unwrap_err();
    assert!(error.to_string().contains("1 of 2 file(s) failed"));
    assert!(output_dir.join("a_en.srt").exists());
    assert!(!output_dir.join("b_en.srt").exists());
    Ok(())
}

#[tokio::test]
async fn test_run_withStrictCoverageAndOmission_shouldFailWithoutOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "lesson.srt", common::LESSON_SRT)?;
    let mut config = common::local_config(4, 1);
    config.batching.strict_coverage = true;
    let controller = Controller::with_backend(config, Arc::new(MockBackend::omitting(vec![10])));

    let result = controller.run(&input, None, None, None).await;

    let error = result.unwrap_err();
    assert!(format!("{:#}", error).contains("Batch 3 left subtitles untranslated: [10]"));
    assert!(!temp_dir.path().join("lesson_en.srt").exists());
    Ok(())
}

#[tokio::test]
async fn test_run_withEmptyFolder_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    let result = mock_controller(MockBackend::tagged()).run(temp_dir.path(), None, None, None).await;

    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_testConnection_withMockBackend_shouldPass() {
    let controller = mock_controller(MockBackend::failing());

    let result = tokio_test::block_on(async { controller.test_connection().await });

    assert!(result.is_ok());
    assert_eq!(controller.target_code(), "en");
}
