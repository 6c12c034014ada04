/*!
 * Integration tests for detection, planning, orchestration and assembly
 */

use std::sync::Arc;
use std::sync::Mutex;

use phasewai::errors::TranslationError;
use phasewai::phase::{Phase, PhaseDetector};
use phasewai::providers::mock::MockBackend;
use phasewai::subtitle_processor::SrtCodec;
use phasewai::translation::{
    assemble, BatchPlanner, OrchestratorOptions, PlannerConfig, TranslationOrchestrator, TranslatedLine,
};
use crate::common;

fn planner(batch_size: usize, overlap: usize) -> BatchPlanner {
    BatchPlanner::new(PlannerConfig::new(batch_size, overlap).unwrap())
}

#[tokio::test]
async fn test_pipeline_withLessonFile_shouldLabelBatchesAndKeepEarlierOverlapText() {
    let records = SrtCodec::parse(common::LESSON_SRT);
    let detection = PhaseDetector::default().detect(&records);
    let batches = planner(4, 1).plan(&records, detection.boundary);
    let backend = Arc::new(MockBackend::tagged());
    let orchestrator = TranslationOrchestrator::new(backend.clone(), OrchestratorOptions::default());

    let map = orchestrator.run(&batches, "", |_, _| {}).await.unwrap();
    let result = assemble(&records, &map, detection);

    let phases: Vec<Phase> = batches.iter().map(|b| b.phase).collect();
    assert_eq!(phases, vec![Phase::Sketch, Phase::Transitioning, Phase::Paint]);
    assert_eq!(result.subtitles.len(), 10);
    assert_eq!(result.subtitles[3].text, "[b1] 轻轻地勾勒轮廓");
    assert_eq!(result.subtitles[6].text, "[b2] 先调一点胭脂");
    assert_eq!(result.subtitles[9].text, "[b3] 等它干透");
    assert_eq!(result.phase_summary, "Phase boundary near subtitle 6 (switching from sketch to paint)");

    let requests = backend.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].phase, Phase::Transitioning);
}

#[tokio::test]
async fn test_pipeline_withOmittedIndex_shouldFallBackToSourceText() {
    let records = SrtCodec::parse(common::LESSON_SRT);
    let detection = PhaseDetector::default().detect(&records);
    let batches = planner(35, 5).plan(&records, detection.boundary);
    let orchestrator = TranslationOrchestrator::new(Arc::new(MockBackend::omitting(vec![8])), OrchestratorOptions::default());

    let map = orchestrator.run(&batches, "", |_, _| {}).await.unwrap();
    let result = assemble(&records, &map, detection);

    assert_eq!(result.subtitles[7].text, "用毛笔蘸水");
    assert_eq!(result.subtitles[7].start, "00:00:15,500");
    assert_eq!(result.subtitles[8].text, "[b1] 趁湿晕染");
}

#[tokio::test]
async fn test_pipeline_withStrictCoverage_shouldNameMissingIndices() {
    let records = SrtCodec::parse(common::LESSON_SRT);
    let batches = planner(4, 1).plan(&records, 5);
    let options = OrchestratorOptions {
        strict_coverage: true,
        ..Default::default()
    };
    let orchestrator = TranslationOrchestrator::new(Arc::new(MockBackend::omitting(vec![9])), options);

    let error = orchestrator.run(&batches, "", |_, _| {}).await.unwrap_err();

    match error {
        TranslationError::MissingIndices { batch, indices } => {
            assert_eq!(batch, 2);
            assert_eq!(indices, vec![9]);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_pipeline_withOverlapCoveredLater_shouldPassStrictCoverage() {
    let records = SrtCodec::parse(common::LESSON_SRT);
    let batches = planner(4, 1).plan(&records, 5);
    // Batch 1 drops subtitle 4, which batch 2 repeats
    let backend = MockBackend::scripted(|request| {
        let lines: Vec<TranslatedLine> = request
            .records
            .iter()
            .filter(|r| !(request.position == 0 && r.index == 4))
            .map(|r| TranslatedLine {
                index: r.index,
                text: format!("EN{}", r.index),
            })
            .collect();
        serde_json::to_string(&lines).unwrap()
    });
    let options = OrchestratorOptions {
        strict_coverage: true,
        ..Default::default()
    };
    let orchestrator = TranslationOrchestrator::new(Arc::new(backend), options);

    let map = orchestrator.run(&batches, "", |_, _| {}).await.unwrap();

    assert_eq!(map.len(), 10);
    assert_eq!(map.get(4), Some("EN4"));
}

#[tokio::test]
async fn test_pipeline_withConcurrentBatches_shouldMatchSequentialOutput() {
    let texts: Vec<String> = (1..=50).map(|i| format!("第{}句", i)).collect();
    let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let records = common::records(&text_refs);
    let batches = planner(8, 3).plan(&records, 20);

    let sequential = TranslationOrchestrator::new(Arc::new(MockBackend::tagged()), OrchestratorOptions::default())
        .run(&batches, "", |_, _| {})
        .await
        .unwrap();

    let slow_first = MockBackend::tagged().with_delay_by_position(|position| 60u64.saturating_sub(6 * position as u64));
    let options = OrchestratorOptions {
        concurrent_batches: 5,
        ..Default::default()
    };
    let progress = Mutex::new(Vec::new());
    let concurrent = TranslationOrchestrator::new(Arc::new(slow_first), options)
        .run(&batches, "", |done, _| progress.lock().unwrap().push(done))
        .await
        .unwrap();

    for record in &records {
        assert_eq!(concurrent.get(record.index), sequential.get(record.index));
    }
    let progress = progress.into_inner().unwrap();
    assert_eq!(progress, (1..=batches.len()).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_pipeline_withFencedAnswer_shouldStillMerge() {
    let records = SrtCodec::parse(common::AMBIGUOUS_SRT);
    let detection = PhaseDetector::default().detect(&records);
    let batches = planner(35, 5).plan(&records, detection.boundary);
    let orchestrator = TranslationOrchestrator::new(Arc::new(MockBackend::fenced()), OrchestratorOptions::default());

    let map = orchestrator.run(&batches, "", |_, _| {}).await.unwrap();
    let result = assemble(&records, &map, detection);

    assert_eq!(batches[0].phase, Phase::Sketch);
    assert_eq!(result.subtitles[1].text, "[b1] 我们画这里");
    assert_eq!(result.flagged.len(), 1);
    assert!(result.review_log().contains("  [2] 00:00:02,500 --> 00:00:04,000 | 我们画这里 |"));
}

#[tokio::test]
async fn test_pipeline_withMalformedAnswer_shouldFailWithBatchNumber() {
    let records = SrtCodec::parse(common::LESSON_SRT);
    let batches = planner(35, 5).plan(&records, 5);
    let orchestrator = TranslationOrchestrator::new(Arc::new(MockBackend::malformed()), OrchestratorOptions::default());

    let error = orchestrator.run(&batches, "", |_, _| {}).await.unwrap_err();

    assert!(matches!(error, TranslationError::ResponseValidation { batch: 0, .. }));
    assert!(error.to_string().starts_with("Batch 1 returned an invalid response"));
}
