/*!
 * Tests for phase boundary detection through the public API
 */

use phasewai::phase::{DetectionPass, DetectorConfig, PhaseBoundary, PhaseDetector, SignalCategory, SignalPattern, SignalTable};
use phasewai::subtitle_processor::SrtCodec;
use crate::common;

#[test]
fn test_detect_withLessonTransitionPhrase_shouldStartPaintingThere() {
    let records = SrtCodec::parse(common::LESSON_SRT);

    let detection = PhaseDetector::default().detect(&records);

    assert_eq!(detection.boundary, 5);
    assert_eq!(detection.decided_by, DetectionPass::ExplicitPhrase);
    assert_eq!(
        PhaseBoundary::from_position(detection.boundary, &records).summary(),
        "Phase boundary near subtitle 6 (switching from sketch to paint)"
    );
}

#[test]
fn test_detect_withAmbiguousLesson_shouldFlagTheBareVerb() {
    let records = SrtCodec::parse(common::AMBIGUOUS_SRT);

    let detection = PhaseDetector::default().detect(&records);

    assert_eq!(detection.boundary, records.len());
    assert_eq!(detection.flagged.len(), 1);
    assert_eq!(detection.flagged[0].index, 2);
    assert_eq!(detection.flagged[0].text, "我们画这里");
}

#[test]
fn test_detect_withNounUsesOfHua_shouldNotFlag() {
    let records = common::records(&["准备好画纸", "画面要干净", "画板放平"]);

    let detection = PhaseDetector::default().detect(&records);

    assert!(detection.flagged.is_empty());
}

#[test]
fn test_detect_shouldBeDeterministic() {
    let mut texts = vec!["用铅笔画轮廓"; 12];
    texts.extend(vec!["群青加一点水，湿画"; 12]);
    let records = common::records(&texts);
    let detector = PhaseDetector::default();

    let first = detector.detect(&records);
    let second = detector.detect(&records);

    assert_eq!(first, second);
}

#[test]
fn test_detect_withReplacedTable_shouldFollowNewTerms() {
    let table = SignalTable::new(vec![
        SignalPattern::new("(?i)time to paint", SignalCategory::ExplicitTransition, 0.0).unwrap(),
        SignalPattern::new("(?i)pencil", SignalCategory::PreOnly, 1.0).unwrap(),
    ]);
    let detector = PhaseDetector::new(DetectorConfig::default().with_signals(table));
    let records = common::records(&["Grab a pencil", "Light pencil lines", "Time to paint!", "Add water"]);

    let detection = detector.detect(&records);

    assert_eq!(detection.boundary, 2);
    assert_eq!(detection.decided_by, DetectionPass::ExplicitPhrase);
}

#[test]
fn test_detect_withSketchChatterAboutErasing_shouldSummarizeAsPreTransition() {
    let records = common::records(&[
        "用橡皮擦干净",
        "先画一个圆",
        "你们在干嘛",
        "先画一个圆",
        "用橡皮擦干净",
        "先画一个圆",
        "用橡皮擦干净",
        "先画一个圆",
        "用橡皮擦干净",
        "先画一个圆",
    ]);

    let detection = PhaseDetector::default().detect(&records);

    assert_eq!(detection.boundary, records.len());
    assert_eq!(detection.decided_by, DetectionPass::Density);
    assert_eq!(
        PhaseBoundary::from_position(detection.boundary, &records).summary(),
        "Entire file is pre-transition (sketch phase)"
    );
}

#[test]
fn test_detect_withExtraDensityRow_shouldFollowConfiguredMarker() {
    let mut table = SignalTable::default();
    table.push(SignalPattern::new("吹风机", SignalCategory::PostContext, 0.0).unwrap());
    let detector = PhaseDetector::new(DetectorConfig::default().with_signals(table));
    let records = common::records(&["拿吹风机", "拿吹风机", "结束"]);

    let detection = detector.detect(&records);

    assert_eq!(detection.boundary, 0);
}
