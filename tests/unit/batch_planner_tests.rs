/*!
 * Tests for batch planning across many sequence shapes
 */

use phasewai::app_config::BatchingConfig;
use phasewai::phase::Phase;
use phasewai::translation::{BatchPlanner, PlannerConfig};
use crate::common;

#[test]
fn test_plan_acrossShapes_shouldCoverEveryRecordContiguously() {
    for (batch_size, overlap) in [(1, 0), (3, 1), (5, 4), (35, 5), (10, 0)] {
        let planner = BatchPlanner::new(PlannerConfig::new(batch_size, overlap).unwrap());
        for len in [1, 2, 9, 34, 35, 36, 71] {
            let texts = vec!["字"; len];
            let records = common::records(&texts);
            let batches = planner.plan(&records, len / 2);

            assert_eq!(batches.first().map(|b| b.start), Some(0));
            assert_eq!(batches.last().map(|b| b.end), Some(len));
            for batch in &batches {
                assert!(!batch.is_empty());
                assert!(batch.len() <= batch_size);
            }
            for pair in batches.windows(2) {
                // Later batches never start before earlier ones and always repeat `overlap` records
                assert!(pair[1].start > pair[0].start);
                assert_eq!(pair[1].start, pair[0].end - overlap);
            }
            for (position, batch) in batches.iter().enumerate() {
                assert_eq!(batch.position, position);
            }
        }
    }
}

#[test]
fn test_plan_withBoundaryInsideBatch_shouldLabelItTransitioning() {
    let records = common::records(&vec!["字"; 20]);
    let planner = BatchPlanner::new(PlannerConfig::new(8, 2).unwrap());

    let phases: Vec<Phase> = planner.plan(&records, 10).iter().map(|b| b.phase).collect();

    // [0,8) [6,14) [12,20)
    assert_eq!(phases, vec![Phase::Sketch, Phase::Transitioning, Phase::Paint]);
}

#[test]
fn test_plan_withBoundaryAtEnds_shouldUseSinglePhase() {
    let records = common::records(&vec!["字"; 20]);
    let planner = BatchPlanner::new(PlannerConfig::new(8, 2).unwrap());

    assert!(planner.plan(&records, 0).iter().all(|b| b.phase == Phase::Paint));
    assert!(planner.plan(&records, 20).iter().all(|b| b.phase == Phase::Sketch));
}

#[test]
fn test_plannerConfig_fromBatchingConfig_shouldValidate() {
    let mut batching = BatchingConfig::default();
    assert_eq!(PlannerConfig::try_from(&batching).unwrap().batch_size(), 35);

    batching.overlap = batching.batch_size;
    assert!(PlannerConfig::try_from(&batching).is_err());
}
