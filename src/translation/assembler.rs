/*!
 * Output assembly and the human review log.
 */

use crate::phase::PhaseDetection;
use crate::phase::PhaseBoundary;
use crate::subtitle_processor::{CaptionRecord, FlaggedRecord};
use crate::translation::map::TranslationMap;

/// Outcome of translating one caption sequence
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    /// Same length, indices and timestamps as the input
    pub subtitles: Vec<CaptionRecord>,
    /// Records the detector could not place on either side of the boundary
    pub flagged: Vec<FlaggedRecord>,
    /// One of the three boundary sentences
    pub phase_summary: String,
}

impl TranslationResult {
    /// Review log for this result
    pub fn review_log(&self) -> String {
        format_review_log(&self.flagged, &self.phase_summary)
    }
}

/// Rebuild the sequence with translated text, falling back to the source text
pub fn assemble(records: &[CaptionRecord], map: &TranslationMap, detection: PhaseDetection) -> TranslationResult {
    let subtitles = records
        .iter()
        .map(|record| match map.get(record.index) {
            Some(text) => record.with_text(text),
            None => record.clone(),
        })
        .collect();

    TranslationResult {
        subtitles,
        flagged: detection.flagged,
        phase_summary: PhaseBoundary::from_position(detection.boundary, records).summary(),
    }
}

/// Render the review log text
pub fn format_review_log(flagged: &[FlaggedRecord], phase_summary: &str) -> String {
    let mut lines = vec![format!("Phase detection: {}", phase_summary), String::new()];

    if flagged.is_empty() {
        lines.push("No subtitles flagged for review.".to_string());
    } else {
        lines.push(format!(
            "Flagged subtitles ({}) - ambiguous sketch/paint context, please verify:",
            flagged.len()
        ));
        lines.push(String::new());
        lines.extend(flagged.iter().map(FlaggedRecord::review_line));
    }

    lines.push(String::new());
    lines.join("\n")
}
