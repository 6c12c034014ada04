/*!
 * Phase boundary detection.
 *
 * Three ordered passes over the whole caption sequence, first decisive pass wins:
 * 1. explicit transition phrase
 * 2. sliding-window weighted score
 * 3. density of painting context over the whole file
 *
 * Ambiguous-term flags are a side effect of the scoring scan and are reported
 * whichever of passes 2 and 3 fixes the boundary.
 */

use log::debug;

use crate::subtitle_processor::{CaptionRecord, FlaggedRecord};

use super::signals::{SignalTable, SignalWeights};

/// Review reason attached to records holding only an ambiguous term
pub const AMBIGUOUS_REASON: &str = "ambiguous term without clear phase context";

// Float slack when comparing window sums against the threshold
const SCORE_EPSILON: f64 = 1e-9;

/// Immutable detector settings
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Number of consecutive records summed per window
    pub window_size: usize,

    /// Window sum at which painting is judged to have started
    pub threshold: f64,

    /// Share of painting-context records above which the whole file is painting
    pub density_threshold: f64,

    /// Terms and weights
    pub signals: SignalTable,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_size: 8,
            threshold: 3.0,
            density_threshold: 0.3,
            signals: SignalTable::builtin(&SignalWeights::default()),
        }
    }
}

impl DetectorConfig {
    /// Replace the signal table
    pub fn with_signals(mut self, signals: SignalTable) -> Self {
        self.signals = signals;
        self
    }

    /// Set the window size and threshold
    pub fn with_window(mut self, window_size: usize, threshold: f64) -> Self {
        self.window_size = window_size;
        self.threshold = threshold;
        self
    }
}

/// Which pass fixed the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionPass {
    ExplicitPhrase,
    WindowScore,
    Density,
}

/// Output of a detection run
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseDetection {
    /// First position judged to be painting, in `[0, n]`
    pub boundary: usize,

    /// Records needing review, in sequence order
    pub flagged: Vec<FlaggedRecord>,

    /// Pass that decided the boundary
    pub decided_by: DetectionPass,
}

/// Human-facing reading of a boundary value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseBoundary {
    /// Boundary at 0: everything is painting
    EntirelyPost,
    /// Boundary at n: everything is sketching
    EntirelyPre,
    /// Painting starts at `position`, the record with `index`
    Near { position: usize, index: usize },
}

impl PhaseBoundary {
    /// Interpret a boundary position against the sequence it was computed for
    pub fn from_position(boundary: usize, records: &[CaptionRecord]) -> Self {
        if boundary == 0 {
            Self::EntirelyPost
        } else if boundary >= records.len() {
            Self::EntirelyPre
        } else {
            Self::Near {
                position: boundary,
                index: records[boundary].index,
            }
        }
    }

    /// One-sentence summary for logs and the review file
    pub fn summary(&self) -> String {
        match self {
            Self::EntirelyPost => "Entire file is post-transition (paint phase)".to_string(),
            Self::EntirelyPre => "Entire file is pre-transition (sketch phase)".to_string(),
            Self::Near { index, .. } => {
                format!("Phase boundary near subtitle {} (switching from sketch to paint)", index)
            }
        }
    }
}

/// Phase boundary detector
#[derive(Debug, Clone, Default)]
pub struct PhaseDetector {
    config: DetectorConfig,
}

impl PhaseDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Locate the sketch-to-paint boundary and collect ambiguous records.
    ///
    /// Total over any input: the empty sequence yields boundary 0 and no flags.
    pub fn detect(&self, records: &[CaptionRecord]) -> PhaseDetection {
        let signals = &self.config.signals;

        // Pass 1: an explicit phrase decides on its own
        if let Some(position) = records.iter().position(|r| signals.matches_explicit_transition(&r.text)) {
            debug!("Explicit transition phrase at position {} (subtitle {})", position, records[position].index);
            return PhaseDetection {
                boundary: position,
                flagged: Vec::new(),
                decided_by: DetectionPass::ExplicitPhrase,
            };
        }

        // Pass 2: per-record scores, flagging as we go
        let mut scores = Vec::with_capacity(records.len());
        let mut flagged = Vec::new();
        let mut density_records = 0usize;

        for record in records {
            let evaluation = signals.evaluate(&record.text);
            if evaluation.is_ambiguous_only() {
                flagged.push(FlaggedRecord::from_record(record, AMBIGUOUS_REASON));
            }
            if evaluation.density_hits > 0 {
                density_records += 1;
            }
            scores.push(evaluation.score);
        }

        if let Some(position) = self.first_window_over_threshold(&scores) {
            debug!("Window score reached threshold at position {}", position);
            return PhaseDetection {
                boundary: position,
                flagged,
                decided_by: DetectionPass::WindowScore,
            };
        }

        // Pass 3: density fallback
        let boundary = if !records.is_empty()
            && density_records as f64 > records.len() as f64 * self.config.density_threshold
        {
            0
        } else {
            records.len()
        };
        debug!(
            "No scoring window reached threshold; {} of {} records carry strong painting terms, boundary {}",
            density_records,
            records.len(),
            boundary
        );

        PhaseDetection {
            boundary,
            flagged,
            decided_by: DetectionPass::Density,
        }
    }

    /// Start of the first window whose summed score reaches the threshold
    fn first_window_over_threshold(&self, scores: &[f64]) -> Option<usize> {
        let window = self.config.window_size.max(1);
        if scores.len() < window {
            return None;
        }

        (0..=scores.len() - window).find(|&start| {
            let sum: f64 = scores[start..start + window].iter().sum();
            sum + SCORE_EPSILON >= self.config.threshold
        })
    }
}
