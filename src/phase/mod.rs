/*!
 * Working-phase tracking for lesson captions.
 *
 * Watercolor lessons start with a pencil sketch and move on to painting. Some
 * source terms translate differently on either side of that switch, so the
 * pipeline locates it once per file before any translation happens.
 *
 * - `signals`: data-driven table of phase terms
 * - `detector`: boundary detection and ambiguous-term flagging
 */

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod detector;
pub mod signals;

pub use detector::{DetectionPass, DetectorConfig, PhaseBoundary, PhaseDetection, PhaseDetector, AMBIGUOUS_REASON};
pub use signals::{RecordSignals, SignalCategory, SignalPattern, SignalTable, SignalWeights};

/// Phase label attached to a translation batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Pencil work before any color
    Sketch,
    /// Color work
    Paint,
    /// The batch spans the boundary
    Transitioning,
}

impl Phase {
    /// Heading used in translation prompts
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Self::Sketch => "SKETCH",
            Self::Paint => "PAINT",
            Self::Transitioning => "SKETCH TRANSITIONING TO PAINT",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sketch => "sketch",
            Self::Paint => "paint",
            Self::Transitioning => "transitioning",
        };
        write!(f, "{}", name)
    }
}
