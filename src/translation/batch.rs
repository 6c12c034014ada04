/*!
 * Overlapping batch planning.
 *
 * The caption sequence is cut into windows of `batch_size` records where each
 * window repeats the last `overlap` records of its predecessor, so the service
 * always sees some of the preceding dialogue. Each window gets a phase label
 * derived from the detected boundary.
 */

use anyhow::{Result, anyhow};

use crate::phase::Phase;
use crate::subtitle_processor::CaptionRecord;

/// Immutable batch geometry.
///
/// `overlap < batch_size` is enforced on construction; it is what guarantees
/// that planning always advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerConfig {
    batch_size: usize,
    overlap: usize,
}

impl PlannerConfig {
    pub fn new(batch_size: usize, overlap: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(anyhow!("Batch size must be at least 1"));
        }
        if overlap >= batch_size {
            return Err(anyhow!(
                "Batch overlap ({}) must be smaller than the batch size ({})",
                overlap,
                batch_size
            ));
        }
        Ok(Self { batch_size, overlap })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            batch_size: 35,
            overlap: 5,
        }
    }
}

/// Position range and label of one planned batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSpan {
    /// First position, inclusive
    pub start: usize,
    /// Last position, exclusive
    pub end: usize,
    pub phase: Phase,
}

impl BatchSpan {
    /// Label a span against the boundary: midpoint decides, straddling overrides
    fn labelled(start: usize, end: usize, boundary: usize) -> Self {
        let midpoint = start + (end - start) / 2;
        let phase = if start < boundary && boundary < end {
            Phase::Transitioning
        } else if midpoint < boundary {
            Phase::Sketch
        } else {
            Phase::Paint
        };
        Self { start, end, phase }
    }
}

/// A contiguous window of records submitted together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<'a> {
    /// Zero-based submission order
    pub position: usize,
    /// Sequence position of the first record
    pub start: usize,
    /// Sequence position after the last record
    pub end: usize,
    pub records: &'a [CaptionRecord],
    pub phase: Phase,
}

impl Batch<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Caption indices in submission order
    pub fn indices(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.index).collect()
    }

    /// Indices of the first and last record, for log lines
    pub fn index_range(&self) -> Option<(usize, usize)> {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => Some((first.index, last.index)),
            _ => None,
        }
    }
}

/// Overlap-aware batch planner
#[derive(Debug, Clone, Default)]
pub struct BatchPlanner {
    config: PlannerConfig,
}

impl BatchPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Spans for a sequence of `len` records; depends only on its arguments
    pub fn plan_spans(&self, len: usize, boundary: usize) -> Vec<BatchSpan> {
        let mut spans = Vec::new();
        let mut start = 0;

        while start < len {
            let end = (start + self.config.batch_size).min(len);
            spans.push(BatchSpan::labelled(start, end, boundary));
            if end == len {
                break;
            }
            start = end - self.config.overlap;
        }

        spans
    }

    /// Cut `records` into labelled batches
    pub fn plan<'a>(&self, records: &'a [CaptionRecord], boundary: usize) -> Vec<Batch<'a>> {
        self.plan_spans(records.len(), boundary)
            .into_iter()
            .enumerate()
            .map(|(position, span)| Batch {
                position,
                start: span.start,
                end: span.end,
                records: &records[span.start..span.end],
                phase: span.phase,
            })
            .collect()
    }
}
