/*!
 * Batch-by-batch translation orchestration.
 *
 * Each planned batch becomes one request to a [`BatchBackend`]. Responses are
 * validated, then merged into a [`TranslationMap`] in submission order under
 * the first-write-wins rule, so an index shared by two overlapping batches
 * keeps the earlier batch's text regardless of which request finished first.
 */

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::errors::{ProviderError, TranslationError};
use crate::phase::Phase;
use crate::subtitle_processor::CaptionRecord;
use crate::translation::batch::Batch;
use crate::translation::map::TranslationMap;
use crate::translation::response::{parse_response, TranslatedLine};

/// Everything the translation service needs for one batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    /// Zero-based submission order
    pub position: usize,
    pub records: Vec<CaptionRecord>,
    pub phase: Phase,
    /// Rendered glossary guidance, possibly empty
    pub glossary_text: String,
}

impl BatchRequest {
    pub fn from_batch(batch: &Batch<'_>, glossary_text: &str) -> Self {
        Self {
            position: batch.position,
            records: batch.records.to_vec(),
            phase: batch.phase,
            glossary_text: glossary_text.to_string(),
        }
    }
}

/// The translation service as seen by the orchestrator.
///
/// Implementations return the raw service answer; validation happens here.
#[async_trait]
pub trait BatchBackend: Send + Sync {
    async fn translate(&self, request: &BatchRequest) -> Result<String, ProviderError>;
}

/// Run-level knobs for the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Batches in flight at once; 1 is strictly sequential
    pub concurrent_batches: usize,
    /// Fail when any submitted index is left without a translation
    pub strict_coverage: bool,
    /// Fail when a response mentions an index that was not submitted
    pub reject_foreign_indices: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            concurrent_batches: 1,
            strict_coverage: false,
            reject_foreign_indices: false,
        }
    }
}

/// Drives a planned run against a backend
pub struct TranslationOrchestrator {
    backend: Arc<dyn BatchBackend>,
    options: OrchestratorOptions,
}

impl TranslationOrchestrator {
    pub fn new(backend: Arc<dyn BatchBackend>, options: OrchestratorOptions) -> Self {
        Self { backend, options }
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// Translate every batch and merge the answers.
    ///
    /// `progress` is called with `(merged, total)` after each batch is merged.
    /// The first failing batch aborts the run.
    pub async fn run<F>(
        &self,
        batches: &[Batch<'_>],
        glossary_text: &str,
        progress: F,
    ) -> Result<TranslationMap, TranslationError>
    where
        F: Fn(usize, usize),
    {
        let total = batches.len();
        let mut map = TranslationMap::new();

        // buffered() yields in submission order even when later requests finish first
        let mut responses = stream::iter(batches.iter().map(|batch| self.request_batch(batch, glossary_text, total)))
            .buffered(self.options.concurrent_batches.max(1));

        let mut merged = 0;
        while let Some(result) = responses.next().await {
            let lines = result?;
            self.merge_batch(&batches[merged], lines, &mut map)?;
            merged += 1;
            progress(merged, total);
        }

        if self.options.strict_coverage {
            for batch in batches {
                let missing = map.missing(batch.records.iter().map(|r| &r.index));
                if !missing.is_empty() {
                    return Err(TranslationError::MissingIndices {
                        batch: batch.position,
                        indices: missing,
                    });
                }
            }
        }

        Ok(map)
    }

    /// Invoke the backend for one batch and validate its answer
    async fn request_batch(
        &self,
        batch: &Batch<'_>,
        glossary_text: &str,
        total: usize,
    ) -> Result<Vec<TranslatedLine>, TranslationError> {
        if let Some((first, last)) = batch.index_range() {
            info!(
                "Translating batch {}/{}: subtitles {}-{} (phase: {})",
                batch.position + 1,
                total,
                first,
                last,
                batch.phase
            );
        }

        let request = BatchRequest::from_batch(batch, glossary_text);
        let raw = self
            .backend
            .translate(&request)
            .await
            .map_err(|source| TranslationError::ServiceInvocation {
                batch: batch.position,
                source,
            })?;

        parse_response(&raw).map_err(|e| TranslationError::ResponseValidation {
            batch: batch.position,
            reason: e.to_string(),
        })
    }

    /// Merge one validated answer under first-write-wins
    fn merge_batch(
        &self,
        batch: &Batch<'_>,
        lines: Vec<TranslatedLine>,
        map: &mut TranslationMap,
    ) -> Result<(), TranslationError> {
        let submitted: BTreeSet<usize> = batch.records.iter().map(|r| r.index).collect();

        let foreign: Vec<usize> = lines
            .iter()
            .map(|line| line.index)
            .filter(|index| !submitted.contains(index))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if !foreign.is_empty() {
            if self.options.reject_foreign_indices {
                return Err(TranslationError::ForeignIndices {
                    batch: batch.position,
                    indices: foreign,
                });
            }
            warn!(
                "Batch {} returned indices that were not submitted, ignoring them: {:?}",
                batch.position + 1,
                foreign
            );
        }

        let mut answered = BTreeSet::new();
        let mut inserted = 0;
        for line in lines {
            if !submitted.contains(&line.index) || !answered.insert(line.index) {
                continue;
            }
            if map.insert_first(line.index, line.text) {
                inserted += 1;
            }
        }

        let unanswered: Vec<usize> = submitted.difference(&answered).copied().collect();
        if !unanswered.is_empty() {
            warn!(
                "Batch {} returned {} of {} subtitles; unanswered indices keep earlier or source text: {:?}",
                batch.position + 1,
                answered.len(),
                submitted.len(),
                unanswered
            );
        }
        debug!("Batch {} merged {} new translations", batch.position + 1, inserted);

        Ok(())
    }
}
