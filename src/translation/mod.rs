/*!
 * Phase-aware translation of caption sequences.
 *
 * The pipeline is split into several submodules:
 *
 * - `batch`: Batch planning around the phase boundary
 * - `prompts`: System prompt and per-batch prompt rendering
 * - `response`: Validation of the service's answers
 * - `map`: First-write-wins translation map
 * - `orchestrator`: Batch-by-batch requests and merging
 * - `assembler`: Output assembly and the review log
 * - `core`: Provider-backed translation service
 */

// Re-export main types for easier usage
pub use self::assembler::{assemble, format_review_log, TranslationResult};
pub use self::batch::{Batch, BatchPlanner, PlannerConfig};
pub use self::core::{TokenUsageStats, TranslationService};
pub use self::map::TranslationMap;
pub use self::orchestrator::{BatchBackend, BatchRequest, OrchestratorOptions, TranslationOrchestrator};
pub use self::prompts::{BatchPromptBuilder, PromptTemplate};
pub use self::response::{parse_response, TranslatedLine};

// Submodules
pub mod assembler;
pub mod batch;
pub mod core;
pub mod map;
pub mod orchestrator;
pub mod prompts;
pub mod response;
