/*!
 * # phasewai - phase-aware caption translation
 *
 * A Rust library for translating watercolor lesson captions with an LLM.
 *
 * ## Features
 *
 * - Finds where the instructor switches from the pencil sketch to painting
 * - Plans overlapping batches that never mix the two phases needlessly
 * - Tells the model the phase of every batch, so an ambiguous verb such as 画
 *   becomes "sketch" or "paint" as the lesson requires
 * - Required terminology from a CSV glossary
 * - Translation providers:
 *   - Anthropic API (default)
 *   - OpenAI API and LM Studio
 *   - Ollama (local LLM)
 * - Review log of captions whose phase could not be decided
 * - Remote folder workflow driven by rclone
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `subtitle_processor`: Caption records and the SRT codec
 * - `phase`: Signal table and phase boundary detection
 * - `translation`: Batch planning, prompts, orchestration and assembly:
 *   - `translation::batch`: Batch planning around the boundary
 *   - `translation::orchestrator`: Batch requests and first-write-wins merging
 *   - `translation::assembler`: Output assembly and the review log
 *   - `translation::core`: Provider-backed translation service
 * - `providers`: Client implementations for various LLM providers
 * - `glossary`: Terminology glossary loading
 * - `app_config`: Configuration management
 * - `app_controller`: File and folder workflow
 * - `drive_sync`: Remote folder workflow
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod drive_sync;
pub mod errors;
pub mod file_utils;
pub mod glossary;
pub mod language_utils;
pub mod phase;
pub mod providers;
pub mod subtitle_processor;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use errors::{AppError, ProviderError, SubtitleError, TranslationError};
pub use glossary::{Glossary, GlossaryEntry};
pub use language_utils::{get_language_name, normalize_to_part2t};
pub use phase::{Phase, PhaseBoundary, PhaseDetection, PhaseDetector};
pub use subtitle_processor::{CaptionRecord, FlaggedRecord, SrtCodec};
pub use translation::{TranslationResult, TranslationService};
