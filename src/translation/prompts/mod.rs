/*!
 * Prompt construction for caption translation.
 *
 * - System prompt template with the sketch/paint rules
 * - Per-batch prompt rendering from records, phase and glossary
 */

pub mod templates;

// Re-export main types
pub use templates::{BatchPromptBuilder, PromptTemplate};
