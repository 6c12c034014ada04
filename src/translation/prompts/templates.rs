/*!
 * Prompt templates for phase-aware caption translation.
 *
 * The system prompt explains the sketch/paint distinction and the JSON output
 * contract once; each batch prompt then states the batch's phase, the glossary
 * and the captions themselves.
 */

use crate::phase::Phase;
use crate::subtitle_processor::CaptionRecord;

/// System prompt template for caption translation.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// The default system prompt for watercolor lesson captions.
    pub const LESSON_TRANSLATOR: &'static str = r#"You are an expert {source_language}-to-{target_language} subtitle translator for watercolor painting lessons.

## Key rules

1. Natural phrasing: produce translations that read naturally to a native {target_language} speaker. You may lightly restructure phrasing across neighbouring lines, but every subtitle's text must stay with its own index.

2. Sketch vs. paint: the verb 画 (huà) means either "sketch/draw" or "paint".
   - Lessons open with a PENCIL SKETCH phase: outlining the composition before any color is applied.
   - Later the instructor moves to the PAINTING phase: mixing and applying watercolor.
   - Use "sketch", "draw" or "outline" while the instructor is still working in pencil.
   - Use "paint", "apply" or "brush" once color is being used.
   - Sketch phase clues: pencil (铅笔), eraser (橡皮), light lines (轻轻地), outline (轮廓), composition (构图), proportions (比例).
   - Paint phase clues: brush (毛笔), water (水), pigment or color (颜料/颜色), palette (调色盘), wet (湿), dry (干), wash (渲染), blending (晕染), layers (层).
   - Each batch states its current phase. Trust that label unless the subtitles clearly contradict it. When the phase is marked as transitioning, decide line by line from the surrounding lines.

3. Keep indices: return exactly the index numbers you were given and translate only the text.

4. Glossary: when a glossary is provided, always use its translations for the listed terms. The glossary overrides your own judgment.

5. Output format: return ONLY a JSON array whose elements have the keys "index" (integer) and "text" (string). No markdown fences, no commentary."#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default lesson translator template.
    pub fn lesson_translator() -> Self {
        Self::new(Self::LESSON_TRANSLATOR)
    }

    /// Render the template with the given language names.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::lesson_translator()
    }
}

/// Builder for the per-batch user prompt.
#[derive(Debug, Clone)]
pub struct BatchPromptBuilder<'a> {
    phase: Phase,
    glossary_text: &'a str,
    records: &'a [CaptionRecord],
}

impl<'a> BatchPromptBuilder<'a> {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            glossary_text: "",
            records: &[],
        }
    }

    /// Rendered glossary guidance; empty text adds nothing
    pub fn with_glossary(mut self, glossary_text: &'a str) -> Self {
        self.glossary_text = glossary_text;
        self
    }

    pub fn with_records(mut self, records: &'a [CaptionRecord]) -> Self {
        self.records = records;
        self
    }

    /// Render the prompt
    pub fn build(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        if !self.glossary_text.trim().is_empty() {
            lines.push(self.glossary_text.trim_end().to_string());
            lines.push(String::new());
        }

        lines.push(format!("## Current phase: {}", self.phase.prompt_label()));
        lines.push(self.phase_guidance().to_string());
        lines.push(String::new());
        lines.push("## Subtitles to translate".to_string());
        lines.push(String::new());

        for record in self.records {
            lines.push(format!("[{}]", record.index));
            lines.push(record.text.clone());
            lines.push(String::new());
        }

        lines.push(r#"Return a JSON array: [{"index": N, "text": "..."}]"#.to_string());
        lines.join("\n")
    }

    fn phase_guidance(&self) -> &'static str {
        match self.phase {
            Phase::Sketch | Phase::Paint => {
                r#"Translate 画 as "sketch"/"draw" for SKETCH phase or "paint" for PAINT phase, unless context clearly indicates otherwise."#
            }
            Phase::Transitioning => {
                r#"This batch spans the switch from sketching to painting. Translate 画 as "sketch"/"draw" before color is introduced and "paint" after, judging each line from its neighbours."#
            }
        }
    }
}
