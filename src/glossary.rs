/*!
 * Terminology glossary loading and prompt rendering.
 *
 * Glossaries are CSV files with a header row. The source and target columns
 * are required (`Chinese`/`English`, or `source`/`target`); `Category` and
 * `Notes` are optional. Headers are matched case-insensitively.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use std::io::Read;
use std::path::Path;

const DEFAULT_CATEGORY: &str = "General";

/// One required translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossaryEntry {
    pub source_term: String,
    pub target_term: String,
    /// Empty when the file has no category for the row
    pub category: String,
    pub notes: String,
}

impl GlossaryEntry {
    pub fn new(source_term: impl Into<String>, target_term: impl Into<String>) -> Self {
        Self {
            source_term: source_term.into(),
            target_term: target_term.into(),
            category: String::new(),
            notes: String::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Ordered set of required translations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glossary {
    entries: Vec<GlossaryEntry>,
}

/// Column positions resolved from the header row
struct Columns {
    source: usize,
    target: usize,
    category: Option<usize>,
    notes: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        fn find_in(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        }

        let source = find_in(headers, &["chinese", "source"])
            .ok_or_else(|| anyhow!("Glossary header needs a 'Chinese' or 'source' column"))?;
        let target = find_in(headers, &["english", "target"])
            .ok_or_else(|| anyhow!("Glossary header needs an 'English' or 'target' column"))?;

        Ok(Self {
            source,
            target,
            category: find_in(headers, &["category"]),
            notes: find_in(headers, &["notes"]),
        })
    }
}

impl Glossary {
    pub fn new(entries: Vec<GlossaryEntry>) -> Self {
        Self { entries }
    }

    /// Load a glossary CSV file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open glossary file: {}", path.display()))?;
        let glossary = Self::from_reader(file)
            .with_context(|| format!("Failed to read glossary file: {}", path.display()))?;

        debug!("Loaded {} glossary entries from {}", glossary.len(), path.display());
        Ok(glossary)
    }

    /// Parse glossary CSV from any reader; rows without both terms are skipped
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns = Columns::from_headers(reader.headers().context("Missing glossary header row")?)?;
        let mut entries = Vec::new();

        for (row, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Malformed glossary row {}", row + 2))?;
            let field = |column: Option<usize>| column.and_then(|c| record.get(c)).unwrap_or("").trim().to_string();

            let source_term = field(Some(columns.source));
            let target_term = field(Some(columns.target));
            if source_term.is_empty() || target_term.is_empty() {
                warn!("Skipping glossary row {}: source or target term is empty", row + 2);
                continue;
            }

            entries.push(GlossaryEntry {
                source_term,
                target_term,
                category: field(columns.category),
                notes: field(columns.notes),
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[GlossaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Guidance text for the translation prompt, grouped by category in
    /// first-appearance order; empty for an empty glossary
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }

        let mut groups: Vec<(&str, Vec<&GlossaryEntry>)> = Vec::new();
        for entry in &self.entries {
            let category = if entry.category.is_empty() {
                DEFAULT_CATEGORY
            } else {
                entry.category.as_str()
            };
            match groups.iter_mut().find(|(name, _)| *name == category) {
                Some((_, members)) => members.push(entry),
                None => groups.push((category, vec![entry])),
            }
        }

        let mut lines = vec![
            "## Required Terminology Glossary".to_string(),
            String::new(),
            "Use these exact translations when the source term appears:".to_string(),
            String::new(),
        ];
        for (category, members) in groups {
            lines.push(format!("### {}", category));
            for entry in members {
                let mut line = format!("- {} -> {}", entry.source_term, entry.target_term);
                if !entry.notes.is_empty() {
                    line.push_str(&format!("  ({})", entry.notes));
                }
                lines.push(line);
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }
}
