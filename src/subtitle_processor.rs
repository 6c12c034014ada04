use std::fmt;
use std::path::Path;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context};
use encoding_rs::{GB18030, UTF_8};
use log::{warn, debug};
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;
use crate::file_utils::FileManager;

// @module: Caption records and the SRT codec

// @const: SRT timestamp range line
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}:\d{2}:\d{2},\d{3})\s*-->\s*(\d{2}:\d{2}:\d{2},\d{3})").unwrap()
});

// @const: Separator between SRT blocks
static BLOCK_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// One timed caption.
///
/// `index` and the timestamps are the record's identity and never change after
/// parsing; translation only ever replaces `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionRecord {
    // @field: Stable identity used for merging translations
    pub index: usize,

    // @field: Start timestamp, HH:MM:SS,mmm
    pub start: String,

    // @field: End timestamp, HH:MM:SS,mmm
    pub end: String,

    // @field: Caption text, possibly multi-line
    pub text: String,
}

impl CaptionRecord {
    pub fn new(index: usize, start: impl Into<String>, end: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            index,
            start: start.into(),
            end: end.into(),
            text: text.into(),
        }
    }

    /// Copy of this record carrying different text
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            index: self.index,
            start: self.start.clone(),
            end: self.end.clone(),
            text: text.into(),
        }
    }

    /// `start --> end` as written in SRT files
    pub fn time_range(&self) -> String {
        format!("{} --> {}", self.start, self.end)
    }
}

impl fmt::Display for CaptionRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{}", self.time_range())?;
        write!(f, "{}", self.text)
    }
}

/// A caption whose phase-relevant wording needs a human look.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedRecord {
    pub index: usize,
    pub start: String,
    pub end: String,
    pub text: String,
    pub reason: String,
}

impl FlaggedRecord {
    pub fn from_record(record: &CaptionRecord, reason: impl Into<String>) -> Self {
        Self {
            index: record.index,
            start: record.start.clone(),
            end: record.end.clone(),
            text: record.text.clone(),
            reason: reason.into(),
        }
    }

    /// One review-log line: index, time range, text and reason
    pub fn review_line(&self) -> String {
        format!(
            "  [{}] {} --> {} | {} | {}",
            self.index,
            self.start,
            self.end,
            self.text.replace('\n', " / "),
            self.reason
        )
    }
}

/// SRT reading and writing
pub struct SrtCodec;

impl SrtCodec {
    /// Parse SRT content into caption records.
    ///
    /// Blocks that are too short, lack a numeric index or carry a malformed
    /// timestamp line are skipped.
    pub fn parse(content: &str) -> Vec<CaptionRecord> {
        let normalized = content.replace("\r\n", "\n");
        let normalized = normalized.trim();
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut records = Vec::new();
        for (block_number, block) in BLOCK_SEPARATOR.split(normalized).enumerate() {
            let lines: Vec<&str> = block.trim().split('\n').collect();
            if lines.len() < 3 {
                debug!("Skipping block {}: fewer than three lines", block_number + 1);
                continue;
            }

            let index = match lines[0].trim().parse::<usize>() {
                Ok(index) => index,
                Err(_) => {
                    warn!("Skipping block {}: invalid index line '{}'", block_number + 1, lines[0].trim());
                    continue;
                }
            };

            let Some(caps) = TIMESTAMP_REGEX.captures(lines[1].trim()) else {
                warn!("Skipping subtitle {}: invalid timestamp line '{}'", index, lines[1].trim());
                continue;
            };

            records.push(CaptionRecord::new(index, &caps[1], &caps[2], lines[2..].join("\n")));
        }

        records
    }

    /// Serialize records to SRT, numbering blocks sequentially from 1
    pub fn format(records: &[CaptionRecord]) -> String {
        let blocks: Vec<String> = records
            .iter()
            .enumerate()
            .map(|(i, record)| format!("{}\n{}\n{}", i + 1, record.time_range(), record.text))
            .collect();
        let mut output = blocks.join("\n\n");
        output.push('\n');
        output
    }

    /// Decode raw bytes trying UTF-8, UTF-8 with BOM and GB18030 in turn
    pub fn decode(bytes: &[u8], source_name: &str) -> Result<String, SubtitleError> {
        // UTF-8, with or without BOM
        let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
        if !had_errors {
            return Ok(text.into_owned());
        }

        // No BOM sniffing here; a UTF-16 BOM is not a GB18030 lead byte
        if let Some(text) = GB18030.decode_without_bom_handling_and_without_replacement(bytes) {
            debug!("Decoded {} as GB18030", source_name);
            return Ok(text.into_owned());
        }

        Err(SubtitleError::DecodeFailure {
            source_name: source_name.to_string(),
        })
    }

    /// Check that indices are strictly ascending
    pub fn ensure_ascending(records: &[CaptionRecord]) -> Result<(), SubtitleError> {
        for pair in records.windows(2) {
            if pair[1].index <= pair[0].index {
                return Err(SubtitleError::NonAscendingIndex {
                    previous: pair[0].index,
                    current: pair[1].index,
                });
            }
        }
        Ok(())
    }

    /// Read, decode and parse an SRT file
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<CaptionRecord>> {
        let path = path.as_ref();
        let bytes = FileManager::read_bytes(path)?;
        let name = path.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let content = Self::decode(&bytes, &name)?;
        let records = Self::parse(&content);
        Self::ensure_ascending(&records)
            .with_context(|| format!("Invalid subtitle order in {}", name))?;
        Ok(records)
    }

    /// Write records to an SRT file as UTF-8
    pub fn write_file<P: AsRef<Path>>(records: &[CaptionRecord], path: P) -> Result<()> {
        FileManager::write_to_file(path, &Self::format(records))
    }
}
