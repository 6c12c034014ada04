/*!
 * Translation response validation.
 *
 * The service is asked for a JSON array of `{"index": N, "text": "..."}`.
 * Models wrap that payload in code fences or chatter often enough that the
 * fence is stripped and the first complete JSON value is read out of the
 * surrounding prose; that value is then checked against the schema and any
 * mismatch becomes a typed error.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").unwrap()
});

/// One translated caption as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedLine {
    pub index: usize,
    pub text: String,
}

/// Why a response was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponseError {
    #[error("response is empty")]
    Empty,

    #[error("no JSON payload found in response")]
    NoPayload,

    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("payload is not a list of translations")]
    NotAList,

    #[error("entry {position} is malformed: {reason}")]
    InvalidEntry {
        /// Zero-based position in the returned list
        position: usize,
        reason: String,
    },
}

/// Strip whitespace and a Markdown code fence around the payload
fn unfence(raw: &str) -> Result<&str, ResponseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ResponseError::Empty);
    }

    Ok(match CODE_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    })
}

/// Validate a raw response into translated lines, preserving their order.
///
/// Every `[` or `{` outside an already parsed value is a candidate start; the
/// first complete JSON value there is read and whatever follows it is ignored.
/// The first candidate that validates wins.
pub fn parse_response(raw: &str) -> Result<Vec<TranslatedLine>, ResponseError> {
    let text = unfence(raw)?;
    let mut first_error: Option<ResponseError> = None;
    let mut parsed_until = 0;

    for (offset, _) in text.char_indices().filter(|(_, c)| *c == '[' || *c == '{') {
        if offset < parsed_until {
            continue;
        }

        let mut values = serde_json::Deserializer::from_str(&text[offset..]).into_iter::<Value>();
        let result = match values.next() {
            Some(Ok(value)) => {
                parsed_until = offset + values.byte_offset();
                lines_from_value(value)
            }
            Some(Err(e)) => Err(ResponseError::InvalidJson(e.to_string())),
            None => continue,
        };

        match result {
            Ok(lines) => return Ok(lines),
            Err(e) => {
                // A value with the wrong shape says more than text that is not JSON at all
                let replace = match &first_error {
                    None => true,
                    Some(ResponseError::InvalidJson(_)) => !matches!(e, ResponseError::InvalidJson(_)),
                    Some(_) => false,
                };
                if replace {
                    first_error = Some(e);
                }
            }
        }
    }

    Err(first_error.unwrap_or(ResponseError::NoPayload))
}

/// Check one JSON value against the response schema
fn lines_from_value(value: Value) -> Result<Vec<TranslatedLine>, ResponseError> {
    let items = match value {
        Value::Array(items) => items,
        // {"translations": [...]} is the only accepted object shape
        Value::Object(mut object) => match object.remove("translations") {
            Some(Value::Array(items)) => items,
            _ => return Err(ResponseError::NotAList),
        },
        _ => return Err(ResponseError::NotAList),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| {
            serde_json::from_value::<TranslatedLine>(item).map_err(|e| ResponseError::InvalidEntry {
                position,
                reason: e.to_string(),
            })
        })
        .collect()
}
