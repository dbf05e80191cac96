//! Exportable question records.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A question record supplied by the persistence layer for export.
///
/// Records deserialize from the JSON shape the question store produces:
/// `year` or `source` both map onto `label`, `question_number` onto `number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Exam year or source label
    #[serde(alias = "year", alias = "source")]
    pub label: RecordLabel,

    /// Sequence number within the label
    #[serde(default, alias = "question_number")]
    pub number: Option<u32>,

    /// Optional title
    #[serde(default)]
    pub title: Option<String>,

    /// Markdown body
    pub content: String,

    /// Optional markdown answer
    #[serde(default)]
    pub answer: Option<String>,

    /// Optional structured options text (JSON object/array or free text)
    #[serde(default, deserialize_with = "options_text")]
    pub options: Option<String>,
}

impl ExportRecord {
    /// Create a record with a label and markdown content.
    pub fn new(label: impl Into<RecordLabel>, content: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            number: None,
            title: None,
            content: content.into(),
            answer: None,
            options: None,
        }
    }

    /// Set the sequence number.
    pub fn with_number(mut self, number: u32) -> Self {
        self.number = Some(number);
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the markdown answer.
    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    /// Set the options text.
    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Options as ordered `(key, text)` pairs when the options text is JSON.
    ///
    /// Objects keep their key order; arrays are keyed `A`, `B`, `C`, ...
    /// Returns `None` for free text or blank options.
    pub fn option_entries(&self) -> Option<Vec<(String, String)>> {
        let raw = self.options.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }

        match serde_json::from_str::<Value>(raw).ok()? {
            Value::Object(map) => Some(
                map.into_iter()
                    .map(|(key, value)| (key, value_text(value)))
                    .collect(),
            ),
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| (option_key(i), value_text(value)))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Check if the record has non-blank options text.
    pub fn has_options(&self) -> bool {
        self.options
            .as_deref()
            .map(|o| !o.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Year or source label of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordLabel {
    /// Exam year (e.g., 2023)
    Year(i32),
    /// Source name (e.g., a mock exam provider)
    Source(String),
}

impl std::fmt::Display for RecordLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordLabel::Year(year) => write!(f, "{}", year),
            RecordLabel::Source(source) => write!(f, "{}", source),
        }
    }
}

impl From<i32> for RecordLabel {
    fn from(year: i32) -> Self {
        RecordLabel::Year(year)
    }
}

impl From<&str> for RecordLabel {
    fn from(source: &str) -> Self {
        RecordLabel::Source(source.to_string())
    }
}

impl From<String> for RecordLabel {
    fn from(source: String) -> Self {
        RecordLabel::Source(source)
    }
}

fn option_key(index: usize) -> String {
    if index < 26 {
        char::from(b'A' + index as u8).to_string()
    } else {
        (index + 1).to_string()
    }
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Accept options either as a JSON string or as inline JSON.
fn options_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
