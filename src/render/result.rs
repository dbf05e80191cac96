//! Export result with package bytes and statistics.

use serde::{Deserialize, Serialize};

/// MIME type of a WordprocessingML package.
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// A finished export: the serialized document plus its download metadata.
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Serialized document bytes
    pub bytes: Vec<u8>,

    /// Suggested file name, including extension
    pub filename: String,

    /// MIME type of `bytes`
    pub content_type: &'static str,

    /// Rendering statistics
    pub stats: ExportStats,
}

impl ExportResult {
    /// Create a new export result.
    pub fn new(bytes: Vec<u8>, filename: String, stats: ExportStats) -> Self {
        Self {
            bytes,
            filename,
            content_type: DOCX_CONTENT_TYPE,
            stats,
        }
    }

    /// Set MIME type.
    pub fn with_content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = content_type;
        self
    }

    /// Size of the serialized document in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if no bytes were produced.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Statistics collected while assembling a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStats {
    /// Number of records exported
    pub record_count: u32,

    /// Number of headings emitted
    pub heading_count: u32,

    /// Number of paragraphs emitted
    pub paragraph_count: u32,

    /// Number of code blocks emitted
    pub code_block_count: u32,

    /// Number of images embedded
    pub image_count: u32,

    /// Number of image references kept as literal text
    pub unresolved_image_count: u32,

    /// Number of horizontal rules
    pub rule_count: u32,

    /// Character count (excluding whitespace)
    pub char_count: u32,
}

impl ExportStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment record count.
    pub fn add_record(&mut self) {
        self.record_count += 1;
    }

    /// Increment heading count.
    pub fn add_heading(&mut self) {
        self.heading_count += 1;
    }

    /// Increment paragraph count.
    pub fn add_paragraph(&mut self) {
        self.paragraph_count += 1;
    }

    /// Increment code block count.
    pub fn add_code_block(&mut self) {
        self.code_block_count += 1;
    }

    /// Increment horizontal rule count.
    pub fn add_rule(&mut self) {
        self.rule_count += 1;
    }

    /// Add image counters.
    pub fn add_images(&mut self, embedded: u32, unresolved: u32) {
        self.image_count += embedded;
        self.unresolved_image_count += unresolved;
    }

    /// Add character count from text.
    pub fn count_text(&mut self, text: &str) {
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &ExportStats) {
        self.record_count += other.record_count;
        self.heading_count += other.heading_count;
        self.paragraph_count += other.paragraph_count;
        self.code_block_count += other.code_block_count;
        self.image_count += other.image_count;
        self.unresolved_image_count += other.unresolved_image_count;
        self.rule_count += other.rule_count;
        self.char_count += other.char_count;
    }
}
