//! Block-level types produced by the block scanner.

use serde::{Deserialize, Serialize};

/// A top-level structural unit of markdown source.
///
/// Blocks are emitted in source order. Heading levels are always in `1..=6`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// An ATX heading (`# Title`)
    Heading {
        /// Heading level (1-6)
        level: u8,
        /// Heading text, not inline-formatted
        text: String,
    },

    /// A fenced code block, fence lines excluded
    CodeBlock {
        /// Source lines, verbatim
        lines: Vec<String>,
    },

    /// A paragraph of raw markdown text (lines joined with `\n`)
    Paragraph {
        /// Unformatted paragraph text
        raw_text: String,
    },
}

impl Block {
    /// Create a heading block, clamping the level into `1..=6`.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            level: level.clamp(1, 6),
            text: text.into(),
        }
    }

    /// Create a code block from lines.
    pub fn code<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Block::CodeBlock {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a paragraph block.
    pub fn paragraph(raw_text: impl Into<String>) -> Self {
        Block::Paragraph {
            raw_text: raw_text.into(),
        }
    }

    /// Check if this block is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self, Block::Heading { .. })
    }

    /// Check if this block is a code block.
    pub fn is_code(&self) -> bool {
        matches!(self, Block::CodeBlock { .. })
    }

    /// Check if this block is a paragraph.
    pub fn is_paragraph(&self) -> bool {
        matches!(self, Block::Paragraph { .. })
    }

    /// Code block content, lines rejoined with newlines.
    pub fn code_text(&self) -> Option<String> {
        match self {
            Block::CodeBlock { lines } => Some(lines.join("\n")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_clamped() {
        assert_eq!(Block::heading(9, "x"), Block::heading(6, "x"));
        assert_eq!(Block::heading(0, "x"), Block::heading(1, "x"));
    }

    #[test]
    fn test_block_variants() {
        let code = Block::code(["a = 1", "b = 2"]);
        assert!(code.is_code());
        assert!(!code.is_paragraph());
        assert_eq!(code.code_text().as_deref(), Some("a = 1\nb = 2"));

        let para = Block::paragraph("text");
        assert!(para.is_paragraph());
        assert_eq!(para.code_text(), None);
    }

    #[test]
    fn test_block_json_shape() {
        let json = serde_json::to_string(&Block::heading(2, "Intro")).unwrap();
        assert_eq!(json, r#"{"type":"heading","level":2,"text":"Intro"}"#);
    }
}
