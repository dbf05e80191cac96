//! Line-oriented block scanner.
//!
//! Splits markdown into headings, fenced code blocks and paragraphs with a
//! two-state machine (`Normal` / `InFence`). Paragraph text is kept raw; the
//! inline formatter handles emphasis and images later.

use crate::model::Block;
use once_cell::sync::Lazy;
use regex::Regex;

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("valid heading regex"));

/// Marker that opens and closes a fenced code block.
pub const FENCE_MARKER: &str = "```";

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InFence,
}

/// Scan markdown into an ordered list of blocks.
///
/// # Example
///
/// ```
/// use mdocx::model::Block;
/// use mdocx::parser::parse_blocks;
///
/// let blocks = parse_blocks("# Title\n\nBody text");
/// assert_eq!(blocks, vec![Block::heading(1, "Title"), Block::paragraph("Body text")]);
/// ```
pub fn parse_blocks(markdown: &str) -> Vec<Block> {
    BlockScanner::new().scan(markdown)
}

/// Two-state block scanner.
///
/// All state is local to one [`scan`](BlockScanner::scan) call.
#[derive(Debug)]
pub struct BlockScanner {
    state: ScanState,
    blocks: Vec<Block>,
    paragraph: String,
    code: Vec<String>,
}

impl BlockScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self {
            state: ScanState::Normal,
            blocks: Vec::new(),
            paragraph: String::new(),
            code: Vec::new(),
        }
    }

    /// Scan markdown source into blocks.
    pub fn scan(mut self, markdown: &str) -> Vec<Block> {
        // Stored content sometimes carries escaped newlines
        let source = markdown.replace("\\n", "\n");

        for line in source.split('\n') {
            self.scan_line(line.strip_suffix('\r').unwrap_or(line));
        }

        match self.state {
            ScanState::InFence => {
                log::debug!("Unterminated code fence at end of input");
                self.flush_code();
            }
            ScanState::Normal => self.flush_paragraph(),
        }

        self.blocks
    }

    fn scan_line(&mut self, line: &str) {
        if line.trim().starts_with(FENCE_MARKER) {
            match self.state {
                ScanState::Normal => {
                    self.flush_paragraph();
                    self.state = ScanState::InFence;
                }
                ScanState::InFence => {
                    self.flush_code();
                    self.state = ScanState::Normal;
                }
            }
            return;
        }

        if self.state == ScanState::InFence {
            self.code.push(line.to_string());
            return;
        }

        if let Some(caps) = HEADING.captures(line) {
            self.flush_paragraph();
            let level = caps[1].len() as u8;
            self.blocks.push(Block::heading(level, &caps[2]));
            return;
        }

        if line.trim().is_empty() {
            self.flush_paragraph();
            return;
        }

        if !self.paragraph.is_empty() {
            self.paragraph.push('\n');
        }
        self.paragraph.push_str(line);
    }

    fn flush_paragraph(&mut self) {
        if !self.paragraph.is_empty() {
            let text = std::mem::take(&mut self.paragraph);
            self.blocks.push(Block::Paragraph { raw_text: text });
        }
    }

    fn flush_code(&mut self) {
        if !self.code.is_empty() {
            let lines = std::mem::take(&mut self.code);
            self.blocks.push(Block::CodeBlock { lines });
        }
    }
}

impl Default for BlockScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_all_levels() {
        let blocks = parse_blocks("# One\n## Two\n###### Six\n####### Seven");
        assert_eq!(
            blocks,
            vec![
                Block::heading(1, "One"),
                Block::heading(2, "Two"),
                Block::heading(6, "Six"),
                Block::paragraph("####### Seven"),
            ]
        );
    }

    #[test]
    fn test_heading_requires_space() {
        let blocks = parse_blocks("#hashtag");
        assert_eq!(blocks, vec![Block::paragraph("#hashtag")]);
    }

    #[test]
    fn test_heading_flushes_paragraph() {
        let blocks = parse_blocks("line one\nline two\n## Next");
        assert_eq!(
            blocks,
            vec![
                Block::paragraph("line one\nline two"),
                Block::heading(2, "Next"),
            ]
        );
    }

    #[test]
    fn test_blank_lines_split_paragraphs() {
        let blocks = parse_blocks("a\n\n\nb\n   \nc");
        assert_eq!(
            blocks,
            vec![
                Block::paragraph("a"),
                Block::paragraph("b"),
                Block::paragraph("c"),
            ]
        );
    }

    #[test]
    fn test_fence_keeps_lines_verbatim() {
        let blocks = parse_blocks("```python\n  # not a heading\n\n**x**\n```");
        assert_eq!(
            blocks,
            vec![Block::code(["  # not a heading", "", "**x**"])]
        );
    }

    #[test]
    fn test_unterminated_fence_flushes_code() {
        let blocks = parse_blocks("intro\n```\nlet x = 1;");
        assert_eq!(
            blocks,
            vec![Block::paragraph("intro"), Block::code(["let x = 1;"])]
        );
    }

    #[test]
    fn test_empty_fence_emits_nothing() {
        let blocks = parse_blocks("```\n```\ntext");
        assert_eq!(blocks, vec![Block::paragraph("text")]);
    }

    #[test]
    fn test_escaped_newlines_normalized() {
        let blocks = parse_blocks("# Title\\n\\nBody");
        assert_eq!(
            blocks,
            vec![Block::heading(1, "Title"), Block::paragraph("Body")]
        );
    }

    #[test]
    fn test_crlf_input() {
        let blocks = parse_blocks("# Title\r\n\r\nBody\r\n");
        assert_eq!(
            blocks,
            vec![Block::heading(1, "Title"), Block::paragraph("Body")]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_blocks("").is_empty());
        assert!(parse_blocks("\n\n  \n").is_empty());
    }
}
