//! Markdown parsing: block scanning and inline formatting.

mod inline;
mod scanner;

pub use inline::{
    scan_bold, scan_code, scan_image, scan_italic, FormatReport, InlineFormatter, Scan, Span,
};
pub use scanner::{parse_blocks, BlockScanner, FENCE_MARKER};
