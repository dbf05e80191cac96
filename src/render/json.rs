//! JSON dump of scanned blocks and their inline runs.

use serde::Serialize;

use crate::error::Result;
use crate::model::{Block, InlineRun};
use crate::parser::{parse_blocks, InlineFormatter};
use crate::resolver::ImageSource;

use super::ImageSizing;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// A block together with the runs its paragraph text formats into.
#[derive(Debug, Clone, Serialize)]
pub struct BlockDump {
    /// The scanned block
    #[serde(flatten)]
    pub block: Block,

    /// Inline runs, paragraphs only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runs: Option<Vec<InlineRun>>,
}

/// Scan markdown and pair every paragraph with its inline runs.
///
/// Pictures carry the display size `sizing` gives them in a document.
pub fn dump_blocks(
    markdown: &str,
    images: &dyn ImageSource,
    sizing: ImageSizing,
) -> Vec<BlockDump> {
    let formatter = InlineFormatter::new(images).with_sizing(sizing);
    parse_blocks(markdown)
        .into_iter()
        .map(|block| {
            let runs = match &block {
                Block::Paragraph { raw_text } => Some(formatter.format(raw_text)),
                _ => None,
            };
            BlockDump { block, runs }
        })
        .collect()
}

/// Serialize a block dump to JSON.
pub fn to_json(blocks: &[BlockDump], format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(blocks)?,
        JsonFormat::Compact => serde_json::to_string(blocks)?,
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ImageResolver;

    #[test]
    fn test_dump_pairs_runs_with_paragraphs() {
        let resolver = ImageResolver::with_root(".");
        let dump = dump_blocks(
            "# Head\n\nplain **bold**\n```\ncode\n```",
            &resolver,
            ImageSizing::default(),
        );

        assert_eq!(dump.len(), 3);
        assert!(dump[0].runs.is_none());
        assert_eq!(
            dump[1].runs.as_deref(),
            Some(&[InlineRun::plain("plain "), InlineRun::bold("bold")][..])
        );
        assert!(dump[2].block.is_code());
    }

    #[test]
    fn test_to_json_formats() {
        let resolver = ImageResolver::with_root(".");
        let dump = dump_blocks("Hello *there*", &resolver, ImageSizing::default());

        let pretty = to_json(&dump, JsonFormat::Pretty).unwrap();
        assert!(pretty.contains("\"type\": \"paragraph\""));
        assert!(pretty.contains('\n'));

        let compact = to_json(&dump, JsonFormat::Compact).unwrap();
        assert!(!compact.contains('\n'));
        assert!(compact.contains("\"type\":\"italic\""));
    }

    #[test]
    fn test_dump_uses_picture_sizing() {
        // 1x1 PNG
        let markdown = "![dot](data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==)";
        let resolver = ImageResolver::with_root(".");

        let dump = dump_blocks(markdown, &resolver, ImageSizing::scale_to_width(120.0));
        let runs = dump[0].runs.as_deref().unwrap();
        assert!(matches!(
            runs,
            [InlineRun::Image { width_pt, height_pt, .. }] if *width_pt == 120.0 && *height_pt == 120.0
        ));

        let json = to_json(&dump, JsonFormat::Compact).unwrap();
        assert!(json.contains("\"width_pt\":120.0"));
    }
}
