//! Inline runs produced by the inline formatter.

use serde::{Deserialize, Serialize};

/// A contiguous styled fragment of a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineRun {
    /// Unstyled text
    Plain {
        /// Text content
        text: String,
    },

    /// `**bold**` text
    Bold {
        /// Text content
        text: String,
    },

    /// `*italic*` text
    Italic {
        /// Text content
        text: String,
    },

    /// `` `code` `` text
    Code {
        /// Text content
        text: String,
    },

    /// An embedded image with decoded bytes
    Image {
        /// Alternative text from the markup
        alt: String,
        /// MIME type (e.g., "image/png")
        mime_type: String,
        /// Decoded image bytes
        #[serde(skip_serializing, default)]
        data: Vec<u8>,
        /// Display width in points
        width_pt: f32,
        /// Display height in points
        height_pt: f32,
    },
}

impl InlineRun {
    /// Create a plain run.
    pub fn plain(text: impl Into<String>) -> Self {
        InlineRun::Plain { text: text.into() }
    }

    /// Create a bold run.
    pub fn bold(text: impl Into<String>) -> Self {
        InlineRun::Bold { text: text.into() }
    }

    /// Create an italic run.
    pub fn italic(text: impl Into<String>) -> Self {
        InlineRun::Italic { text: text.into() }
    }

    /// Create an inline code run.
    pub fn code(text: impl Into<String>) -> Self {
        InlineRun::Code { text: text.into() }
    }

    /// Text of a textual run, `None` for images.
    pub fn text(&self) -> Option<&str> {
        match self {
            InlineRun::Plain { text }
            | InlineRun::Bold { text }
            | InlineRun::Italic { text }
            | InlineRun::Code { text } => Some(text),
            InlineRun::Image { .. } => None,
        }
    }

    /// Check if this run is an embedded image.
    pub fn is_image(&self) -> bool {
        matches!(self, InlineRun::Image { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_text() {
        assert_eq!(InlineRun::bold("b").text(), Some("b"));
        assert_eq!(InlineRun::code("x").text(), Some("x"));

        let image = InlineRun::Image {
            alt: String::new(),
            mime_type: "image/png".to_string(),
            data: vec![1, 2, 3],
            width_pt: 400.0,
            height_pt: 300.0,
        };
        assert!(image.is_image());
        assert_eq!(image.text(), None);
    }

    #[test]
    fn test_image_bytes_not_serialized() {
        let image = InlineRun::Image {
            alt: "diagram".to_string(),
            mime_type: "image/png".to_string(),
            data: vec![0x89, 0x50],
            width_pt: 400.0,
            height_pt: 300.0,
        };
        let json = serde_json::to_string(&image).unwrap();
        assert!(json.contains("\"mime_type\":\"image/png\""));
        assert!(!json.contains("data"));
    }
}
