//! Document-level types of the assembled output.

use super::{Paragraph, Resource, TextRun};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An assembled word-processor document, ready for serialization.
///
/// Elements are appended in order and never reordered. Picture bytes live in
/// `resources`; paragraphs reference them by ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputDocument {
    /// Document metadata (title, author, etc.)
    pub metadata: Metadata,

    /// Body elements in document order
    pub elements: Vec<Element>,

    /// Embedded media (images)
    pub resources: Vec<Resource>,
}

impl OutputDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element to the body.
    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Store an image and return its resource ID (`image1`, `image2`, ...).
    pub fn add_resource(&mut self, data: Vec<u8>, mime_type: impl Into<String>) -> String {
        let id = format!("image{}", self.resources.len() + 1);
        self.resources
            .push(Resource::image(id.clone(), data, mime_type));
        id
    }

    /// Get a resource by ID.
    pub fn get_resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Check if the document has no body elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Total number of pictures placed in paragraphs.
    pub fn picture_count(&self) -> usize {
        self.elements
            .iter()
            .map(|e| match e {
                Element::Paragraph(p) => p.picture_count(),
                _ => 0,
            })
            .sum()
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.elements
            .iter()
            .filter_map(|element| match element {
                Element::Heading { run, .. } => Some(run.text.clone()),
                Element::Paragraph(p) => Some(p.plain_text()),
                Element::Code(run) => Some(run.text.clone()),
                Element::Rule => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// A body element of the output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    /// A heading rendered as one bold, sized run
    Heading {
        /// Heading level (1-6)
        level: u8,
        /// The styled heading run
        run: TextRun,
    },

    /// A paragraph of styled runs and pictures
    Paragraph(Paragraph),

    /// A shaded monospace code paragraph
    Code(TextRun),

    /// A horizontal rule separating records
    Rule,
}

impl Element {
    /// Check if this element is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self, Element::Heading { .. })
    }

    /// Check if this element is a code paragraph.
    pub fn is_code(&self) -> bool {
        matches!(self, Element::Code(_))
    }
}

/// Document metadata written to the package core properties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Create metadata with a title, stamped with the current time.
    pub fn titled(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            title: Some(title.into()),
            created: Some(now),
            modified: Some(now),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_new() {
        let doc = OutputDocument::new();
        assert!(doc.is_empty());
        assert_eq!(doc.picture_count(), 0);
    }

    #[test]
    fn test_add_resource_ids() {
        let mut doc = OutputDocument::new();
        let first = doc.add_resource(vec![1], "image/png");
        let second = doc.add_resource(vec![2], "image/jpeg");

        assert_eq!(first, "image1");
        assert_eq!(second, "image2");
        assert_eq!(doc.get_resource("image2").unwrap().mime_type, "image/jpeg");
        assert!(doc.get_resource("image3").is_none());
    }

    #[test]
    fn test_plain_text_skips_rules() {
        let mut doc = OutputDocument::new();
        doc.push(Element::Heading {
            level: 1,
            run: TextRun::bold("Title"),
        });
        doc.push(Element::Rule);
        doc.push(Element::Paragraph(Paragraph::with_text("Body")));

        assert_eq!(doc.plain_text(), "Title\n\nBody");
    }

    #[test]
    fn test_metadata_titled() {
        let metadata = Metadata::titled("Export");
        assert_eq!(metadata.title.as_deref(), Some("Export"));
        assert!(metadata.created.is_some());
    }
}
