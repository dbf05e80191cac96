//! # mdocx
//!
//! Markdown to DOCX rendering for question records.
//!
//! This library turns the small markdown dialect used to author question
//! records into Office Open XML word-processor documents, embedding every
//! image it can resolve as a self-contained media part.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mdocx::{export_records, ExportOptions, ExportRecord};
//!
//! fn main() -> mdocx::Result<()> {
//!     let records = vec![
//!         ExportRecord::new(2023, "Explain **ownership**.").with_number(1),
//!         ExportRecord::new(2023, "What does `Arc` add over `Rc`?").with_number(2),
//!     ];
//!
//!     let options = ExportOptions::new().with_storage_root("./uploads");
//!     let result = export_records(&records, &options)?;
//!     std::fs::write(&result.filename, &result.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Supported markup
//!
//! - Headings `#` to `######`
//! - `**bold**`, `*italic*` and `` `inline code` ``
//! - Fenced code blocks (```` ``` ````)
//! - Images `![alt](ref)` from data URIs, storage paths or upload URLs
//!
//! Malformed markup and unresolvable images degrade to literal text; only
//! the final package write can fail an export.

pub mod detect;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod render;
pub mod resolver;

// Re-export commonly used types
pub use detect::{detect_image_format, image_dimensions, ImageFormat};
pub use error::{Error, Result};
pub use export::{
    export_filename, export_records, markdown_to_docx, records_from_json, ExportOptions, Exporter,
};
pub use model::{
    Block, Element, ExportRecord, InlineContent, InlineRun, Metadata, OutputDocument, Paragraph,
    Picture, RecordLabel, Resource, TextRun, TextStyle,
};
pub use parser::{parse_blocks, InlineFormatter};
pub use render::{
    DocumentAssembler, DocumentWriter, DocxWriter, ExportResult, ExportStats, ImageSizing,
    JsonFormat, RecordLayout, RenderOptions, DOCX_CONTENT_TYPE,
};
pub use resolver::{ImageResolution, ImageResolver, ImageSource, ResolverOptions};

#[cfg(feature = "async")]
pub use export::export_records_with_timeout;

use std::path::Path;

/// Format one paragraph of markdown into inline runs, resolving images
/// relative to `storage_root`.
///
/// # Example
///
/// ```
/// use mdocx::{format_inline, InlineRun};
///
/// let runs = format_inline("Some **bold** text", ".");
/// assert_eq!(runs[1], InlineRun::bold("bold"));
/// ```
pub fn format_inline(text: &str, storage_root: impl Into<std::path::PathBuf>) -> Vec<InlineRun> {
    let resolver = ImageResolver::with_root(storage_root);
    InlineFormatter::new(&resolver).format(text)
}

/// Convert a markdown file to DOCX.
///
/// The file name stem becomes the output stem; no timestamp is appended.
///
/// # Example
///
/// ```no_run
/// use mdocx::convert_file;
///
/// let result = convert_file("notes.md").unwrap();
/// std::fs::write(&result.filename, &result.bytes).unwrap();
/// ```
pub fn convert_file<P: AsRef<Path>>(path: P) -> Result<ExportResult> {
    Mdocx::new().convert_file(path)
}

/// Builder for rendering markdown and records to DOCX.
///
/// # Example
///
/// ```no_run
/// use mdocx::{ExportRecord, Mdocx};
///
/// let result = Mdocx::new()
///     .with_storage_root("./uploads")
///     .with_title("Operating Systems")
///     .with_image_width(360.0)
///     .keep_aspect_ratio()
///     .export_records(&[ExportRecord::new(2022, "Define a *semaphore*.")])?;
/// println!("{} ({} bytes)", result.filename, result.bytes.len());
/// # Ok::<(), mdocx::Error>(())
/// ```
pub struct Mdocx {
    options: ExportOptions,
}

impl Mdocx {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: ExportOptions::default(),
        }
    }

    /// Set the storage root for relative image paths.
    pub fn with_storage_root(mut self, root: impl Into<std::path::PathBuf>) -> Self {
        self.options = self.options.with_storage_root(root);
        self
    }

    /// Refuse absolute filesystem paths in image references.
    pub fn storage_root_only(mut self) -> Self {
        self.options.resolver = self.options.resolver.with_absolute_paths(false);
        self
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.options = self.options.with_title(title);
        self
    }

    /// Set the picture display width in points.
    pub fn with_image_width(mut self, width_pt: f32) -> Self {
        self.options.render = self.options.render.with_image_width(width_pt);
        self
    }

    /// Scale picture height by the source aspect ratio.
    pub fn keep_aspect_ratio(mut self) -> Self {
        self.options.render.image.keep_aspect = true;
        self
    }

    /// Set the record heading template (`{label}`, `{number}`).
    pub fn with_heading_template(mut self, template: impl Into<String>) -> Self {
        self.options.layout = self.options.layout.with_heading_template(template);
        self
    }

    /// Set rendering options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.options.render = options;
        self
    }

    /// Set the output file name stem.
    pub fn with_filename_stem(mut self, stem: impl Into<String>) -> Self {
        self.options = self.options.with_filename_stem(stem);
        self
    }

    /// Do not append a timestamp to the file name.
    pub fn without_timestamp(mut self) -> Self {
        self.options = self.options.with_timestamp(false);
        self
    }

    /// Current export options.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export question records.
    pub fn export_records(&self, records: &[ExportRecord]) -> Result<ExportResult> {
        export::export_records(records, &self.options)
    }

    /// Render markdown text.
    pub fn convert(&self, markdown: &str) -> Result<ExportResult> {
        export::markdown_to_docx(markdown, &self.options)
    }

    /// Render a markdown file, named after the file.
    pub fn convert_file<P: AsRef<Path>>(&self, path: P) -> Result<ExportResult> {
        let path = path.as_ref();
        let markdown = std::fs::read_to_string(path)?;

        let mut options = self.options.clone();
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            options.filename_stem = stem.to_string();
        }
        options.timestamp = false;
        export::markdown_to_docx(&markdown, &options)
    }
}

impl Default for Mdocx {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_options() {
        let builder = Mdocx::new()
            .with_storage_root("/data")
            .storage_root_only()
            .with_image_width(200.0)
            .keep_aspect_ratio()
            .with_heading_template("Q{number} ({label})")
            .without_timestamp();

        let options = builder.options();
        assert_eq!(options.resolver.storage_root, std::path::PathBuf::from("/data"));
        assert!(!options.resolver.allow_absolute_paths);
        assert_eq!(options.render.image.width_pt, 200.0);
        assert!(options.render.image.keep_aspect);
        assert_eq!(options.layout.heading_template, "Q{number} ({label})");
        assert!(!options.timestamp);
    }

    #[test]
    fn test_format_inline() {
        let runs = format_inline("a *b*", ".");
        assert_eq!(runs, vec![InlineRun::plain("a "), InlineRun::italic("b")]);
    }

    #[test]
    fn test_convert_missing_file() {
        let err = convert_file("/nonexistent/input.md").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
