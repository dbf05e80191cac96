//! Export facade: question records or markdown in, DOCX bytes out.
//!
//! # Example
//!
//! ```no_run
//! use mdocx::export::{export_records, ExportOptions};
//! use mdocx::model::ExportRecord;
//!
//! fn main() -> mdocx::Result<()> {
//!     let records = vec![ExportRecord::new(2023, "What is **RAII**?").with_number(1)];
//!     let options = ExportOptions::new()
//!         .with_title("Systems Questions")
//!         .with_storage_root("/var/lib/questions");
//!
//!     let result = export_records(&records, &options)?;
//!     std::fs::write(&result.filename, &result.bytes)?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::error::{Error, Result};
use crate::model::{ExportRecord, Metadata};
use crate::render::{
    DocumentAssembler, DocumentWriter, DocxWriter, ExportResult, RecordLayout, RenderOptions,
};
use crate::resolver::{ImageResolver, ImageSource, ResolverOptions};

/// Default file name stem of record exports.
pub const DEFAULT_FILENAME_STEM: &str = "questions";

/// Options for an export call.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Image lookup
    pub resolver: ResolverOptions,

    /// Fonts, sizes and picture sizing
    pub render: RenderOptions,

    /// Record heading and section labels
    pub layout: RecordLayout,

    /// Optional level-1 document title
    pub title: Option<String>,

    /// Author written to the document properties
    pub author: Option<String>,

    /// File name stem
    pub filename_stem: String,

    /// Append `_YYYYMMDD_HHMMSS` to the file name
    pub timestamp: bool,
}

impl ExportOptions {
    /// Create new export options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage root for relative image paths.
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.resolver = self.resolver.with_storage_root(root);
        self
    }

    /// Set resolver options.
    pub fn with_resolver_options(mut self, options: ResolverOptions) -> Self {
        self.resolver = options;
        self
    }

    /// Set rendering options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render = options;
        self
    }

    /// Set the record layout.
    pub fn with_layout(mut self, layout: RecordLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the document author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the file name stem.
    pub fn with_filename_stem(mut self, stem: impl Into<String>) -> Self {
        self.filename_stem = stem.into();
        self
    }

    /// Enable or disable the file name timestamp.
    pub fn with_timestamp(mut self, timestamp: bool) -> Self {
        self.timestamp = timestamp;
        self
    }

    fn metadata(&self) -> Metadata {
        let mut metadata = match &self.title {
            Some(title) => Metadata::titled(title.clone()),
            None => Metadata::titled(self.filename_stem.clone()),
        };
        metadata.author = self.author.clone();
        metadata
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            resolver: ResolverOptions::default(),
            render: RenderOptions::default(),
            layout: RecordLayout::default(),
            title: None,
            author: None,
            filename_stem: DEFAULT_FILENAME_STEM.to_string(),
            timestamp: true,
        }
    }
}

/// Build the suggested file name: `{stem}_{YYYYMMDD_HHMMSS}.{ext}`, or
/// `{stem}.{ext}` without a timestamp.
pub fn export_filename(stem: &str, extension: &str, at: Option<DateTime<Local>>) -> String {
    let stem = stem.trim();
    let stem = if stem.is_empty() {
        DEFAULT_FILENAME_STEM
    } else {
        stem
    };
    match at {
        Some(at) => format!("{}_{}.{}", stem, at.format("%Y%m%d_%H%M%S"), extension),
        None => format!("{}.{}", stem, extension),
    }
}

/// Runs exports against a given image source and writer.
///
/// The free functions in this module use [`ImageResolver`] and
/// [`DocxWriter`]; construct an `Exporter` to plug in others.
pub struct Exporter<'a> {
    images: &'a dyn ImageSource,
    writer: &'a dyn DocumentWriter,
    options: &'a ExportOptions,
}

impl<'a> Exporter<'a> {
    /// Create an exporter.
    pub fn new(
        images: &'a dyn ImageSource,
        writer: &'a dyn DocumentWriter,
        options: &'a ExportOptions,
    ) -> Self {
        Self {
            images,
            writer,
            options,
        }
    }

    /// Export records in the supplied order.
    pub fn export_records(&self, records: &[ExportRecord]) -> Result<ExportResult> {
        let mut assembler = self.assembler()?;
        for record in records {
            assembler.push_record(record);
        }
        self.finish(assembler)
    }

    /// Export a single markdown document.
    pub fn export_markdown(&self, markdown: &str) -> Result<ExportResult> {
        let mut assembler = self.assembler()?;
        assembler.push_markdown(markdown);
        self.finish(assembler)
    }

    fn assembler(&self) -> Result<DocumentAssembler<'a>> {
        self.options.render.validate()?;

        let mut assembler = DocumentAssembler::new(self.images, self.options.render.clone())
            .with_layout(self.options.layout.clone())
            .with_metadata(self.options.metadata());
        if let Some(title) = &self.options.title {
            assembler.push_title(title);
        }
        Ok(assembler)
    }

    fn finish(&self, assembler: DocumentAssembler<'_>) -> Result<ExportResult> {
        let (doc, stats) = assembler.finish_with_stats();

        // The only fatal path: the writer either produces the whole package or nothing
        let bytes = self.writer.write(&doc).map_err(Error::export_failed)?;

        let at = self.options.timestamp.then(Local::now);
        let filename = export_filename(&self.options.filename_stem, self.writer.extension(), at);

        log::info!(
            "Exported {} ({} bytes, {} records, {} images, {} unresolved)",
            filename,
            bytes.len(),
            stats.record_count,
            stats.image_count,
            stats.unresolved_image_count
        );

        Ok(ExportResult::new(bytes, filename, stats).with_content_type(self.writer.content_type()))
    }
}

/// Export question records to a DOCX document.
pub fn export_records(records: &[ExportRecord], options: &ExportOptions) -> Result<ExportResult> {
    let resolver = ImageResolver::new(options.resolver.clone());
    let writer = DocxWriter::new();
    Exporter::new(&resolver, &writer, options).export_records(records)
}

/// Render a markdown document to DOCX.
pub fn markdown_to_docx(markdown: &str, options: &ExportOptions) -> Result<ExportResult> {
    let resolver = ImageResolver::new(options.resolver.clone());
    let writer = DocxWriter::new();
    Exporter::new(&resolver, &writer, options).export_markdown(markdown)
}

/// Parse records from JSON: an array of records or a single record object.
pub fn records_from_json(json: &str) -> Result<Vec<ExportRecord>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let records = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        _ => vec![serde_json::from_value(value)?],
    };
    Ok(records)
}

/// Export records on the blocking pool, giving up after `timeout`.
///
/// The export itself is synchronous; on timeout the blocking task is left
/// to finish and its result is discarded.
#[cfg(feature = "async")]
pub async fn export_records_with_timeout(
    records: Vec<ExportRecord>,
    options: ExportOptions,
    timeout: std::time::Duration,
) -> Result<ExportResult> {
    let task = tokio::task::spawn_blocking(move || export_records(&records, &options));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(Error::Other(format!("export task failed: {}", join_error))),
        Err(_) => Err(Error::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_export_filename() {
        let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(
            export_filename("questions", "docx", Some(at)),
            "questions_20240305_140709.docx"
        );
        assert_eq!(export_filename("notes", "docx", None), "notes.docx");
        assert_eq!(export_filename("  ", "docx", None), "questions.docx");
    }

    #[test]
    fn test_export_options_builder() {
        let options = ExportOptions::new()
            .with_title("Exam")
            .with_author("Ops")
            .with_filename_stem("exam")
            .with_timestamp(false)
            .with_storage_root("/srv/files");

        assert_eq!(options.title.as_deref(), Some("Exam"));
        assert_eq!(options.resolver.storage_root, PathBuf::from("/srv/files"));
        assert_eq!(options.metadata().author.as_deref(), Some("Ops"));
        assert!(!options.timestamp);
    }

    #[test]
    fn test_invalid_render_options_rejected() {
        let options =
            ExportOptions::new().with_render_options(RenderOptions::new().with_image_width(-1.0));
        let err = markdown_to_docx("text", &options).unwrap_err();
        assert!(matches!(err, Error::InvalidOption(_)));
    }

    #[test]
    fn test_records_from_json() {
        let records = records_from_json(
            r#"[{"year": 2020, "question_number": 1, "content": "A"},
                {"source": "Mock", "content": "B"}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].label.to_string(), "Mock");

        let single = records_from_json(r#"{"label": 2019, "content": "C"}"#).unwrap();
        assert_eq!(single.len(), 1);

        assert!(matches!(records_from_json("[1, 2]"), Err(Error::Json(_))));
    }

    #[test]
    fn test_export_without_timestamp() {
        let options = ExportOptions::new()
            .with_filename_stem("single")
            .with_timestamp(false);
        let result = markdown_to_docx("# Hi", &options).unwrap();
        assert_eq!(result.filename, "single.docx");
        assert_eq!(result.stats.heading_count, 1);
        assert!(result.bytes.starts_with(b"PK"));
    }
}
