//! Document model types.
//!
//! The model has two halves: the markdown side (`Block`, `InlineRun`,
//! `ExportRecord`) produced by scanning and formatting, and the output side
//! (`OutputDocument` and its elements) consumed by the binary writer.

mod block;
mod document;
mod inline;
mod paragraph;
mod record;
mod resource;

pub use block::Block;
pub use document::{Element, Metadata, OutputDocument};
pub use inline::InlineRun;
pub use paragraph::{InlineContent, Paragraph, Picture, TextRun, TextStyle};
pub use record::{ExportRecord, RecordLabel};
pub use resource::{extension_for_mime, Resource};
