//! Rendering: document assembly and DOCX serialization.

mod assembler;
mod docx;
mod json;
mod options;
mod result;

pub use assembler::{DocumentAssembler, RecordLayout};
pub use docx::{points_to_emu, DocumentWriter, DocxWriter, CODE_STYLE_ID, EMU_PER_POINT};
pub use json::{dump_blocks, to_json, BlockDump, JsonFormat};
pub use options::{
    ImageSizing, RenderOptions, DEFAULT_HEADING_SIZES, DEFAULT_IMAGE_HEIGHT_PT,
    DEFAULT_IMAGE_WIDTH_PT,
};
pub use result::{ExportResult, ExportStats, DOCX_CONTENT_TYPE};
