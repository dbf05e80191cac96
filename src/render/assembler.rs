//! Document assembly from markdown blocks and question records.

use crate::model::{
    Block, Element, ExportRecord, InlineRun, Metadata, OutputDocument, Paragraph, Picture,
    TextRun, TextStyle,
};
use crate::parser::{parse_blocks, InlineFormatter};
use crate::resolver::ImageSource;

use super::{ExportStats, RenderOptions};

/// Layout of one exported record.
#[derive(Debug, Clone)]
pub struct RecordLayout {
    /// Heading text; `{label}` and `{number}` are substituted
    pub heading_template: String,

    /// Heading level of each record
    pub heading_level: u8,

    /// Bold label before the options section
    pub options_label: String,

    /// Bold label before the answer section
    pub answer_label: String,
}

impl RecordLayout {
    /// Create a layout with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the heading template.
    pub fn with_heading_template(mut self, template: impl Into<String>) -> Self {
        self.heading_template = template.into();
        self
    }

    /// Set the options section label.
    pub fn with_options_label(mut self, label: impl Into<String>) -> Self {
        self.options_label = label.into();
        self
    }

    /// Set the answer section label.
    pub fn with_answer_label(mut self, label: impl Into<String>) -> Self {
        self.answer_label = label.into();
        self
    }

    /// Heading text for a record. Records without a number use the bare label.
    pub fn heading_for(&self, record: &ExportRecord) -> String {
        match record.number {
            Some(number) => self
                .heading_template
                .replace("{label}", &record.label.to_string())
                .replace("{number}", &number.to_string()),
            None => record.label.to_string(),
        }
    }
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self {
            heading_template: "{label} Question {number}".to_string(),
            heading_level: 2,
            options_label: "Options:".to_string(),
            answer_label: "Answer:".to_string(),
        }
    }
}

/// Builds an [`OutputDocument`] element by element.
///
/// Elements are only ever appended. Paragraph text goes through the inline
/// formatter; code blocks are emitted verbatim.
pub struct DocumentAssembler<'a> {
    images: &'a dyn ImageSource,
    options: RenderOptions,
    layout: RecordLayout,
    doc: OutputDocument,
    stats: ExportStats,
}

impl<'a> DocumentAssembler<'a> {
    /// Create an assembler resolving images through `images`.
    pub fn new(images: &'a dyn ImageSource, options: RenderOptions) -> Self {
        Self {
            images,
            options,
            layout: RecordLayout::default(),
            doc: OutputDocument::new(),
            stats: ExportStats::new(),
        }
    }

    /// Set the record layout.
    pub fn with_layout(mut self, layout: RecordLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set document metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.doc.metadata = metadata;
        self
    }

    /// Statistics so far.
    pub fn stats(&self) -> &ExportStats {
        &self.stats
    }

    /// Append a level-1 document title.
    pub fn push_title(&mut self, title: &str) {
        if self.doc.metadata.title.is_none() {
            self.doc.metadata.title = Some(title.to_string());
        }
        self.push_heading(1, title);
    }

    /// Append a heading.
    pub fn push_heading(&mut self, level: u8, text: &str) {
        let level = level.clamp(1, 6);
        let style = TextStyle {
            bold: true,
            font_name: self.options.heading_font.clone(),
            font_size: Some(self.options.heading_size(level)),
            ..Default::default()
        };

        self.stats.add_heading();
        self.stats.count_text(text);
        self.doc.push(Element::Heading {
            level,
            run: TextRun::new(text).with_style(style),
        });
    }

    /// Scan markdown and append its blocks.
    pub fn push_markdown(&mut self, markdown: &str) {
        for block in parse_blocks(markdown) {
            self.push_block(&block);
        }
    }

    /// Append one block.
    pub fn push_block(&mut self, block: &Block) {
        match block {
            Block::Heading { level, text } => self.push_heading(*level, text),
            Block::CodeBlock { lines } => self.push_code(&lines.join("\n")),
            Block::Paragraph { raw_text } => self.push_paragraph(raw_text),
        }
    }

    /// Append a shaded monospace code paragraph.
    pub fn push_code(&mut self, code: &str) {
        let style = TextStyle {
            monospace: true,
            font_name: Some(self.options.code_font.clone()),
            font_size: Some(self.options.code_font_size),
            shading: Some(self.options.code_shading.clone()),
            ..Default::default()
        };

        self.stats.add_code_block();
        self.stats.count_text(code);
        self.doc.push(Element::Code(TextRun::new(code).with_style(style)));
    }

    /// Format paragraph text and append it.
    pub fn push_paragraph(&mut self, raw_text: &str) {
        let mut paragraph = Paragraph::new();
        self.append_inline(&mut paragraph, raw_text);
        self.finish_paragraph(paragraph);
    }

    /// Append a paragraph holding one bold run.
    pub fn push_label(&mut self, label: &str) {
        let mut paragraph = Paragraph::new();
        paragraph.add_run(self.body_run(TextRun::bold(label)));
        self.finish_paragraph(paragraph);
    }

    /// Append a horizontal rule.
    pub fn push_rule(&mut self) {
        self.stats.add_rule();
        self.doc.push(Element::Rule);
    }

    /// Append a question record. Consecutive records are separated by a rule.
    pub fn push_record(&mut self, record: &ExportRecord) {
        if self.stats.record_count > 0 {
            self.push_rule();
        }
        self.stats.add_record();

        let heading = self.layout.heading_for(record);
        self.push_heading(self.layout.heading_level, &heading);

        if let Some(title) = record.title.as_deref().filter(|t| !t.trim().is_empty()) {
            self.push_label(title.trim());
        }

        self.push_markdown(&record.content);

        if record.has_options() {
            let label = self.layout.options_label.clone();
            self.push_label(&label);
            match record.option_entries() {
                Some(entries) => {
                    for (key, text) in entries {
                        self.push_option(&key, &text);
                    }
                }
                None => {
                    if let Some(options) = record.options.as_deref() {
                        self.push_markdown(options);
                    }
                }
            }
        }

        if let Some(answer) = record.answer.as_deref().filter(|a| !a.trim().is_empty()) {
            let label = self.layout.answer_label.clone();
            self.push_label(&label);
            self.push_markdown(answer);
        }
    }

    /// Finish assembly and return the document.
    pub fn finish(self) -> OutputDocument {
        self.finish_with_stats().0
    }

    /// Finish assembly and return the document with statistics.
    pub fn finish_with_stats(self) -> (OutputDocument, ExportStats) {
        log::debug!(
            "Assembled {} elements, {} pictures",
            self.doc.elements.len(),
            self.doc.resources.len()
        );
        (self.doc, self.stats)
    }

    fn push_option(&mut self, key: &str, text: &str) {
        let mut paragraph = Paragraph::new();
        paragraph.add_run(self.body_run(TextRun::bold(format!("{}. ", key))));
        self.append_inline(&mut paragraph, text);
        self.finish_paragraph(paragraph);
    }

    fn finish_paragraph(&mut self, paragraph: Paragraph) {
        if paragraph.is_empty() {
            return;
        }
        self.stats.add_paragraph();
        self.stats.count_text(&paragraph.plain_text());
        self.doc.push(Element::Paragraph(paragraph));
    }

    fn append_inline(&mut self, paragraph: &mut Paragraph, text: &str) {
        let formatter = InlineFormatter::new(self.images).with_sizing(self.options.image);
        let (runs, report) = formatter.format_with_report(text);
        self.stats
            .add_images(report.images_embedded, report.images_unresolved);

        for run in runs {
            match run {
                InlineRun::Plain { text } => paragraph.add_run(self.body_run(TextRun::new(text))),
                InlineRun::Bold { text } => paragraph.add_run(self.body_run(TextRun::bold(text))),
                InlineRun::Italic { text } => {
                    paragraph.add_run(self.body_run(TextRun::italic(text)))
                }
                InlineRun::Code { text } => {
                    let style = TextStyle {
                        monospace: true,
                        font_name: Some(self.options.code_font.clone()),
                        shading: Some(self.options.code_shading.clone()),
                        ..Default::default()
                    };
                    paragraph.add_run(TextRun::new(text).with_style(style));
                }
                InlineRun::Image {
                    alt,
                    mime_type,
                    data,
                    width_pt,
                    height_pt,
                } => {
                    let resource_id = self.doc.add_resource(data, mime_type);
                    paragraph.add_picture(Picture {
                        resource_id,
                        alt,
                        width_pt,
                        height_pt,
                    });
                }
            }
        }
    }

    fn body_run(&self, mut run: TextRun) -> TextRun {
        run.style.font_name = self.options.body_font.clone();
        run
    }
}
