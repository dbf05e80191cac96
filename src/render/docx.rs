//! WordprocessingML (DOCX) package writer.
//!
//! Serializes an [`OutputDocument`] into a zip package with the minimum part
//! set Word needs: content types, package and document relationships, core
//! properties, styles, the main document and one media part per image.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::model::{
    Element, InlineContent, Metadata, OutputDocument, Paragraph, Picture,
    Resource, TextRun,
};

use super::result::DOCX_CONTENT_TYPE;

/// EMUs per point in DrawingML.
pub const EMU_PER_POINT: f64 = 12700.0;

/// Paragraph style ID of code blocks.
pub const CODE_STYLE_ID: &str = "Code";

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Convert points to EMUs.
pub fn points_to_emu(points: f32) -> i64 {
    (points as f64 * EMU_PER_POINT).round() as i64
}

/// Serializes an assembled document into a binary package.
///
/// Implement this trait to target another word-processor format.
pub trait DocumentWriter: Send + Sync {
    /// Name of this writer.
    fn name(&self) -> &str;

    /// Serialize the document. Any fault aborts the whole write.
    fn write(&self, doc: &OutputDocument) -> Result<Vec<u8>>;

    /// MIME type of the produced bytes.
    fn content_type(&self) -> &'static str;

    /// File extension without the leading dot.
    fn extension(&self) -> &str;
}

/// DOCX package writer.
///
/// # Example
///
/// ```
/// use mdocx::model::{Element, OutputDocument, Paragraph};
/// use mdocx::render::{DocumentWriter, DocxWriter};
///
/// let mut doc = OutputDocument::new();
/// doc.push(Element::Paragraph(Paragraph::with_text("Hello")));
///
/// let bytes = DocxWriter::new().write(&doc)?;
/// assert!(bytes.starts_with(b"PK"));
/// # Ok::<(), mdocx::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocxWriter {
    compression_level: Option<i64>,
}

impl DocxWriter {
    /// Create a new writer with default compression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deflate level for XML parts (0-9).
    pub fn with_compression_level(mut self, level: i64) -> Self {
        self.compression_level = Some(level.clamp(0, 9));
        self
    }

    fn write_package(&self, doc: &OutputDocument) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(self.compression_level);
        // Image formats are already compressed
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        let body = document_xml(doc)?;

        zip.start_file("[Content_Types].xml", deflated)?;
        zip.write_all(content_types_xml(&doc.resources).as_bytes())?;

        zip.start_file("_rels/.rels", deflated)?;
        zip.write_all(package_rels_xml().as_bytes())?;

        zip.start_file("docProps/core.xml", deflated)?;
        zip.write_all(core_xml(&doc.metadata).as_bytes())?;

        zip.start_file("word/document.xml", deflated)?;
        zip.write_all(body.as_bytes())?;

        zip.start_file("word/styles.xml", deflated)?;
        zip.write_all(styles_xml().as_bytes())?;

        zip.start_file("word/_rels/document.xml.rels", deflated)?;
        zip.write_all(document_rels_xml(&doc.resources).as_bytes())?;

        for resource in &doc.resources {
            zip.start_file(format!("word/media/{}", resource.part_name()), stored)?;
            zip.write_all(&resource.data)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

impl DocumentWriter for DocxWriter {
    fn name(&self) -> &str {
        "docx"
    }

    fn write(&self, doc: &OutputDocument) -> Result<Vec<u8>> {
        let bytes = self.write_package(doc)?;
        log::debug!(
            "Wrote DOCX package: {} bytes, {} media parts",
            bytes.len(),
            doc.resources.len()
        );
        Ok(bytes)
    }

    fn content_type(&self) -> &'static str {
        DOCX_CONTENT_TYPE
    }

    fn extension(&self) -> &str {
        "docx"
    }
}

/// Relationship ID of a media resource in `document.xml.rels`.
fn relationship_id(resource_id: &str) -> String {
    format!("rId_{}", resource_id)
}

/// Drop characters XML 1.0 cannot carry, then escape markup.
fn xml_text(text: &str) -> Cow<'_, str> {
    let invalid = |c: char| c < ' ' && c != '\t' && c != '\n';
    if text.chars().any(invalid) {
        let cleaned: String = text.chars().filter(|c| !invalid(*c)).collect();
        Cow::Owned(escape(cleaned.as_str()).into_owned())
    } else {
        escape(text)
    }
}

fn content_types_xml(resources: &[Resource]) -> String {
    let mut media: BTreeMap<&str, &str> = BTreeMap::new();
    for resource in resources {
        media
            .entry(resource.extension())
            .or_insert(resource.mime_type.as_str());
    }

    let mut xml = String::from(XML_DECL);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    for (extension, mime_type) in media {
        xml.push_str(&format!(
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            xml_text(extension),
            xml_text(mime_type)
        ));
    }
    xml.push_str(r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
    xml.push_str("</Types>");
    xml
}

fn package_rels_xml() -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    xml.push_str(&format!(
        r#"<Relationship Id="rId1" Type="{}/officeDocument" Target="word/document.xml"/>"#,
        REL_BASE
    ));
    xml.push_str(r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#);
    xml.push_str("</Relationships>");
    xml
}

fn document_rels_xml(resources: &[Resource]) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    xml.push_str(&format!(
        r#"<Relationship Id="rId1" Type="{}/styles" Target="styles.xml"/>"#,
        REL_BASE
    ));
    for resource in resources {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}/image" Target="media/{}"/>"#,
            relationship_id(&resource.id),
            REL_BASE,
            xml_text(&resource.part_name())
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn w3c_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn core_xml(metadata: &Metadata) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(concat!(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties""#,
        r#" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/""#,
        r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#
    ));

    let fields = [
        ("dc:title", &metadata.title),
        ("dc:creator", &metadata.author),
        ("dc:subject", &metadata.subject),
        ("cp:keywords", &metadata.keywords),
    ];
    for (tag, value) in fields {
        if let Some(value) = value {
            xml.push_str(&format!("<{tag}>{}</{tag}>", xml_text(value)));
        }
    }
    if let Some(created) = &metadata.created {
        xml.push_str(&format!(
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>"#,
            w3c_date(created)
        ));
    }
    if let Some(modified) = &metadata.modified {
        xml.push_str(&format!(
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{}</dcterms:modified>"#,
            w3c_date(modified)
        ));
    }

    xml.push_str("</cp:coreProperties>");
    xml
}

fn styles_xml() -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(&format!(r#"<w:styles xmlns:w="{}">"#, NS_W));
    xml.push_str(concat!(
        r#"<w:docDefaults><w:rPrDefault><w:rPr><w:sz w:val="22"/><w:szCs w:val="22"/>"#,
        r#"</w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120" w:line="276" w:lineRule="auto"/>"#,
        r#"</w:pPr></w:pPrDefault></w:docDefaults>"#,
        r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#
    ));
    for level in 1..=6u8 {
        xml.push_str(&format!(
            concat!(
                r#"<w:style w:type="paragraph" w:styleId="Heading{0}"><w:name w:val="heading {0}"/>"#,
                r#"<w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/>"#,
                r#"<w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="{1}"/></w:pPr>"#,
                r#"<w:rPr><w:b/></w:rPr></w:style>"#
            ),
            level,
            level - 1
        ));
    }
    xml.push_str(&format!(
        concat!(
            r#"<w:style w:type="paragraph" w:customStyle="1" w:styleId="{0}"><w:name w:val="{0}"/>"#,
            r#"<w:basedOn w:val="Normal"/><w:pPr><w:spacing w:after="0" w:line="240" w:lineRule="auto"/></w:pPr>"#,
            r#"<w:rPr><w:rFonts w:ascii="Consolas" w:hAnsi="Consolas" w:cs="Consolas"/><w:sz w:val="20"/></w:rPr></w:style>"#
        ),
        CODE_STYLE_ID
    ));
    xml.push_str("</w:styles>");
    xml
}

fn document_xml(doc: &OutputDocument) -> Result<String> {
    let mut xml = String::from(XML_DECL);
    xml.push_str(&format!(
        r#"<w:document xmlns:w="{}" xmlns:r="{}" xmlns:wp="{}" xmlns:a="{}" xmlns:pic="{}"><w:body>"#,
        NS_W, NS_R, NS_WP, NS_A, NS_PIC
    ));

    let mut body = BodyWriter {
        doc,
        xml: &mut xml,
        next_drawing_id: 1,
    };
    for element in &doc.elements {
        body.element(element)?;
    }

    // A4 portrait, one-inch margins
    xml.push_str(concat!(
        r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/>"#,
        r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/>"#,
        r#"</w:sectPr></w:body></w:document>"#
    ));
    Ok(xml)
}

struct BodyWriter<'a> {
    doc: &'a OutputDocument,
    xml: &'a mut String,
    next_drawing_id: u32,
}

impl BodyWriter<'_> {
    fn element(&mut self, element: &Element) -> Result<()> {
        match element {
            Element::Heading { level, run } => {
                self.xml.push_str(&format!(
                    r#"<w:p><w:pPr><w:pStyle w:val="Heading{}"/></w:pPr>"#,
                    level
                ));
                self.run(run);
                self.xml.push_str("</w:p>");
            }
            Element::Paragraph(paragraph) => self.paragraph(paragraph)?,
            Element::Code(run) => {
                self.xml.push_str(&format!(
                    r#"<w:p><w:pPr><w:pStyle w:val="{}"/>"#,
                    CODE_STYLE_ID
                ));
                if let Some(fill) = &run.style.shading {
                    self.xml.push_str(&shading(fill));
                }
                self.xml.push_str("</w:pPr>");
                self.run(run);
                self.xml.push_str("</w:p>");
            }
            Element::Rule => {
                self.xml.push_str(concat!(
                    r#"<w:p><w:pPr><w:pBdr>"#,
                    r#"<w:bottom w:val="single" w:sz="6" w:space="1" w:color="auto"/>"#,
                    r#"</w:pBdr></w:pPr></w:p>"#
                ));
            }
        }
        Ok(())
    }

    fn paragraph(&mut self, paragraph: &Paragraph) -> Result<()> {
        self.xml.push_str("<w:p>");
        for content in &paragraph.content {
            match content {
                InlineContent::Text(run) => self.run(run),
                InlineContent::Picture(picture) => self.picture(picture)?,
            }
        }
        self.xml.push_str("</w:p>");
        Ok(())
    }

    fn run(&mut self, run: &TextRun) {
        if run.is_empty() {
            return;
        }
        self.xml.push_str("<w:r>");
        self.run_properties(run);

        for (i, line) in run.text.split('\n').enumerate() {
            if i > 0 {
                self.xml.push_str("<w:br/>");
            }
            if !line.is_empty() {
                self.xml.push_str(&format!(
                    r#"<w:t xml:space="preserve">{}</w:t>"#,
                    xml_text(line)
                ));
            }
        }
        self.xml.push_str("</w:r>");
    }

    fn run_properties(&mut self, run: &TextRun) {
        let style = &run.style;
        let font = style
            .font_name
            .as_deref()
            .or(style.monospace.then_some("Courier New"));
        if font.is_none()
            && !style.bold
            && !style.italic
            && style.font_size.is_none()
            && style.shading.is_none()
        {
            return;
        }

        // Child order follows the CT_RPr schema sequence
        self.xml.push_str("<w:rPr>");
        if let Some(font) = font {
            let font = xml_text(font);
            self.xml.push_str(&format!(
                r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:eastAsia="{0}" w:cs="{0}"/>"#,
                font
            ));
        }
        if style.bold {
            self.xml.push_str("<w:b/>");
        }
        if style.italic {
            self.xml.push_str("<w:i/>");
        }
        if let Some(size) = style.font_size {
            let half_points = (size * 2.0).round() as u32;
            self.xml.push_str(&format!(
                r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#,
                half_points
            ));
        }
        if let Some(fill) = &style.shading {
            self.xml.push_str(&shading(fill));
        }
        self.xml.push_str("</w:rPr>");
    }

    fn picture(&mut self, picture: &Picture) -> Result<()> {
        let resource = self.doc.get_resource(&picture.resource_id).ok_or_else(|| {
            Error::Other(format!(
                "picture references missing resource {}",
                picture.resource_id
            ))
        })?;

        let id = self.next_drawing_id;
        self.next_drawing_id += 1;
        let cx = points_to_emu(picture.width_pt);
        let cy = points_to_emu(picture.height_pt);
        let alt = xml_text(&picture.alt);
        let rel = relationship_id(&resource.id);
        let name = xml_text(&resource.part_name()).into_owned();

        self.xml.push_str(&format!(
            concat!(
                r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
                r#"<wp:docPr id="{id}" name="Picture {id}" descr="{alt}"/>"#,
                r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
                r#"<a:graphic><a:graphicData uri="{ns_pic}"><pic:pic>"#,
                r#"<pic:nvPicPr><pic:cNvPr id="{id}" name="{name}" descr="{alt}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
                r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
            ),
            cx = cx,
            cy = cy,
            id = id,
            alt = alt,
            ns_pic = NS_PIC,
            name = name,
            rel = rel,
        ));
        Ok(())
    }
}

fn shading(fill: &str) -> String {
    format!(
        r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#,
        xml_text(fill)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextStyle;
    use std::io::Read;
    use zip::ZipArchive;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    fn sample_doc() -> OutputDocument {
        let mut doc = OutputDocument::new();
        doc.metadata = Metadata::titled("Sample & Co");
        doc.push(Element::Heading {
            level: 1,
            run: TextRun::bold("Title").with_style(TextStyle {
                bold: true,
                font_size: Some(24.0),
                ..Default::default()
            }),
        });
        let mut p = Paragraph::with_text("a < b\nnext");
        let id = doc.add_resource(vec![0x89, b'P', b'N', b'G'], "image/png");
        p.add_picture(Picture {
            resource_id: id,
            alt: "fig".to_string(),
            width_pt: 400.0,
            height_pt: 300.0,
        });
        doc.push(Element::Paragraph(p));
        doc.push(Element::Rule);
        doc
    }

    #[test]
    fn test_points_to_emu() {
        assert_eq!(points_to_emu(400.0), 5_080_000);
        assert_eq!(points_to_emu(300.0), 3_810_000);
    }

    #[test]
    fn test_package_parts() {
        let bytes = DocxWriter::new().write(&sample_doc()).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<_> = archive.file_names().collect();

        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "word/document.xml",
            "word/styles.xml",
            "word/_rels/document.xml.rels",
            "word/media/image1.png",
        ] {
            assert!(names.contains(&part), "missing part {}", part);
        }
    }

    #[test]
    fn test_document_xml_content() {
        let bytes = DocxWriter::new().write(&sample_doc()).unwrap();
        let xml = read_part(&bytes, "word/document.xml");

        assert!(xml.contains(r#"<w:pStyle w:val="Heading1"/>"#));
        assert!(xml.contains(r#"<w:b/><w:sz w:val="48"/>"#));
        assert!(xml.contains("a &lt; b</w:t><w:br/>"));
        assert!(xml.contains(r#"<wp:extent cx="5080000" cy="3810000"/>"#));
        assert!(xml.contains(r#"r:embed="rId_image1""#));
        assert!(xml.contains(r#"<w:bottom w:val="single" w:sz="6" w:space="1" w:color="auto"/>"#));

        let rels = read_part(&bytes, "word/_rels/document.xml.rels");
        assert!(rels.contains(r#"Id="rId_image1""#));
        assert!(rels.contains(r#"Target="media/image1.png""#));

        let types = read_part(&bytes, "[Content_Types].xml");
        assert!(types.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));

        let core = read_part(&bytes, "docProps/core.xml");
        assert!(core.contains("<dc:title>Sample &amp; Co</dc:title>"));
    }

    #[test]
    fn test_plain_paragraph_has_no_properties() {
        let mut doc = OutputDocument::new();
        let mut p = Paragraph::with_text("plain");
        p.add_run(TextRun::bold("strong"));
        doc.push(Element::Paragraph(p));
        doc.push(Element::Rule);

        let bytes = DocxWriter::new().write(&doc).unwrap();
        let xml = read_part(&bytes, "word/document.xml");

        assert!(xml.contains(r#"<w:p><w:r><w:t xml:space="preserve">plain</w:t></w:r>"#));
        assert!(xml.contains(r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">strong</w:t></w:r></w:p>"#));
        assert_eq!(xml.matches("<w:pPr>").count(), 1);
        assert!(xml.contains(r#"<w:pPr><w:pBdr><w:bottom w:val="single""#));
    }

    #[test]
    fn test_missing_resource_fails() {
        let mut doc = OutputDocument::new();
        let mut p = Paragraph::new();
        p.add_picture(Picture {
            resource_id: "image9".to_string(),
            alt: String::new(),
            width_pt: 1.0,
            height_pt: 1.0,
        });
        doc.push(Element::Paragraph(p));

        assert!(matches!(DocxWriter::new().write(&doc), Err(Error::Other(_))));
    }

    #[test]
    fn test_control_characters_dropped() {
        assert_eq!(xml_text("a\u{1}b\tc"), "ab\tc");
        assert_eq!(xml_text("\"q\""), "&quot;q&quot;");
    }

    #[test]
    fn test_writer_metadata() {
        let writer = DocxWriter::new().with_compression_level(12);
        assert_eq!(writer.extension(), "docx");
        assert_eq!(writer.name(), "docx");
        assert_eq!(writer.content_type(), DOCX_CONTENT_TYPE);
    }
}
