//! Inline formatter for paragraph text.
//!
//! Splits raw paragraph text into styled runs. Constructs are tried in a
//! fixed priority order: image, inline code, bold, italic, plain. Each
//! matcher reports one of three outcomes so the formatter can tell "no
//! opener here" apart from "opener without a closer"; both fall back to
//! plain text.

use crate::model::InlineRun;
use crate::render::ImageSizing;
use crate::resolver::{ImageResolution, ImageSource};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("valid image regex"));

/// Outcome of a single matcher over a text segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scan {
    /// A complete construct was found.
    Matched(Span),
    /// No opener for this construct exists in the segment.
    Absent,
    /// An opener exists at the given byte offset but never closes.
    Unterminated(usize),
}

impl Scan {
    /// The matched span, if any.
    pub fn matched(self) -> Option<Span> {
        match self {
            Scan::Matched(span) => Some(span),
            _ => None,
        }
    }
}

/// Byte ranges of a matched construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Whole construct including delimiters
    pub outer: Range<usize>,
    /// Content between the delimiters (image reference for images)
    pub inner: Range<usize>,
    /// Alt text range, images only
    pub label: Option<Range<usize>>,
}

impl Span {
    fn delimited(outer: Range<usize>, inner: Range<usize>) -> Self {
        Self {
            outer,
            inner,
            label: None,
        }
    }
}

/// Find the first `![alt](reference)` in `text`.
pub fn scan_image(text: &str) -> Scan {
    match IMAGE.captures(text) {
        Some(caps) => {
            let (Some(outer), Some(alt), Some(reference)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                return Scan::Absent;
            };
            Scan::Matched(Span {
                outer: outer.range(),
                inner: reference.range(),
                label: Some(alt.range()),
            })
        }
        None => match text.find("![") {
            Some(at) => Scan::Unterminated(at),
            None => Scan::Absent,
        },
    }
}

/// Find the first `` `code` `` span with non-empty content.
pub fn scan_code(text: &str) -> Scan {
    let mut unterminated = None;
    let mut start = 0;

    while let Some(offset) = text[start..].find('`') {
        let open = start + offset;
        match text[open + 1..].find('`') {
            // Empty content; the second backtick may open the next span
            Some(0) => start = open + 1,
            Some(len) => {
                let close = open + 1 + len;
                return Scan::Matched(Span::delimited(open..close + 1, open + 1..close));
            }
            None => {
                unterminated.get_or_insert(open);
                break;
            }
        }
    }

    unterminated.map_or(Scan::Absent, Scan::Unterminated)
}

/// Find the first `**bold**` span.
///
/// Content is at least one character, never spans a line break, and ends
/// at the nearest following `**`.
pub fn scan_bold(text: &str) -> Scan {
    let bytes = text.as_bytes();
    let mut unterminated = None;

    for open in 0..bytes.len().saturating_sub(1) {
        if bytes[open] != b'*' || bytes[open + 1] != b'*' {
            continue;
        }
        let content = open + 2;
        let Some(first) = char_len_at(text, content) else {
            unterminated.get_or_insert(open);
            continue;
        };
        if bytes[content] == b'\n' {
            unterminated.get_or_insert(open);
            continue;
        }

        let mut k = content + first;
        let mut closed = None;
        while k < bytes.len() {
            match bytes[k] {
                b'\n' => break,
                b'*' if bytes.get(k + 1) == Some(&b'*') => {
                    closed = Some(k);
                    break;
                }
                _ => k += 1,
            }
        }

        match closed {
            Some(close) => return Scan::Matched(Span::delimited(open..close + 2, content..close)),
            None => {
                unterminated.get_or_insert(open);
            }
        }
    }

    unterminated.map_or(Scan::Absent, Scan::Unterminated)
}

/// Find the first `*italic*` span.
///
/// The opener is a lone `*` (no `*` on either side). Content is at least
/// one character and may contain `*`; the closer is the nearest `*` that is
/// not followed by another `*`.
pub fn scan_italic(text: &str) -> Scan {
    let bytes = text.as_bytes();
    let mut unterminated = None;

    for open in 0..bytes.len() {
        if bytes[open] != b'*' {
            continue;
        }
        if open > 0 && bytes[open - 1] == b'*' {
            continue;
        }
        let content = open + 1;
        match bytes.get(content) {
            Some(b'*') => continue,
            Some(b'\n') | None => {
                unterminated.get_or_insert(open);
                continue;
            }
            Some(_) => {}
        }
        let Some(first) = char_len_at(text, content) else {
            continue;
        };

        let mut k = content + first;
        let mut closed = None;
        while k < bytes.len() {
            match bytes[k] {
                b'\n' => break,
                b'*' if bytes.get(k + 1) != Some(&b'*') => {
                    closed = Some(k);
                    break;
                }
                _ => k += 1,
            }
        }

        match closed {
            Some(close) => return Scan::Matched(Span::delimited(open..close + 1, content..close)),
            None => {
                unterminated.get_or_insert(open);
            }
        }
    }

    unterminated.map_or(Scan::Absent, Scan::Unterminated)
}

fn char_len_at(text: &str, at: usize) -> Option<usize> {
    text.get(at..)?.chars().next().map(char::len_utf8)
}

/// Counters collected while formatting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatReport {
    /// Images embedded as picture runs
    pub images_embedded: u32,
    /// Image references kept as literal text
    pub images_unresolved: u32,
}

impl FormatReport {
    /// Merge counters from another report.
    pub fn merge(&mut self, other: FormatReport) {
        self.images_embedded += other.images_embedded;
        self.images_unresolved += other.images_unresolved;
    }
}

/// Splits paragraph text into styled inline runs.
///
/// Images are resolved through the given [`ImageSource`]; a reference that
/// cannot be resolved stays in the output as its literal markup.
///
/// # Example
///
/// ```
/// use mdocx::model::InlineRun;
/// use mdocx::parser::InlineFormatter;
/// use mdocx::resolver::ImageResolver;
///
/// let resolver = ImageResolver::with_root(".");
/// let formatter = InlineFormatter::new(&resolver);
/// let runs = formatter.format("Use `ls` and **bold**");
/// assert_eq!(
///     runs,
///     vec![
///         InlineRun::plain("Use "),
///         InlineRun::code("ls"),
///         InlineRun::plain(" and "),
///         InlineRun::bold("bold"),
///     ]
/// );
/// ```
pub struct InlineFormatter<'a> {
    images: &'a dyn ImageSource,
    sizing: ImageSizing,
}

impl<'a> InlineFormatter<'a> {
    /// Create a formatter with default picture sizing.
    pub fn new(images: &'a dyn ImageSource) -> Self {
        Self {
            images,
            sizing: ImageSizing::default(),
        }
    }

    /// Set picture sizing.
    pub fn with_sizing(mut self, sizing: ImageSizing) -> Self {
        self.sizing = sizing;
        self
    }

    /// Format text into runs.
    pub fn format(&self, text: &str) -> Vec<InlineRun> {
        self.format_with_report(text).0
    }

    /// Format text into runs and report image counters.
    pub fn format_with_report(&self, text: &str) -> (Vec<InlineRun>, FormatReport) {
        let mut out = Output::default();
        self.images_pass(text, &mut out);
        (out.runs, out.report)
    }

    fn images_pass(&self, text: &str, out: &mut Output) {
        let mut rest = text;
        while let Some(span) = scan_image(rest).matched() {
            self.images_pass(&rest[..span.outer.start], out);
            self.push_image(rest, &span, out);
            rest = &rest[span.outer.end..];
        }
        self.code_pass(rest, out);
    }

    fn push_image(&self, text: &str, span: &Span, out: &mut Output) {
        let alt = span.label.clone().map(|r| &text[r]).unwrap_or_default();
        let reference = &text[span.inner.clone()];

        match self.images.resolve(reference) {
            ImageResolution::Resolved(image) => {
                let (width_pt, height_pt) = self.sizing.display_size(&image.data);
                out.report.images_embedded += 1;
                out.runs.push(InlineRun::Image {
                    alt: alt.to_string(),
                    mime_type: image.mime_type,
                    data: image.data,
                    width_pt,
                    height_pt,
                });
            }
            ImageResolution::Unresolved(reason) => {
                log::debug!("Keeping image reference as text ({}): {}", reason, reference);
                out.report.images_unresolved += 1;
                out.push_plain(&text[span.outer.clone()]);
            }
        }
    }

    fn code_pass(&self, text: &str, out: &mut Output) {
        let mut rest = text;
        while let Some(span) = scan_code(rest).matched() {
            emphasis_pass(&rest[..span.outer.start], out);
            out.runs.push(InlineRun::code(&rest[span.inner.clone()]));
            rest = &rest[span.outer.end..];
        }
        emphasis_pass(rest, out);
    }
}

fn emphasis_pass(text: &str, out: &mut Output) {
    let mut rest = text;
    loop {
        if let Some(span) = scan_bold(rest).matched() {
            emphasis_pass(&rest[..span.outer.start], out);
            out.runs.push(InlineRun::bold(&rest[span.inner.clone()]));
            rest = &rest[span.outer.end..];
            continue;
        }
        if let Some(span) = scan_italic(rest).matched() {
            emphasis_pass(&rest[..span.outer.start], out);
            out.runs.push(InlineRun::italic(&rest[span.inner.clone()]));
            rest = &rest[span.outer.end..];
            continue;
        }
        out.push_plain(rest);
        return;
    }
}

#[derive(Default)]
struct Output {
    runs: Vec<InlineRun>,
    report: FormatReport,
}

impl Output {
    fn push_plain(&mut self, text: &str) {
        if !text.is_empty() {
            self.runs.push(InlineRun::plain(text));
        }
    }
}
