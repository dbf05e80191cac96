//! Image format and pixel-size detection from header bytes.
//!
//! Used to scale picture height by the source aspect ratio. Format sniffing
//! looks at magic bytes only; dimensions come from the `image` header
//! decoders, so no pixel data is decoded.

use std::io::Cursor;

use image::ImageReader;

/// Image container formats recognised from magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Portable Network Graphics
    Png,
    /// JPEG / JFIF
    Jpeg,
    /// GIF87a / GIF89a
    Gif,
    /// Windows bitmap
    Bmp,
    /// WebP (RIFF container)
    Webp,
}

impl ImageFormat {
    /// Canonical MIME type of the format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Webp => "image/webp",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageFormat::Png => write!(f, "PNG"),
            ImageFormat::Jpeg => write!(f, "JPEG"),
            ImageFormat::Gif => write!(f, "GIF"),
            ImageFormat::Bmp => write!(f, "BMP"),
            ImageFormat::Webp => write!(f, "WebP"),
        }
    }
}

const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Detect the image format from magic bytes.
///
/// # Example
/// ```
/// use mdocx::detect::{detect_image_format, ImageFormat};
///
/// assert_eq!(detect_image_format(b"GIF89a\x01\x00\x01\x00"), Some(ImageFormat::Gif));
/// assert_eq!(detect_image_format(b"plain text"), None);
/// ```
pub fn detect_image_format(data: &[u8]) -> Option<ImageFormat> {
    if data.starts_with(PNG_MAGIC) {
        return Some(ImageFormat::Png);
    }
    if data.starts_with(JPEG_MAGIC) {
        return Some(ImageFormat::Jpeg);
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some(ImageFormat::Gif);
    }
    if data.starts_with(b"BM") && data.len() >= 26 {
        return Some(ImageFormat::Bmp);
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some(ImageFormat::Webp);
    }
    None
}

/// Read the pixel dimensions `(width, height)` from an image header.
///
/// Only the header is decoded. Returns `None` for unknown formats, corrupt
/// headers or zero sizes.
pub fn image_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?;
    let (width, height) = match reader.into_dimensions() {
        Ok(dims) => dims,
        Err(e) => {
            log::debug!("Unreadable image header: {}", e);
            return None;
        }
    };

    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}
