//! Rendering options and configuration.

use crate::detect::image_dimensions;
use crate::error::{Error, Result};

/// Font sizes (points) for heading levels 1-6. Levels 5 and 6 share a size.
pub const DEFAULT_HEADING_SIZES: [f32; 6] = [24.0, 20.0, 18.0, 16.0, 14.0, 14.0];

/// Default display width of embedded pictures, in points.
pub const DEFAULT_IMAGE_WIDTH_PT: f32 = 400.0;

/// Default display height of embedded pictures, in points.
pub const DEFAULT_IMAGE_HEIGHT_PT: f32 = 300.0;

/// Options for rendering blocks into document elements.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Font for body text runs
    pub body_font: Option<String>,

    /// Font for headings
    pub heading_font: Option<String>,

    /// Heading font sizes in points, indexed by level - 1
    pub heading_sizes: [f32; 6],

    /// Monospace font for code blocks and inline code
    pub code_font: String,

    /// Code block font size in points
    pub code_font_size: f32,

    /// Background fill for code (hex without `#`)
    pub code_shading: String,

    /// Picture display size
    pub image: ImageSizing,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the body font.
    pub fn with_body_font(mut self, font: impl Into<String>) -> Self {
        self.body_font = Some(font.into());
        self
    }

    /// Set the heading font.
    pub fn with_heading_font(mut self, font: impl Into<String>) -> Self {
        self.heading_font = Some(font.into());
        self
    }

    /// Set the code font.
    pub fn with_code_font(mut self, font: impl Into<String>) -> Self {
        self.code_font = font.into();
        self
    }

    /// Set the code shading color.
    pub fn with_code_shading(mut self, fill: impl Into<String>) -> Self {
        self.code_shading = fill.into().trim_start_matches('#').to_uppercase();
        self
    }

    /// Set heading sizes for levels 1-6.
    pub fn with_heading_sizes(mut self, sizes: [f32; 6]) -> Self {
        self.heading_sizes = sizes;
        self
    }

    /// Set picture sizing.
    pub fn with_image_sizing(mut self, sizing: ImageSizing) -> Self {
        self.image = sizing;
        self
    }

    /// Set the picture display width in points.
    pub fn with_image_width(mut self, width_pt: f32) -> Self {
        self.image.width_pt = width_pt;
        self
    }

    /// Font size for a heading level; levels outside 1-6 are clamped.
    pub fn heading_size(&self, level: u8) -> f32 {
        let index = level.clamp(1, 6) as usize - 1;
        self.heading_sizes[index]
    }

    /// Check option values.
    pub fn validate(&self) -> Result<()> {
        if self.heading_sizes.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(Error::InvalidOption(
                "heading sizes must be positive".to_string(),
            ));
        }
        if !(self.code_font_size.is_finite() && self.code_font_size > 0.0) {
            return Err(Error::InvalidOption(
                "code font size must be positive".to_string(),
            ));
        }
        if self.code_shading.len() != 6 || !self.code_shading.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(Error::InvalidOption(format!(
                "code shading must be a 6-digit hex color, got {:?}",
                self.code_shading
            )));
        }
        self.image.validate()
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            body_font: Some("Microsoft YaHei".to_string()),
            heading_font: Some("Microsoft YaHei".to_string()),
            heading_sizes: DEFAULT_HEADING_SIZES,
            code_font: "Consolas".to_string(),
            code_font_size: 10.0,
            code_shading: "F5F5F5".to_string(),
            image: ImageSizing::default(),
        }
    }
}

/// Display size of embedded pictures.
///
/// Width is always fixed. Height is fixed unless `keep_aspect` is set and
/// the pixel size can be read from the image header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSizing {
    /// Display width in points
    pub width_pt: f32,

    /// Display height in points (fixed, or fallback when scaling)
    pub height_pt: f32,

    /// Scale height by the source aspect ratio
    pub keep_aspect: bool,
}

impl ImageSizing {
    /// Fixed width and height.
    pub fn fixed(width_pt: f32, height_pt: f32) -> Self {
        Self {
            width_pt,
            height_pt,
            keep_aspect: false,
        }
    }

    /// Fixed width, height scaled by aspect ratio.
    pub fn scale_to_width(width_pt: f32) -> Self {
        Self {
            width_pt,
            height_pt: DEFAULT_IMAGE_HEIGHT_PT,
            keep_aspect: true,
        }
    }

    /// Display `(width, height)` in points for the given image bytes.
    pub fn display_size(&self, data: &[u8]) -> (f32, f32) {
        if self.keep_aspect {
            if let Some((w, h)) = image_dimensions(data) {
                return (self.width_pt, self.width_pt * h as f32 / w as f32);
            }
        }
        (self.width_pt, self.height_pt)
    }

    fn validate(&self) -> Result<()> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(self.width_pt) || !valid(self.height_pt) {
            return Err(Error::InvalidOption(format!(
                "image size must be positive, got {}x{}",
                self.width_pt, self.height_pt
            )));
        }
        Ok(())
    }
}

impl Default for ImageSizing {
    fn default() -> Self {
        Self::fixed(DEFAULT_IMAGE_WIDTH_PT, DEFAULT_IMAGE_HEIGHT_PT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_builder() {
        let options = RenderOptions::new()
            .with_body_font("Arial")
            .with_code_font("Courier New")
            .with_code_shading("#eeeeee")
            .with_image_width(320.0);

        assert_eq!(options.body_font.as_deref(), Some("Arial"));
        assert_eq!(options.code_font, "Courier New");
        assert_eq!(options.code_shading, "EEEEEE");
        assert_eq!(options.image.width_pt, 320.0);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_heading_size_table() {
        let options = RenderOptions::default();
        assert_eq!(options.heading_size(1), 24.0);
        assert_eq!(options.heading_size(2), 20.0);
        assert_eq!(options.heading_size(3), 18.0);
        assert_eq!(options.heading_size(4), 16.0);
        assert_eq!(options.heading_size(5), 14.0);
        assert_eq!(options.heading_size(6), 14.0);
        assert_eq!(options.heading_size(9), 14.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let options = RenderOptions::new().with_image_width(0.0);
        assert!(matches!(options.validate(), Err(Error::InvalidOption(_))));

        let options = RenderOptions::new().with_code_shading("grey");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_fixed_sizing_ignores_pixels() {
        let sizing = ImageSizing::default();
        assert_eq!(sizing.display_size(b"GIF89a\x0A\x00\x0A\x00"), (400.0, 300.0));
    }

    #[test]
    fn test_scaled_sizing() {
        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(200, 100)
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();

        let sizing = ImageSizing::scale_to_width(400.0);
        assert_eq!(sizing.display_size(png.get_ref()), (400.0, 200.0));
        // Unknown format falls back to the fixed height
        assert_eq!(sizing.display_size(b"????"), (400.0, DEFAULT_IMAGE_HEIGHT_PT));
    }
}
