//! Media resources embedded in the output package.

use serde::{Deserialize, Serialize};

/// An embedded media part (image) of the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource ID referenced by pictures (e.g., "image1")
    pub id: String,

    /// Raw binary data
    #[serde(skip_serializing, default)]
    pub data: Vec<u8>,

    /// MIME type (e.g., "image/jpeg")
    pub mime_type: String,
}

impl Resource {
    /// Create an image resource.
    pub fn image(id: impl Into<String>, data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Get the size of the resource data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Part name inside the package media folder (e.g., "image1.png").
    pub fn part_name(&self) -> String {
        format!("{}.{}", self.id, self.extension())
    }

    /// Get the file extension based on MIME type.
    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }
}

/// File extension for an image MIME type; unknown types fall back to `png`.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpeg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/bmp" | "image/x-ms-bmp" => "bmp",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/tiff" => "tiff",
        _ => "png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_part_name() {
        let res = Resource::image("image1", vec![0xFF, 0xD8, 0xFF], "image/jpeg");
        assert_eq!(res.extension(), "jpeg");
        assert_eq!(res.part_name(), "image1.jpeg");
        assert_eq!(res.size(), 3);
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/svg+xml"), "svg");
        assert_eq!(extension_for_mime("IMAGE/PNG"), "png");
        assert_eq!(extension_for_mime("image/x-unknown"), "png");
    }
}
