//! Image reference resolution.
//!
//! Turns the `ref` part of `![alt](ref)` into decoded bytes plus a MIME
//! type. Supported reference forms:
//!
//! - data URIs: `data:image/png;base64,iVBOR...`
//! - absolute URLs: `http://host/uploads/a.png?v=2` (host discarded)
//! - root-relative or bare paths: `/uploads/a.png`, `uploads/a.png`
//! - absolute filesystem paths, when enabled
//!
//! Resolution never fails with an error: anything that cannot be read is
//! reported as [`ImageResolution::Unresolved`] with a reason.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use std::path::{Component, Path, PathBuf};

static DATA_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^data:(image/[A-Za-z0-9.+-]+);base64,(.+)$").expect("valid data URI regex")
});

/// A successfully resolved image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// MIME type (e.g., "image/png")
    pub mime_type: String,

    /// Decoded image bytes
    pub data: Vec<u8>,
}

/// Why an image reference could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// The reference is blank
    EmptyReference,
    /// A `data:` reference that is not a base64 image
    InvalidDataUri,
    /// The base64 payload does not decode
    InvalidBase64,
    /// An `http(s)://` URL without a path
    InvalidUrl,
    /// The path climbs out of the storage root
    OutsideStorageRoot,
    /// No file at the resolved location
    NotFound,
    /// The file exists but could not be read
    Unreadable,
    /// The file or payload is empty
    Empty,
}

impl std::fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            UnresolvedReason::EmptyReference => "empty reference",
            UnresolvedReason::InvalidDataUri => "not a base64 image data URI",
            UnresolvedReason::InvalidBase64 => "invalid base64 payload",
            UnresolvedReason::InvalidUrl => "URL has no path",
            UnresolvedReason::OutsideStorageRoot => "path escapes the storage root",
            UnresolvedReason::NotFound => "file not found",
            UnresolvedReason::Unreadable => "file not readable",
            UnresolvedReason::Empty => "image is empty",
        };
        write!(f, "{}", text)
    }
}

/// Outcome of resolving one image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageResolution {
    /// Bytes and MIME type are available
    Resolved(ResolvedImage),
    /// The reference cannot be embedded
    Unresolved(UnresolvedReason),
}

impl ImageResolution {
    /// Check if the reference was resolved.
    pub fn is_resolved(&self) -> bool {
        matches!(self, ImageResolution::Resolved(_))
    }

    /// Convert into an `Option`, dropping the failure reason.
    pub fn ok(self) -> Option<ResolvedImage> {
        match self {
            ImageResolution::Resolved(image) => Some(image),
            ImageResolution::Unresolved(_) => None,
        }
    }
}

/// A source of images for the inline formatter.
///
/// Implementations must be read-only: several exports may resolve through
/// the same source concurrently.
pub trait ImageSource: Send + Sync {
    /// Resolve one image reference.
    fn resolve(&self, reference: &str) -> ImageResolution;
}

/// Options for the filesystem-backed resolver.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Directory that storage-relative paths are resolved against
    pub storage_root: PathBuf,

    /// Try absolute filesystem paths when the storage lookup misses
    pub allow_absolute_paths: bool,
}

impl ResolverOptions {
    /// Create new resolver options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage root.
    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }

    /// Enable or disable absolute filesystem paths.
    pub fn with_absolute_paths(mut self, allow: bool) -> Self {
        self.allow_absolute_paths = allow;
        self
    }
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("."),
            allow_absolute_paths: true,
        }
    }
}

/// Resolves data URIs and files under a storage root.
#[derive(Debug, Clone, Default)]
pub struct ImageResolver {
    options: ResolverOptions,
}

impl ImageResolver {
    /// Create a resolver with the given options.
    pub fn new(options: ResolverOptions) -> Self {
        Self { options }
    }

    /// Create a resolver rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self::new(ResolverOptions::new().with_storage_root(root))
    }

    /// Get the resolver options.
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    fn resolve_reference(&self, reference: &str) -> ImageResolution {
        let reference = reference.trim();
        if reference.is_empty() {
            return ImageResolution::Unresolved(UnresolvedReason::EmptyReference);
        }

        if has_prefix_ignore_case(reference, "data:") {
            return decode_data_uri(reference);
        }

        let is_url = has_prefix_ignore_case(reference, "http://")
            || has_prefix_ignore_case(reference, "https://");

        let relative = match storage_relative(reference, is_url) {
            Ok(path) => path,
            Err(reason) => return ImageResolution::Unresolved(reason),
        };

        let candidate = Path::new(relative);
        let mut is_absolute = false;
        for component in candidate.components() {
            match component {
                Component::ParentDir => {
                    return ImageResolution::Unresolved(UnresolvedReason::OutsideStorageRoot)
                }
                Component::Prefix(_) | Component::RootDir => is_absolute = true,
                _ => {}
            }
        }

        if !is_absolute {
            let full = self.options.storage_root.join(candidate);
            match read_image(&full) {
                ImageResolution::Unresolved(UnresolvedReason::NotFound) => {}
                resolution => return resolution,
            }
        }

        // Fall back to the reference as an absolute filesystem path
        if self.options.allow_absolute_paths && !is_url {
            let path = Path::new(strip_query(reference));
            if path.is_absolute() {
                return read_image(path);
            }
        }

        log::debug!("Image not found in storage: {}", reference);
        ImageResolution::Unresolved(UnresolvedReason::NotFound)
    }
}

impl ImageSource for ImageResolver {
    fn resolve(&self, reference: &str) -> ImageResolution {
        self.resolve_reference(reference)
    }
}

/// MIME type for an image path, inferred from its extension.
///
/// Unknown or missing extensions map to `image/png`.
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "image/png",
    }
}

fn has_prefix_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn strip_query(reference: &str) -> &str {
    match reference.find('?') {
        Some(i) => &reference[..i],
        None => reference,
    }
}

/// Reduce a URL or path reference to a storage-relative path.
fn storage_relative(reference: &str, is_url: bool) -> Result<&str, UnresolvedReason> {
    let mut path = reference;

    if is_url {
        let after_scheme = &path[path.find("://").map(|i| i + 3).unwrap_or(0)..];
        match after_scheme.find('/') {
            Some(i) => path = &after_scheme[i..],
            None => return Err(UnresolvedReason::InvalidUrl),
        }
    }

    let path = strip_query(path).trim_start_matches(['/', '\\']);
    if path.is_empty() {
        return Err(UnresolvedReason::NotFound);
    }
    Ok(path)
}

fn decode_data_uri(reference: &str) -> ImageResolution {
    let Some(caps) = DATA_URI.captures(reference) else {
        log::debug!("Unsupported data URI");
        return ImageResolution::Unresolved(UnresolvedReason::InvalidDataUri);
    };

    let payload: String = caps[2].chars().filter(|c| !c.is_whitespace()).collect();
    let data = match STANDARD
        .decode(&payload)
        .or_else(|_| STANDARD_NO_PAD.decode(&payload))
    {
        Ok(data) => data,
        Err(e) => {
            log::debug!("Invalid base64 image payload: {}", e);
            return ImageResolution::Unresolved(UnresolvedReason::InvalidBase64);
        }
    };

    if data.is_empty() {
        return ImageResolution::Unresolved(UnresolvedReason::Empty);
    }

    ImageResolution::Resolved(ResolvedImage {
        mime_type: caps[1].to_string(),
        data,
    })
}

fn read_image(path: &Path) -> ImageResolution {
    match std::fs::read(path) {
        Ok(data) if data.is_empty() => ImageResolution::Unresolved(UnresolvedReason::Empty),
        Ok(data) => ImageResolution::Resolved(ResolvedImage {
            mime_type: mime_for_path(path).to_string(),
            data,
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            ImageResolution::Unresolved(UnresolvedReason::NotFound)
        }
        Err(e) => {
            log::warn!("Failed to read image {}: {}", path.display(), e);
            ImageResolution::Unresolved(UnresolvedReason::Unreadable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.gif")), "image/gif");
        assert_eq!(mime_for_path(Path::new("a.bmp")), "image/bmp");
        assert_eq!(mime_for_path(Path::new("a.webp")), "image/webp");
        assert_eq!(mime_for_path(Path::new("a.svg")), "image/svg+xml");
        assert_eq!(mime_for_path(Path::new("a.tiff")), "image/png");
        assert_eq!(mime_for_path(Path::new("noext")), "image/png");
    }

    #[test]
    fn test_storage_relative_url() {
        assert_eq!(
            storage_relative("http://host:8081/uploads/a.png?v=1", true),
            Ok("uploads/a.png")
        );
        assert_eq!(
            storage_relative("https://host", true),
            Err(UnresolvedReason::InvalidUrl)
        );
    }

    #[test]
    fn test_storage_relative_paths() {
        assert_eq!(storage_relative("/uploads/a.png", false), Ok("uploads/a.png"));
        assert_eq!(storage_relative("uploads/a.png", false), Ok("uploads/a.png"));
        assert_eq!(storage_relative("//x.png?y", false), Ok("x.png"));
    }

    #[test]
    fn test_decode_data_uri() {
        let resolution = decode_data_uri("data:image/gif;base64,R0lGODlh");
        assert_eq!(
            resolution,
            ImageResolution::Resolved(ResolvedImage {
                mime_type: "image/gif".to_string(),
                data: b"GIF89a".to_vec(),
            })
        );
    }

    #[test]
    fn test_decode_data_uri_failures() {
        assert_eq!(
            decode_data_uri("data:text/plain;base64,aGk="),
            ImageResolution::Unresolved(UnresolvedReason::InvalidDataUri)
        );
        assert_eq!(
            decode_data_uri("data:image/png;base64,!!!"),
            ImageResolution::Unresolved(UnresolvedReason::InvalidBase64)
        );
    }

    #[test]
    fn test_parent_dir_rejected() {
        let resolver = ImageResolver::with_root("/tmp");
        assert_eq!(
            resolver.resolve("../etc/passwd"),
            ImageResolution::Unresolved(UnresolvedReason::OutsideStorageRoot)
        );
        assert_eq!(
            resolver.resolve("http://host/uploads/../../secret.png"),
            ImageResolution::Unresolved(UnresolvedReason::OutsideStorageRoot)
        );
    }

    #[test]
    fn test_empty_reference() {
        let resolver = ImageResolver::default();
        assert_eq!(
            resolver.resolve("   "),
            ImageResolution::Unresolved(UnresolvedReason::EmptyReference)
        );
    }
}
