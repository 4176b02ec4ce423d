// Extension-based input recognition.

use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jfif", "png", "webp", "tif", "tiff", "bmp", "gif",
];
const UNSUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["heic", "heif"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];
const ARCHIVE_EXTENSIONS: &[&str] = &["zip"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    /// Recognized image type with no decoder (HEIC/HEIF).
    UnsupportedImage,
    Document,
    Archive,
    Other,
}

impl FileKind {
    /// Kinds that become jobs (directly or via an archive entry).
    pub fn is_job_input(self) -> bool {
        matches!(
            self,
            FileKind::Image | FileKind::UnsupportedImage | FileKind::Document
        )
    }
}

/// Lowercased extension of `name`, without the dot.
pub fn extension_lower(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn classify(name: &str) -> FileKind {
    let Some(ext) = extension_lower(name) else {
        return FileKind::Other;
    };
    let ext = ext.as_str();

    if IMAGE_EXTENSIONS.contains(&ext) {
        FileKind::Image
    } else if UNSUPPORTED_IMAGE_EXTENSIONS.contains(&ext) {
        FileKind::UnsupportedImage
    } else if DOCUMENT_EXTENSIONS.contains(&ext) {
        FileKind::Document
    } else if ARCHIVE_EXTENSIONS.contains(&ext) {
        FileKind::Archive
    } else {
        FileKind::Other
    }
}

/// `name` with its final extension removed (`a/b.c.png` -> `a/b.c`).
pub fn strip_extension(name: &str) -> &str {
    match extension_lower(name) {
        Some(ext) => &name[..name.len() - ext.len() - 1],
        None => name,
    }
}
