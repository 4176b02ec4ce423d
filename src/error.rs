use thiserror::Error;

#[derive(Debug, Error)]
pub enum JpegTargetError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("decode error: {0}")]
    DecodeFailure(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("JPEG encode error: {0}")]
    EncodingFailure(String),

    #[error("render error: {0}")]
    RenderError(String),

    #[error("archive error: {0}")]
    ArchiveError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`JpegTargetError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl JpegTargetError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create a decode failure (unreadable image or document bytes).
    decode => DecodeFailure,
    /// Create an unsupported-format error (recognized extension, no decoder).
    unsupported => UnsupportedFormat,
    /// Create a JPEG encoding failure.
    encoding => EncodingFailure,
    /// Create a document render error.
    render => RenderError,
    /// Create an archive read/write error.
    archive => ArchiveError,
    /// Create an archive store error.
    store => StoreError,
}

impl From<serde_json::Error> for JpegTargetError {
    fn from(e: serde_json::Error) -> Self {
        Self::StoreError(e.to_string())
    }
}

impl From<serde_yml::Error> for JpegTargetError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<zip::result::ZipError> for JpegTargetError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::ArchiveError(e.to_string())
    }
}

#[cfg(feature = "pdf")]
impl From<pdfium_render::prelude::PdfiumError> for JpegTargetError {
    fn from(e: pdfium_render::prelude::PdfiumError) -> Self {
        Self::RenderError(e.to_string())
    }
}

impl From<image::ImageError> for JpegTargetError {
    fn from(e: image::ImageError) -> Self {
        Self::EncodingFailure(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JpegTargetError>;
