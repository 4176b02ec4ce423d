// pdfium-render wrapper: PDF bytes -> one DynamicImage per page

use std::io::Write;
use std::path::PathBuf;

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use crate::error::JpegTargetError;

/// Resolves the path to the pdfium shared library.
///
/// Search order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` environment variable
/// 2. `vendor/pdfium/lib/` relative to the project root (for development)
fn resolve_pdfium_lib_path() -> crate::error::Result<PathBuf> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Ok(p);
        }
        return Err(JpegTargetError::render(format!(
            "PDFIUM_DYNAMIC_LIB_PATH is set to '{}' but the path does not exist",
            path
        )));
    }

    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let vendor_path = PathBuf::from(&manifest_dir).join("vendor/pdfium/lib");
        if vendor_path.exists() {
            return Ok(vendor_path);
        }
    }

    Err(JpegTargetError::render(
        "pdfium library not found: set PDFIUM_DYNAMIC_LIB_PATH or place libpdfium.so in vendor/pdfium/lib/",
    ))
}

/// Creates a new Pdfium instance by dynamically loading the shared library.
fn create_pdfium() -> crate::error::Result<Pdfium> {
    let lib_path = resolve_pdfium_lib_path()?;
    let lib_path_str = lib_path
        .to_str()
        .ok_or_else(|| JpegTargetError::render("pdfium library path contains non-UTF-8 characters"))?;
    let bindings =
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(lib_path_str))?;
    Ok(Pdfium::new(bindings))
}

/// Renders every page of `pdf_bytes` at `dpi`.
///
/// The document is spilled to a named temp file for the duration of the call;
/// the file is removed when this function returns, on error paths too.
///
/// # Errors
/// Returns `RenderError` if pdfium cannot be loaded and `DecodeFailure` if the
/// document cannot be opened. Per-page failures are reported in the returned vector.
pub fn render_document(
    pdf_bytes: &[u8],
    dpi: u32,
) -> crate::error::Result<Vec<crate::error::Result<DynamicImage>>> {
    let pdfium = create_pdfium()?;

    let mut scratch = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".pdf")
        .tempfile()?;
    scratch.write_all(pdf_bytes)?;
    scratch.flush()?;

    let document = pdfium
        .load_pdf_from_file(scratch.path(), None)
        .map_err(|e| JpegTargetError::decode(format!("cannot open PDF: {e}")))?;

    let pages: Vec<_> = document
        .pages()
        .iter()
        .enumerate()
        .map(|(index, page)| {
            let rendered = render_page(&page, dpi);
            match &rendered {
                Ok(img) => debug!(page = index + 1, width = img.width(), height = img.height(), "rendered page"),
                Err(e) => warn!(page = index + 1, error = %e, "page render failed"),
            }
            rendered
        })
        .collect();

    Ok(pages)
}

fn render_page(page: &PdfPage, dpi: u32) -> crate::error::Result<DynamicImage> {
    // PDF default user unit: 1 point = 1/72 inch
    let width_px = (page.width().value * dpi as f32 / 72.0).round() as i32;
    let height_px = (page.height().value * dpi as f32 / 72.0).round() as i32;

    if width_px <= 0 || height_px <= 0 {
        return Err(JpegTargetError::render(format!(
            "page has empty size at {dpi} DPI"
        )));
    }

    let config = PdfRenderConfig::new()
        .set_target_width(width_px)
        .set_target_height(height_px);

    let bitmap = page.render_with_config(&config)?;

    Ok(bitmap.as_image())
}
