#[cfg(feature = "pdf")]
pub mod pdfium;

use image::DynamicImage;

/// Render every page of a PDF held in memory at `dpi`.
///
/// The outer `Err` means the document could not be opened; each page carries
/// its own result so one bad page does not abort the rest.
pub fn render_document(
    pdf_bytes: &[u8],
    dpi: u32,
) -> crate::error::Result<Vec<crate::error::Result<DynamicImage>>> {
    #[cfg(feature = "pdf")]
    {
        pdfium::render_document(pdf_bytes, dpi)
    }
    #[cfg(not(feature = "pdf"))]
    {
        let _ = (pdf_bytes, dpi);
        Err(crate::error::JpegTargetError::unsupported(
            "PDF rendering is not available (built without the `pdf` feature)",
        ))
    }
}
