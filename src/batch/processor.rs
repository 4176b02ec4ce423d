// Per-job processing: classify -> rasterize -> compress into range

use tracing::{info, warn};

use super::formats::{FileKind, classify, strip_extension};
use super::job::Job;
use crate::compress::{CompressionResult, compress_into_range};
use crate::config::compression::CompressionConfig;
use crate::error::JpegTargetError;
use crate::raster::decode::decode_image;
use crate::render::render_document;

/// One JPEG produced by a job.
#[derive(Debug, Clone)]
pub struct ProducedFile {
    /// Output name relative to the label folder, e.g. `scans/doc_p2.jpg`.
    pub relative_output: String,
    pub result: CompressionResult,
}

impl ProducedFile {
    /// `{relative_output} -> {bytes} bytes scale={scale} q={quality}`
    pub fn summary_line(&self) -> String {
        format!(
            "{} -> {} bytes scale={:.3} q={}",
            self.relative_output,
            self.result.byte_len(),
            self.result.scale,
            self.result.quality
        )
    }
}

/// Everything one job contributes to the batch.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub label: String,
    pub relative_path: String,
    pub produced: Vec<ProducedFile>,
    pub failures: Vec<String>,
}

impl JobOutcome {
    fn new(job: &Job) -> Self {
        JobOutcome {
            label: job.label.clone(),
            relative_path: job.relative_path.clone(),
            produced: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn fail(&mut self, error: &JpegTargetError) {
        warn!(label = %self.label, input = %self.relative_path, error = %error, "job failed");
        self.failures.push(format!("{}: {error}", self.relative_path));
    }
}

/// Process a single job. Never returns an error: failures are recorded on the
/// outcome, and a failing image contributes no output.
pub fn process_job(job: &Job, config: &CompressionConfig) -> JobOutcome {
    let mut outcome = JobOutcome::new(job);
    let stem = strip_extension(&job.relative_path);

    match classify(&job.relative_path) {
        FileKind::Document => process_document(job, stem, config, &mut outcome),
        FileKind::Image | FileKind::UnsupportedImage => {
            let result = decode_image(&job.relative_path, &job.data)
                .and_then(|image| compress_into_range(&image, config));
            match result {
                Ok(result) => outcome.produced.push(ProducedFile {
                    relative_output: format!("{stem}.jpg"),
                    result,
                }),
                Err(e) => outcome.fail(&e),
            }
        }
        FileKind::Archive | FileKind::Other => {
            outcome.fail(&JpegTargetError::unsupported("not an image or PDF"));
        }
    }

    for file in &outcome.produced {
        info!(label = %outcome.label, "{}", file.summary_line());
    }
    outcome
}

fn process_document(job: &Job, stem: &str, config: &CompressionConfig, outcome: &mut JobOutcome) {
    let pages = match render_document(&job.data, config.render_dpi()) {
        Ok(pages) => pages,
        Err(e) => {
            outcome.fail(&e);
            return;
        }
    };

    for (index, page) in pages.into_iter().enumerate() {
        let page_number = index + 1;
        match page.and_then(|image| compress_into_range(&image, config)) {
            Ok(result) => outcome.produced.push(ProducedFile {
                relative_output: format!("{stem}_p{page_number}.jpg"),
                result,
            }),
            Err(e) => {
                warn!(input = %job.relative_path, page = page_number, error = %e, "page failed");
                outcome
                    .failures
                    .push(format!("{} (page {page_number}): {e}", job.relative_path));
            }
        }
    }
}
