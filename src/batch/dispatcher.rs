// Bounded-pool fan-out of jobs; results merged into one shared BatchOutcome.
//
// Jobs run fully job-local. The outcome lock is held only for in-memory
// appends, never across decoding, rendering or the compression search.
// Output names are assigned after the pool joins, in job order, so two inputs
// that map to the same name (`photo.png`, `photo.bmp`) both survive as
// `photo.jpg` and `photo_2.jpg` regardless of completion order.
// There is no mid-batch cancellation: a failing job is recorded and the rest
// of the batch proceeds.

use std::collections::{BTreeMap, BTreeSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use tracing::{error, info};

use super::formats::strip_extension;
use super::job::{Job, LabelNote};
use super::processor::{JobOutcome, ProducedFile, process_job};
use crate::archive::package::{output_path, package_outputs};
use crate::config::compression::CompressionConfig;
use crate::error::JpegTargetError;

pub const DEFAULT_THREADS: usize = 4;

/// Accumulated results of one batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Every label that has a folder in the output archive.
    pub labels: BTreeSet<String>,
    /// Per-label success lines.
    pub summaries: BTreeMap<String, Vec<String>>,
    /// Per-label failure lines.
    pub failures: BTreeMap<String, Vec<String>>,
    /// Per-label inputs skipped as unsupported.
    pub skipped: BTreeMap<String, Vec<String>>,
    /// Archive path -> JPEG bytes.
    pub outputs: BTreeMap<String, Vec<u8>>,
    /// Number of jobs whose outcome has been merged.
    pub completed_jobs: usize,
    /// Produced files keyed by job index, awaiting output names.
    staged: Vec<(usize, String, ProducedFile)>,
}

impl BatchOutcome {
    pub fn record_skipped(&mut self, note: LabelNote) {
        self.skipped.entry(note.label).or_default().push(note.message);
    }

    pub fn record_failure(&mut self, note: LabelNote) {
        self.failures.entry(note.label).or_default().push(note.message);
    }

    fn merge(&mut self, index: usize, outcome: JobOutcome) {
        self.completed_jobs += 1;
        self.labels.insert(outcome.label.clone());

        for file in outcome.produced {
            self.staged.push((index, outcome.label.clone(), file));
        }
        if !outcome.failures.is_empty() {
            self.failures
                .entry(outcome.label)
                .or_default()
                .extend(outcome.failures);
        }
    }

    /// Assign every staged file a unique archive path, in job order.
    fn finalize(&mut self) {
        let mut staged = std::mem::take(&mut self.staged);
        // Stable: pages of one document keep their order.
        staged.sort_by_key(|(index, _, _)| *index);

        for (_, label, mut file) in staged {
            file.relative_output = self.unique_output(&label, &file.relative_output);
            self.summaries
                .entry(label.clone())
                .or_default()
                .push(file.summary_line());
            self.outputs
                .insert(output_path(&label, &file.relative_output), file.result.payload);
        }
    }

    /// `relative_output` if free under `label`, else `{stem}_2.jpg`, `{stem}_3.jpg`, ...
    fn unique_output(&self, label: &str, relative_output: &str) -> String {
        if !self.outputs.contains_key(&output_path(label, relative_output)) {
            return relative_output.to_string();
        }
        let stem = strip_extension(relative_output);
        (2..)
            .map(|n| format!("{stem}_{n}.jpg"))
            .find(|name| !self.outputs.contains_key(&output_path(label, name)))
            .unwrap_or_else(|| relative_output.to_string())
    }

    /// `{label}: {line}` for every produced file, in label order.
    pub fn summary_lines(&self) -> Vec<String> {
        self.summaries
            .iter()
            .flat_map(|(label, lines)| lines.iter().map(move |line| format!("{label}: {line}")))
            .collect()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.values().map(Vec::len).sum()
    }

    /// Package every output into one ZIP archive.
    pub fn to_archive(&self) -> crate::error::Result<Vec<u8>> {
        package_outputs(&self.labels, &self.outputs)
    }
}

/// Run `jobs` on a pool of `threads` workers (0 = [`DEFAULT_THREADS`]).
///
/// Exactly one outcome is merged per job, including jobs that panic.
pub fn run_batch(
    jobs: Vec<Job>,
    config: &CompressionConfig,
    threads: usize,
) -> crate::error::Result<BatchOutcome> {
    let threads = if threads == 0 { DEFAULT_THREADS } else { threads };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("jpeg-target-{i}"))
        .build()
        .map_err(|e| JpegTargetError::config(format!("cannot build worker pool: {e}")))?;

    info!(jobs = jobs.len(), threads, "starting batch");
    let shared = Mutex::new(BatchOutcome::default());

    pool.install(|| {
        jobs.into_par_iter().enumerate().for_each(|(index, job)| {
            let outcome = run_guarded(&job, config);
            shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .merge(index, outcome);
        });
    });

    let mut outcome = shared.into_inner().unwrap_or_else(PoisonError::into_inner);
    outcome.finalize();
    info!(
        completed = outcome.completed_jobs,
        outputs = outcome.outputs.len(),
        failures = outcome.failure_count(),
        "batch finished"
    );
    Ok(outcome)
}

/// Run one job, turning a panic into a recorded failure.
fn run_guarded(job: &Job, config: &CompressionConfig) -> JobOutcome {
    match catch_unwind(AssertUnwindSafe(|| process_job(job, config))) {
        Ok(outcome) => outcome,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(label = %job.label, input = %job.relative_path, %reason, "job panicked");
            JobOutcome {
                label: job.label.clone(),
                relative_path: job.relative_path.clone(),
                produced: Vec::new(),
                failures: vec![format!("{}: panic: {reason}", job.relative_path)],
            }
        }
    }
}
