pub mod dispatcher;
pub mod formats;
pub mod job;
pub mod processor;

pub use dispatcher::{BatchOutcome, run_batch};
pub use job::{Expansion, Job, LabelNote, Upload, expand_uploads};

use crate::config::compression::CompressionConfig;

/// Expand uploads, run every job, and fold expansion notes into the outcome.
pub fn process_uploads(
    uploads: Vec<Upload>,
    loose_label: &str,
    config: &CompressionConfig,
    threads: usize,
) -> crate::error::Result<BatchOutcome> {
    let Expansion {
        jobs,
        skipped,
        failures,
    } = expand_uploads(uploads, loose_label);

    let mut outcome = run_batch(jobs, config, threads)?;
    for note in skipped {
        outcome.record_skipped(note);
    }
    for note in failures {
        outcome.record_failure(note);
    }
    Ok(outcome)
}
