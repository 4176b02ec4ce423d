// Upload expansion: top-level inputs (loose files and ZIPs) -> flat job list

use std::collections::HashMap;

use tracing::warn;

use super::formats::{FileKind, classify, strip_extension};
use crate::archive::extract::extract_zip;

/// One top-level input as received from the caller.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// One unit of work for the dispatcher.
#[derive(Debug, Clone)]
pub struct Job {
    /// Grouping key; outputs land under `{label}_compressed/`.
    pub label: String,
    pub relative_path: String,
    pub data: Vec<u8>,
}

/// A note recorded against a label during expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelNote {
    pub label: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Expansion {
    pub jobs: Vec<Job>,
    /// Inputs of an unsupported type, recorded rather than rejected.
    pub skipped: Vec<LabelNote>,
    /// Archives that could not be read.
    pub failures: Vec<LabelNote>,
}

/// Expand uploads into jobs.
///
/// ZIP uploads are labelled by their file stem, made unique across uploads
/// (`photos`, `photos_2`, ...). Loose image/PDF uploads share `loose_label`.
pub fn expand_uploads(uploads: Vec<Upload>, loose_label: &str) -> Expansion {
    let mut expansion = Expansion::default();
    let mut used_labels: HashMap<String, usize> = HashMap::new();

    for upload in uploads {
        match classify(&upload.file_name) {
            FileKind::Archive => {
                let label = unique_label(&mut used_labels, archive_stem(&upload.file_name));
                let entries = match extract_zip(&upload.data) {
                    Ok(entries) => entries,
                    Err(e) => {
                        warn!(archive = %upload.file_name, error = %e, "failed to unzip");
                        expansion.failures.push(LabelNote {
                            label,
                            message: format!("{}: {e}", upload.file_name),
                        });
                        continue;
                    }
                };

                for entry in entries {
                    if classify(&entry.relative_path).is_job_input() {
                        expansion.jobs.push(Job {
                            label: label.clone(),
                            relative_path: entry.relative_path,
                            data: entry.data,
                        });
                    } else {
                        expansion.skipped.push(LabelNote {
                            label: label.clone(),
                            message: format!("{}: unsupported file type", entry.relative_path),
                        });
                    }
                }
            }
            kind if kind.is_job_input() => expansion.jobs.push(Job {
                label: loose_label.to_string(),
                relative_path: upload.file_name,
                data: upload.data,
            }),
            _ => expansion.skipped.push(LabelNote {
                label: loose_label.to_string(),
                message: format!("{}: unsupported file type", upload.file_name),
            }),
        }
    }

    expansion
}

/// File stem of an archive upload, ignoring any directory part.
fn archive_stem(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let stem = strip_extension(base);
    if stem.is_empty() {
        "output".to_string()
    } else {
        stem.to_string()
    }
}

fn unique_label(used: &mut HashMap<String, usize>, base: String) -> String {
    let count = used.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        base
    } else {
        format!("{base}_{count}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_stem() {
        assert_eq!(archive_stem("uploads/Photos.zip"), "Photos");
        assert_eq!(archive_stem("scans.2024.zip"), "scans.2024");
    }

    #[test]
    fn test_unique_label_suffixes_repeats() {
        let mut used = HashMap::new();
        assert_eq!(unique_label(&mut used, "a".into()), "a");
        assert_eq!(unique_label(&mut used, "a".into()), "a_2");
        assert_eq!(unique_label(&mut used, "a".into()), "a_3");
        assert_eq!(unique_label(&mut used, "b".into()), "b");
    }
}
