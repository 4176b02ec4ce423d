// Output archive assembly: {label}_compressed/ folders, then files.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Folder name used for a label inside the output archive.
pub fn label_folder(label: &str) -> String {
    format!("{label}_compressed")
}

/// Archive path for an output file: `{label}_compressed/{relative_output_name}`.
pub fn output_path(label: &str, relative_output_name: &str) -> String {
    format!("{}/{}", label_folder(label), relative_output_name)
}

/// Write all outputs into a single ZIP archive.
///
/// One directory entry per label is written first (sorted), then every file
/// in path order, so the result is deterministic for a given input.
pub fn package_outputs(
    labels: &BTreeSet<String>,
    outputs: &BTreeMap<String, Vec<u8>>,
) -> crate::error::Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for label in labels {
        writer.add_directory(format!("{}/", label_folder(label)), options)?;
    }

    for (path, data) in outputs {
        writer.start_file(path.as_str(), options)?;
        writer.write_all(data)?;
    }

    Ok(writer.finish()?.into_inner())
}
