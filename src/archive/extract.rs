// ZIP bytes -> (relative path, bytes) for every file entry

use std::io::{Cursor, Read};
use std::path::{Component, Path};

use tracing::warn;
use zip::ZipArchive;

use super::ArchiveEntry;

/// Largest decompressed entry accepted from an input archive.
pub const MAX_ENTRY_BYTES: u64 = 256 * 1024 * 1024;

/// Read every non-directory entry of a ZIP archive held in memory.
///
/// A malformed archive is an error. Individual entries that cannot be read
/// (bad compression, encryption), that exceed [`MAX_ENTRY_BYTES`], or whose
/// name would escape the extraction root are skipped with a warning.
pub fn extract_zip(bytes: &[u8]) -> crate::error::Result<Vec<ArchiveEntry>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut file = match archive.by_index(index) {
            Ok(f) => f,
            Err(e) => {
                warn!(index, error = %e, "skipping unreadable zip entry");
                continue;
            }
        };
        if file.is_dir() {
            continue;
        }

        let Some(relative_path) = file.enclosed_name().as_deref().and_then(normalized_path)
        else {
            warn!(entry = %file.name(), "skipping zip entry with unsafe path");
            continue;
        };

        // The header size is untrusted: it only seeds the buffer, bounded by
        // what the archive could plausibly hold.
        let hint = file.size().min(bytes.len() as u64).min(MAX_ENTRY_BYTES);
        let mut data = Vec::with_capacity(hint as usize);
        if let Err(e) = (&mut file).take(MAX_ENTRY_BYTES + 1).read_to_end(&mut data) {
            warn!(entry = %relative_path, error = %e, "skipping unreadable zip entry");
            continue;
        }
        if data.len() as u64 > MAX_ENTRY_BYTES {
            warn!(entry = %relative_path, limit = MAX_ENTRY_BYTES, "skipping oversized zip entry");
            continue;
        }

        entries.push(ArchiveEntry {
            relative_path,
            data,
        });
    }

    Ok(entries)
}

/// `/`-joined path with `.` and `..` resolved. `None` when nothing remains or
/// the path climbs above its root.
fn normalized_path(path: &Path) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_path_resolves_inner_parent() {
        assert_eq!(
            normalized_path(Path::new("a/./b/../c.png")).as_deref(),
            Some("a/c.png")
        );
    }

    #[test]
    fn test_normalized_path_rejects_escape() {
        assert_eq!(normalized_path(Path::new("../x.jpg")), None);
        assert_eq!(normalized_path(Path::new("/abs.jpg")), None);
        assert_eq!(normalized_path(Path::new(".")), None);
    }
}
