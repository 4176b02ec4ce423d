pub mod extract;
pub mod package;

/// One file pulled out of an input archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub relative_path: String,
    pub data: Vec<u8>,
}
