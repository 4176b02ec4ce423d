// Token-keyed store for finished output archives.
//
// Layout: <store_dir>/<token>/archive.zip + metadata.json
// The token is the SHA-256 of the archive bytes, lowercase hex.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::JpegTargetError;

const ARCHIVE_FILE: &str = "archive.zip";
const METADATA_FILE: &str = "metadata.json";

/// Filesystem store for output archives, addressed by opaque token.
pub struct ArchiveStore {
    store_dir: PathBuf,
}

/// Stored next to each archive.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArchiveMetadata {
    pub token: String,
    pub byte_len: usize,
    #[serde(default)]
    pub summary: Vec<String>,
}

/// A stored archive together with its metadata.
#[derive(Debug, Clone)]
pub struct StoredArchive {
    pub metadata: ArchiveMetadata,
    pub bytes: Vec<u8>,
}

/// Token for `bytes`: SHA-256, lowercase hex.
pub fn compute_token(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Tokens must be exactly 64 lowercase hex characters. Rejects path traversal.
fn validate_token(token: &str) -> crate::error::Result<()> {
    if token.len() == 64 && token.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        Ok(())
    } else {
        Err(JpegTargetError::store(format!(
            "invalid token: expected 64-character lowercase hex string, got '{}'",
            token
        )))
    }
}

impl ArchiveStore {
    pub fn new(store_dir: impl AsRef<Path>) -> Self {
        Self {
            store_dir: store_dir.as_ref().to_path_buf(),
        }
    }

    fn token_dir(&self, token: &str) -> crate::error::Result<PathBuf> {
        validate_token(token)?;
        Ok(self.store_dir.join(token))
    }

    /// Store `bytes` and return its token.
    ///
    /// Writes go to a sibling temp directory that is renamed into place, so a
    /// reader never sees a half-written entry.
    pub fn store(&self, bytes: &[u8], summary: &[String]) -> crate::error::Result<String> {
        let token = compute_token(bytes);
        let dir = self.token_dir(&token)?;
        let tmp_dir = dir.with_extension("tmp");

        if tmp_dir.exists() {
            let _ = fs::remove_dir_all(&tmp_dir);
        }
        fs::create_dir_all(&tmp_dir).map_err(|e| JpegTargetError::store(e.to_string()))?;

        fs::write(tmp_dir.join(ARCHIVE_FILE), bytes)
            .map_err(|e| JpegTargetError::store(e.to_string()))?;

        let metadata = ArchiveMetadata {
            token: token.clone(),
            byte_len: bytes.len(),
            summary: summary.to_vec(),
        };
        let metadata_json = serde_json::to_string_pretty(&metadata)?;
        fs::write(tmp_dir.join(METADATA_FILE), metadata_json.as_bytes())
            .map_err(|e| JpegTargetError::store(e.to_string()))?;

        if dir.exists() {
            let _ = fs::remove_dir_all(&dir);
        }
        fs::rename(&tmp_dir, &dir).map_err(|e| JpegTargetError::store(e.to_string()))?;

        Ok(token)
    }

    /// Fetch an archive by token. Unknown tokens return `None`.
    pub fn retrieve(&self, token: &str) -> crate::error::Result<Option<StoredArchive>> {
        let dir = self.token_dir(token)?;
        if !dir.exists() {
            return Ok(None);
        }

        let metadata_str = fs::read_to_string(dir.join(METADATA_FILE))
            .map_err(|e| JpegTargetError::store(e.to_string()))?;
        let metadata: ArchiveMetadata = serde_json::from_str(&metadata_str)?;

        if metadata.token != token {
            return Err(JpegTargetError::store(format!(
                "token mismatch: expected '{}', found '{}'",
                token, metadata.token
            )));
        }

        let bytes =
            fs::read(dir.join(ARCHIVE_FILE)).map_err(|e| JpegTargetError::store(e.to_string()))?;
        if bytes.len() != metadata.byte_len {
            return Err(JpegTargetError::store(format!(
                "archive for '{}' is truncated: expected {} bytes, found {}",
                token,
                metadata.byte_len,
                bytes.len()
            )));
        }

        Ok(Some(StoredArchive { metadata, bytes }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_token_rejects_uppercase_hex() {
        let uppercase = "a".repeat(58) + "ABCDEF";
        assert_eq!(uppercase.len(), 64);
        assert!(validate_token(&uppercase).is_err());
    }

    #[test]
    fn test_validate_token_rejects_traversal() {
        assert!(validate_token("../../etc/passwd").is_err());
    }

    #[test]
    fn test_compute_token_is_valid() {
        let token = compute_token(b"archive");
        assert!(validate_token(&token).is_ok());
    }
}
