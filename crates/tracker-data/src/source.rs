//! Raw document access.
//!
//! A [`FileSource`] hands over the bytes of one uploaded export, never reading
//! more than the size cap into memory. The rest of the pipeline only needs
//! `bytes -> serde_json::Value`, which [`parse_document`] provides.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;
use tracker_core::error::{Result, TrackerError};

/// Supplier of the raw bytes of one usage export.
pub trait FileSource {
    /// Stable name of the upload, e.g. its path.
    fn identity(&self) -> String;

    /// Read the complete document, failing with
    /// [`TrackerError::DocumentTooLarge`] once it exceeds `max_bytes`.
    fn read_bytes(&self, max_bytes: usize) -> Result<Vec<u8>>;
}

// ── PathSource ────────────────────────────────────────────────────────────────

/// A usage export on the local filesystem.
#[derive(Debug, Clone)]
pub struct PathSource {
    path: PathBuf,
}

impl PathSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileSource for PathSource {
    fn identity(&self) -> String {
        self.path.display().to_string()
    }

    fn read_bytes(&self, max_bytes: usize) -> Result<Vec<u8>> {
        let file_read = |source: std::io::Error| TrackerError::FileRead {
            path: self.path.clone(),
            source,
        };

        let size = std::fs::metadata(&self.path).map_err(file_read)?.len();
        if size > max_bytes as u64 {
            return Err(TrackerError::DocumentTooLarge {
                size: usize::try_from(size).unwrap_or(usize::MAX),
                limit: max_bytes,
            });
        }

        // The file may have grown since the metadata call.
        let file = std::fs::File::open(&self.path).map_err(file_read)?;
        read_capped(file, max_bytes).map_err(|e| match e {
            TrackerError::Io(source) => file_read(source),
            other => other,
        })
    }
}

// ── MemorySource ──────────────────────────────────────────────────────────────

/// An export already held in memory (stdin, tests).
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    bytes: Vec<u8>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Drain `reader` into a new source named `name`, stopping with
    /// [`TrackerError::DocumentTooLarge`] once more than `max_bytes` arrive.
    pub fn from_reader(name: impl Into<String>, reader: impl Read, max_bytes: usize) -> Result<Self> {
        Ok(Self::new(name, read_capped(reader, max_bytes)?))
    }
}

impl FileSource for MemorySource {
    fn identity(&self) -> String {
        self.name.clone()
    }

    fn read_bytes(&self, max_bytes: usize) -> Result<Vec<u8>> {
        check_size(self.bytes.len(), max_bytes)?;
        Ok(self.bytes.clone())
    }
}

/// Read at most `max_bytes + 1` bytes from `reader`; the extra byte tells an
/// oversized stream apart from one that is exactly at the cap. The reported
/// size of an oversized stream is a lower bound.
fn read_capped(reader: impl Read, max_bytes: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader
        .take((max_bytes as u64).saturating_add(1))
        .read_to_end(&mut bytes)?;
    check_size(bytes.len(), max_bytes)?;
    Ok(bytes)
}

fn check_size(size: usize, max_bytes: usize) -> Result<()> {
    if size > max_bytes {
        return Err(TrackerError::DocumentTooLarge {
            size,
            limit: max_bytes,
        });
    }
    Ok(())
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `bytes` as one JSON document of at most `max_bytes` bytes.
///
/// Fails with [`TrackerError::DocumentTooLarge`] or
/// [`TrackerError::InvalidDocument`]; there is never a partial result.
pub fn parse_document(bytes: &[u8], max_bytes: usize) -> Result<Value> {
    check_size(bytes.len(), max_bytes)?;
    let value: Value = serde_json::from_slice(bytes)?;
    debug!("Parsed JSON document of {} bytes", bytes.len());
    Ok(value)
}

/// Lower-case hex SHA-256 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_source_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("costs.json");
        std::fs::write(&path, b"[]").unwrap();

        let source = PathSource::new(&path);
        assert_eq!(source.read_bytes(1024).unwrap(), b"[]");
        assert_eq!(source.identity(), path.display().to_string());
    }

    #[test]
    fn test_path_source_rejects_oversized_file_before_reading() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("costs.json");
        std::fs::write(&path, vec![b' '; 64]).unwrap();

        let err = PathSource::new(&path).read_bytes(16).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::DocumentTooLarge { size: 64, limit: 16 }
        ));
        assert_eq!(PathSource::new(&path).read_bytes(64).unwrap().len(), 64);
    }

    #[test]
    fn test_path_source_missing_file() {
        let source = PathSource::new("/tmp/does-not-exist-cost-tracker-xyz.json");
        let err = source.read_bytes(1024).unwrap_err();
        assert!(matches!(err, TrackerError::FileRead { .. }));
    }

    #[test]
    fn test_memory_source_from_reader() {
        let source = MemorySource::from_reader("stdin", &b"{\"a\": []}"[..], 1024).unwrap();
        assert_eq!(source.identity(), "stdin");
        assert_eq!(source.read_bytes(1024).unwrap(), b"{\"a\": []}");
    }

    #[test]
    fn test_memory_source_from_reader_stops_at_cap() {
        // An endless stream must be cut off instead of buffered.
        let endless = std::io::repeat(b'[');
        let err = MemorySource::from_reader("stdin", endless, 1024).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::DocumentTooLarge { size: 1025, limit: 1024 }
        ));
    }

    #[test]
    fn test_memory_source_exactly_at_cap() {
        let source = MemorySource::from_reader("stdin", &b"[1]"[..], 3).unwrap();
        assert_eq!(source.read_bytes(3).unwrap(), b"[1]");
        assert!(matches!(
            source.read_bytes(2).unwrap_err(),
            TrackerError::DocumentTooLarge { size: 3, limit: 2 }
        ));
    }

    #[test]
    fn test_parse_document_valid() {
        let value = parse_document(br#"[{"model": "gpt-4"}]"#, 1024).unwrap();
        assert!(value.is_array());
    }

    #[test]
    fn test_parse_document_invalid_json() {
        let err = parse_document(b"{not json", 1024).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidDocument(_)));
    }

    #[test]
    fn test_parse_document_too_large() {
        let err = parse_document(b"[1, 2, 3]", 4).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::DocumentTooLarge { size: 9, limit: 4 }
        ));
    }

    #[test]
    fn test_parse_document_preserves_key_order() {
        let value = parse_document(br#"{"z@x.com": [], "a@x.com": []}"#, 1024).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z@x.com", "a@x.com"]);
    }

    #[test]
    fn test_content_hash() {
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(content_hash(b"[]"), content_hash(b"[ ]"));
    }
}
