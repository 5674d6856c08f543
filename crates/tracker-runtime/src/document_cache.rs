//! Session-scoped cache of the loaded usage export.
//!
//! [`DocumentCache`] holds at most one document, keyed by the upload's
//! identity and the SHA-256 of its bytes. Loading the same bytes again reuses
//! the parsed and normalized result; a different file or changed content
//! replaces the entry. Document-level failures leave the previous entry in
//! place and are returned to the caller.

use chrono::{DateTime, Utc};
use tracker_core::error::Result;
use tracker_data::normalizer::{normalize, Normalized};
use tracker_data::source::{content_hash, parse_document, FileSource};

// ── CacheKey / LoadedDocument ─────────────────────────────────────────────────

/// Identity of one loaded upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    /// Name of the upload (path, `"stdin"`, ...).
    pub identity: String,
    /// Lower-case hex SHA-256 of the document bytes.
    pub content_hash: String,
}

/// A parsed and normalized export.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub key: CacheKey,
    pub normalized: Normalized,
    pub size_bytes: usize,
    /// When the bytes were last parsed (not when last read).
    pub loaded_at: DateTime<Utc>,
}

// ── DocumentCache ─────────────────────────────────────────────────────────────

/// Single-entry, content-addressed cache of the current upload.
///
/// # Example
/// ```no_run
/// use tracker_data::source::PathSource;
/// use tracker_runtime::document_cache::DocumentCache;
///
/// let mut cache = DocumentCache::new(256 * 1024 * 1024);
/// let doc = cache.load(&PathSource::new("costs.json")).unwrap();
/// println!("{} records", doc.normalized.records.len());
/// ```
#[derive(Debug)]
pub struct DocumentCache {
    /// Largest document accepted, in bytes.
    max_bytes: usize,
    entry: Option<LoadedDocument>,
    hits: u64,
    misses: u64,
}

impl DocumentCache {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            entry: None,
            hits: 0,
            misses: 0,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Read `source` and return its normalized document, reusing the cached
    /// one when identity and content hash are unchanged.
    pub fn load(&mut self, source: &dyn FileSource) -> Result<&LoadedDocument> {
        let bytes = source.read_bytes(self.max_bytes)?;
        let key = CacheKey {
            identity: source.identity(),
            content_hash: content_hash(&bytes),
        };

        match self.entry.take() {
            Some(entry) if entry.key == key => {
                self.hits += 1;
                tracing::debug!(identity = %key.identity, "document cache hit");
                Ok(&*self.entry.insert(entry))
            }
            previous => {
                let document = match parse_document(&bytes, self.max_bytes) {
                    Ok(document) => document,
                    Err(e) => {
                        tracing::warn!(identity = %key.identity, error = %e, "document load failed");
                        self.entry = previous;
                        return Err(e);
                    }
                };

                if previous.is_some() {
                    tracing::info!(identity = %key.identity, "document changed; cache invalidated");
                }

                let normalized = normalize(&document);
                tracing::info!(
                    identity = %key.identity,
                    records = normalized.records.len(),
                    diagnostics = normalized.diagnostics.len(),
                    "document loaded"
                );

                self.misses += 1;
                Ok(&*self.entry.insert(LoadedDocument {
                    key,
                    normalized,
                    size_bytes: bytes.len(),
                    loaded_at: Utc::now(),
                }))
            }
        }
    }

    /// The cached document, if any.
    pub fn current(&self) -> Option<&LoadedDocument> {
        self.entry.as_ref()
    }

    pub fn is_cached(&self) -> bool {
        self.entry.is_some()
    }

    /// Drop the cached document so the next [`load`](Self::load) re-parses.
    pub fn invalidate(&mut self) {
        self.entry = None;
        tracing::debug!("document cache invalidated");
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::error::TrackerError;
    use tracker_data::source::{MemorySource, PathSource};

    const ONE_RECORD: &str = r#"[{"timestamp":"2024-11-01T10:00:00.000000","model":"gpt-4","total_cost":0.1,"input_tokens":1,"output_tokens":2,"user":"a@x.com"}]"#;

    #[test]
    fn test_first_load_is_a_miss() {
        let mut cache = DocumentCache::new(1 << 20);
        assert!(!cache.is_cached());

        let doc = cache.load(&MemorySource::new("a.json", ONE_RECORD)).unwrap();
        assert_eq!(doc.normalized.records.len(), 1);
        assert_eq!(doc.key.identity, "a.json");
        assert_eq!(doc.size_bytes, ONE_RECORD.len());
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 0);
        assert!(cache.is_cached());
    }

    #[test]
    fn test_same_content_is_a_hit() {
        let mut cache = DocumentCache::new(1 << 20);
        let source = MemorySource::new("a.json", ONE_RECORD);

        let first_loaded_at = cache.load(&source).unwrap().loaded_at;
        let second_loaded_at = cache.load(&source).unwrap().loaded_at;

        assert_eq!(first_loaded_at, second_loaded_at);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_new_upload_replaces_entry() {
        let mut cache = DocumentCache::new(1 << 20);
        cache.load(&MemorySource::new("a.json", ONE_RECORD)).unwrap();
        let doc = cache.load(&MemorySource::new("b.json", "[]")).unwrap();

        assert_eq!(doc.key.identity, "b.json");
        assert!(doc.normalized.records.is_empty());
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn test_changed_file_content_invalidates() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("costs.json");
        std::fs::write(&path, ONE_RECORD).unwrap();
        let source = PathSource::new(&path);

        let mut cache = DocumentCache::new(1 << 20);
        let first_hash = cache.load(&source).unwrap().key.content_hash.clone();

        std::fs::write(&path, "[]").unwrap();
        let doc = cache.load(&source).unwrap();
        assert_ne!(doc.key.content_hash, first_hash);
        assert!(doc.normalized.records.is_empty());
        assert_eq!(cache.hits(), 0);
    }

    #[test]
    fn test_invalid_document_keeps_previous_entry() {
        let mut cache = DocumentCache::new(1 << 20);
        cache.load(&MemorySource::new("a.json", ONE_RECORD)).unwrap();

        let err = cache
            .load(&MemorySource::new("b.json", "{broken"))
            .unwrap_err();
        assert!(matches!(err, TrackerError::InvalidDocument(_)));

        let current = cache.current().unwrap();
        assert_eq!(current.key.identity, "a.json");
        assert_eq!(current.normalized.records.len(), 1);
    }

    #[test]
    fn test_size_cap_enforced() {
        let mut cache = DocumentCache::new(4);
        let err = cache.load(&MemorySource::new("a.json", ONE_RECORD)).unwrap_err();
        assert!(matches!(err, TrackerError::DocumentTooLarge { .. }));
        assert!(!cache.is_cached());
    }

    #[test]
    fn test_oversized_file_rejected_before_hashing() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("costs.json");
        std::fs::write(&path, ONE_RECORD).unwrap();
        let source = PathSource::new(&path);

        let mut cache = DocumentCache::new(ONE_RECORD.len());
        cache.load(&source).unwrap();

        let mut grown = ONE_RECORD.to_string();
        grown.push_str("   ");
        std::fs::write(&path, &grown).unwrap();

        let err = cache.load(&source).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::DocumentTooLarge { size, limit } if size == grown.len() && limit == ONE_RECORD.len()
        ));
        assert_eq!(cache.current().unwrap().normalized.records.len(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_missing_file_is_file_read_error() {
        let mut cache = DocumentCache::new(1 << 20);
        let err = cache
            .load(&PathSource::new("/tmp/does-not-exist-cost-tracker-cache.json"))
            .unwrap_err();
        assert!(matches!(err, TrackerError::FileRead { .. }));
    }

    #[test]
    fn test_invalidate_forces_reparse() {
        let mut cache = DocumentCache::new(1 << 20);
        let source = MemorySource::new("a.json", ONE_RECORD);
        cache.load(&source).unwrap();
        cache.invalidate();
        assert!(cache.current().is_none());

        cache.load(&source).unwrap();
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.hits(), 0);
    }
}
