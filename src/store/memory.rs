//! In-memory blob store

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{BlobMetadata, BlobSource, BlobStore, matches_glob};
use crate::error::Result;
use crate::error::archive::archive_not_found;

/// Blob store holding every blob in memory
///
/// With [`MemoryBlobStore::stream_only`] every opened source is
/// forward-only, the way a plain HTTP download would be.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: BTreeMap<String, Arc<Vec<u8>>>,
    stream_only: bool,
    opens: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve non-seekable sources only
    #[must_use]
    pub fn stream_only(mut self) -> Self {
        self.stream_only = true;
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.blobs.insert(key.into(), Arc::new(bytes.into()));
    }

    #[must_use]
    pub fn with_blob(mut self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(key, bytes);
        self
    }

    /// Number of successful `open` calls so far
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::Relaxed)
    }
}

/// Shares one blob's bytes between many cursors
#[derive(Debug, Clone)]
struct SharedBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl BlobStore for MemoryBlobStore {
    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.blobs.contains_key(key))
    }

    fn size(&self, key: &str) -> Result<Option<u64>> {
        Ok(self.blobs.get(key).map(|bytes| bytes.len() as u64))
    }

    fn open(&self, key: &str) -> Result<BlobSource> {
        let bytes = self.blobs.get(key).ok_or_else(|| archive_not_found(key))?;
        self.opens.fetch_add(1, Ordering::Relaxed);
        let cursor = Cursor::new(SharedBytes(Arc::clone(bytes)));
        Ok(if self.stream_only {
            BlobSource::Stream(Box::new(cursor))
        } else {
            BlobSource::Seekable(Box::new(cursor))
        })
    }

    fn list_matching(&self, pattern: &str) -> Result<Vec<BlobMetadata>> {
        Ok(self
            .blobs
            .iter()
            .filter(|(key, _)| matches_glob(pattern, key))
            .map(|(key, bytes)| BlobMetadata {
                path: key.clone(),
                size: bytes.len() as u64,
            })
            .collect())
    }
}
