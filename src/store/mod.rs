//! Blob store collaborators
//!
//! Archive-backed bundles live as opaque blobs in a named store. Everything
//! that reads them receives a `&dyn BlobStore`; nothing here is global.
//!
//! - [`local`]: blobs stored as files under a directory
//! - [`memory`]: in-memory store for tests and embedding

pub mod local;
pub mod memory;

use std::collections::BTreeMap;
use std::io::{self, Read, Seek};
use std::path::Path;

use wax::{CandidatePath, Glob, Pattern};

use crate::error::Result;
use crate::error::archive::store_not_found;
use crate::path_utils;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

/// Object-safe `Read + Seek`
pub trait SeekableRead: Read + Seek {}

impl<T: Read + Seek> SeekableRead for T {}

/// An open blob, seekable when the store supports ranged reads
pub enum BlobSource {
    Seekable(Box<dyn SeekableRead>),
    Stream(Box<dyn Read>),
}

impl BlobSource {
    pub fn is_seekable(&self) -> bool {
        matches!(self, BlobSource::Seekable(_))
    }
}

impl Read for BlobSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BlobSource::Seekable(source) => source.read(buf),
            BlobSource::Stream(source) => source.read(buf),
        }
    }
}

/// Listing entry returned by [`BlobStore::list_matching`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMetadata {
    pub path: String,
    pub size: u64,
}

/// Read-only access to a blob store
pub trait BlobStore {
    /// Whether a blob exists at `key`
    fn exists(&self, key: &str) -> Result<bool>;

    /// Size in bytes of the blob at `key`, `None` when it does not exist
    fn size(&self, key: &str) -> Result<Option<u64>>;

    /// Open the blob at `key` for reading
    fn open(&self, key: &str) -> Result<BlobSource>;

    /// Every blob whose key matches `pattern`, sorted by key
    fn list_matching(&self, pattern: &str) -> Result<Vec<BlobMetadata>>;
}

/// Match a `/`-separated blob key against a glob pattern.
///
/// Invalid patterns fall back to an exact comparison.
pub fn matches_glob(pattern: &str, key: &str) -> bool {
    let normalized = path_utils::to_forward_slashes(Path::new(key));
    let candidate = CandidatePath::from(normalized.as_str());
    match Glob::new(pattern) {
        Ok(glob) => glob.matched(&candidate).is_some(),
        Err(_) => pattern == normalized,
    }
}

/// Named blob stores available to a [`crate::operations::BundleFs`]
#[derive(Default)]
pub struct BlobStores {
    stores: BTreeMap<String, Box<dyn BlobStore>>,
}

impl BlobStores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, store: impl BlobStore + 'static) {
        self.stores.insert(name.into(), Box::new(store));
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, store: impl BlobStore + 'static) -> Self {
        self.insert(name, store);
        self
    }

    /// Store registered under `name`
    pub fn get(&self, name: &str) -> Result<&dyn BlobStore> {
        self.stores
            .get(name)
            .map(Box::as_ref)
            .ok_or_else(|| store_not_found(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_glob_literal_and_wildcard() {
        assert!(matches_glob(
            "bundles/0x1/contents.zip",
            "bundles/0x1/contents.zip"
        ));
        assert!(!matches_glob("bundles/0x1/contents.zip", "bundles/0x1/other"));
        assert!(matches_glob("bundles/*/contents.zip", "bundles/0x2/contents.zip"));
        assert!(matches_glob("bundles/**", "bundles/0x2/contents"));
    }

    #[test]
    fn test_unknown_store() {
        let stores = BlobStores::new().with("main", MemoryBlobStore::new());
        assert!(stores.get("main").is_ok());
        let err = stores.get("other").err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("Blob store 'other' is not configured"));
    }
}
