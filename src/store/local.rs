//! Directory-backed blob store
//!
//! Each blob key maps to `<root>/<key>`. Keys that would climb out of the
//! root are treated as missing.

use std::fs::{self, File};
use std::path::PathBuf;

use tracing::trace;
use walkdir::WalkDir;

use super::{BlobMetadata, BlobSource, BlobStore, matches_glob};
use crate::error::Result;
use crate::error::archive::archive_not_found;
use crate::error::fs::io_context;
use crate::path_utils::{self, is_within, normalize_lexically};

/// Blob store rooted at a local directory
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn blob_path(&self, key: &str) -> Option<PathBuf> {
        let normalized = normalize_lexically(key);
        is_within(&normalized, ".").then(|| self.root.join(normalized))
    }
}

impl BlobStore for LocalBlobStore {
    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.blob_path(key).is_some_and(|path| path.is_file()))
    }

    fn size(&self, key: &str) -> Result<Option<u64>> {
        let Some(path) = self.blob_path(key) else {
            return Ok(None);
        };
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_context("stat blob", err)),
        }
    }

    fn open(&self, key: &str) -> Result<BlobSource> {
        let path = self
            .blob_path(key)
            .filter(|path| path.is_file())
            .ok_or_else(|| archive_not_found(key))?;
        trace!(key, "opening local blob");
        let file = File::open(&path).map_err(|err| io_context("open blob", err))?;
        Ok(BlobSource::Seekable(Box::new(file)))
    }

    fn list_matching(&self, pattern: &str) -> Result<Vec<BlobMetadata>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|err| io_context("list blobs", err.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let key = path_utils::to_forward_slashes(relative);
            if matches_glob(pattern, &key) {
                let size = entry
                    .metadata()
                    .map_err(|err| io_context("stat blob", err.into()))?
                    .len();
                matches.push(BlobMetadata { path: key, size });
            }
        }
        Ok(matches)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    fn store_with_blobs() -> (TempDir, LocalBlobStore) {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path().join("bundles/0x1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("contents.zip"), b"zipbytes").unwrap();
        fs::write(temp.path().join("bundles/0x1/notes"), b"n").unwrap();
        let store = LocalBlobStore::new(temp.path());
        (temp, store)
    }

    #[test]
    fn test_exists_and_open() {
        let (_temp, store) = store_with_blobs();
        assert!(store.exists("bundles/0x1/contents.zip").unwrap());
        assert!(!store.exists("bundles/0x1/missing.zip").unwrap());

        let mut source = store.open("bundles/0x1/contents.zip").unwrap();
        assert!(source.is_seekable());
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, b"zipbytes");
    }

    #[test]
    fn test_size_of_single_blob() {
        let (temp, store) = store_with_blobs();
        fs::create_dir_all(temp.path().join("bundles/0x[2]")).unwrap();
        fs::write(temp.path().join("bundles/0x[2]/contents"), b"12345").unwrap();

        assert_eq!(store.size("bundles/0x1/contents.zip").unwrap(), Some(8));
        assert_eq!(store.size("bundles/0x[2]/contents").unwrap(), Some(5));
        assert_eq!(store.size("bundles/0x1").unwrap(), None);
        assert_eq!(store.size("bundles/0x1/missing").unwrap(), None);
        assert_eq!(store.size("../outside").unwrap(), None);
    }

    #[test]
    fn test_open_missing_is_archive_not_found() {
        let (_temp, store) = store_with_blobs();
        let err = store.open("bundles/0x2/contents.zip").err().expect("missing");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_escaping_key_is_missing() {
        let (temp, store) = store_with_blobs();
        fs::write(temp.path().join("outside"), b"x").unwrap();
        let nested = LocalBlobStore::new(temp.path().join("bundles"));
        assert!(!nested.exists("../outside").unwrap());
        assert!(store.exists("outside").unwrap());
    }

    #[test]
    fn test_list_matching_reports_sizes() {
        let (_temp, store) = store_with_blobs();
        let listed = store.list_matching("bundles/0x1/*").unwrap();
        assert_eq!(
            listed,
            vec![
                BlobMetadata {
                    path: "bundles/0x1/contents.zip".to_string(),
                    size: 8
                },
                BlobMetadata {
                    path: "bundles/0x1/notes".to_string(),
                    size: 1
                },
            ]
        );
    }
}
