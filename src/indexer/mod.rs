//! Metadata trees for resolved locations
//!
//! [`TargetInfoIndexer`] dispatches on the location variant: local paths are
//! read with `lstat` ([`local`]), archive-backed locators are handed whole to
//! [`crate::vfs::ZipVirtualFs`].

pub mod local;

use tracing::debug;

use crate::domain::{Location, MetadataNode, ResolvedLocation};
use crate::error::Result;
use crate::store::BlobStores;
use crate::vfs::ZipVirtualFs;

/// Builds depth-bounded metadata trees
pub struct TargetInfoIndexer<'a> {
    stores: &'a BlobStores,
}

impl<'a> TargetInfoIndexer<'a> {
    pub fn new(stores: &'a BlobStores) -> Self {
        Self { stores }
    }

    /// Metadata for `resolved`, expanding directories `depth` levels deep.
    pub fn index(&self, resolved: &ResolvedLocation, depth: usize) -> Result<MetadataNode> {
        match resolved.location() {
            Location::Local(path) => {
                debug!(path = %path.display(), depth, "indexing local path");
                local::index_path(path, depth)
            }
            Location::ArchiveBacked(locator) => {
                debug!(locator = %locator, depth, "indexing archive");
                let store = self.stores.get(locator.store())?;
                ZipVirtualFs::new(store).index(locator, depth)
            }
        }
    }
}
