//! Archive-backed bundles presented as directory trees
//!
//! [`ZipVirtualFs`] turns a blob locator into the same [`MetadataNode`]
//! shape a local directory produces. Archives are listed without being
//! extracted: through the central directory when the store hands out a
//! seekable source, otherwise by streaming local headers.
//!
//! Each directory level is a separate call that opens the blob, lists it,
//! and drops the handle before recursing.

pub mod tree;

use tracing::debug;

use crate::archive;
use crate::domain::{ARCHIVE_PERM, ArchiveLocator, Backend, MetadataNode};
use crate::error::Result;
use crate::error::archive::{archive_not_found, entry_not_found};
use crate::store::BlobStore;
use tree::{ArchiveTree, TreeNode};

/// Metadata view over archives in one blob store
pub struct ZipVirtualFs<'a> {
    store: &'a dyn BlobStore,
}

impl<'a> ZipVirtualFs<'a> {
    pub fn new(store: &'a dyn BlobStore) -> Self {
        Self { store }
    }

    /// Metadata for `locator`, expanding directories `depth` levels deep.
    ///
    /// A missing blob is reported as [`crate::error::BundleFsError::ArchiveNotFound`]
    /// even when the internal path would also be missing.
    pub fn index(&self, locator: &ArchiveLocator, depth: usize) -> Result<MetadataNode> {
        let key = locator.blob_key();
        if !self.store.exists(&key)? {
            return Err(archive_not_found(locator.archive_root().to_string()));
        }
        if !locator.is_archive() {
            return self.index_single_file(locator, &key);
        }

        let entries = {
            let source = self.store.open(&key)?;
            archive::list_entries(source)?
        };
        debug!(blob = %key, entries = entries.len(), internal = ?locator.internal_path(), "listed archive");
        let tree = ArchiveTree::from_entries(&entries);

        let Some(internal) = locator.internal_path() else {
            let root = archive_node(MetadataNode::directory(
                locator.bundle_uuid(),
                tree.size_under(""),
                ARCHIVE_PERM,
            ));
            return self.expand(root, &tree, locator, "", depth);
        };

        match tree.lookup(internal) {
            Some(TreeNode::File { size }) => Ok(archive_node(MetadataNode::file(
                locator.display_name(),
                size,
                ARCHIVE_PERM,
            ))),
            Some(TreeNode::Directory) => {
                let dir = archive_node(MetadataNode::directory(
                    locator.display_name(),
                    tree.size_under(internal),
                    ARCHIVE_PERM,
                ));
                self.expand(dir, &tree, locator, internal, depth)
            }
            None => Err(entry_not_found(key, internal)),
        }
    }

    fn index_single_file(&self, locator: &ArchiveLocator, key: &str) -> Result<MetadataNode> {
        if let Some(internal) = locator.internal_path() {
            return Err(entry_not_found(key, internal));
        }
        let size = self
            .store
            .size(key)?
            .ok_or_else(|| archive_not_found(locator.to_string()))?;
        Ok(archive_node(MetadataNode::file(
            locator.blob_name(),
            size,
            ARCHIVE_PERM,
        )))
    }

    fn expand(
        &self,
        node: MetadataNode,
        tree: &ArchiveTree,
        locator: &ArchiveLocator,
        dir: &str,
        depth: usize,
    ) -> Result<MetadataNode> {
        if depth == 0 {
            return Ok(node);
        }
        let contents = tree
            .children(dir)
            .into_iter()
            .map(|child| match child.node {
                TreeNode::File { size } => Ok(archive_node(MetadataNode::file(
                    child.name,
                    size,
                    ARCHIVE_PERM,
                ))),
                TreeNode::Directory => self.index(&locator.with_internal_path(child.path), depth - 1),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(node.with_contents(contents))
    }
}

fn archive_node(node: MetadataNode) -> MetadataNode {
    node.with_backend(Backend::Archive)
}
