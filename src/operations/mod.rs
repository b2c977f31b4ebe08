//! High-level operations on bundle targets
//!
//! [`BundleFs`] wires the collaborators together:
//! - Resolver: dependency substitution and containment (from resolver module)
//! - Indexer: metadata trees for local and archive-backed locations
//! - Blob stores: archive bytes for archived bundles
//!
//! Every call is independent; nothing is cached between requests.

pub mod read;

use std::io::Read;

use tracing::debug;

use crate::config::Config;
use crate::domain::{BundleTarget, MetadataNode, ResolvedLocation};
use crate::error::bundle::not_found;
use crate::error::{BundleFsError, Result};
use crate::indexer::TargetInfoIndexer;
use crate::resolver::{BundleLocator, DependencyLinks, PathResolver};
use crate::store::BlobStores;

/// Entry point for resolving, indexing and reading bundle targets
pub struct BundleFs {
    locator: Box<dyn BundleLocator>,
    links: Box<dyn DependencyLinks>,
    stores: BlobStores,
}

impl BundleFs {
    pub fn new(
        locator: impl BundleLocator + 'static,
        links: impl DependencyLinks + 'static,
        stores: BlobStores,
    ) -> Self {
        Self {
            locator: Box::new(locator),
            links: Box::new(links),
            stores,
        }
    }

    /// Build from a loaded configuration file.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.locator()?,
            config.dependency_map()?,
            config.blob_stores(),
        ))
    }

    fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(self.locator.as_ref(), self.links.as_ref())
    }

    /// Resolve `target` and describe it, expanding directories `depth` levels.
    ///
    /// The returned root carries the target actually resolved, which differs
    /// from `target` when a dependency key was substituted.
    pub fn resolve_and_index(&self, target: &BundleTarget, depth: usize) -> Result<MetadataNode> {
        let (effective, resolved) = self.resolver().resolve(target)?;
        debug!(target = %target, location = %resolved, depth, "indexing target");
        let node = TargetInfoIndexer::new(&self.stores)
            .index(&resolved, depth)
            .map_err(|err| missing_as_not_found(err, &effective))?;
        Ok(node.with_resolved_target(effective))
    }

    /// Resolve `target` without inspecting what the location holds.
    ///
    /// Returns the target actually resolved alongside its location.
    pub fn resolve_location(&self, target: &BundleTarget) -> Result<(BundleTarget, ResolvedLocation)> {
        self.resolver().resolve(target)
    }

    /// Resolve `target` to a location that is safe to open for reading.
    ///
    /// Fails with [`BundleFsError::SymlinkNotAllowed`] when the location is
    /// itself a symlink.
    pub fn resolve_readable_location(&self, target: &BundleTarget) -> Result<ResolvedLocation> {
        self.resolver()
            .resolve_readable(target)
            .map(|(_, resolved)| resolved)
    }

    /// Open the bytes of a file target.
    ///
    /// Archive entries are decompressed and CRC-checked while reading.
    pub fn open_target(&self, target: &BundleTarget) -> Result<Box<dyn Read>> {
        let (effective, resolved) = self.resolver().resolve_readable(target)?;
        debug!(target = %target, location = %resolved, "opening target");
        read::open_location(&self.stores, &resolved, &effective)
            .map_err(|err| missing_as_not_found(err, &effective))
    }
}

/// Report a missing path or entry under the target that was asked for.
fn missing_as_not_found(err: BundleFsError, target: &BundleTarget) -> BundleFsError {
    match err {
        BundleFsError::EntryNotFound { .. } => not_found(target.bundle_uuid(), target.subpath()),
        err if err.io_kind() == Some(std::io::ErrorKind::NotFound) => {
            not_found(target.bundle_uuid(), target.subpath())
        }
        err => err,
    }
}
