//! Bundle root lookup

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::domain::{ArchiveLocator, Location};
use crate::error::Result;
use crate::error::bundle::bundle_not_found;

/// Maps a bundle uuid to the location of its root
pub trait BundleLocator {
    fn locate(&self, bundle_uuid: &str) -> Result<Location>;
}

/// Locator backed by configuration
///
/// Archived bundles are looked up first; otherwise the bundle is expected at
/// `<bundles_dir>/<uuid>`.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredLocator {
    bundles_dir: Option<PathBuf>,
    archived: BTreeMap<String, ArchiveLocator>,
}

impl ConfiguredLocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bundles_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bundles_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_archived(mut self, bundle_uuid: impl Into<String>, root: ArchiveLocator) -> Self {
        self.archived.insert(bundle_uuid.into(), root);
        self
    }

    pub fn bundles_dir(&self) -> Option<&Path> {
        self.bundles_dir.as_deref()
    }
}

/// A uuid must be a single plain path component
fn is_plain_component(bundle_uuid: &str) -> bool {
    !bundle_uuid.is_empty()
        && bundle_uuid != "."
        && bundle_uuid != ".."
        && !bundle_uuid.contains(['/', '\\'])
}

impl BundleLocator for ConfiguredLocator {
    fn locate(&self, bundle_uuid: &str) -> Result<Location> {
        if let Some(root) = self.archived.get(bundle_uuid) {
            trace!(bundle_uuid, root = %root, "archived bundle");
            return Ok(Location::ArchiveBacked(root.clone()));
        }

        let dir = self
            .bundles_dir
            .as_ref()
            .filter(|_| is_plain_component(bundle_uuid))
            .map(|dir| dir.join(bundle_uuid))
            .filter(|path| fs::symlink_metadata(path).is_ok())
            .ok_or_else(|| bundle_not_found(bundle_uuid))?;
        trace!(bundle_uuid, root = %dir.display(), "local bundle");
        Ok(Location::Local(dir))
    }
}
