//! Opening target bytes for reading

use std::fs::{self, File};
use std::io::Read;

use tracing::debug;

use crate::archive;
use crate::domain::{ArchiveLocator, BundleTarget, Location, ResolvedLocation};
use crate::error::{BundleFsError, Result};
use crate::error::archive::{archive_not_found, entry_not_found};
use crate::error::fs::{io_context, io_error};
use crate::store::BlobStores;
use crate::vfs::tree::{ArchiveTree, TreeNode};

/// Open a resolved file location: a plain handle for local files, a
/// decompressing reader for archive entries.
pub fn open_location(
    stores: &BlobStores,
    resolved: &ResolvedLocation,
    target: &BundleTarget,
) -> Result<Box<dyn Read>> {
    match resolved.location() {
        Location::Local(path) => {
            let meta = fs::metadata(path).map_err(|err| io_context("stat target", err))?;
            if meta.is_dir() {
                return Err(is_a_directory(target));
            }
            let file = File::open(path).map_err(|err| io_context("open target", err))?;
            Ok(Box::new(file))
        }
        Location::ArchiveBacked(locator) => open_archive_location(stores, locator, target),
    }
}

fn open_archive_location(
    stores: &BlobStores,
    locator: &ArchiveLocator,
    target: &BundleTarget,
) -> Result<Box<dyn Read>> {
    let store = stores.get(locator.store())?;
    let key = locator.blob_key();
    if !store.exists(&key)? {
        return Err(archive_not_found(locator.archive_root().to_string()));
    }

    match (locator.is_archive(), locator.internal_path()) {
        (false, None) => {
            debug!(blob = %key, "opening single-file blob");
            Ok(Box::new(store.open(&key)?))
        }
        (false, Some(internal)) => Err(entry_not_found(key, internal)),
        (true, None) => Err(is_a_directory(target)),
        (true, Some(internal)) => {
            debug!(blob = %key, entry = internal, "opening archive entry");
            match archive::open_entry(store.open(&key)?, &key, internal) {
                Ok(reader) => Ok(Box::new(reader)),
                Err(err @ BundleFsError::EntryNotFound { .. }) => {
                    // Directories are `name/` entries or only implied by deeper paths.
                    let tree = ArchiveTree::from_entries(&archive::list_entries(store.open(&key)?)?);
                    match tree.lookup(internal) {
                        Some(TreeNode::Directory) => Err(is_a_directory(target)),
                        _ => Err(err),
                    }
                }
                Err(err) => Err(err),
            }
        }
    }
}

fn is_a_directory(target: &BundleTarget) -> BundleFsError {
    io_error(format!("{target} is a directory"))
}
