//! Target resolution for bundlefs
//!
//! This module handles:
//! - One-shot dependency substitution ([`dependency`])
//! - Mapping a bundle uuid to its root location ([`locator`])
//! - Proving a subpath stays inside that root ([`PathResolver`])
//!
//! Containment is checked lexically on `/`-separated strings. The subpath is
//! appended to the root with a separator rather than `Path::join`, so an
//! absolute subpath can never replace the root.

pub mod dependency;
pub mod locator;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

pub use dependency::{DependencyLinks, DependencyMap, substitute_once};
pub use locator::{BundleLocator, ConfiguredLocator};

use crate::domain::{ArchiveLocator, BundleTarget, Location, ResolvedLocation};
use crate::error::Result;
use crate::error::bundle::{path_security_violation, symlink_not_allowed};
use crate::path_utils::{is_within, normalize_lexically};

/// Resolves bundle targets into locations proven to stay inside their bundle
pub struct PathResolver<'a> {
    locator: &'a dyn BundleLocator,
    links: &'a dyn DependencyLinks,
}

impl<'a> PathResolver<'a> {
    pub fn new(locator: &'a dyn BundleLocator, links: &'a dyn DependencyLinks) -> Self {
        Self { locator, links }
    }

    /// Substitute dependencies once, then resolve inside the bundle root.
    ///
    /// Returns the target actually resolved alongside its location.
    pub fn resolve(&self, target: &BundleTarget) -> Result<(BundleTarget, ResolvedLocation)> {
        let effective = substitute_once(self.links, target);
        if &effective != target {
            debug!(requested = %target, resolved = %effective, "substituted dependency");
        }
        let root = self.locator.locate(effective.bundle_uuid())?;
        let resolved = resolve_within(&root, &effective)?;
        Ok((effective, resolved))
    }

    /// Like [`Self::resolve`], but refuses a location that is itself a symlink.
    pub fn resolve_readable(
        &self,
        target: &BundleTarget,
    ) -> Result<(BundleTarget, ResolvedLocation)> {
        let (effective, resolved) = self.resolve(target)?;
        ensure_not_symlink(&resolved, &effective)?;
        Ok((effective, resolved))
    }
}

/// Resolve `target`'s subpath against a bundle `root`.
pub fn resolve_within(root: &Location, target: &BundleTarget) -> Result<ResolvedLocation> {
    match root {
        Location::Local(path) => resolve_local(path, target),
        Location::ArchiveBacked(locator) => resolve_archive(locator, target),
    }
}

/// Fail when a local location is a symlink (checked without following it).
pub fn ensure_not_symlink(resolved: &ResolvedLocation, target: &BundleTarget) -> Result<()> {
    match resolved.location() {
        Location::Local(path) => match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => Err(symlink_not_allowed(
                target.bundle_uuid(),
                target.subpath(),
            )),
            _ => Ok(()),
        },
        Location::ArchiveBacked(_) => Ok(()),
    }
}

/// Real path of a bundle root, or its lexical normal form when it cannot be
/// canonicalized (missing, or unreadable parents).
fn canonical_root(root: &Path) -> String {
    match dunce::canonicalize(root) {
        Ok(real) => real.to_string_lossy().into_owned(),
        Err(err) => {
            trace!(root = %root.display(), error = %err, "root not canonicalizable");
            normalize_lexically(&root.to_string_lossy())
        }
    }
}

fn resolve_local(root: &Path, target: &BundleTarget) -> Result<ResolvedLocation> {
    let root = normalize_lexically(&canonical_root(root));
    let subpath = target.subpath();
    let joined = if subpath.is_empty() {
        root.clone()
    } else {
        format!("{root}/{subpath}")
    };
    let normalized = normalize_lexically(&joined);

    if !is_within(&normalized, &root) {
        return Err(path_security_violation(target.bundle_uuid(), subpath));
    }
    trace!(target = %target, "resolved local target");
    Ok(ResolvedLocation::local(PathBuf::from(normalized)))
}

fn resolve_archive(locator: &ArchiveLocator, target: &BundleTarget) -> Result<ResolvedLocation> {
    let base = locator.internal_path().unwrap_or_default();
    let subpath = target.subpath().trim_start_matches('/');
    let joined = match (base.is_empty(), subpath.is_empty()) {
        (_, true) => base.to_string(),
        (true, false) => subpath.to_string(),
        (false, false) => format!("{base}/{subpath}"),
    };
    let normalized = normalize_lexically(&joined);

    if !is_within(&normalized, &normalize_lexically(base)) {
        return Err(path_security_violation(target.bundle_uuid(), target.subpath()));
    }
    let internal = if normalized == "." { "" } else { &normalized };
    trace!(target = %target, internal, "resolved archive target");
    Ok(ResolvedLocation::archive(locator.with_internal_path(internal)))
}
