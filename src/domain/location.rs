//! Bundle and target locations
//!
//! A [`Location`] is either a local filesystem path or an archive locator of
//! the form `blob://<store>/bundles/<uuid>/<blob-name>[/<internal-path>]`.
//! [`ResolvedLocation`] wraps a location that has passed the resolver's
//! containment checks and can only be built inside this crate.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::error::archive::invalid_locator;
use crate::path_utils::last_component;

/// Scheme prefix for archive-backed locations
pub const ARCHIVE_SCHEME: &str = "blob://";

/// Path segment that precedes the bundle uuid in a blob key
pub const BUNDLES_PREFIX: &str = "bundles";

/// Blob names with this suffix are ZIP archives; anything else is a single file
pub const ARCHIVE_SUFFIX: &str = ".zip";

/// Where a blob lives in a remote store, and optionally which path inside it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveLocator {
    store: String,
    bundle_uuid: String,
    blob_name: String,
    internal_path: Option<String>,
}

impl ArchiveLocator {
    pub fn new(
        store: impl Into<String>,
        bundle_uuid: impl Into<String>,
        blob_name: impl Into<String>,
    ) -> Self {
        Self {
            store: store.into(),
            bundle_uuid: bundle_uuid.into(),
            blob_name: blob_name.into(),
            internal_path: None,
        }
    }

    /// Parse a `blob://` locator string.
    pub fn parse(input: &str) -> Result<Self> {
        let rest = input
            .strip_prefix(ARCHIVE_SCHEME)
            .ok_or_else(|| invalid_locator(input, format!("missing {ARCHIVE_SCHEME} scheme")))?;

        let mut parts = rest.splitn(5, '/');
        let store = parts.next().unwrap_or_default();
        let bundles = parts.next().unwrap_or_default();
        let bundle_uuid = parts.next().unwrap_or_default();
        let blob_name = parts.next().unwrap_or_default();
        let internal = parts.next().unwrap_or_default();

        if store.is_empty() {
            return Err(invalid_locator(input, "missing store name"));
        }
        if bundles != BUNDLES_PREFIX {
            return Err(invalid_locator(
                input,
                format!("expected '{BUNDLES_PREFIX}/' after the store name"),
            ));
        }
        if bundle_uuid.is_empty() || blob_name.is_empty() {
            return Err(invalid_locator(input, "missing bundle uuid or blob name"));
        }

        Ok(Self::new(store, bundle_uuid, blob_name).with_internal_path(internal))
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    pub fn bundle_uuid(&self) -> &str {
        &self.bundle_uuid
    }

    pub fn blob_name(&self) -> &str {
        &self.blob_name
    }

    /// Path inside the archive without leading or trailing separators
    pub fn internal_path(&self) -> Option<&str> {
        self.internal_path.as_deref()
    }

    /// Key of the outer blob inside its store, independent of any internal path
    pub fn blob_key(&self) -> String {
        format!("{BUNDLES_PREFIX}/{}/{}", self.bundle_uuid, self.blob_name)
    }

    /// Whether the blob is a ZIP archive rather than a single stored file
    pub fn is_archive(&self) -> bool {
        self.blob_name.ends_with(ARCHIVE_SUFFIX)
    }

    /// Same blob, addressing `path` inside it (empty means the whole archive)
    #[must_use]
    pub fn with_internal_path(&self, path: &str) -> Self {
        let trimmed = path.trim_matches('/');
        Self {
            internal_path: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            ..self.clone()
        }
    }

    /// Same blob without an internal path
    #[must_use]
    pub fn archive_root(&self) -> Self {
        self.with_internal_path("")
    }

    /// Name shown for the addressed node: the internal path's last component,
    /// or the bundle uuid for the whole archive
    pub fn display_name(&self) -> &str {
        match &self.internal_path {
            Some(path) => last_component(path),
            None if self.is_archive() => &self.bundle_uuid,
            None => &self.blob_name,
        }
    }
}

impl fmt::Display for ArchiveLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ARCHIVE_SCHEME}{}/{}", self.store, self.blob_key())?;
        if let Some(path) = &self.internal_path {
            write!(f, "/{path}")?;
        }
        Ok(())
    }
}

/// Either a local path or an archive-backed locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local(PathBuf),
    ArchiveBacked(ArchiveLocator),
}

impl Location {
    /// Parse a location string, dispatching on the scheme prefix.
    pub fn parse(input: &str) -> Result<Self> {
        if input.starts_with(ARCHIVE_SCHEME) {
            ArchiveLocator::parse(input).map(Location::ArchiveBacked)
        } else {
            Ok(Location::Local(PathBuf::from(input)))
        }
    }

    pub fn as_local(&self) -> Option<&Path> {
        match self {
            Location::Local(path) => Some(path),
            Location::ArchiveBacked(_) => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Local(path) => write!(f, "{}", path.display()),
            Location::ArchiveBacked(locator) => write!(f, "{locator}"),
        }
    }
}

/// A location proven to stay inside its bundle root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    location: Location,
}

impl ResolvedLocation {
    pub(crate) fn local(path: PathBuf) -> Self {
        Self {
            location: Location::Local(path),
        }
    }

    pub(crate) fn archive(locator: ArchiveLocator) -> Self {
        Self {
            location: Location::ArchiveBacked(locator),
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }
}

impl fmt::Display for ResolvedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.location.fmt(f)
    }
}
