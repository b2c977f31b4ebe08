//! Error types and handling for bundlefs
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`bundle`]: Target resolution and path security errors
//! - [`archive`]: ZIP parsing and archive lookup errors
//! - [`config`]: Configuration errors
//! - [`fs`]: File system errors

pub mod archive;
pub mod bundle;
pub mod config;
pub mod fs;


use miette::Diagnostic;
use thiserror::Error;

/// Main error type for bundlefs operations
#[derive(Error, Diagnostic, Debug)]
pub enum BundleFsError {
    // Bundle errors
    #[error("{bundle_uuid}/{subpath} is not inside the bundle")]
    #[diagnostic(
        code(bundlefs::bundle::path_security_violation),
        help("Subpaths must stay inside the bundle; remove '..' segments that climb above its root")
    )]
    PathSecurityViolation {
        bundle_uuid: String,
        subpath: String,
    },

    #[error("{bundle_uuid}/{subpath} is a symlink and following symlinks is not allowed")]
    #[diagnostic(
        code(bundlefs::bundle::symlink_not_allowed),
        help("Request the file or directory the link points to instead of the link itself")
    )]
    SymlinkNotAllowed {
        bundle_uuid: String,
        subpath: String,
    },

    #[error("Path '{subpath}' in bundle {bundle_uuid} not found")]
    #[diagnostic(code(bundlefs::bundle::path_not_found))]
    NotFound {
        bundle_uuid: String,
        subpath: String,
    },

    #[error("Bundle '{bundle_uuid}' not found")]
    #[diagnostic(
        code(bundlefs::bundle::not_found),
        help("Check bundles_dir and archived_bundles in the configuration file")
    )]
    BundleNotFound { bundle_uuid: String },

    #[error("Invalid bundle target '{input}': {reason}")]
    #[diagnostic(
        code(bundlefs::bundle::invalid_target),
        help("Targets are written as <bundle-uuid> or <bundle-uuid>:<subpath>")
    )]
    InvalidTarget { input: String, reason: String },

    // Archive errors
    #[error("Archive not found: {blob}")]
    #[diagnostic(code(bundlefs::archive::not_found))]
    ArchiveNotFound { blob: String },

    #[error("Entry '{entry}' not found in archive {blob}")]
    #[diagnostic(code(bundlefs::archive::entry_not_found))]
    EntryNotFound { blob: String, entry: String },

    #[error("Corrupt archive: {reason}")]
    #[diagnostic(
        code(bundlefs::archive::corrupt),
        help("The archive bytes are structurally invalid; re-reading them will not help")
    )]
    CorruptArchive { reason: String },

    #[error("CRC-32 mismatch for entry '{entry}': expected {expected:08x}, got {actual:08x}")]
    #[diagnostic(code(bundlefs::archive::integrity))]
    IntegrityError {
        entry: String,
        expected: u32,
        actual: u32,
    },

    #[error("Unsupported archive feature: {reason}")]
    #[diagnostic(code(bundlefs::archive::unsupported))]
    UnsupportedArchive { reason: String },

    #[error("Archive bytes not yet available")]
    #[diagnostic(
        code(bundlefs::archive::not_yet_available),
        help("The source has not received enough bytes yet; retry once more data is written")
    )]
    NotYetAvailable,

    #[error("Invalid archive locator '{locator}': {reason}")]
    #[diagnostic(
        code(bundlefs::archive::invalid_locator),
        help("Locators look like blob://<store>/bundles/<uuid>/<blob-name>[/<internal-path>]")
    )]
    InvalidLocator { locator: String, reason: String },

    #[error("Blob store '{store}' is not configured")]
    #[diagnostic(
        code(bundlefs::archive::store_not_found),
        help("Add the store to blob_stores in the configuration file")
    )]
    StoreNotFound { store: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(code(bundlefs::config::not_found))]
    ConfigNotFound { path: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(bundlefs::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(bundlefs::config::invalid))]
    ConfigInvalid { message: String },

    #[error("Failed to read configuration file: {path}")]
    #[diagnostic(code(bundlefs::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    // File system errors
    #[error("IO error: {message}")]
    #[diagnostic(code(bundlefs::fs::io_error))]
    IoError {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl BundleFsError {
    /// True for every "does not exist" flavour: targets, bundles, archives and entries.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BundleFsError::NotFound { .. }
                | BundleFsError::BundleNotFound { .. }
                | BundleFsError::ArchiveNotFound { .. }
                | BundleFsError::EntryNotFound { .. }
        )
    }

    /// Kind of the underlying IO error, if this wraps one
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            BundleFsError::IoError {
                source: Some(source),
                ..
            } => Some(source.kind()),
            _ => None,
        }
    }

    /// True when the same call may succeed once the source has more bytes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BundleFsError::NotYetAvailable)
    }
}

impl From<std::io::Error> for BundleFsError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::WouldBlock {
            return BundleFsError::NotYetAvailable;
        }

        // Entry readers smuggle archive errors through `io::Read`; unwrap them again.
        if err
            .get_ref()
            .is_some_and(|inner| inner.is::<BundleFsError>())
        {
            let message = err.to_string();
            return match err.into_inner().map(|inner| inner.downcast::<BundleFsError>()) {
                Some(Ok(inner)) => *inner,
                _ => BundleFsError::IoError {
                    message,
                    source: None,
                },
            };
        }

        BundleFsError::IoError {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<BundleFsError> for std::io::Error {
    fn from(err: BundleFsError) -> Self {
        let kind = match &err {
            BundleFsError::NotYetAvailable => std::io::ErrorKind::WouldBlock,
            BundleFsError::CorruptArchive { .. } | BundleFsError::IntegrityError { .. } => {
                std::io::ErrorKind::InvalidData
            }
            BundleFsError::UnsupportedArchive { .. } => std::io::ErrorKind::Unsupported,
            _ if err.is_not_found() => std::io::ErrorKind::NotFound,
            _ => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

impl From<serde_yaml::Error> for BundleFsError {
    fn from(err: serde_yaml::Error) -> Self {
        BundleFsError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BundleFsError {
    fn from(err: serde_json::Error) -> Self {
        BundleFsError::IoError {
            message: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, BundleFsError>;
