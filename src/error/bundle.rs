//! Target resolution and path security errors

use super::BundleFsError;
use crate::path_utils::sanitize_for_display;

/// Creates a traversal escape error; only the requested subpath is reported
pub fn path_security_violation(bundle_uuid: &str, subpath: &str) -> BundleFsError {
    BundleFsError::PathSecurityViolation {
        bundle_uuid: sanitize_for_display(bundle_uuid),
        subpath: sanitize_for_display(subpath),
    }
}

/// Creates a raw-symlink access error
pub fn symlink_not_allowed(bundle_uuid: &str, subpath: &str) -> BundleFsError {
    BundleFsError::SymlinkNotAllowed {
        bundle_uuid: sanitize_for_display(bundle_uuid),
        subpath: sanitize_for_display(subpath),
    }
}

/// Creates a missing target error
pub fn not_found(bundle_uuid: &str, subpath: &str) -> BundleFsError {
    BundleFsError::NotFound {
        bundle_uuid: sanitize_for_display(bundle_uuid),
        subpath: sanitize_for_display(subpath),
    }
}

/// Creates an unknown bundle error
pub fn bundle_not_found(bundle_uuid: impl Into<String>) -> BundleFsError {
    BundleFsError::BundleNotFound {
        bundle_uuid: bundle_uuid.into(),
    }
}

/// Creates an unparseable target error
pub fn invalid_target(input: impl Into<String>, reason: impl Into<String>) -> BundleFsError {
    BundleFsError::InvalidTarget {
        input: input.into(),
        reason: reason.into(),
    }
}
