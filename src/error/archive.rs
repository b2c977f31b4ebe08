//! Archive parsing and lookup errors

use super::BundleFsError;

/// Creates a structural corruption error
pub fn corrupt(reason: impl Into<String>) -> BundleFsError {
    BundleFsError::CorruptArchive {
        reason: reason.into(),
    }
}

/// Creates a CRC-32 mismatch error
pub fn integrity(entry: impl Into<String>, expected: u32, actual: u32) -> BundleFsError {
    BundleFsError::IntegrityError {
        entry: entry.into(),
        expected,
        actual,
    }
}

/// Creates an unsupported feature error
pub fn unsupported(reason: impl Into<String>) -> BundleFsError {
    BundleFsError::UnsupportedArchive {
        reason: reason.into(),
    }
}

/// Creates a missing archive blob error
pub fn archive_not_found(blob: impl Into<String>) -> BundleFsError {
    BundleFsError::ArchiveNotFound { blob: blob.into() }
}

/// Creates a missing archive entry error
pub fn entry_not_found(blob: impl Into<String>, entry: impl Into<String>) -> BundleFsError {
    BundleFsError::EntryNotFound {
        blob: blob.into(),
        entry: entry.into(),
    }
}

/// Creates an unknown blob store error
pub fn store_not_found(store: impl Into<String>) -> BundleFsError {
    BundleFsError::StoreNotFound {
        store: store.into(),
    }
}

/// Creates a malformed locator error
pub fn invalid_locator(locator: impl Into<String>, reason: impl Into<String>) -> BundleFsError {
    BundleFsError::InvalidLocator {
        locator: locator.into(),
        reason: reason.into(),
    }
}
