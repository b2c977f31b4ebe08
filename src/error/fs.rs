//! File system errors

use super::BundleFsError;

/// Creates an IO error without an underlying source
pub fn io_error(message: impl Into<String>) -> BundleFsError {
    BundleFsError::IoError {
        message: message.into(),
        source: None,
    }
}

/// Wraps an IO error with a short description of the failed operation
pub fn io_context(operation: &str, err: std::io::Error) -> BundleFsError {
    if err.kind() == std::io::ErrorKind::WouldBlock {
        return BundleFsError::NotYetAvailable;
    }
    BundleFsError::IoError {
        message: format!("{operation}: {err}"),
        source: Some(err),
    }
}
