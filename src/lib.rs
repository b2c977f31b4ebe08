//! bundlefs - resolve bundle targets and browse ZIP-backed bundles
//!
//! A bundle is a directory tree addressed by a uuid. It lives either as a
//! local directory or as a ZIP archive in a blob store. [`operations::BundleFs`]
//! turns a [`domain::BundleTarget`] (`uuid:subpath`) into a location proven to
//! stay inside the bundle, describes it as a depth-bounded metadata tree, and
//! opens its bytes.
//!
//! Archives are read without extraction by [`archive::StreamingZipReader`],
//! which also works on sources that are still being written
//! ([`stream::AppendBuffer`]).

pub mod archive;
pub mod config;
pub mod domain;
pub mod error;
pub mod indexer;
pub mod operations;
pub mod path_utils;
pub mod resolver;
pub mod store;
pub mod stream;
pub mod vfs;

#[cfg(test)]
mod test_fixtures;

pub use archive::open_archive_stream;
pub use domain::{BundleTarget, MetadataNode, ResolvedLocation};
pub use error::{BundleFsError, Result};
pub use operations::BundleFs;
