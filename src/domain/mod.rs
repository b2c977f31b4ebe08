//! Domain models for bundlefs
//!
//! This module contains the value types exchanged between components:
//! targets going in, locations in the middle, metadata trees coming out.

pub mod location;
pub mod metadata;
pub mod target;

pub use location::{ArchiveLocator, Location, ResolvedLocation};
pub use metadata::{ARCHIVE_PERM, Backend, MetadataNode, NodeKind};
pub use target::BundleTarget;
