//! Depth-bounded metadata trees
//!
//! Local directories and archive-backed virtual directories both produce
//! [`MetadataNode`] trees of the same shape.

use serde::{Deserialize, Serialize};

use super::target::BundleTarget;

/// Permission bits reported for every archive-backed node
pub const ARCHIVE_PERM: u32 = 0o777;

/// Kind of a metadata node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
    Link,
}

/// Which backend serves the node's bytes
///
/// Readers use this to decide whether to decompress on open or open a plain
/// file handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Local,
    Archive,
}

impl Backend {
    pub fn is_local(&self) -> bool {
        matches!(self, Backend::Local)
    }
}

/// One node of a metadata tree
///
/// `contents` is present only for directories expanded while the depth
/// budget was positive; `link` only for symlinks; `resolved_target` only on
/// the root returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub size: u64,
    pub perm: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<Vec<MetadataNode>>,
    #[serde(rename = "fs", default, skip_serializing_if = "Backend::is_local")]
    pub backend: Backend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_target: Option<BundleTarget>,
}

impl MetadataNode {
    fn new(name: impl Into<String>, kind: NodeKind, size: u64, perm: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            size,
            perm,
            link: None,
            contents: None,
            backend: Backend::Local,
            resolved_target: None,
        }
    }

    pub fn file(name: impl Into<String>, size: u64, perm: u32) -> Self {
        Self::new(name, NodeKind::File, size, perm)
    }

    pub fn directory(name: impl Into<String>, size: u64, perm: u32) -> Self {
        Self::new(name, NodeKind::Directory, size, perm)
    }

    pub fn link(name: impl Into<String>, size: u64, perm: u32, target: impl Into<String>) -> Self {
        Self {
            link: Some(target.into()),
            ..Self::new(name, NodeKind::Link, size, perm)
        }
    }

    #[must_use]
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    #[must_use]
    pub fn with_contents(mut self, contents: Vec<MetadataNode>) -> Self {
        self.contents = Some(contents);
        self
    }

    #[must_use]
    pub fn with_resolved_target(mut self, target: BundleTarget) -> Self {
        self.resolved_target = Some(target);
        self
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Direct child by name, if contents were expanded
    pub fn child(&self, name: &str) -> Option<&MetadataNode> {
        self.contents
            .as_ref()
            .and_then(|contents| contents.iter().find(|node| node.name == name))
    }

    /// Names of the direct children, empty when contents were not expanded
    pub fn child_names(&self) -> Vec<&str> {
        self.contents
            .iter()
            .flatten()
            .map(|node| node.name.as_str())
            .collect()
    }

    /// Follow `/`-separated names through expanded contents
    pub fn descendant(&self, path: &str) -> Option<&MetadataNode> {
        path.split('/')
            .filter(|part| !part.is_empty())
            .try_fold(self, |node, part| node.child(part))
    }
}
