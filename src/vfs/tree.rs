//! Directory structure implied by a flat list of archive entries
//!
//! ZIP archives store paths, not directories. A directory exists if it has
//! an explicit `dir/` entry or if any entry lives below it.

use std::collections::{BTreeMap, BTreeSet};

use crate::archive::ZipEntryDescriptor;
use crate::path_utils::last_component;

/// What a path inside the archive names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeNode {
    File { size: u64 },
    Directory,
}

/// One immediate child of a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeChild<'a> {
    pub name: &'a str,
    pub path: &'a str,
    pub node: TreeNode,
}

/// Files and directory prefixes of one archive, keyed without trailing `/`
#[derive(Debug, Default)]
pub struct ArchiveTree {
    files: BTreeMap<String, u64>,
    dirs: BTreeSet<String>,
}

impl ArchiveTree {
    pub fn from_entries(entries: &[ZipEntryDescriptor]) -> Self {
        let mut tree = Self::default();
        for entry in entries {
            let path = entry.filename.trim_start_matches('/').trim_end_matches('/');
            if path.is_empty() {
                continue;
            }
            if entry.is_directory {
                tree.dirs.insert(path.to_string());
            } else {
                tree.files.insert(path.to_string(), entry.uncompressed_size);
            }
            let mut ancestor = path;
            while let Some((parent, _)) = ancestor.rsplit_once('/') {
                tree.dirs.insert(parent.to_string());
                ancestor = parent;
            }
        }
        tree
    }

    pub fn lookup(&self, path: &str) -> Option<TreeNode> {
        let path = path.trim_matches('/');
        if let Some(&size) = self.files.get(path) {
            return Some(TreeNode::File { size });
        }
        self.dirs.contains(path).then_some(TreeNode::Directory)
    }

    /// Immediate children of `dir` (empty string for the archive root), by name
    pub fn children(&self, dir: &str) -> Vec<TreeChild<'_>> {
        let dir = dir.trim_matches('/');
        let files = self.files.iter().map(|(path, &size)| (path, TreeNode::File { size }));
        let dirs = self.dirs.iter().map(|path| (path, TreeNode::Directory));

        let mut children: Vec<_> = files
            .chain(dirs)
            .filter(|(path, _)| parent_of(path) == dir)
            .map(|(path, node)| TreeChild {
                name: last_component(path),
                path,
                node,
            })
            .collect();
        children.sort_by(|a, b| a.name.cmp(b.name));
        children
    }

    /// Sum of uncompressed sizes of every file below `dir`
    pub fn size_under(&self, dir: &str) -> u64 {
        let dir = dir.trim_matches('/');
        if dir.is_empty() {
            return self.files.values().sum();
        }
        self.files
            .iter()
            .filter(|(path, _)| {
                path.strip_prefix(dir)
                    .is_some_and(|rest| rest.starts_with('/'))
            })
            .map(|(_, size)| size)
            .sum()
    }
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}
