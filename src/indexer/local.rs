//! Metadata for paths on the local filesystem

use std::fs::{self, Metadata};
use std::path::Path;

use tracing::trace;
use walkdir::WalkDir;

use crate::domain::MetadataNode;
use crate::error::Result;
use crate::error::fs::io_context;

/// Index `path` without following it, expanding directories `depth` levels.
pub fn index_path(path: &Path, depth: usize) -> Result<MetadataNode> {
    let meta = fs::symlink_metadata(path)
        .map_err(|err| io_context(&format!("stat {}", path.display()), err))?;
    let name = node_name(path);
    let perm = permission_bits(&meta);
    let file_type = meta.file_type();

    if file_type.is_symlink() {
        let target = fs::read_link(path)
            .map_err(|err| io_context(&format!("read link {}", path.display()), err))?;
        trace!(path = %path.display(), target = %target.display(), "indexed link");
        return Ok(MetadataNode::link(
            name,
            meta.len(),
            perm,
            target.to_string_lossy(),
        ));
    }

    if !file_type.is_dir() {
        return Ok(MetadataNode::file(name, meta.len(), perm));
    }

    let node = MetadataNode::directory(name, meta.len(), perm);
    if depth == 0 {
        return Ok(node);
    }

    let contents = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            let entry = entry.map_err(|err| io_context("list directory", err.into()))?;
            index_path(entry.path(), depth - 1)
        })
        .collect::<Result<Vec<_>>>()?;
    trace!(path = %path.display(), children = contents.len(), "indexed directory");
    Ok(node.with_contents(contents))
}

fn node_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.to_string_lossy().into_owned(),
        |name| name.to_string_lossy().into_owned(),
    )
}

#[cfg(unix)]
fn permission_bits(meta: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn permission_bits(meta: &Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o555
    } else {
        0o777
    }
}
