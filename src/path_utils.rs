//! Path string utilities shared by the resolver and the archive view
//!
//! Archive-internal paths are always `/`-separated regardless of platform,
//! so the helpers here operate on strings rather than `Path`.

use std::path::Path;

/// Convert a path to a string with forward slashes
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use bundlefs::path_utils::to_forward_slashes;
///
/// assert_eq!(to_forward_slashes(Path::new("a\\b/c")), "a/b/c");
/// ```
pub fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Escape control characters so user-supplied paths are safe to print.
///
/// # Examples
///
/// ```
/// use bundlefs::path_utils::sanitize_for_display;
///
/// assert_eq!(sanitize_for_display("a/b.txt"), "a/b.txt");
/// assert_eq!(sanitize_for_display("a\nb"), "a\\nb");
/// ```
pub fn sanitize_for_display(input: &str) -> String {
    input
        .chars()
        .flat_map(|c| {
            let escaped: Vec<char> = if c.is_control() {
                c.escape_debug().collect()
            } else {
                vec![c]
            };
            escaped
        })
        .collect()
}

/// Collapse `.`, `..` and repeated `/` in a `/`-separated path without touching the filesystem.
///
/// Behaves like POSIX `normpath`: a leading `/` is preserved and `..` above it
/// is dropped, while `..` segments that climb above a relative start are kept
/// so callers can detect the escape. An empty result becomes `"."`.
///
/// # Examples
///
/// ```
/// use bundlefs::path_utils::normalize_lexically;
///
/// assert_eq!(normalize_lexically("/root//a/./b/../c"), "/root/a/c");
/// assert_eq!(normalize_lexically("/../etc"), "/etc");
/// assert_eq!(normalize_lexically("a/../../b"), "../b");
/// assert_eq!(normalize_lexically(""), ".");
/// ```
pub fn normalize_lexically(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Component-wise prefix test on normalized `/`-separated paths.
///
/// `"/bundles/a"` is inside `"/bundles/a"` and `"/bundles/a/x"`, but not
/// `"/bundles/ab"`; a root of `"."` contains any relative path that does not
/// climb out with `..`.
pub fn is_within(normalized: &str, normalized_root: &str) -> bool {
    if normalized_root == "." {
        return !normalized.starts_with('/')
            && normalized.split('/').next() != Some("..");
    }
    if normalized == normalized_root {
        return true;
    }
    let root = normalized_root.trim_end_matches('/');
    normalized
        .strip_prefix(root)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Last `/`-separated component of a path, ignoring a trailing separator.
pub fn last_component(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}
