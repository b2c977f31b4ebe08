//! Bundle target addressing
//!
//! A [`BundleTarget`] names "subpath inside bundle `uuid`" and is the unit
//! passed between every other component.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BundleFsError;
use crate::error::bundle::invalid_target;

/// Address of a path inside a bundle
///
/// Equality and hashing are structural over both fields. Targets are
/// immutable; substitution through a dependency produces a new target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BundleTarget {
    bundle_uuid: String,
    subpath: String,
}

impl BundleTarget {
    pub fn new(bundle_uuid: impl Into<String>, subpath: impl Into<String>) -> Self {
        Self {
            bundle_uuid: bundle_uuid.into(),
            subpath: subpath.into(),
        }
    }

    /// Target naming the bundle root itself
    pub fn root(bundle_uuid: impl Into<String>) -> Self {
        Self::new(bundle_uuid, "")
    }

    pub fn bundle_uuid(&self) -> &str {
        &self.bundle_uuid
    }

    pub fn subpath(&self) -> &str {
        &self.subpath
    }

    /// Split the subpath into its first component and the remainder.
    ///
    /// Leading separators are ignored, so `"/key/rest"` and `"key/rest"` both
    /// yield `("key", "rest")`. Returns `None` for an empty subpath.
    pub fn split_first_component(&self) -> Option<(&str, &str)> {
        let trimmed = self.subpath.trim_start_matches('/');
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.split_once('/') {
            Some((first, rest)) => (first, rest.trim_start_matches('/')),
            None => (trimmed, ""),
        })
    }

    /// Target under `self` with `remainder` appended to the subpath.
    pub fn join(&self, remainder: &str) -> Self {
        let base = self.subpath.trim_end_matches('/');
        let remainder = remainder.trim_start_matches('/');
        let subpath = match (base.is_empty(), remainder.is_empty()) {
            (_, true) => self.subpath.clone(),
            (true, false) => remainder.to_string(),
            (false, false) => format!("{base}/{remainder}"),
        };
        Self::new(self.bundle_uuid.clone(), subpath)
    }
}

impl fmt::Display for BundleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.bundle_uuid, self.subpath)
    }
}

impl FromStr for BundleTarget {
    type Err = BundleFsError;

    /// Parses `uuid`, `uuid:` or `uuid:subpath`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (uuid, subpath) = input.split_once(':').unwrap_or((input, ""));
        let uuid = uuid.trim();
        if uuid.is_empty() {
            return Err(invalid_target(input, "missing bundle uuid"));
        }
        if uuid.contains('/') {
            return Err(invalid_target(input, "bundle uuid must not contain '/'"));
        }
        Ok(Self::new(uuid, subpath))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_structural_equality_and_hash() {
        let a = BundleTarget::new("0x1", "dir/file");
        let b = BundleTarget::new("0x1", "dir/file");
        let c = BundleTarget::new("0x1", "dir");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_display_round_trips() {
        let target = BundleTarget::new("0x1", "a/b");
        assert_eq!(target.to_string(), "0x1:a/b");
        let parsed: BundleTarget = target.to_string().parse().expect("parse");
        assert_eq!(parsed, target);
    }

    #[test]
    fn test_parse_without_subpath() {
        let parsed: BundleTarget = "0x1".parse().expect("parse");
        assert_eq!(parsed, BundleTarget::root("0x1"));
        let parsed: BundleTarget = "0x1:".parse().expect("parse");
        assert_eq!(parsed.subpath(), "");
    }

    #[test]
    fn test_parse_rejects_missing_uuid() {
        let err = ":sub".parse::<BundleTarget>().expect_err("should fail");
        assert!(matches!(err, BundleFsError::InvalidTarget { .. }));
    }

    #[test]
    fn test_split_first_component() {
        let target = BundleTarget::new("0x1", "key/rest/of/path");
        assert_eq!(target.split_first_component(), Some(("key", "rest/of/path")));

        let target = BundleTarget::new("0x1", "/key");
        assert_eq!(target.split_first_component(), Some(("key", "")));

        assert_eq!(BundleTarget::root("0x1").split_first_component(), None);
    }

    #[test]
    fn test_join() {
        let target = BundleTarget::new("0x1", "dep-subpath");
        assert_eq!(target.join("x/y").subpath(), "dep-subpath/x/y");
        assert_eq!(target.join("").subpath(), "dep-subpath");
        assert_eq!(BundleTarget::root("0x1").join("x").subpath(), "x");
    }
}
