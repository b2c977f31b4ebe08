//! Dependency links between bundles
//!
//! A bundle may expose another bundle's target under a key. When the first
//! component of a requested subpath is such a key, the key is replaced by
//! the dependency's target and the rest of the subpath is appended. This
//! happens exactly once per resolution; the substituted target is never
//! looked up again, so link cycles cannot loop.

use std::collections::HashMap;

use crate::domain::BundleTarget;

/// Lookup of a bundle's dependency keys
pub trait DependencyLinks {
    /// Target that `key` of `bundle_uuid` points to, if the key exists
    fn dependency(&self, bundle_uuid: &str, key: &str) -> Option<BundleTarget>;
}

/// Apply at most one dependency substitution to `target`.
pub fn substitute_once(links: &dyn DependencyLinks, target: &BundleTarget) -> BundleTarget {
    target
        .split_first_component()
        .and_then(|(key, rest)| {
            links
                .dependency(target.bundle_uuid(), key)
                .map(|linked| linked.join(rest))
        })
        .unwrap_or_else(|| target.clone())
}

/// In-memory dependency table, usually loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct DependencyMap {
    links: HashMap<(String, String), BundleTarget>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        bundle_uuid: impl Into<String>,
        key: impl Into<String>,
        target: BundleTarget,
    ) {
        self.links
            .insert((bundle_uuid.into(), key.into()), target);
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl DependencyLinks for DependencyMap {
    fn dependency(&self, bundle_uuid: &str, key: &str) -> Option<BundleTarget> {
        self.links
            .get(&(bundle_uuid.to_string(), key.to_string()))
            .cloned()
    }
}
