//! Configuration file handling for bundlefs
//!
//! `config.yaml` tells bundlefs where bundles live:
//!
//! ```yaml
//! bundles_dir: /var/bundles          # local bundles at <dir>/<uuid>
//! blob_stores:                       # store name -> directory
//!   main: /var/blobs
//! archived_bundles:                  # uuid -> blob root locator
//!   "0x1234": blob://main/bundles/0x1234/contents.zip
//! dependencies:
//!   - bundle: "0xparent"
//!     key: data
//!     target: 0xdep:sub/dir
//! ```
//!
//! Relative directories are taken relative to the file that names them.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use normpath::PathExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ArchiveLocator, BundleTarget};
use crate::error::config::{invalid, not_found, parse_failed, read_failed};
use crate::error::Result;
use crate::resolver::{ConfiguredLocator, DependencyMap};
use crate::store::{BlobStores, LocalBlobStore};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "BUNDLEFS_CONFIG";

/// Directory under the platform config dir
pub const CONFIG_DIR_NAME: &str = "bundlefs";

/// File name inside [`CONFIG_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// One dependency link: `bundle:key/...` resolves through `target`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyEntry {
    pub bundle: String,
    pub key: String,
    pub target: String,
}

/// Parsed configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding local bundles as `<uuid>` subdirectories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundles_dir: Option<PathBuf>,

    /// Blob store name to directory
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub blob_stores: BTreeMap<String, PathBuf>,

    /// Bundle uuid to `blob://` root locator
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub archived_bundles: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyEntry>,
}

impl Config {
    /// Parse configuration from a YAML string; an empty document is an empty config.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load and validate the file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let yaml = fs::read_to_string(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => not_found(&display),
            _ => read_failed(&display, err.to_string()),
        })?;
        let mut config = Self::from_yaml(&yaml).map_err(|err| match err {
            crate::error::BundleFsError::ConfigParseFailed { reason, .. } => {
                parse_failed(&display, reason)
            }
            other => other,
        })?;

        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Find and load the configuration.
    ///
    /// An explicit path wins, then [`CONFIG_ENV`], then the platform default.
    /// Only a missing default file yields an empty configuration.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        Self::discover_with(explicit, std::env::var_os(CONFIG_ENV))
    }

    fn discover_with(explicit: Option<&Path>, from_env: Option<OsString>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Some(path) = from_env.filter(|value| !value.is_empty()) {
            return Self::load(Path::new(&path));
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => {
                debug!("no configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// `<config_dir>/bundlefs/config.yaml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Check locators, dependency targets and keys.
    pub fn validate(&self) -> Result<()> {
        for (uuid, locator) in &self.archived_bundles {
            let parsed = ArchiveLocator::parse(locator)
                .map_err(|err| invalid(format!("archived bundle {uuid}: {err}")))?;
            if !self.blob_stores.is_empty() && !self.blob_stores.contains_key(parsed.store()) {
                return Err(invalid(format!(
                    "archived bundle {uuid} uses unknown blob store '{}'",
                    parsed.store()
                )));
            }
        }

        for dep in &self.dependencies {
            if dep.bundle.is_empty() {
                return Err(invalid("dependency without a bundle uuid"));
            }
            if dep.key.is_empty() || dep.key.contains('/') || dep.key == "." || dep.key == ".." {
                return Err(invalid(format!(
                    "dependency key '{}' of bundle {} must be a single path component",
                    dep.key, dep.bundle
                )));
            }
            dep.target
                .parse::<BundleTarget>()
                .map_err(|err| invalid(format!("dependency {}:{}: {err}", dep.bundle, dep.key)))?;
        }
        Ok(())
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        if let Some(dir) = self.bundles_dir.take() {
            self.bundles_dir = Some(resolve_path(base, dir));
        }
        for dir in self.blob_stores.values_mut() {
            *dir = resolve_path(base, std::mem::take(dir));
        }
    }

    /// Bundle locator described by this configuration
    pub fn locator(&self) -> Result<ConfiguredLocator> {
        let mut locator = ConfiguredLocator::new();
        if let Some(dir) = &self.bundles_dir {
            locator = locator.with_bundles_dir(dir);
        }
        for (uuid, root) in &self.archived_bundles {
            locator = locator.with_archived(uuid, ArchiveLocator::parse(root)?);
        }
        Ok(locator)
    }

    /// Dependency links described by this configuration
    pub fn dependency_map(&self) -> Result<DependencyMap> {
        let mut map = DependencyMap::new();
        for dep in &self.dependencies {
            map.insert(&dep.bundle, &dep.key, dep.target.parse()?);
        }
        Ok(map)
    }

    /// Directory-backed blob stores described by this configuration
    pub fn blob_stores(&self) -> BlobStores {
        let mut stores = BlobStores::new();
        for (name, dir) in &self.blob_stores {
            stores.insert(name, LocalBlobStore::new(dir));
        }
        stores
    }
}

fn resolve_path(base: &Path, path: PathBuf) -> PathBuf {
    let joined = if path.is_absolute() {
        path
    } else {
        base.join(path)
    };
    joined
        .normalize()
        .map(normpath::BasePathBuf::into_path_buf)
        .unwrap_or(joined)
}
