//! Command implementations for bundlefs CLI

pub mod cat;
pub mod completions;
pub mod info;
pub mod resolve;
pub mod zip;

use std::path::Path;

use tracing::debug;

use bundlefs::BundleFs;
use bundlefs::config::Config;
use bundlefs::domain::BundleTarget;
use bundlefs::error::Result;

/// Load configuration and build the facade every target command works through
fn open_bundle_fs(config_path: Option<&Path>) -> Result<BundleFs> {
    let config = Config::discover(config_path)?;
    debug!(
        bundles_dir = ?config.bundles_dir,
        stores = config.blob_stores.len(),
        archived = config.archived_bundles.len(),
        "configuration ready"
    );
    BundleFs::from_config(&config)
}

fn parse_target(input: &str) -> Result<BundleTarget> {
    input.parse()
}
