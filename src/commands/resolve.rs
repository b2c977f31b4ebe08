//! Resolve command implementation

use std::path::Path;

use crate::cli::ResolveArgs;
use bundlefs::error::Result;

/// Print the location a target resolves to
pub fn run(config: Option<&Path>, args: ResolveArgs) -> Result<()> {
    let fs = super::open_bundle_fs(config)?;
    let target = super::parse_target(&args.target)?;
    let location = if args.readable {
        fs.resolve_readable_location(&target)?
    } else {
        fs.resolve_location(&target)?.1
    };
    println!("{location}");
    Ok(())
}
