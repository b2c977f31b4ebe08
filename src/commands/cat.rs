//! Cat command implementation

use std::io::{self, Write};
use std::path::Path;

use crate::cli::CatArgs;
use bundlefs::error::Result;

/// Copy a file target to stdout
pub fn run(config: Option<&Path>, args: CatArgs) -> Result<()> {
    let fs = super::open_bundle_fs(config)?;
    let target = super::parse_target(&args.target)?;
    let mut reader = fs.open_target(&target)?;

    let mut stdout = io::stdout().lock();
    io::copy(&mut reader, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}
