use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Arguments for the zip command
#[derive(Parser, Debug)]
pub struct ZipArgs {
    #[command(subcommand)]
    pub command: ZipSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ZipSubcommand {
    /// List entries in archive order
    List(ZipListArgs),

    /// Write one entry's decompressed bytes to stdout
    Cat(ZipCatArgs),
}

/// Arguments for zip list
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  List a local archive:\n    bundlefs zip list contents.zip\n\n\
                  List an archive while it downloads:\n    curl -s URL | bundlefs zip list -")]
pub struct ZipListArgs {
    /// Archive file, or - to read stdin as a forward-only stream
    pub archive: PathBuf,

    /// Print entries as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Arguments for zip cat
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Extract one file to stdout:\n    bundlefs zip cat contents.zip docs/readme.md")]
pub struct ZipCatArgs {
    /// Archive file, or - to read stdin as a forward-only stream
    pub archive: PathBuf,

    /// Entry name as stored in the archive
    pub entry: String,
}
