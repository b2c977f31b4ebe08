//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - info: Info command arguments
//! - resolve: Resolve command arguments
//! - cat: Cat command arguments
//! - zip: Zip command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod cat;
pub mod completions;
pub mod info;
pub mod resolve;
pub mod zip;

pub use cat::CatArgs;
pub use completions::CompletionsArgs;
pub use info::InfoArgs;
pub use resolve::ResolveArgs;
pub use zip::{ZipArgs, ZipSubcommand};

/// bundlefs - browse local and archived bundles
///
/// Resolve bundle targets safely and read ZIP-backed bundles without extracting them.
#[derive(Parser, Debug)]
#[command(
    name = "bundlefs",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Resolve bundle targets and browse ZIP-backed bundles as directory trees",
    long_about = "bundlefs resolves <bundle-uuid>:<subpath> targets to locations that are \
                  guaranteed to stay inside the bundle, and presents bundles stored as ZIP \
                  archives in a blob store as ordinary directory trees.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  bundlefs info 0x1234                     \x1b[90m# Show the bundle root\x1b[0m\n   \
                  bundlefs info 0x1234:data --depth 3      \x1b[90m# Show three levels below data\x1b[0m\n   \
                  bundlefs resolve 0x1234:data/file.txt    \x1b[90m# Print the resolved location\x1b[0m\n   \
                  bundlefs cat 0x1234:data/file.txt        \x1b[90m# Write file bytes to stdout\x1b[0m\n   \
                  curl -s URL | bundlefs zip list -        \x1b[90m# List a streamed archive\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Configuration file (defaults to <config dir>/bundlefs/config.yaml)
    #[arg(long, short = 'c', global = true, env = "BUNDLEFS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show metadata for a bundle target
    Info(InfoArgs),

    /// Print where a bundle target resolves to
    Resolve(ResolveArgs),

    /// Write the bytes of a file target to stdout
    Cat(CatArgs),

    /// Read ZIP archives from a file or stdin
    Zip(ZipArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
