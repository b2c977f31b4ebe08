use clap::Parser;

/// Arguments for the cat command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Print a file from a bundle:\n    bundlefs cat 0x1234:data/file.txt")]
pub struct CatArgs {
    /// File target as <bundle-uuid>:<subpath>
    pub target: String,
}
