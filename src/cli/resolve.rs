use clap::Parser;

/// Arguments for the resolve command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Print the location of a file:\n    bundlefs resolve 0x1234:data/file.txt\n\n\
                  Refuse targets that are themselves symlinks:\n    bundlefs resolve 0x1234:link --readable")]
pub struct ResolveArgs {
    /// Bundle target as <bundle-uuid>[:<subpath>]
    pub target: String,

    /// Fail when the target is itself a symlink
    #[arg(long)]
    pub readable: bool,
}
