use clap::Parser;

/// Arguments for the info command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show a bundle root and its direct children:\n    bundlefs info 0x1234\n\n\
                  Show three levels below a subdirectory:\n    bundlefs info 0x1234:data --depth 3\n\n\
                  Print machine-readable output:\n    bundlefs info 0x1234:data --json")]
pub struct InfoArgs {
    /// Bundle target as <bundle-uuid>[:<subpath>]
    pub target: String,

    /// How many directory levels to expand (0 shows only the target itself)
    #[arg(long, short = 'd', default_value_t = 1)]
    pub depth: usize,

    /// Print the metadata tree as JSON
    #[arg(long)]
    pub json: bool,
}
