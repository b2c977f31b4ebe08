//! bundlefs - command line front end
//!
//! Resolves bundle targets, prints their metadata trees and streams bytes out
//! of local or archive-backed bundles.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, ZipSubcommand};

/// Environment variable holding a `tracing` filter directive
const LOG_ENV: &str = "BUNDLEFS_LOG";

fn init_logging(verbose: bool) {
    let default = if verbose { "bundlefs=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (e.g. in tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config;
    let result = match cli.command {
        Commands::Info(args) => commands::info::run(config.as_deref(), args),
        Commands::Resolve(args) => commands::resolve::run(config.as_deref(), args),
        Commands::Cat(args) => commands::cat::run(config.as_deref(), args),
        Commands::Zip(args) => match args.command {
            ZipSubcommand::List(args) => commands::zip::list(args),
            ZipSubcommand::Cat(args) => commands::zip::cat(args),
        },
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
