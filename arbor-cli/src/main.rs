//! Main entry point for the arbor CLI.
//!
//! This is the command-line interface for arbor configuration files.
//! It provides commands for inspecting and editing them:
//! - `get`: Read a value, optionally typed or defaulted
//! - `set`: Write a value
//! - `keys`: List keys below a path
//! - `dump`: Print the whole tree as YAML or JSON
//! - `rename`: Move a value to a new key, keeping a backup

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    let cli = Cli::parse();

    arbor::init_logger(cli.verbose, cli.quiet).install();

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        file: cli.file,
        separator: cli.separator,
        no_write_defaults: cli.no_write_defaults,
    };

    let result = match cli.command {
        cli::Command::Get(cmd) => cmd.execute(&global),
        cli::Command::Set(cmd) => cmd.execute(&global),
        cli::Command::Keys(cmd) => cmd.execute(&global),
        cli::Command::Dump(cmd) => cmd.execute(&global),
        cli::Command::Rename(cmd) => cmd.execute(&global),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
