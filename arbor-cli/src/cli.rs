//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{DumpCommand, GetCommand, KeysCommand, RenameCommand, SetCommand};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line tool for inspecting and editing arbor configuration files.
#[derive(Parser)]
#[command(name = "arbor")]
#[command(version, about = "Inspect and edit hierarchical configuration files", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// The YAML configuration file to operate on
    #[arg(
        long,
        short = 'f',
        value_name = "PATH",
        global = true,
        env = "ARBOR_FILE",
        default_value = "config.yml"
    )]
    pub file: PathBuf,

    /// Separator between path segments
    #[arg(long, value_name = "SEP", global = true, env = "ARBOR_SEPARATOR")]
    pub separator: Option<String>,

    /// Do not store defaults for values that are read but missing
    #[arg(long, global = true)]
    pub no_write_defaults: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Print the value at a path
    Get(GetCommand),

    /// Store a value at a path
    Set(SetCommand),

    /// List the keys below a path
    Keys(KeysCommand),

    /// Print the whole configuration
    Dump(DumpCommand),

    /// Move a value to a new path
    Rename(RenameCommand),
}
