//! Build script for arbor-cli.
//!
//! This script generates the man page at build time using clap_mangen.
//! The generated man page is placed in OUT_DIR for inclusion in release builds.
//!
//! Note: We build a minimal command structure here rather than importing from
//! the main crate, since build scripts cannot depend on the crate being built.

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Build the CLI command structure for man page generation.
///
/// IMPORTANT: Keep this structure synchronized with src/cli.rs
fn build_cli() -> Command {
    Command::new("arbor")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect and edit hierarchical configuration files")
        .long_about("Command-line tool for reading and editing YAML configuration trees by path")
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("file")
                .long("file")
                .short('f')
                .help("The YAML configuration file to operate on")
                .value_name("PATH")
                .global(true)
                .env("ARBOR_FILE")
                .default_value("config.yml"),
        )
        .arg(
            Arg::new("separator")
                .long("separator")
                .help("Separator between path segments")
                .value_name("SEP")
                .global(true)
                .env("ARBOR_SEPARATOR"),
        )
        .arg(
            Arg::new("no-write-defaults")
                .long("no-write-defaults")
                .help("Do not store defaults for values that are read but missing")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommands([
            Command::new("get")
                .about("Print the value at a path")
                .long_about("Print a value, optionally read as a type or replaced by a default"),
            Command::new("set")
                .about("Store a value at a path")
                .long_about("Store a value, creating missing parents along the path"),
            Command::new("keys")
                .about("List the keys below a path")
                .long_about("List direct children, or every descendant with --deep"),
            Command::new("dump")
                .about("Print the whole configuration")
                .long_about("Print the configuration as YAML or JSON"),
            Command::new("rename")
                .about("Move a value to a new path")
                .long_about("Move a value, keeping a backup of the file as <file>.old"),
        ])
}

fn main() {
    // Generate man pages at build time
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).unwrap();

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer).unwrap();
    fs::write(man_dir.join("arbor.1"), buffer).unwrap();

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
}
