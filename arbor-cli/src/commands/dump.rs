//! Dump command implementation.

use crate::error::CliError;
use crate::utils::{open_configuration, render_json, render_yaml, GlobalOptions};
use clap::{Args, ValueEnum};

/// Output formats for `dump`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DumpFormat {
    /// YAML, as the file would be written
    Yaml,
    /// Pretty-printed JSON
    Json,
}

/// Print the whole configuration.
#[derive(Args)]
pub struct DumpCommand {
    /// Output format
    #[arg(long, value_enum, default_value_t = DumpFormat::Yaml)]
    pub format: DumpFormat,
}

impl DumpCommand {
    /// Execute the dump command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let config = open_configuration(global)?;
        let snapshot = config.snapshot();
        let rendered = match self.format {
            DumpFormat::Yaml => render_yaml(&snapshot)?,
            DumpFormat::Json => render_json(&snapshot)?,
        };
        if !rendered.is_empty() {
            println!("{rendered}");
        }
        Ok(())
    }
}
