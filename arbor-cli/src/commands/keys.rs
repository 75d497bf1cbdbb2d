//! Keys command implementation.

use crate::error::CliError;
use crate::utils::{open_configuration, GlobalOptions};
use clap::Args;

/// List the keys below a path, or the top-level keys.
#[derive(Args)]
pub struct KeysCommand {
    /// Path whose children to list; the root when omitted
    pub path: Option<String>,

    /// Include every descendant, joined with the separator
    #[arg(long)]
    pub deep: bool,
}

impl KeysCommand {
    /// Execute the keys command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut config = open_configuration(global)?;
        let keys = match self.path.as_deref() {
            Some(path) => config.get_node(path)?.get_keys(self.deep),
            None => config.get_keys(self.deep),
        };
        for key in keys {
            println!("{key}");
        }
        Ok(())
    }
}
