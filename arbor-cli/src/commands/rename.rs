//! Rename command implementation.
//!
//! Moves a value to a new path. The file is backed up to `<file>.old`
//! before it is rewritten.

use crate::error::CliError;
use crate::utils::{open_configuration, GlobalOptions};
use arbor::{Migrator, NewKey};
use clap::Args;

/// Move a value to a new path.
#[derive(Args)]
pub struct RenameCommand {
    /// Current path of the value
    pub from: String,

    /// New path for the value
    pub to: String,
}

impl RenameCommand {
    /// Execute the rename command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut config = open_configuration(global)?;
        let from = config.split_path(&self.from)?;
        let to = config.split_path(&self.to)?;

        let watched = self.from.clone();
        let migrator = Migrator::new()
            .when(move |config| config.has_node(&watched))
            .rename(from, NewKey::new(to));

        if !migrator.migrate(&mut config)? {
            return Err(CliError::SemanticFailure(format!(
                "no value at '{}'",
                self.from
            )));
        }

        if !global.quiet {
            eprintln!("Renamed {} to {}", self.from, self.to);
        }
        Ok(())
    }
}
