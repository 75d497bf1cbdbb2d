//! Set command implementation.

use crate::error::CliError;
use crate::utils::{open_configuration, parse_type, parse_value, GlobalOptions};
use arbor::ValueHolder;
use clap::Args;

/// Store a value at a path, creating missing parents.
#[derive(Args)]
pub struct SetCommand {
    /// Path of the value, e.g. `server.port`
    pub path: String,

    /// The value; YAML syntax such as `8080` or `[a, b]` is understood
    pub value: String,

    /// Convert the value to this type before storing it
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub value_type: Option<String>,
}

impl SetCommand {
    /// Execute the set command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut config = open_configuration(global)?;
        let raw = parse_value(&self.value);
        let mut node = config.get_node(&self.path)?;

        let previous = match self.value_type.as_deref() {
            Some(text) => {
                let ty = parse_type(text)?;
                let typed = node.serialization().deserialize(&ty, &raw).ok_or_else(|| {
                    CliError::InvalidArguments(format!("'{}' is not a valid {ty}", self.value))
                })?;
                node.set_typed_value(&ty, &typed)?
            }
            None => node.set_value(raw)?,
        };

        config.save()?;
        if global.verbose && !previous.is_null() {
            eprintln!("Replaced {previous}");
        }
        log::info!("set '{}'", self.path);
        Ok(())
    }
}
