//! Get command implementation.
//!
//! Prints the value at a path. With `--type` the value goes through the
//! serializers for that type; with `--default` a missing value is replaced
//! and, unless defaults are disabled, stored in the file.

use crate::error::CliError;
use crate::utils::{open_configuration, parse_type, parse_value, render_value, GlobalOptions};
use arbor::{Node, Shape, TypeDescriptor, Value, ValueHolder};
use clap::Args;

/// Print the value at a path.
#[derive(Args)]
pub struct GetCommand {
    /// Path of the value, e.g. `server.port`
    pub path: String,

    /// Read the value as this type, e.g. `int` or `list<string>`
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub value_type: Option<String>,

    /// Value to use (and store) when the path holds nothing
    #[arg(long, value_name = "VALUE")]
    pub default: Option<String>,
}

impl GetCommand {
    /// Execute the get command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut config = open_configuration(global)?;
        let ty = self.value_type.as_deref().map(parse_type).transpose()?;
        let default = self.default.as_deref().map(parse_value);

        let mut node = config.get_node(&self.path)?;
        let missing = node.shape() == Shape::Null;
        let value = match &ty {
            Some(ty) => self.read_typed(&mut node, ty, default)?,
            None => match default {
                Some(default) => node.value_or(default),
                None => node.value(),
            },
        };

        if value.is_null() {
            return Err(self.nothing_here());
        }

        if missing && config.has_node(&self.path) {
            config.save()?;
            log::info!("stored default for '{}'", self.path);
        }

        println!("{}", render_value(&value)?);
        Ok(())
    }

    fn read_typed(
        &self,
        node: &mut Node<'_>,
        ty: &TypeDescriptor,
        default: Option<Value>,
    ) -> Result<Value, CliError> {
        if let Some(value) = node.get_typed_value(ty) {
            return Ok(value);
        }
        let missing = node.shape() == Shape::Null;
        let Some(default) = default else {
            return Err(if missing {
                self.nothing_here()
            } else {
                CliError::SemanticFailure(format!("value at '{}' is not a valid {ty}", self.path))
            });
        };

        let serialization = node.serialization();
        let typed = serialization.deserialize(ty, &default).ok_or_else(|| {
            CliError::InvalidArguments(format!("default '{default}' is not a valid {ty}"))
        })?;
        if missing {
            node.value_or(serialization.serialize(ty, &typed));
        }
        Ok(typed)
    }

    fn nothing_here(&self) -> CliError {
        CliError::SemanticFailure(format!("no value at '{}'", self.path))
    }
}
