//! Utility functions for CLI operations.
//!
//! This module provides common utility functions used across CLI commands,
//! including opening the configuration file and rendering values.

use crate::error::CliError;
use arbor::{Configuration, Snapshot, TypeDescriptor, Value, YamlSource};
use std::path::PathBuf;

/// Global CLI options shared across all commands.
#[derive(Debug, Clone)]
#[allow(dead_code)] // Fields used via pattern matching in main.rs
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// The configuration file.
    pub file: PathBuf,

    /// Override the path separator.
    pub separator: Option<String>,

    /// Do not store defaults for missing values.
    pub no_write_defaults: bool,
}

/// Open and load the configuration file named by the global options.
///
/// A missing file loads as an empty configuration.
pub fn open_configuration(global: &GlobalOptions) -> Result<Configuration, CliError> {
    let mut config = Configuration::new(YamlSource::from_file(&global.file));
    if let Some(ref separator) = global.separator {
        config.set_path_separator(separator.as_str())?;
    }
    config.set_writes_defaults(!global.no_write_defaults);
    config.load()?;
    log::debug!("loaded {}", global.file.display());
    Ok(config)
}

/// Parse a `--type` argument.
pub fn parse_type(text: &str) -> Result<TypeDescriptor, CliError> {
    text.parse()
        .map_err(|e: arbor::Error| CliError::InvalidArguments(e.to_string()))
}

/// Interpret command-line text as a value.
///
/// YAML scalars and flow collections are understood, so `8080` is a number
/// and `[a, b]` a list; anything that does not parse stays text.
pub fn parse_value(text: &str) -> Value {
    match serde_yaml::from_str::<serde_yaml::Value>(text) {
        Ok(serde_yaml::Value::String(_)) | Err(_) => Value::from(text),
        Ok(parsed) => Value::from(parsed),
    }
}

/// Render a value for display: scalars bare, containers as YAML.
pub fn render_value(value: &Value) -> Result<String, CliError> {
    match value {
        Value::List(_) | Value::Map(_) | Value::Bytes(_) => {
            let text = serde_yaml::to_string(value).map_err(arbor::Error::from)?;
            Ok(text.trim_end().to_string())
        }
        other => Ok(other.to_string()),
    }
}

/// Render a whole tree as YAML.
pub fn render_yaml(snapshot: &Snapshot) -> Result<String, CliError> {
    if snapshot.is_empty() {
        return Ok(String::new());
    }
    let text = serde_yaml::to_string(snapshot).map_err(arbor::Error::from)?;
    Ok(text.trim_end().to_string())
}

/// Render a whole tree as pretty JSON.
pub fn render_json(snapshot: &Snapshot) -> Result<String, CliError> {
    serde_json::to_string_pretty(snapshot)
        .map_err(|e| CliError::Config(format!("cannot render JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("8080"), Value::I32(8080));
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("[a, b]"), Value::list(["a", "b"]));
        assert_eq!(parse_value("hello world"), Value::from("hello world"));
        assert_eq!(parse_value("'quoted'"), Value::from("'quoted'"));
        assert_eq!(parse_value("[unclosed"), Value::from("[unclosed"));
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(&Value::from(3)).unwrap(), "3");
        assert_eq!(render_value(&Value::list(["a", "b"])).unwrap(), "- a\n- b");
    }

    #[test]
    fn test_parse_type() {
        assert!(parse_type("list<int>").is_ok());
        assert!(matches!(parse_type("list<"), Err(CliError::InvalidArguments(_))));
    }
}
