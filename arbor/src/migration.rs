//! Moving values between keys when a configuration layout changes.
//!
//! A [`Migrator`] holds a list of old keys, each with an optional
//! [`MigrationAction`]. Migrating removes every old key and, where the key
//! held a value and has an action, writes the converted value at the
//! converted key. A file-backed configuration is backed up to `<file>.old`
//! before anything changes, and saved afterwards.
//!
//! ```
//! use arbor::{Configuration, Migrator, NewKey, ValueHolder};
//!
//! let mut config = Configuration::in_memory();
//! config.set("db.host", "localhost").unwrap();
//! config.set("db.legacy", true).unwrap();
//!
//! let migrator = Migrator::new()
//!     .rename(["db", "host"], NewKey::new(["database", "host"]))
//!     .discard(["db", "legacy"]);
//! assert!(migrator.migrate(&mut config).unwrap());
//!
//! assert!(!config.has_node("db.host"));
//! assert_eq!(
//!     config.get_node("database.host").unwrap().get_string().as_deref(),
//!     Some("localhost")
//! );
//! ```

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::config::{Configuration, ValueHolder};
use crate::error::{Error, Result};
use crate::value::Value;

/// How one old key is carried over.
pub trait MigrationAction: Send + Sync {
    /// The new path for a value found at `key`.
    fn convert_key(&self, key: &[String]) -> Vec<String>;

    /// The value to store at the new path.
    fn convert_value(&self, value: Value) -> Value {
        value
    }
}

/// Moves a value to a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewKey {
    key: Vec<String>,
}

impl NewKey {
    /// An action moving values to `key`.
    pub fn new<I, S>(key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into_iter().map(Into::into).collect(),
        }
    }
}

impl MigrationAction for NewKey {
    fn convert_key(&self, _key: &[String]) -> Vec<String> {
        self.key.clone()
    }
}

/// Moves a value under a pattern built from its old path.
///
/// The old path is joined with the separator, substituted for `%` in the
/// pattern, and the result split on the separator again.
///
/// ```
/// use arbor::{MigrationAction, NewJoinedKey};
///
/// let action = NewJoinedKey::new("now.before.%", ".");
/// let old = ["input".to_string(), "key".to_string()];
/// assert_eq!(action.convert_key(&old), ["now", "before", "input", "key"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJoinedKey {
    pattern: String,
    separator: String,
}

impl NewJoinedKey {
    /// An action for `pattern`, joining and splitting on `separator`.
    pub fn new(pattern: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            separator: separator.into(),
        }
    }

    /// An action using `config`'s path separator.
    pub fn for_configuration(pattern: impl Into<String>, config: &Configuration) -> Self {
        Self::new(pattern, config.path_separator())
    }
}

impl MigrationAction for NewJoinedKey {
    fn convert_key(&self, key: &[String]) -> Vec<String> {
        let joined = key.join(&self.separator);
        self.pattern
            .replace('%', &joined)
            .split(self.separator.as_str())
            .map(ToString::to_string)
            .collect()
    }
}

type Predicate = Box<dyn Fn(&Configuration) -> bool + Send + Sync>;

struct Step {
    key: Vec<String>,
    action: Option<Box<dyn MigrationAction>>,
}

/// An ordered set of key migrations, guarded by a predicate.
pub struct Migrator {
    predicate: Predicate,
    steps: Vec<Step>,
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Migrator {
    /// A migrator that always runs and has no steps.
    #[must_use]
    pub fn new() -> Self {
        Self {
            predicate: Box::new(|_| true),
            steps: Vec::new(),
        }
    }

    /// Runs only when `predicate` holds for the configuration.
    #[must_use]
    pub fn when(
        mut self,
        predicate: impl Fn(&Configuration) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Box::new(predicate);
        self
    }

    /// Moves the value at `key` as `action` says.
    #[must_use]
    pub fn rename<I, S>(mut self, key: I, action: impl MigrationAction + 'static) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps.push(Step {
            key: key.into_iter().map(Into::into).collect(),
            action: Some(Box::new(action)),
        });
        self
    }

    /// Removes `key` without carrying its value anywhere.
    #[must_use]
    pub fn discard<I, S>(mut self, key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps.push(Step {
            key: key.into_iter().map(Into::into).collect(),
            action: None,
        });
        self
    }

    /// Whether this migrator would run on `config`.
    #[must_use]
    pub fn should_migrate(&self, config: &Configuration) -> bool {
        (self.predicate)(config)
    }

    /// Migrates `config`, which should already be loaded.
    ///
    /// Returns `false` without touching anything if the predicate declines.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Migration`] if the backup, a path, or the final save
    /// fails. Steps applied before the failure stay applied in memory.
    pub fn migrate(&self, config: &mut Configuration) -> Result<bool> {
        if !self.should_migrate(config) {
            return Ok(false);
        }

        if let Some(file) = config.file().map(PathBuf::from) {
            back_up(&file).map_err(failed)?;
        }

        for step in &self.steps {
            self.apply(config, step).map_err(failed)?;
        }

        config.save().map_err(failed)?;
        log::info!("migrated {} keys", self.steps.len());
        Ok(true)
    }

    fn apply(&self, config: &mut Configuration, step: &Step) -> Result<()> {
        let existing = {
            let mut node = config.get_node_at(&step.key)?;
            let value = node.value();
            node.remove();
            value
        };
        let Some(action) = &step.action else {
            return Ok(());
        };
        if existing.is_null() {
            return Ok(());
        }
        let key = action.convert_key(&step.key);
        log::debug!("moving {} to {}", step.key.join("."), key.join("."));
        config
            .get_node_at(&key)?
            .set_value(action.convert_value(existing))?;
        Ok(())
    }
}

impl fmt::Debug for Migrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migrator")
            .field("keys", &self.steps.iter().map(|s| &s.key).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn back_up(file: &std::path::Path) -> Result<()> {
    if !file.exists() {
        return Ok(());
    }
    let mut backup = OsString::from(file.as_os_str());
    backup.push(".old");
    fs::rename(file, &backup)?;
    log::debug!("backed up {} to {}", file.display(), PathBuf::from(backup).display());
    Ok(())
}

fn failed(err: Error) -> Error {
    match err {
        Error::Migration { .. } => err,
        other => Error::Migration {
            reason: other.to_string(),
        },
    }
}
