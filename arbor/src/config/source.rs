//! Backing stores for configuration snapshots.
//!
//! A [`Source`] only ever deals in whole snapshots: it hands a fully
//! materialized mapping to [`Configuration::load`](super::Configuration::load)
//! and receives one back from [`Configuration::save`](super::Configuration::save).

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::value::Snapshot;

/// Where a configuration's snapshot comes from and goes to.
pub trait Source: Send + fmt::Debug {
    /// Reads the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read or parsed.
    fn load(&mut self) -> Result<Snapshot>;

    /// Persists `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save(&mut self, snapshot: &Snapshot) -> Result<()>;

    /// The file this source reads, if it is file-backed.
    fn file(&self) -> Option<&Path> {
        None
    }
}

/// An in-memory source.
///
/// Clones share the same storage, so a test can keep one clone and inspect
/// what a configuration saved through the other.
///
/// # Examples
///
/// ```
/// use arbor::{Configuration, MapSource, Value};
///
/// let source = MapSource::default();
/// let mut config = Configuration::new(source.clone());
/// config.get_node("a.b").unwrap().set_value(1).unwrap();
/// config.save().unwrap();
///
/// assert_eq!(source.snapshot()["a"], Value::map([("b", 1)]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    data: Arc<Mutex<Snapshot>>,
}

impl MapSource {
    /// A source that initially holds `snapshot`.
    #[must_use]
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            data: Arc::new(Mutex::new(snapshot)),
        }
    }

    /// A copy of what is currently stored.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.data.lock().clone()
    }

    /// Replaces what is stored.
    pub fn replace(&self, snapshot: Snapshot) {
        *self.data.lock() = snapshot;
    }
}

impl Source for MapSource {
    fn load(&mut self) -> Result<Snapshot> {
        Ok(self.snapshot())
    }

    fn save(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.replace(snapshot.clone());
        Ok(())
    }
}
