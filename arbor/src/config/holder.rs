//! Named, defaulted handles onto a path of a shared configuration.
//!
//! A [`ConfigurationHolder`] is declared with a path and a default, possibly
//! long before any configuration exists, and bound later. Every access
//! resolves its path afresh, so a holder keeps working across reloads.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{Error, Result};
use crate::serialization::Serialization;
use crate::setting::Setting;
use crate::value::{Snapshot, Value};

use super::node::Node;
use super::value_holder::ValueHolder;
use super::Configuration;

/// A configuration shared between holders and threads.
pub type SharedConfiguration = Arc<Mutex<Configuration>>;

struct HolderState {
    path: Vec<String>,
    default: RwLock<Value>,
    configuration: RwLock<Option<SharedConfiguration>>,
}

/// A handle onto one path of a [`SharedConfiguration`], with a default.
///
/// Reads go through the node's default-writing read, with the holder's own
/// default, so a fresh configuration fills itself in as holders are read.
/// Clones share binding and default.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use arbor::{Configuration, ConfigurationHolder, ValueHolder};
///
/// let mut port = ConfigurationHolder::new(["server", "port"], 8080);
/// assert!(port.try_value().is_err());
///
/// let config = Arc::new(Mutex::new(Configuration::in_memory()));
/// port.set_configuration(Arc::clone(&config));
/// assert_eq!(port.get_int(0), 8080);
/// assert!(config.lock().has_node("server.port"));
/// ```
#[derive(Clone)]
pub struct ConfigurationHolder {
    state: Arc<HolderState>,
}

impl ConfigurationHolder {
    /// An unbound holder for `path` with `default`.
    pub fn new<I, S>(path: I, default: impl Into<Value>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            state: Arc::new(HolderState {
                path: path.into_iter().map(Into::into).collect(),
                default: RwLock::new(default.into()),
                configuration: RwLock::new(None),
            }),
        }
    }

    /// A holder already bound to `configuration`.
    pub fn bound<I, S>(
        configuration: &SharedConfiguration,
        path: I,
        default: impl Into<Value>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let holder = Self::new(path, default);
        holder.set_configuration(Arc::clone(configuration));
        holder
    }

    /// The path segments.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.state.path
    }

    /// The default value.
    #[must_use]
    pub fn default_value(&self) -> Value {
        self.state.default.read().clone()
    }

    /// Replaces the default value.
    pub fn set_default_value(&self, default: impl Into<Value>) {
        *self.state.default.write() = default.into();
    }

    /// The bound configuration, if any.
    #[must_use]
    pub fn configuration(&self) -> Option<SharedConfiguration> {
        self.state.configuration.read().clone()
    }

    /// Binds the holder (and all its clones) to `configuration`.
    pub fn set_configuration(&self, configuration: SharedConfiguration) {
        *self.state.configuration.write() = Some(configuration);
    }

    fn bound_configuration(&self) -> Result<SharedConfiguration> {
        self.configuration().ok_or_else(|| Error::NotBound {
            path: self.state.path.join("."),
        })
    }

    /// Runs `f` on the holder's node while holding the configuration lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotBound`] for an unbound holder, and path errors
    /// from resolving the node.
    pub fn with_node<R>(&self, f: impl FnOnce(&mut Node<'_>) -> R) -> Result<R> {
        let configuration = self.bound_configuration()?;
        let mut guard = configuration.lock();
        let mut node = guard.get_node_at(self.state.path.as_slice())?;
        Ok(f(&mut node))
    }

    /// The current value, writing the default into an empty node.
    ///
    /// # Errors
    ///
    /// As for [`ConfigurationHolder::with_node`].
    pub fn try_value(&self) -> Result<Value> {
        let default = self.default_value();
        self.with_node(|node| node.value_or(default))
    }

    /// Stores `value`, returning the previous value.
    ///
    /// # Errors
    ///
    /// As for [`ConfigurationHolder::with_node`] and [`Node::set_value`].
    pub fn set_value(&self, value: impl Into<Value>) -> Result<Value> {
        let value = value.into();
        self.with_node(|node| node.set_value(value))?
    }

    /// Stores a typed value.
    ///
    /// # Errors
    ///
    /// As for [`ConfigurationHolder::set_value`].
    pub fn set_typed<T: Setting>(&self, value: T) -> Result<Value> {
        self.with_node(|node| node.set_typed(value))?
    }

    /// Child keys of the holder's node.
    ///
    /// # Errors
    ///
    /// As for [`ConfigurationHolder::with_node`].
    pub fn get_keys(&self, deep: bool) -> Result<Vec<String>> {
        self.with_node(|node| node.get_keys(deep))
    }

    /// Child values of the holder's node.
    ///
    /// # Errors
    ///
    /// As for [`ConfigurationHolder::with_node`].
    pub fn values(&self) -> Result<Snapshot> {
        self.with_node(|node| node.values())
    }

    /// Returns `true` if the holder's node has a child `name`.
    ///
    /// # Errors
    ///
    /// As for [`ConfigurationHolder::with_node`].
    pub fn has_child(&self, name: &str) -> Result<bool> {
        self.with_node(|node| node.has_child(name))
    }
}

impl ValueHolder for ConfigurationHolder {
    fn value(&mut self) -> Value {
        self.try_value().unwrap_or_else(|err| {
            log::warn!("{err}; using the default");
            self.default_value()
        })
    }

    /// Holders always read with their own default.
    fn value_or(&mut self, _default: Value) -> Value {
        self.value()
    }

    fn serialization(&self) -> Serialization {
        self.configuration().map_or_else(Serialization::shared, |config| {
            let guard = config.lock();
            guard.serialization().clone()
        })
    }
}

impl fmt::Debug for ConfigurationHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationHolder")
            .field("path", &self.state.path)
            .field("default", &*self.state.default.read())
            .field("bound", &self.state.configuration.read().is_some())
            .finish()
    }
}

/// A group of holders loaded together.
///
/// Loading reloads the configuration, binds every holder to it and reads
/// each once, so defaults for missing entries are written.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use arbor::{Configuration, ConfigurationHolder, HolderSet, MapSource, Value};
///
/// let source = MapSource::default();
/// let config = Arc::new(Mutex::new(Configuration::new(source.clone())));
///
/// let mut holders = HolderSet::new();
/// holders.add(ConfigurationHolder::new(["name"], "arbor"));
/// holders.load(&config).unwrap();
/// holders.save(&config).unwrap();
///
/// assert_eq!(source.snapshot()["name"], Value::from("arbor"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct HolderSet {
    holders: Vec<ConfigurationHolder>,
}

impl HolderSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a holder.
    pub fn add(&mut self, holder: ConfigurationHolder) -> &mut Self {
        self.holders.push(holder);
        self
    }

    /// The holders, in the order they were added.
    #[must_use]
    pub fn holders(&self) -> &[ConfigurationHolder] {
        &self.holders
    }

    /// Reloads `configuration`, then binds and reads every holder.
    ///
    /// # Errors
    ///
    /// Returns the source's error, or a path error from a holder.
    pub fn load(&self, configuration: &SharedConfiguration) -> Result<()> {
        configuration.lock().load()?;
        for holder in &self.holders {
            holder.set_configuration(Arc::clone(configuration));
            holder.try_value()?;
        }
        log::debug!("loaded {} holders", self.holders.len());
        Ok(())
    }

    /// Saves `configuration`.
    ///
    /// # Errors
    ///
    /// Returns the source's error.
    pub fn save(&self, configuration: &SharedConfiguration) -> Result<()> {
        configuration.lock().save()
    }
}
