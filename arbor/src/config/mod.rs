//! The configuration tree and its root.
//!
//! A [`Configuration`] owns a tree of nodes addressed by separator-joined
//! paths, a [`Source`] it loads from and saves to, and the [`Serialization`]
//! registry typed reads go through.
//!
//! # Examples
//!
//! Building a tree in memory and reading it back:
//!
//! ```
//! use arbor::{Configuration, ValueHolder, Value};
//!
//! let mut config = Configuration::in_memory();
//! config.get_node("server.port").unwrap().set_value(8080).unwrap();
//! config.get_node("server.hosts").unwrap().set_value(Value::list(["a", "b"])).unwrap();
//!
//! assert_eq!(config.get_node("server.port").unwrap().get_int(0), 8080);
//! assert_eq!(
//!     config.get_keys(true),
//!     ["server", "server.port", "server.hosts", "server.hosts.0", "server.hosts.1"]
//! );
//! ```
//!
//! Nodes that do not exist yet are detached until something is written:
//!
//! ```
//! use arbor::Configuration;
//!
//! let mut config = Configuration::in_memory();
//! let node = config.get_node("a.b.c").unwrap();
//! assert!(!node.is_attached());
//! assert!(!config.has_child("a"));
//! ```

pub mod holder;
pub mod node;
pub mod source;
pub mod tree;
pub mod value_holder;
pub mod yaml;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::serialization::Serialization;
use crate::value::{Snapshot, Value};

pub use holder::{ConfigurationHolder, HolderSet, SharedConfiguration};
pub use node::Node;
pub use source::{MapSource, Source};
pub use tree::{NodeId, Parent, Shape};
pub use value_holder::ValueHolder;
pub use yaml::YamlSource;

use tree::NodeData;

/// The default path separator.
pub const DEFAULT_SEPARATOR: &str = ".";

/// The root of a configuration tree.
///
/// The root has no path and no value of its own; its children are the
/// top-level entries. It is not safe to mutate one configuration from
/// several threads without external locking, which is what
/// [`SharedConfiguration`] provides.
#[derive(Debug)]
pub struct Configuration {
    source: Box<dyn Source>,
    serialization: Serialization,
    separator: String,
    writes_defaults: bool,
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) children: IndexMap<String, NodeId>,
    pub(crate) free: Vec<usize>,
}

impl Configuration {
    /// An empty configuration backed by `source`. Nothing is read until
    /// [`Configuration::load`] is called.
    pub fn new(source: impl Source + 'static) -> Self {
        Self {
            source: Box::new(source),
            serialization: Serialization::shared(),
            separator: DEFAULT_SEPARATOR.to_string(),
            writes_defaults: true,
            nodes: Vec::new(),
            children: IndexMap::new(),
            free: Vec::new(),
        }
    }

    /// An empty configuration backed by a fresh [`MapSource`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MapSource::default())
    }

    /// A configuration already populated from `snapshot`.
    ///
    /// The snapshot is also the initial content of its [`MapSource`].
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut config = Self::new(MapSource::new(snapshot.clone()));
        config.rebuild(snapshot);
        config
    }

    /// Uses `serialization` instead of the process-wide registry.
    #[must_use]
    pub fn with_serialization(mut self, serialization: Serialization) -> Self {
        self.serialization = serialization;
        self
    }

    /// The registry typed reads and writes go through.
    #[must_use]
    pub fn serialization(&self) -> &Serialization {
        &self.serialization
    }

    /// The backing source.
    #[must_use]
    pub fn source(&self) -> &dyn Source {
        self.source.as_ref()
    }

    /// The backing file, for file-backed sources.
    #[must_use]
    pub fn file(&self) -> Option<&Path> {
        self.source.file()
    }

    /// The separator used to split and join paths.
    #[must_use]
    pub fn path_separator(&self) -> &str {
        &self.separator
    }

    /// Changes the path separator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSeparator`] for an empty separator.
    pub fn set_path_separator(&mut self, separator: impl Into<String>) -> Result<()> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(Error::InvalidSeparator);
        }
        self.separator = separator;
        Ok(())
    }

    /// Whether reads with a default write that default into empty nodes.
    #[must_use]
    pub const fn writes_defaults(&self) -> bool {
        self.writes_defaults
    }

    /// Enables or disables writing defaults on read.
    pub fn set_writes_defaults(&mut self, writes_defaults: bool) {
        self.writes_defaults = writes_defaults;
    }

    /// Splits `path` on the separator, taken literally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyPath`] for an empty path.
    pub fn split_path(&self, path: &str) -> Result<Vec<String>> {
        if path.is_empty() {
            return Err(Error::EmptyPath);
        }
        Ok(path.split(self.separator.as_str()).map(str::to_string).collect())
    }

    /// Replaces the tree with the source's current snapshot.
    ///
    /// Node handles issued before the reload become stale. If the source
    /// fails, the tree is left as it was.
    ///
    /// # Errors
    ///
    /// Returns the source's error.
    pub fn load(&mut self) -> Result<()> {
        let snapshot = self.source.load()?;
        log::debug!("loaded {} top-level entries", snapshot.len());
        self.rebuild(snapshot);
        Ok(())
    }

    /// Writes the tree's current snapshot to the source.
    ///
    /// # Errors
    ///
    /// Returns the source's error.
    pub fn save(&mut self) -> Result<()> {
        let snapshot = self.snapshot();
        self.source.save(&snapshot)
    }

    /// The values of all top-level entries.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.values_of(Parent::Root)
    }

    /// Alias of [`Configuration::snapshot`], matching [`Node::values`].
    #[must_use]
    pub fn values(&self) -> Snapshot {
        self.snapshot()
    }

    /// The whole tree as one mapping value.
    #[must_use]
    pub fn dump(&self) -> Value {
        Value::Map(self.snapshot())
    }

    /// Resolves a node handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleNode`] if the handle predates a reload.
    pub fn node(&mut self, id: NodeId) -> Result<Node<'_>> {
        self.check(id)?;
        Ok(Node::live(self, id))
    }

    /// The node at `path`, or a detached node for that path if it does not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyPath`] for an empty path and a structural error
    /// if the path runs through a scalar.
    pub fn get_node(&mut self, path: &str) -> Result<Node<'_>> {
        let segments = self.split_path(path)?;
        Node::resolve(self, Parent::Root, Vec::new(), segments)
    }

    /// Like [`Configuration::get_node`] with the path already split.
    ///
    /// # Errors
    ///
    /// As for [`Configuration::get_node`].
    pub fn get_node_at<S: AsRef<str>>(&mut self, segments: &[S]) -> Result<Node<'_>> {
        let segments = segments.iter().map(|s| s.as_ref().to_string()).collect();
        Node::resolve(self, Parent::Root, Vec::new(), segments)
    }

    /// The top-level child `name`. When it does not exist, `create` decides
    /// between attaching a new empty child and returning a detached one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyPath`] for an empty name.
    pub fn get_child(&mut self, name: &str, create: bool) -> Result<Node<'_>> {
        if name.is_empty() {
            return Err(Error::EmptyPath);
        }
        if let Some(id) = self.find_child(Parent::Root, name) {
            return Ok(Node::live(self, id));
        }
        let path = vec![name.to_string()];
        if create {
            let id = self.alloc(path);
            self.attach(Parent::Root, id)?;
            Ok(Node::live(self, id))
        } else {
            Ok(Node::pending(self, path))
        }
    }

    /// Creates a detached node at `segments` holding `value`.
    ///
    /// The node stays allocated until it is placed in the tree, passed to
    /// [`Configuration::discard`], or the configuration is reloaded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyPath`] if `segments` is empty.
    pub fn create_node<S: AsRef<str>>(
        &mut self,
        segments: &[S],
        value: impl Into<Value>,
    ) -> Result<NodeId> {
        if segments.is_empty() {
            return Err(Error::EmptyPath);
        }
        let path = segments.iter().map(|s| s.as_ref().to_string()).collect();
        Ok(self.build(path, value.into(), None, false))
    }

    /// Places a node in the tree at its own path, creating or reusing
    /// intermediate nodes.
    ///
    /// # Errors
    ///
    /// Returns an error for stale handles, empty paths, paths through a
    /// scalar or sequence, and attachments that would form a cycle.
    pub fn set_node(&mut self, id: NodeId) -> Result<()> {
        self.check(id)?;
        self.place(id)
    }

    /// Adds a top-level child keyed by its last path segment, returning the
    /// child it replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleNode`] for a stale handle.
    pub fn add_child(&mut self, id: NodeId) -> Result<Option<NodeId>> {
        self.check(id)?;
        self.attach(Parent::Root, id)
    }

    /// Removes and detaches the top-level child `name`.
    ///
    /// The returned node can be attached elsewhere; otherwise hand it to
    /// [`Configuration::discard`] to free it.
    pub fn remove_child(&mut self, name: &str) -> Option<NodeId> {
        self.remove_child_of(Parent::Root, name)
    }

    /// Removes `id` from the tree if it is attached and frees it together
    /// with its descendants. Handles to any of them become stale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleNode`] for a stale handle.
    pub fn discard(&mut self, id: NodeId) -> Result<()> {
        self.check(id)?;
        self.release(id);
        Ok(())
    }

    /// Creates an empty node at `path`, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// As for [`Configuration::set_node`].
    pub fn add_node(&mut self, path: &str) -> Result<Node<'_>> {
        let segments = self.split_path(path)?;
        let id = self.alloc(segments);
        self.place(id)?;
        Ok(Node::live(self, id))
    }

    /// Returns `true` if a top-level child `name` exists.
    #[must_use]
    pub fn has_child(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Returns `true` if a node exists at `path`.
    #[must_use]
    pub fn has_node(&self, path: &str) -> bool {
        self.split_path(path)
            .and_then(|segments| self.lookup(Parent::Root, &segments))
            .is_ok_and(|found| found.is_some())
    }

    /// Returns `true` if there are any top-level entries.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// The top-level children, in insertion order.
    #[must_use]
    pub fn children(&self) -> Vec<(String, NodeId)> {
        self.children_of(Parent::Root)
    }

    /// Top-level keys; with `deep`, every descendant's path as well.
    #[must_use]
    pub fn get_keys(&self, deep: bool) -> Vec<String> {
        self.keys_of(Parent::Root, deep)
    }

    /// Writes `value` at `path`, returning the previous value.
    ///
    /// # Errors
    ///
    /// As for [`Configuration::get_node`] and [`Node::set_value`].
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<Value> {
        self.get_node(path)?.set_value(value)
    }

    /// Removes the node at `path`, if it exists.
    ///
    /// # Errors
    ///
    /// As for [`Configuration::get_node`].
    pub fn remove(&mut self, path: &str) -> Result<()> {
        self.get_node(path)?.remove();
        Ok(())
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::in_memory()
    }
}
