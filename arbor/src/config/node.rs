//! Cursors onto single nodes of a configuration tree.

use crate::descriptor::TypeDescriptor;
use crate::error::{Error, Result};
use crate::serialization::Serialization;
use crate::setting::Setting;
use crate::value::{Snapshot, Value};

use super::tree::{Content, NodeId, Parent, Shape};
use super::value_holder::ValueHolder;
use super::Configuration;

#[derive(Debug, Clone)]
enum Target {
    /// A node in the arena, attached or not.
    Live(NodeId),
    /// A node that does not exist yet; only its path is known.
    Pending(Vec<String>),
}

/// A node of a [`Configuration`], borrowed mutably for as long as it is used.
///
/// A node returned for a path that does not exist yet is *detached*: reading
/// it yields null and it takes no space in the tree. Writing a value, or
/// creating a child, attaches it at its path together with any missing
/// ancestors.
///
/// Navigation methods such as [`Node::get_node`] consume the cursor and
/// return a new one, so they chain:
///
/// ```
/// use arbor::{Configuration, ValueHolder};
///
/// let mut config = Configuration::in_memory();
/// config.set("db.primary.host", "localhost").unwrap();
///
/// let host = config
///     .get_node("db")
///     .unwrap()
///     .get_child("primary", false)
///     .unwrap()
///     .get_node("host")
///     .unwrap()
///     .get_string();
/// assert_eq!(host.as_deref(), Some("localhost"));
/// ```
#[derive(Debug)]
pub struct Node<'a> {
    config: &'a mut Configuration,
    target: Target,
}

impl<'a> Node<'a> {
    pub(crate) fn live(config: &'a mut Configuration, id: NodeId) -> Self {
        Self {
            config,
            target: Target::Live(id),
        }
    }

    pub(crate) fn pending(config: &'a mut Configuration, path: Vec<String>) -> Self {
        Self {
            config,
            target: Target::Pending(path),
        }
    }

    /// Walks `segments` below `owner`, whose own path is `base`.
    pub(crate) fn resolve(
        config: &'a mut Configuration,
        owner: Parent,
        base: Vec<String>,
        segments: Vec<String>,
    ) -> Result<Self> {
        if segments.is_empty() {
            return Err(Error::EmptyPath);
        }
        match config.lookup(owner, &segments)? {
            Some(id) => Ok(Self::live(config, id)),
            None => {
                let mut path = base;
                path.extend(segments);
                Ok(Self::pending(config, path))
            }
        }
    }

    /// The node's handle, unless it is a detached node that was never
    /// written.
    #[must_use]
    pub fn id(&self) -> Option<NodeId> {
        match self.target {
            Target::Live(id) => Some(id),
            Target::Pending(_) => None,
        }
    }

    /// The full path from the root.
    #[must_use]
    pub fn path(&self) -> &[String] {
        match &self.target {
            Target::Live(id) => &self.config.data(*id).path,
            Target::Pending(path) => path,
        }
    }

    /// The full path joined with the configuration's separator.
    #[must_use]
    pub fn path_string(&self) -> String {
        self.config.join(self.path())
    }

    /// Returns `true` if the node is reachable from the root.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        match self.target {
            Target::Live(id) => self.config.data(id).attached,
            Target::Pending(_) => false,
        }
    }

    /// What the node hangs off, if it is attached to anything.
    #[must_use]
    pub fn parent(&self) -> Option<Parent> {
        match self.target {
            Target::Live(id) => self.config.data(id).parent,
            Target::Pending(_) => None,
        }
    }

    /// The shape of the node's content.
    #[must_use]
    pub fn shape(&self) -> Shape {
        match self.target {
            Target::Live(id) => self.config.data(id).content.shape(),
            Target::Pending(_) => Shape::Null,
        }
    }

    fn owner(&self) -> Option<Parent> {
        self.id().map(Parent::Node)
    }

    /// Returns `true` if the node has any children.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    /// The children as `(key, handle)` pairs; sequence keys are indices.
    #[must_use]
    pub fn children(&self) -> Vec<(String, NodeId)> {
        self.owner()
            .map(|owner| self.config.children_of(owner))
            .unwrap_or_default()
    }

    /// Returns `true` if a direct child `name` exists.
    #[must_use]
    pub fn has_child(&self, name: &str) -> bool {
        self.owner()
            .is_some_and(|owner| self.config.find_child(owner, name).is_some())
    }

    /// Returns `true` if a descendant exists at the relative `path`.
    #[must_use]
    pub fn has_node(&self, path: &str) -> bool {
        let Some(owner) = self.owner() else {
            return false;
        };
        self.config
            .split_path(path)
            .and_then(|segments| self.config.lookup(owner, &segments))
            .is_ok_and(|found| found.is_some())
    }

    /// Child keys; with `deep`, every descendant's relative path as well.
    #[must_use]
    pub fn get_keys(&self, deep: bool) -> Vec<String> {
        self.owner()
            .map(|owner| self.config.keys_of(owner, deep))
            .unwrap_or_default()
    }

    /// The values of the direct children, by key.
    #[must_use]
    pub fn values(&self) -> Snapshot {
        self.owner()
            .map(|owner| self.config.values_of(owner))
            .unwrap_or_default()
    }

    /// The handle for this node, allocating a detached one if necessary.
    fn ensure_id(&mut self) -> NodeId {
        match &self.target {
            Target::Live(id) => *id,
            Target::Pending(path) => {
                let id = self.config.alloc(path.clone());
                self.target = Target::Live(id);
                id
            }
        }
    }

    /// Attaches the node at its path, creating missing ancestors.
    ///
    /// # Errors
    ///
    /// Returns a structural error if the path runs through a scalar or a
    /// sequence.
    pub fn attach(&mut self) -> Result<NodeId> {
        let id = self.ensure_id();
        self.config.ensure_attached(id)?;
        Ok(id)
    }

    /// Replaces the node's content with `value`, attaching the node first.
    ///
    /// Lists become sequences of child nodes and maps become mappings; any
    /// previous children are detached. Returns the previous value.
    ///
    /// # Errors
    ///
    /// As for [`Node::attach`].
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<Value> {
        let id = self.ensure_id();
        self.config.assign(id, value.into())
    }

    /// Serializes `value` as `ty` and stores the result.
    ///
    /// # Errors
    ///
    /// As for [`Node::set_value`].
    pub fn set_typed_value(&mut self, ty: &TypeDescriptor, value: &Value) -> Result<Value> {
        let raw = self.config.serialization().serialize(ty, value);
        self.set_value(raw)
    }

    /// Stores a typed value.
    ///
    /// # Errors
    ///
    /// As for [`Node::set_value`].
    pub fn set_typed<T: Setting>(&mut self, value: T) -> Result<Value> {
        self.set_typed_value(&T::descriptor(), &value.into_value())
    }

    /// Removes the node and its descendants from the tree and frees them.
    ///
    /// The cursor stays usable as a detached node at the same path; handles
    /// to the removed nodes become stale.
    pub fn remove(&mut self) {
        if let Target::Live(id) = self.target {
            let path = self.config.data(id).path.clone();
            self.config.release(id);
            self.target = Target::Pending(path);
        }
    }

    /// The direct child `name`.
    ///
    /// When the child does not exist, `create` decides between attaching a
    /// new empty child (and this node with it) and returning a detached one.
    ///
    /// # Errors
    ///
    /// Returns a structural error when this node is a scalar.
    pub fn get_child(mut self, name: &str, create: bool) -> Result<Node<'a>> {
        if name.is_empty() {
            return Err(Error::EmptyPath);
        }
        if let Target::Live(id) = self.target {
            if matches!(self.config.data(id).content, Content::Scalar(_)) {
                return Err(Error::structural(
                    self.path_string(),
                    "cannot navigate into a scalar",
                ));
            }
            if let Some(child) = self.config.find_child(Parent::Node(id), name) {
                return Ok(Self::live(self.config, child));
            }
        }
        let mut path = self.path().to_vec();
        path.push(name.to_string());
        if create {
            let owner = self.ensure_id();
            let child = self.config.alloc(path);
            self.config.attach(Parent::Node(owner), child)?;
            Ok(Self::live(self.config, child))
        } else {
            Ok(Self::pending(self.config, path))
        }
    }

    /// The descendant at the relative `path`, or a detached node for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyPath`] for an empty path and a structural error
    /// if the path runs through a scalar.
    pub fn get_node(self, path: &str) -> Result<Node<'a>> {
        let segments = self.config.split_path(path)?;
        self.get_node_at(&segments)
    }

    /// Like [`Node::get_node`] with the path already split.
    ///
    /// # Errors
    ///
    /// As for [`Node::get_node`].
    pub fn get_node_at<S: AsRef<str>>(self, segments: &[S]) -> Result<Node<'a>> {
        let segments: Vec<String> = segments.iter().map(|s| s.as_ref().to_string()).collect();
        match self.target {
            Target::Live(id) => {
                let base = self.config.data(id).path.clone();
                Self::resolve(self.config, Parent::Node(id), base, segments)
            }
            Target::Pending(mut path) => {
                if segments.is_empty() {
                    return Err(Error::EmptyPath);
                }
                path.extend(segments);
                Ok(Self::pending(self.config, path))
            }
        }
    }

    /// Adds `child` under this node, keyed by the child's last path segment.
    ///
    /// A null or scalar node becomes a mapping. Returns the child previously
    /// stored under that key, which is detached.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CircularParent`] if `child` is this node or one of
    /// its ancestors, and a structural error if this node is a sequence.
    pub fn add_child(&mut self, child: NodeId) -> Result<Option<NodeId>> {
        self.config.check(child)?;
        let owner = self.ensure_id();
        self.config.attach(Parent::Node(owner), child)
    }

    /// Appends `child` to this node as a sequence element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CircularParent`] for cycles and a structural error if
    /// this node is a mapping.
    pub fn push_child(&mut self, child: NodeId) -> Result<()> {
        self.config.check(child)?;
        let owner = self.ensure_id();
        self.config.push(owner, child)
    }

    /// Removes and detaches the direct child `name`.
    pub fn remove_child(&mut self, name: &str) -> Option<NodeId> {
        let owner = self.owner()?;
        self.config.remove_child_of(owner, name)
    }

    /// Creates an empty node at the relative `path`, replacing whatever was
    /// there.
    ///
    /// # Errors
    ///
    /// As for [`Configuration::set_node`].
    pub fn add_node(self, path: &str) -> Result<Node<'a>> {
        let mut full = self.path().to_vec();
        full.extend(self.config.split_path(path)?);
        let id = self.config.alloc(full);
        self.config.place(id)?;
        Ok(Self::live(self.config, id))
    }
}

impl ValueHolder for Node<'_> {
    fn value(&mut self) -> Value {
        match self.target {
            Target::Live(id) => self.config.value_of(id),
            Target::Pending(_) => Value::Null,
        }
    }

    fn value_or(&mut self, default: Value) -> Value {
        if self.shape() != Shape::Null {
            return self.value();
        }
        if !default.is_null() && self.config.writes_defaults() {
            if let Err(err) = self.set_value(default.clone()) {
                log::warn!(
                    "could not write default for '{}': {err}",
                    self.path_string()
                );
            }
        }
        default
    }

    fn serialization(&self) -> Serialization {
        self.config.serialization().clone()
    }
}
