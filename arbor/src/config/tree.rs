//! Arena storage and structural operations for the node tree.
//!
//! Nodes live in a flat arena owned by [`Configuration`] and refer to each
//! other through [`NodeId`]s. Slots are reused: a subtree that is overwritten,
//! removed or discarded goes back on a free list, and a reload frees every
//! slot. Each slot carries a generation that is bumped when it is freed, so an
//! id issued before that is rejected instead of silently pointing at whatever
//! node took the slot next.
//!
//! Invariants kept here:
//!
//! - A node is attached exactly when it is reachable from the root.
//! - A node's content is one of null, scalar, sequence or mapping, never a
//!   mix of a scalar and children.
//! - No node is its own ancestor. Attachments that would break this are
//!   rejected before anything is mutated.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::value::{Snapshot, Value};

use super::Configuration;

/// A handle to a node inside one [`Configuration`].
///
/// Handles are only meaningful for the configuration that issued them, and
/// only until the node is overwritten, removed or discarded, or the
/// configuration is reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u64,
}

/// What a node hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parent {
    /// The configuration root.
    Root,
    /// Another node.
    Node(NodeId),
}

/// The shape of a node's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// No value and no children.
    Null,
    /// A single leaf value.
    Scalar,
    /// Children addressed by position.
    Sequence,
    /// Children addressed by name.
    Mapping,
}

#[derive(Debug, Clone)]
pub(crate) enum Content {
    Null,
    Scalar(Value),
    Sequence(Vec<NodeId>),
    Mapping(IndexMap<String, NodeId>),
}

impl Content {
    pub(crate) const fn shape(&self) -> Shape {
        match self {
            Self::Null => Shape::Null,
            Self::Scalar(_) => Shape::Scalar,
            Self::Sequence(_) => Shape::Sequence,
            Self::Mapping(_) => Shape::Mapping,
        }
    }

    fn child_ids(&self) -> Vec<NodeId> {
        match self {
            Self::Sequence(items) => items.clone(),
            Self::Mapping(map) => map.values().copied().collect(),
            Self::Null | Self::Scalar(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) path: Vec<String>,
    pub(crate) content: Content,
    pub(crate) attached: bool,
    pub(crate) parent: Option<Parent>,
    generation: u64,
}

impl Configuration {
    pub(crate) fn alloc(&mut self, path: Vec<String>) -> NodeId {
        if let Some(index) = self.free.pop() {
            let data = &mut self.nodes[index];
            data.path = path;
            return NodeId {
                index,
                generation: data.generation,
            };
        }
        self.nodes.push(NodeData {
            path,
            content: Content::Null,
            attached: false,
            parent: None,
            generation: 0,
        });
        NodeId {
            index: self.nodes.len() - 1,
            generation: 0,
        }
    }

    pub(crate) fn check(&self, id: NodeId) -> Result<()> {
        match self.nodes.get(id.index) {
            Some(data) if data.generation == id.generation => Ok(()),
            _ => Err(Error::StaleNode),
        }
    }

    /// Resets a slot and puts it on the free list, invalidating its ids.
    fn free_slot(&mut self, index: usize) -> Content {
        let data = &mut self.nodes[index];
        let content = std::mem::replace(&mut data.content, Content::Null);
        data.generation += 1;
        data.attached = false;
        data.parent = None;
        data.path.clear();
        self.free.push(index);
        content
    }

    /// Unlinks `id` and returns its whole subtree to the free list.
    pub(crate) fn release(&mut self, id: NodeId) {
        self.unlink(id);
        let mut stack = vec![id.index];
        while let Some(index) = stack.pop() {
            let content = self.free_slot(index);
            stack.extend(content.child_ids().into_iter().map(|child| child.index));
        }
    }

    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index]
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index]
    }

    pub(crate) fn join(&self, path: &[String]) -> String {
        path.join(&self.separator)
    }

    fn path_of(&self, id: NodeId) -> String {
        self.join(&self.data(id).path)
    }

    pub(crate) fn find_child(&self, owner: Parent, name: &str) -> Option<NodeId> {
        match owner {
            Parent::Root => self.children.get(name).copied(),
            Parent::Node(id) => match &self.data(id).content {
                Content::Mapping(map) => map.get(name).copied(),
                Content::Sequence(items) => name
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| items.get(i).copied()),
                Content::Null | Content::Scalar(_) => None,
            },
        }
    }

    pub(crate) fn children_of(&self, owner: Parent) -> Vec<(String, NodeId)> {
        match owner {
            Parent::Root => self
                .children
                .iter()
                .map(|(k, id)| (k.clone(), *id))
                .collect(),
            Parent::Node(id) => match &self.data(id).content {
                Content::Mapping(map) => map.iter().map(|(k, id)| (k.clone(), *id)).collect(),
                Content::Sequence(items) => items
                    .iter()
                    .enumerate()
                    .map(|(i, id)| (i.to_string(), *id))
                    .collect(),
                Content::Null | Content::Scalar(_) => Vec::new(),
            },
        }
    }

    pub(crate) fn keys_of(&self, owner: Parent, deep: bool) -> Vec<String> {
        let mut keys = Vec::new();
        for (name, id) in self.children_of(owner) {
            if deep {
                let nested = self.keys_of(Parent::Node(id), true);
                keys.push(name.clone());
                keys.extend(
                    nested
                        .into_iter()
                        .map(|sub| format!("{name}{}{sub}", self.separator)),
                );
            } else {
                keys.push(name);
            }
        }
        keys
    }

    pub(crate) fn values_of(&self, owner: Parent) -> Snapshot {
        self.children_of(owner)
            .into_iter()
            .map(|(name, id)| (name, self.value_of(id)))
            .collect()
    }

    pub(crate) fn value_of(&self, id: NodeId) -> Value {
        match &self.data(id).content {
            Content::Null => Value::Null,
            Content::Scalar(value) => value.clone(),
            Content::Sequence(items) => {
                Value::List(items.iter().map(|item| self.value_of(*item)).collect())
            }
            Content::Mapping(_) => Value::Map(self.values_of(Parent::Node(id))),
        }
    }

    /// Builds a subtree for `value` under `parent`.
    pub(crate) fn build(
        &mut self,
        path: Vec<String>,
        value: Value,
        parent: Option<Parent>,
        attached: bool,
    ) -> NodeId {
        let id = self.alloc(path);
        let data = self.data_mut(id);
        data.parent = parent;
        data.attached = attached;
        self.fill(id, value);
        id
    }

    fn child_path(&self, id: NodeId, segment: String) -> Vec<String> {
        let mut path = self.data(id).path.clone();
        path.push(segment);
        path
    }

    /// Replaces the (already emptied) content of `id` with `value`.
    fn fill(&mut self, id: NodeId, value: Value) {
        let attached = self.data(id).attached;
        let content = match value {
            Value::Null => Content::Null,
            Value::Map(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, item) in entries {
                    let path = self.child_path(id, key.clone());
                    let child = self.build(path, item, Some(Parent::Node(id)), attached);
                    map.insert(key, child);
                }
                Content::Mapping(map)
            }
            Value::List(items) => {
                let mut ids = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    let path = self.child_path(id, i.to_string());
                    ids.push(self.build(path, item, Some(Parent::Node(id)), attached));
                }
                Content::Sequence(ids)
            }
            scalar => Content::Scalar(scalar),
        };
        self.data_mut(id).content = content;
    }

    /// Replaces the whole tree with `snapshot`, invalidating every id.
    pub(crate) fn rebuild(&mut self, snapshot: Snapshot) {
        self.children.clear();
        self.free.clear();
        for index in (0..self.nodes.len()).rev() {
            self.free_slot(index);
        }
        for (key, value) in snapshot {
            let id = self.build(vec![key.clone()], value, Some(Parent::Root), true);
            self.children.insert(key, id);
        }
    }

    fn set_attached(&mut self, id: NodeId, attached: bool) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let data = self.data_mut(current);
            data.attached = attached;
            stack.extend(data.content.child_ids());
        }
    }

    /// Removes `child` from its parent's children without touching its subtree.
    fn unlink(&mut self, child: NodeId) {
        let Some(parent) = self.data(child).parent else {
            return;
        };
        match parent {
            Parent::Root => self.children.retain(|_, id| *id != child),
            Parent::Node(owner) => match &mut self.data_mut(owner).content {
                Content::Mapping(map) => map.retain(|_, id| *id != child),
                Content::Sequence(items) => items.retain(|id| *id != child),
                Content::Null | Content::Scalar(_) => {}
            },
        }
        self.data_mut(child).parent = None;
    }

    /// Detaches `id` and everything below it.
    ///
    /// Containers lose their children; scalars keep their value. Paths are
    /// left as they were.
    pub(crate) fn detach(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let data = self.data_mut(current);
            data.attached = false;
            data.parent = None;
            if matches!(data.content, Content::Sequence(_) | Content::Mapping(_)) {
                let content = std::mem::replace(&mut data.content, Content::Null);
                stack.extend(content.child_ids());
            }
        }
    }

    /// Unlinks and detaches the named child of `owner`.
    pub(crate) fn remove_child_of(&mut self, owner: Parent, name: &str) -> Option<NodeId> {
        let child = self.find_child(owner, name)?;
        self.unlink(child);
        self.detach(child);
        Some(child)
    }


    /// Rejects attaching `child` under `owner` if that would create a cycle.
    ///
    /// A detached owner will itself be attached along its path first, so the
    /// existing nodes on that path count as future ancestors.
    fn check_cycle(&self, owner: Parent, child: NodeId) -> Result<()> {
        let Parent::Node(start) = owner else {
            return Ok(());
        };
        let circular = || Error::CircularParent {
            child: self.path_of(child),
            parent: self.path_of(start),
        };
        let mut visited = HashSet::new();
        let mut top = start;
        let mut cursor = Some(Parent::Node(start));
        while let Some(Parent::Node(id)) = cursor {
            if id == child || !visited.insert(id) {
                return Err(circular());
            }
            top = id;
            cursor = self.data(id).parent;
        }
        if cursor.is_none() && !self.data(top).attached {
            let path = &self.data(top).path;
            let mut owner = Parent::Root;
            for segment in path.iter().take(path.len().saturating_sub(1)) {
                let Some(next) = self.find_child(owner, segment) else {
                    break;
                };
                if next == child {
                    return Err(circular());
                }
                owner = Parent::Node(next);
            }
        }
        Ok(())
    }

    /// Adds `child` under `owner`, keyed by its last path segment.
    ///
    /// A null or scalar owner becomes a mapping. A detached owner is attached
    /// at its own path first. Returns the child previously stored under the
    /// same key, which is detached.
    pub(crate) fn attach(&mut self, owner: Parent, child: NodeId) -> Result<Option<NodeId>> {
        let key = self
            .data(child)
            .path
            .last()
            .cloned()
            .ok_or(Error::EmptyPath)?;
        self.check_cycle(owner, child)?;
        if let Parent::Node(id) = owner {
            if matches!(self.data(id).content, Content::Sequence(_)) {
                return Err(Error::structural(
                    self.path_of(id),
                    "cannot add a named child to a sequence",
                ));
            }
            self.ensure_attached(id)?;
        }
        self.unlink(child);
        let previous = match owner {
            Parent::Root => self.children.insert(key, child),
            Parent::Node(id) => {
                let data = self.data_mut(id);
                if !matches!(data.content, Content::Mapping(_)) {
                    data.content = Content::Mapping(IndexMap::new());
                }
                match &mut data.content {
                    Content::Mapping(map) => map.insert(key, child),
                    _ => None,
                }
            }
        };
        self.data_mut(child).parent = Some(owner);
        self.set_attached(child, true);
        let previous = previous.filter(|prev| *prev != child);
        if let Some(prev) = previous {
            self.detach(prev);
        }
        Ok(previous)
    }

    /// Appends `child` to the sequence `owner`.
    pub(crate) fn push(&mut self, owner: NodeId, child: NodeId) -> Result<()> {
        self.check_cycle(Parent::Node(owner), child)?;
        if matches!(self.data(owner).content, Content::Mapping(_)) {
            return Err(Error::structural(
                self.path_of(owner),
                "cannot add an unnamed child to a mapping",
            ));
        }
        self.ensure_attached(owner)?;
        self.unlink(child);
        let data = self.data_mut(owner);
        if !matches!(data.content, Content::Sequence(_)) {
            data.content = Content::Sequence(Vec::new());
        }
        if let Content::Sequence(items) = &mut data.content {
            items.push(child);
        }
        self.data_mut(child).parent = Some(Parent::Node(owner));
        self.set_attached(child, true);
        Ok(())
    }

    /// Places `id` in the tree at its own path, creating missing
    /// intermediate nodes and reusing existing ones.
    pub(crate) fn place(&mut self, id: NodeId) -> Result<()> {
        let path = self.data(id).path.clone();
        let Some((_, prefix)) = path.split_last() else {
            return Err(Error::EmptyPath);
        };

        // Validate the existing part of the path before changing anything.
        let mut owner = Parent::Root;
        let mut depth = 0;
        for segment in prefix {
            let Some(next) = self.find_child(owner, segment) else {
                break;
            };
            if matches!(self.data(next).content, Content::Scalar(_)) {
                return Err(Error::structural(
                    self.join(&path[..=depth]),
                    "cannot navigate into a scalar",
                ));
            }
            owner = Parent::Node(next);
            depth += 1;
        }
        if depth < prefix.len() {
            if let Parent::Node(existing) = owner {
                if matches!(self.data(existing).content, Content::Sequence(_)) {
                    return Err(Error::structural(
                        self.path_of(existing),
                        "cannot add a named child to a sequence",
                    ));
                }
            }
        }
        self.check_cycle(owner, id)?;

        for end in depth..prefix.len() {
            let intermediate = self.alloc(path[..=end].to_vec());
            self.attach(owner, intermediate)?;
            owner = Parent::Node(intermediate);
        }
        if let Some(previous) = self.attach(owner, id)? {
            self.release(previous);
        }
        Ok(())
    }

    pub(crate) fn ensure_attached(&mut self, id: NodeId) -> Result<()> {
        if self.data(id).attached {
            Ok(())
        } else {
            self.place(id)
        }
    }

    /// Replaces the content of `id`, attaching it first. Returns the old value.
    ///
    /// The old children are freed.
    pub(crate) fn assign(&mut self, id: NodeId, value: Value) -> Result<Value> {
        self.ensure_attached(id)?;
        let old = self.value_of(id);
        let content = std::mem::replace(&mut self.data_mut(id).content, Content::Null);
        for child in content.child_ids() {
            self.release(child);
        }
        self.fill(id, value);
        Ok(old)
    }

    /// Finds the node at `segments` below `owner`.
    ///
    /// Returns `None` when some segment does not exist yet.
    pub(crate) fn lookup(&self, owner: Parent, segments: &[String]) -> Result<Option<NodeId>> {
        if let Parent::Node(id) = owner {
            if matches!(self.data(id).content, Content::Scalar(_)) {
                return Err(Error::structural(
                    self.path_of(id),
                    "cannot navigate into a scalar",
                ));
            }
        }
        let mut current = owner;
        let mut found = None;
        for segment in segments {
            if let Parent::Node(id) = current {
                if matches!(self.data(id).content, Content::Scalar(_)) {
                    return Err(Error::structural(
                        self.path_of(id),
                        "cannot navigate into a scalar",
                    ));
                }
            }
            match self.find_child(current, segment) {
                Some(next) => {
                    found = Some(next);
                    current = Parent::Node(next);
                }
                None => return Ok(None),
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| (*s).to_string()).collect()
    }

    fn loaded() -> Configuration {
        let mut config = Configuration::in_memory();
        config.rebuild(
            [
                ("a".to_string(), Value::map([("b", 1), ("c", 2)])),
                ("list".to_string(), Value::list(["x", "y"])),
            ]
            .into_iter()
            .collect(),
        );
        config
    }

    #[test]
    fn test_rebuild_attaches_everything() {
        let config = loaded();
        let b = config
            .lookup(Parent::Root, &path(&["a", "b"]))
            .unwrap()
            .unwrap();
        assert!(config.data(b).attached);
        assert_eq!(config.data(b).path, path(&["a", "b"]));
        assert_eq!(config.value_of(b), Value::I32(1));
    }

    #[test]
    fn test_sequence_children_by_index() {
        let config = loaded();
        let y = config
            .lookup(Parent::Root, &path(&["list", "1"]))
            .unwrap()
            .unwrap();
        assert_eq!(config.value_of(y), Value::from("y"));
        assert_eq!(config.lookup(Parent::Root, &path(&["list", "9"])).unwrap(), None);
    }

    #[test]
    fn test_lookup_into_scalar_fails() {
        let config = loaded();
        let err = config
            .lookup(Parent::Root, &path(&["a", "b", "c"]))
            .unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_set_node_creates_intermediates() {
        let mut config = loaded();
        let id = config.alloc(path(&["x", "y", "z"]));
        config.set_node(id).unwrap();
        assert!(config.data(id).attached);
        let y = config
            .lookup(Parent::Root, &path(&["x", "y"]))
            .unwrap()
            .unwrap();
        assert_eq!(config.data(id).parent, Some(Parent::Node(y)));
    }

    #[test]
    fn test_set_node_through_scalar_is_untouched_failure() {
        let mut config = loaded();
        let before = config.nodes.len();
        let id = config.alloc(path(&["a", "b", "deeper"]));
        assert!(config.set_node(id).unwrap_err().is_structural());
        assert_eq!(config.nodes.len(), before + 1);
        assert!(!config.data(id).attached);
    }

    #[test]
    fn test_attach_replaces_and_detaches_previous() {
        let mut config = loaded();
        let old = config.lookup(Parent::Root, &path(&["a"])).unwrap().unwrap();
        let old_b = config
            .lookup(Parent::Root, &path(&["a", "b"]))
            .unwrap()
            .unwrap();
        let new = config.build(path(&["a"]), Value::from(5), None, false);
        assert_eq!(config.attach(Parent::Root, new).unwrap(), Some(old));
        assert!(!config.data(old).attached);
        assert!(!config.data(old_b).attached);
        assert_eq!(config.data(old_b).parent, None);
    }

    #[test]
    fn test_cycle_rejected_before_mutation() {
        let mut config = loaded();
        let a = config.lookup(Parent::Root, &path(&["a"])).unwrap().unwrap();
        let err = config.attach(Parent::Node(a), a).unwrap_err();
        assert!(err.is_programming_error());

        // `a` is the future ancestor of a detached node at a.q.r
        let pending = config.alloc(path(&["a", "q", "r"]));
        let before = config.value_of(a);
        let err = config.attach(Parent::Node(pending), a).unwrap_err();
        assert!(matches!(err, Error::CircularParent { .. }));
        assert_eq!(config.value_of(a), before);
        assert!(!config.data(pending).attached);
    }

    #[test]
    fn test_named_child_in_sequence_fails() {
        let mut config = loaded();
        let list = config
            .lookup(Parent::Root, &path(&["list"]))
            .unwrap()
            .unwrap();
        let child = config.alloc(path(&["list", "name"]));
        assert!(config.attach(Parent::Node(list), child).is_err());
    }

    #[test]
    fn test_push_into_mapping_fails() {
        let mut config = loaded();
        let a = config.lookup(Parent::Root, &path(&["a"])).unwrap().unwrap();
        let child = config.alloc(path(&["a", "0"]));
        assert!(config.push(a, child).unwrap_err().is_structural());
    }

    #[test]
    fn test_assign_clears_children() {
        let mut config = loaded();
        let a = config.lookup(Parent::Root, &path(&["a"])).unwrap().unwrap();
        let b = config
            .lookup(Parent::Root, &path(&["a", "b"]))
            .unwrap()
            .unwrap();
        let old = config.assign(a, Value::from("flat")).unwrap();
        assert_eq!(old, Value::map([("b", 1), ("c", 2)]));
        assert_eq!(config.data(a).content.shape(), Shape::Scalar);
        assert!(matches!(config.check(b), Err(Error::StaleNode)));
    }

    #[test]
    fn test_repeated_writes_reuse_slots() {
        let mut config = Configuration::in_memory();
        for i in 0..1000 {
            config.set("a", Value::map([("x", i), ("y", i)])).unwrap();
        }
        assert_eq!(config.nodes.len(), 3);
        assert_eq!(config.dump(), Value::map([("a", Value::map([("x", 999), ("y", 999)]))]));

        for i in 0..100 {
            config.add_node("a.x").unwrap();
            config.set("a.x", Value::list([i, i])).unwrap();
        }
        assert!(config.nodes.len() <= 6);
    }

    #[test]
    fn test_freed_slot_rejects_old_ids() {
        let mut config = loaded();
        let b = config
            .lookup(Parent::Root, &path(&["a", "b"]))
            .unwrap()
            .unwrap();
        config.set("a", Value::map([("z", 1)])).unwrap();
        let z = config
            .lookup(Parent::Root, &path(&["a", "z"]))
            .unwrap()
            .unwrap();
        assert!(matches!(config.check(b), Err(Error::StaleNode)));
        assert!(config.check(z).is_ok());
        assert_ne!(b, z);
    }

    #[test]
    fn test_reload_reuses_arena() {
        let mut config = loaded();
        let before = config.nodes.len();
        config.rebuild(
            [("a".to_string(), Value::map([("b", 1), ("c", 2)]))]
                .into_iter()
                .collect(),
        );
        assert_eq!(config.nodes.len(), before);
        assert_eq!(config.free.len(), before - 3);
    }

    #[test]
    fn test_deep_keys() {
        let config = loaded();
        assert_eq!(
            config.keys_of(Parent::Root, true),
            ["a", "a.b", "a.c", "list", "list.0", "list.1"]
        );
        assert_eq!(config.keys_of(Parent::Root, false), ["a", "list"]);
    }

    #[test]
    fn test_stale_ids() {
        let mut config = loaded();
        let a = config.lookup(Parent::Root, &path(&["a"])).unwrap().unwrap();
        assert!(config.check(a).is_ok());
        config.rebuild(Snapshot::new());
        assert!(matches!(config.check(a), Err(Error::StaleNode)));
    }
}
