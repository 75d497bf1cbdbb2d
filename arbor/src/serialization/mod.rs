//! Descriptor-driven conversion between raw and typed values.
//!
//! A [`Serialization`] is an ordered registry of [`Serializer`]s plus a cache
//! of which serializer last handled each [`TypeDescriptor`]. Reads scan the
//! registry in order and the first serializer that passes the applicability
//! filter decides the result, even when that result is "no value". Writes
//! prefer the cached serializer, fall back to a scan, and pass the value
//! through unchanged when nobody converts it.
//!
//! The handle is cheap to clone; clones share registry and cache. The cache
//! is guarded by a read/write lock so concurrent readers do not block each
//! other.
//!
//! # Examples
//!
//! ```
//! use arbor::{Serialization, TypeDescriptor, Value};
//!
//! let serialization = Serialization::new();
//! let ty: TypeDescriptor = "list<i32>".parse().unwrap();
//!
//! let raw = Value::list(["1", "2"]);
//! assert_eq!(serialization.deserialize(&ty, &raw), Some(Value::list([1, 2])));
//! assert_eq!(serialization.cached(&ty), Some("list"));
//! ```

mod builtin;
mod serializer;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::descriptor::TypeDescriptor;
use crate::value::Value;

pub use builtin::{
    BoolSerializer, ByteArraySerializer, DateSerializer, EnumSerializer, ListSerializer,
    MapSerializer, NumberSerializer, SameSerializer, SectionSerializer, SetSerializer,
    StringSerializer,
};
pub use serializer::{Parameters, Serializer};

use serializer::{survives, Direction};

struct Registry {
    serializers: RwLock<Vec<Arc<dyn Serializer>>>,
    cache: RwLock<HashMap<TypeDescriptor, Arc<dyn Serializer>>>,
}

/// A shared serializer registry.
#[derive(Clone)]
pub struct Serialization {
    inner: Arc<Registry>,
}

static SHARED: OnceLock<Serialization> = OnceLock::new();

impl Serialization {
    /// A registry holding the built-in serializers.
    #[must_use]
    pub fn new() -> Self {
        let serialization = Self::empty();
        {
            let mut serializers = serialization.inner.serializers.write();
            serializers.extend(builtin::defaults().into_iter().map(Arc::from));
        }
        serialization
    }

    /// A registry with no serializers at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(Registry {
                serializers: RwLock::new(Vec::new()),
                cache: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// The process-wide registry that configurations use unless given
    /// another one.
    #[must_use]
    pub fn shared() -> Self {
        SHARED.get_or_init(Self::new).clone()
    }

    /// Appends a serializer after the existing ones and clears the cache.
    pub fn register(&self, serializer: impl Serializer + 'static) {
        log::debug!("registering serializer '{}'", serializer.name());
        self.inner.serializers.write().push(Arc::new(serializer));
        self.inner.cache.write().clear();
    }

    /// Names of the registered serializers, in dispatch order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.inner
            .serializers
            .read()
            .iter()
            .map(|s| s.name())
            .collect()
    }

    /// The name of the serializer cached for `ty`, if any.
    #[must_use]
    pub fn cached(&self, ty: &TypeDescriptor) -> Option<&'static str> {
        self.inner.cache.read().get(ty).map(|s| s.name())
    }

    // Handlers recurse into the registry, so no lock is held while they run.
    fn snapshot(&self) -> Vec<Arc<dyn Serializer>> {
        self.inner.serializers.read().clone()
    }

    fn remember(&self, ty: &TypeDescriptor, serializer: &Arc<dyn Serializer>) {
        self.inner
            .cache
            .write()
            .insert(ty.clone(), Arc::clone(serializer));
    }

    /// Converts a raw value into the canonical value for `ty`.
    ///
    /// Returns `None` when no serializer applies, and also when the first
    /// applicable serializer cannot convert the value.
    #[must_use]
    pub fn deserialize(&self, ty: &TypeDescriptor, value: &Value) -> Option<Value> {
        for serializer in self.snapshot() {
            if !survives(serializer.as_ref(), Direction::Deserialize, ty, value) {
                continue;
            }
            let result = serializer.deserialize(self, ty, value);
            if result.is_some() {
                self.remember(ty, &serializer);
            }
            return result;
        }
        log::debug!("no serializer for {} as {ty}", value.kind());
        None
    }

    /// Converts a typed value into its storable form.
    ///
    /// Values no serializer converts are returned unchanged.
    #[must_use]
    pub fn serialize(&self, ty: &TypeDescriptor, value: &Value) -> Value {
        let cached = self.inner.cache.read().get(ty).cloned();
        if let Some(serializer) = cached {
            if survives(serializer.as_ref(), Direction::Serialize, ty, value) {
                if let Some(out) = serializer.serialize(self, ty, value) {
                    return out;
                }
            }
        }
        for serializer in self.snapshot() {
            if !survives(serializer.as_ref(), Direction::Serialize, ty, value) {
                continue;
            }
            if let Some(out) = serializer.serialize(self, ty, value) {
                self.remember(ty, &serializer);
                return out;
            }
        }
        value.clone()
    }
}

impl Default for Serialization {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Serialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serialization")
            .field("serializers", &self.names())
            .field("cached", &self.inner.cache.read().len())
            .finish()
    }
}
