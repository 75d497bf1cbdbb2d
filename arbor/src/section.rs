//! Binding plain structs to configuration subtrees.
//!
//! A [`Section`] lists its fields as [`Binding`]s, each with a path and a
//! typed getter and setter. Loading reads every binding through the
//! serializers and writes the field's current value back wherever the
//! configuration has nothing usable, so a fresh file is filled with
//! defaults. Saving writes every field.
//!
//! Sections nest: a [`Nested`] field is stored as a mapping and read through
//! the section serializer, which materializes it from its own subtree.
//!
//! # Examples
//!
//! ```
//! use arbor::{Binding, Configuration, Section, SectionConfiguration, MapSource, Value};
//!
//! #[derive(Debug, Default)]
//! struct Server {
//!     host: String,
//!     port: i32,
//! }
//!
//! impl Section for Server {
//!     const NAME: &'static str = "server";
//!
//!     fn bindings() -> Vec<Binding<Self>> {
//!         vec![
//!             Binding::new(["host"], |s: &Self| s.host.clone(), |s: &mut Self, v| s.host = v),
//!             Binding::new(["port"], |s: &Self| s.port, |s: &mut Self, v| s.port = v),
//!         ]
//!     }
//! }
//!
//! let source = MapSource::new([("port".to_string(), Value::from("9000"))].into_iter().collect());
//! let mut bound =
//!     SectionConfiguration::new(Configuration::new(source.clone()), Server::default());
//! bound.load().unwrap();
//!
//! assert_eq!(bound.section().port, 9000);
//! assert!(bound.is_configured());
//! bound.save().unwrap();
//! assert_eq!(source.snapshot()["host"], Value::from(""));
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::config::{Configuration, ValueHolder};
use crate::descriptor::{MainType, SectionType, TypeDescriptor};
use crate::error::Result;
use crate::serialization::Serialization;
use crate::setting::Setting;
use crate::value::{Snapshot, Value};

type Reader<S> = Box<dyn Fn(&S) -> Value + Send + Sync>;
type Writer<S> = Box<dyn Fn(&mut S, Value) -> bool + Send + Sync>;

/// One field of a section: where it lives and how to read and write it.
pub struct Binding<S> {
    path: Vec<String>,
    descriptor: TypeDescriptor,
    read: Reader<S>,
    write: Writer<S>,
}

impl<S: 'static> Binding<S> {
    /// Binds a field of type `T` at `path`, relative to the section root.
    pub fn new<T, I, P>(path: I, get: fn(&S) -> T, set: fn(&mut S, T)) -> Self
    where
        T: Setting + 'static,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            descriptor: T::descriptor(),
            read: Box::new(move |section| get(section).into_value()),
            write: Box::new(move |section, value| match T::from_value(value) {
                Some(typed) => {
                    set(section, typed);
                    true
                }
                None => false,
            }),
        }
    }
}

impl<S> Binding<S> {
    /// The field's path segments.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// The field's descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }
}

impl<S> fmt::Debug for Binding<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("path", &self.path)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// A struct whose fields are bound to configuration paths.
pub trait Section: Default + 'static {
    /// The section's name, which identifies it as a nested type.
    const NAME: &'static str;

    /// The field bindings, in load order.
    fn bindings() -> Vec<Binding<Self>>;
}

/// Loads every binding of `section` from `config`.
///
/// Fields with no usable value are written back to the configuration.
/// Values that deserialize but do not fit the field leave both untouched.
///
/// # Errors
///
/// Returns path errors from resolving or writing nodes.
pub fn load_section<S: Section>(config: &mut Configuration, section: &mut S) -> Result<()> {
    for binding in S::bindings() {
        let mut node = config.get_node_at(&binding.path)?;
        match node.get_typed_value(&binding.descriptor) {
            Some(value) => {
                if !(binding.write)(section, value) {
                    log::warn!(
                        "{}: value at '{}' does not fit {}; keeping the field",
                        S::NAME,
                        node.path_string(),
                        binding.descriptor
                    );
                }
            }
            None => {
                let current = (binding.read)(section);
                node.set_typed_value(&binding.descriptor, &current)?;
            }
        }
    }
    Ok(())
}

/// Writes every binding of `section` into `config`.
///
/// # Errors
///
/// Returns path errors from resolving or writing nodes.
pub fn save_section<S: Section>(config: &mut Configuration, section: &S) -> Result<()> {
    for binding in S::bindings() {
        let value = (binding.read)(section);
        config
            .get_node_at(&binding.path)?
            .set_typed_value(&binding.descriptor, &value)?;
    }
    Ok(())
}

/// Type-erased access to a section type, used by the section serializer.
pub trait SectionSchema: Send + Sync {
    /// The section's name.
    fn name(&self) -> &str;

    /// Loads a section from `raw` (a mapping, or null for all defaults) and
    /// returns its saved form, or `None` if `raw` cannot hold a section.
    fn normalize(&self, serialization: &Serialization, raw: &Value) -> Option<Value>;
}

struct SchemaOf<S>(PhantomData<fn() -> S>);

fn section_snapshot(raw: &Value) -> Option<Snapshot> {
    match raw {
        Value::Map(map) => Some(map.clone()),
        Value::Null => Some(Snapshot::new()),
        _ => None,
    }
}

impl<S: Section> SectionSchema for SchemaOf<S> {
    fn name(&self) -> &str {
        S::NAME
    }

    fn normalize(&self, serialization: &Serialization, raw: &Value) -> Option<Value> {
        let mut source = Configuration::from_snapshot(section_snapshot(raw)?)
            .with_serialization(serialization.clone());
        let mut section = S::default();
        let mut target = Configuration::in_memory().with_serialization(serialization.clone());
        let loaded = load_section(&mut source, &mut section)
            .and_then(|()| save_section(&mut target, &section));
        match loaded {
            Ok(()) => Some(target.dump()),
            Err(err) => {
                log::warn!("could not read section {}: {err}", S::NAME);
                None
            }
        }
    }
}

impl SectionType {
    /// The section type for `S`.
    #[must_use]
    pub fn of<S: Section>() -> Self {
        Self::new(Arc::new(SchemaOf::<S>(PhantomData)))
    }
}

/// A section stored as a nested mapping inside another section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Nested<S>(pub S);

impl<S: Section> Setting for Nested<S> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::class(MainType::Section(SectionType::of::<S>()))
    }

    fn from_value(value: Value) -> Option<Self> {
        let mut config = Configuration::from_snapshot(section_snapshot(&value)?);
        let mut section = S::default();
        load_section(&mut config, &mut section).ok()?;
        Some(Self(section))
    }

    fn into_value(self) -> Value {
        let mut config = Configuration::in_memory();
        if let Err(err) = save_section(&mut config, &self.0) {
            log::warn!("could not write section {}: {err}", S::NAME);
        }
        config.dump()
    }
}

/// A configuration together with the section bound to its root.
#[derive(Debug)]
pub struct SectionConfiguration<S> {
    configuration: Configuration,
    section: S,
    configured: bool,
}

impl<S: Section> SectionConfiguration<S> {
    /// Binds `section` to `configuration`. Nothing is read yet.
    pub fn new(configuration: Configuration, section: S) -> Self {
        Self {
            configuration,
            section,
            configured: false,
        }
    }

    /// Reloads the configuration and then the section from it.
    ///
    /// # Errors
    ///
    /// Returns the source's error or a path error from a binding.
    pub fn load(&mut self) -> Result<()> {
        self.configuration.load()?;
        load_section(&mut self.configuration, &mut self.section)?;
        self.configured = true;
        Ok(())
    }

    /// Writes the section into the configuration and saves it.
    ///
    /// # Errors
    ///
    /// Returns a path error from a binding or the source's error.
    pub fn save(&mut self) -> Result<()> {
        save_section(&mut self.configuration, &self.section)?;
        self.configuration.save()
    }

    /// Whether a load has completed.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.configured
    }

    /// The bound section.
    #[must_use]
    pub const fn section(&self) -> &S {
        &self.section
    }

    /// The bound section, mutably.
    pub fn section_mut(&mut self) -> &mut S {
        &mut self.section
    }

    /// The underlying configuration.
    pub fn configuration(&mut self) -> &mut Configuration {
        &mut self.configuration
    }
}
