#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # arbor
//!
//! A hierarchical, typed configuration tree.
//!
//! A [`Configuration`] holds a tree of nodes loaded from a [`Source`] (an
//! in-memory map or a YAML file). Nodes are addressed by separator-joined
//! paths, read through loose coercions or through a [`Serialization`]
//! registry that converts raw values into described types, and written back
//! with defaults filled in as they are read.
//!
//! ## Core Types
//!
//! - [`Configuration`] and [`Node`]: the tree and a cursor into it
//! - [`ValueHolder`]: typed accessors shared by nodes and holders
//! - [`Serialization`] and [`Serializer`]: type-directed conversion
//! - [`TypeDescriptor`] and [`Setting`]: describing target types
//! - [`ConfigurationHolder`]: a defaulted handle onto one path
//! - [`Section`]: a struct bound field by field to a subtree
//! - [`Migrator`]: moving values when the layout changes
//!
//! ## Examples
//!
//! ```
//! use arbor::{Configuration, ValueHolder, Value, YamlSource};
//!
//! let source = YamlSource::from_text("server:\n  port: '8080'\n  hosts: [a, b]\n");
//! let mut config = Configuration::new(source);
//! config.load().unwrap();
//!
//! let mut port = config.get_node("server.port").unwrap();
//! assert_eq!(port.get_int(0), 8080);
//!
//! let hosts: Option<Vec<String>> = config.get_node("server.hosts").unwrap().get_typed();
//! assert_eq!(hosts.unwrap(), ["a", "b"]);
//!
//! assert_eq!(
//!     config.get_keys(true),
//!     ["server", "server.port", "server.hosts", "server.hosts.0", "server.hosts.1"]
//! );
//! assert_eq!(config.get_node("missing").unwrap().value(), Value::Null);
//! ```

pub mod coerce;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod logging;
pub mod migration;
pub mod section;
pub mod serialization;
pub mod setting;
pub mod value;

// Re-export key types at crate root for convenience
pub use config::{
    Configuration, ConfigurationHolder, HolderSet, MapSource, Node, NodeId, Parent, Shape,
    SharedConfiguration, Source, ValueHolder, YamlSource, DEFAULT_SEPARATOR,
};
pub use descriptor::{EnumType, MainType, SectionType, TypeDescriptor};
pub use error::{Error, Result};
pub use logging::{init_logger, LogLevel, Logger};
pub use migration::{MigrationAction, Migrator, NewJoinedKey, NewKey};
pub use section::{
    load_section, save_section, Binding, Nested, Section, SectionConfiguration, SectionSchema,
};
pub use serialization::{Serialization, Serializer};
pub use setting::Setting;
pub use value::{Snapshot, Value};
