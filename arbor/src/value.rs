//! The dynamic value model shared by nodes, sources and serializers.
//!
//! A [`Value`] is a closed tagged union: every shape a configuration snapshot
//! can carry has exactly one variant. Maps keep insertion order and are keyed
//! by strings, the way every text format stores them.

use std::fmt;

use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};

/// A fully materialized, ordered mapping of top-level names to values.
///
/// This is what sources hand to [`Configuration::load`](crate::Configuration::load)
/// and receive back from [`Configuration::save`](crate::Configuration::save).
pub type Snapshot = IndexMap<String, Value>;

/// A raw configuration value.
///
/// # Examples
///
/// ```
/// use arbor::Value;
///
/// let v = Value::from(42);
/// assert_eq!(v, Value::I32(42));
/// assert!(v.is_number());
/// assert_eq!(v.to_string(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// An 8-bit integer.
    I8(i8),
    /// A 16-bit integer.
    I16(i16),
    /// A 32-bit integer.
    I32(i32),
    /// A 64-bit integer.
    I64(i64),
    /// A 32-bit float.
    F32(f32),
    /// A 64-bit float.
    F64(f64),
    /// An arbitrary-precision integer.
    BigInt(BigInt),
    /// An arbitrary-precision decimal.
    Decimal(BigDecimal),
    /// A string.
    String(String),
    /// A point in time.
    Date(DateTime<Utc>),
    /// A raw byte sequence.
    Bytes(Vec<u8>),
    /// An ordered sequence.
    List(Vec<Value>),
    /// A string-keyed mapping.
    Map(Snapshot),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for every numeric variant.
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(
            self,
            Self::I8(_)
                | Self::I16(_)
                | Self::I32(_)
                | Self::I64(_)
                | Self::F32(_)
                | Self::F64(_)
                | Self::BigInt(_)
                | Self::Decimal(_)
        )
    }

    /// Returns `true` for anything that is neither a list nor a map.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        !matches!(self, Self::List(_) | Self::Map(_))
    }

    /// A short name for the variant, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::BigInt(_) => "bigint",
            Self::Decimal(_) => "decimal",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Borrows the string, if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrows the elements, if this is a [`Value::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrows the entries, if this is a [`Value::Map`].
    #[must_use]
    pub fn as_map(&self) -> Option<&Snapshot> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Collects anything convertible into a [`Value::List`].
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Collects key/value pairs into a [`Value::Map`].
    pub fn map<I, K, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<Value>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::I8(n) => write!(f, "{n}"),
            Self::I16(n) => write!(f, "{n}"),
            Self::I32(n) => write!(f, "{n}"),
            Self::I64(n) => write!(f, "{n}"),
            Self::F32(n) => write!(f, "{n}"),
            Self::F64(n) => write!(f, "{n}"),
            Self::BigInt(n) => write!(f, "{n}"),
            Self::Decimal(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::Date(d) => f.write_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Bytes(bytes) => f.write_str(&hex::encode(bytes)),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    BigInt => BigInt,
    BigDecimal => Decimal,
    String => String,
    DateTime<Utc> => Date,
    Vec<Value> => List,
    Snapshot => Map,
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Self::I16(i16::from(v))
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Self::I32(i32::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::I64(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<Box<[u8]>> for Value {
    fn from(v: Box<[u8]>) -> Self {
        Self::Bytes(v.into_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::I8(n) => serializer.serialize_i8(*n),
            Self::I16(n) => serializer.serialize_i16(*n),
            Self::I32(n) => serializer.serialize_i32(*n),
            Self::I64(n) => serializer.serialize_i64(*n),
            Self::F32(n) => serializer.serialize_f32(*n),
            Self::F64(n) => serializer.serialize_f64(*n),
            Self::BigInt(n) => match n.to_i64() {
                Some(small) => serializer.serialize_i64(small),
                None => serializer.serialize_str(&n.to_string()),
            },
            Self::Decimal(n) => serializer.serialize_str(&n.to_string()),
            Self::String(s) => serializer.serialize_str(s),
            Self::Date(_) => serializer.serialize_str(&self.to_string()),
            Self::Bytes(bytes) => serializer.collect_seq(bytes),
            Self::List(items) => serializer.collect_seq(items),
            Self::Map(map) => serializer.collect_map(map),
        }
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(raw: serde_yaml::Value) -> Self {
        use serde_yaml::Value as Yaml;

        match raw {
            Yaml::Null => Self::Null,
            Yaml::Bool(b) => Self::Bool(b),
            Yaml::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i32::try_from(i).map_or(Self::I64(i), Self::I32)
                } else if let Some(u) = n.as_u64() {
                    Self::BigInt(BigInt::from(u))
                } else {
                    Self::F64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Yaml::String(s) => Self::String(s),
            Yaml::Sequence(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Yaml::Mapping(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (yaml_key(k), Self::from(v)))
                    .collect(),
            ),
            Yaml::Tagged(tagged) => match tagged.value {
                Yaml::String(text) if is_bytes_tag(&tagged.tag) => match hex::decode(&text) {
                    Ok(bytes) => Self::Bytes(bytes),
                    Err(_) => Self::String(text),
                },
                other => Self::from(other),
            },
        }
    }
}

/// Tag marking a hex-encoded byte sequence in YAML documents.
pub(crate) const BYTES_TAG: &str = "bytes";

fn is_bytes_tag(tag: &serde_yaml::value::Tag) -> bool {
    tag.to_string().trim_start_matches('!') == BYTES_TAG
}

/// Renders a YAML mapping key as a string; non-string keys keep their
/// scalar text.
fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        other => Value::from(other).to_string(),
    }
}
