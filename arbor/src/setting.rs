//! The bridge between Rust types and descriptor-driven values.
//!
//! A [`Setting`] knows its own [`TypeDescriptor`] and how to move between
//! itself and the canonical [`Value`] the serializers produce for that
//! descriptor. This is what lets `get_typed::<Vec<i32>>()` dispatch through
//! the list serializer with an `i32` element type without any runtime
//! reflection.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use bigdecimal::num_bigint::BigInt;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::coerce::coerce;
use crate::descriptor::{MainType, TypeDescriptor};
use crate::value::Value;

/// A type that can be read from and written to a configuration node.
///
/// # Examples
///
/// ```
/// use arbor::{MainType, Setting, TypeDescriptor, Value};
///
/// assert_eq!(<Vec<i32>>::descriptor(), "list<i32>".parse().unwrap());
/// assert_eq!(<Vec<i32>>::from_value(Value::list([1, 2])), Some(vec![1, 2]));
/// assert_eq!(7_i64.into_value(), Value::I64(7));
/// ```
pub trait Setting: Sized {
    /// The descriptor serializers dispatch on.
    fn descriptor() -> TypeDescriptor;

    /// Converts a value into `Self`, or `None` on a miss.
    fn from_value(value: Value) -> Option<Self>;

    /// Converts `self` into its canonical value.
    fn into_value(self) -> Value;
}

macro_rules! scalar_setting {
    ($($ty:ty => $main:ident),* $(,)?) => {
        $(
            impl Setting for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::class(MainType::$main)
                }

                fn from_value(value: Value) -> Option<Self> {
                    coerce(&value)
                }

                fn into_value(self) -> Value {
                    Value::from(self)
                }
            }
        )*
    };
}

scalar_setting! {
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
}

impl Setting for Value {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::class(MainType::Any)
    }

    fn from_value(value: Value) -> Option<Self> {
        (!value.is_null()).then_some(value)
    }

    fn into_value(self) -> Value {
        self
    }
}

impl Setting for Box<[u8]> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::array(TypeDescriptor::class(MainType::I8))
    }

    fn from_value(value: Value) -> Option<Self> {
        coerce::<Vec<u8>>(&value).map(Vec::into_boxed_slice)
    }

    fn into_value(self) -> Value {
        Value::Bytes(self.into_vec())
    }
}

impl<T: Setting> Setting for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::list_of(T::descriptor())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(Setting::into_value).collect())
    }
}

macro_rules! set_setting {
    ($set:ident, $($bound:path),+) => {
        impl<T: Setting $(+ $bound)+> Setting for $set<T> {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::set_of(T::descriptor())
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::List(items) => items.into_iter().map(T::from_value).collect(),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                Value::List(self.into_iter().map(Setting::into_value).collect())
            }
        }
    };
}

set_setting!(HashSet, Eq, Hash);
set_setting!(BTreeSet, Ord);

macro_rules! map_setting {
    ($map:ident, $($bound:path),+) => {
        impl<K: Setting $(+ $bound)+, V: Setting> Setting for $map<K, V> {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::map_of(K::descriptor(), V::descriptor())
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::Map(entries) => entries
                        .into_iter()
                        .map(|(k, v)| Some((K::from_value(Value::String(k))?, V::from_value(v)?)))
                        .collect(),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                Value::Map(
                    self.into_iter()
                        .map(|(k, v)| (k.into_value().to_string(), v.into_value()))
                        .collect(),
                )
            }
        }
    };
}

map_setting!(HashMap, Eq, Hash);
map_setting!(BTreeMap, Ord);
map_setting!(IndexMap, Eq, Hash);

/// Declares a plain enum together with its [`Setting`] implementation.
///
/// Constants are matched case-sensitively against their variant names.
///
/// # Examples
///
/// ```
/// use arbor::{setting_enum, Setting, Value};
///
/// setting_enum! {
///     #[derive(Debug, PartialEq)]
///     pub enum Mode { Fast, Slow }
/// }
///
/// assert_eq!(Mode::from_value(Value::from("Slow")), Some(Mode::Slow));
/// assert_eq!(Mode::from_value(Value::from("slow")), None);
/// assert_eq!(Mode::Fast.into_value(), Value::from("Fast"));
/// ```
#[macro_export]
macro_rules! setting_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        $vis enum $name {
            $($variant),+
        }

        impl $crate::Setting for $name {
            fn descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::class($crate::MainType::Enum($crate::EnumType::new(
                    stringify!($name),
                    [$(stringify!($variant)),+],
                )))
            }

            fn from_value(value: $crate::Value) -> Option<Self> {
                match value.as_str()? {
                    $(stringify!($variant) => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn into_value(self) -> $crate::Value {
                $crate::Value::from(match self {
                    $(Self::$variant => stringify!($variant),)+
                })
            }
        }
    };
}
