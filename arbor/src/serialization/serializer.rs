//! The serializer plug-in contract.

use crate::descriptor::TypeDescriptor;
use crate::value::Value;

use super::Serialization;

/// How many type parameters a serializer expects on its descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameters {
    /// Any number, including none.
    Any,
    /// Exactly this many.
    Exactly(usize),
}

impl Parameters {
    /// Returns `true` if a descriptor with `count` parameters is acceptable.
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Any => true,
            Self::Exactly(n) => n == count,
        }
    }
}

/// A converter between raw values and the canonical value of a descriptor.
///
/// Dispatch checks, in order: null handling, [`Serializer::is_applicable`]
/// and the direction-specific applicability hook, then the parameter count.
/// Only serializers that pass all three are asked to convert.
///
/// Nested conversions, such as list elements, go back through the
/// [`Serialization`] handed to each handler.
///
/// # Examples
///
/// ```
/// use arbor::serialization::{Parameters, Serialization, Serializer};
/// use arbor::{MainType, TypeDescriptor, Value};
///
/// /// Reads "on"/"off" as booleans.
/// struct Switch;
///
/// impl Serializer for Switch {
///     fn name(&self) -> &'static str {
///         "switch"
///     }
///
///     fn parameters(&self) -> Parameters {
///         Parameters::Exactly(0)
///     }
///
///     fn is_applicable(&self, ty: &TypeDescriptor) -> bool {
///         *ty == TypeDescriptor::class(MainType::Bool)
///     }
///
///     fn is_applicable_deserialize(&self, ty: &TypeDescriptor, value: &Value) -> bool {
///         self.is_applicable(ty) && matches!(value.as_str(), Some("on" | "off"))
///     }
///
///     fn deserialize(
///         &self,
///         _: &Serialization,
///         _: &TypeDescriptor,
///         value: &Value,
///     ) -> Option<Value> {
///         Some(Value::Bool(value.as_str()? == "on"))
///     }
/// }
///
/// let serialization = Serialization::empty();
/// serialization.register(Switch);
/// let ty = TypeDescriptor::class(MainType::Bool);
/// assert_eq!(serialization.deserialize(&ty, &Value::from("on")), Some(Value::Bool(true)));
/// ```
pub trait Serializer: Send + Sync {
    /// A short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this serializer wants to see null values.
    fn allows_null(&self) -> bool {
        false
    }

    /// How many type parameters the descriptor must carry.
    fn parameters(&self) -> Parameters;

    /// Whether this serializer handles the descriptor at all.
    fn is_applicable(&self, ty: &TypeDescriptor) -> bool;

    /// Value-level check for reads. Defaults to [`Serializer::is_applicable`].
    fn is_applicable_deserialize(&self, ty: &TypeDescriptor, _value: &Value) -> bool {
        self.is_applicable(ty)
    }

    /// Value-level check for writes. Defaults to [`Serializer::is_applicable`].
    fn is_applicable_serialize(&self, ty: &TypeDescriptor, _value: &Value) -> bool {
        self.is_applicable(ty)
    }

    /// Converts a raw value into the canonical value for `ty`.
    fn deserialize(
        &self,
        serialization: &Serialization,
        ty: &TypeDescriptor,
        value: &Value,
    ) -> Option<Value>;

    /// Converts a typed value into its storable form. The identity by default.
    fn serialize(
        &self,
        _serialization: &Serialization,
        _ty: &TypeDescriptor,
        value: &Value,
    ) -> Option<Value> {
        Some(value.clone())
    }
}

/// Which side of the conversion a dispatch is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Deserialize,
    Serialize,
}

/// Runs the full applicability filter for one serializer.
pub(crate) fn survives(
    serializer: &dyn Serializer,
    direction: Direction,
    ty: &TypeDescriptor,
    value: &Value,
) -> bool {
    if value.is_null() && !serializer.allows_null() {
        return false;
    }
    let applicable = match direction {
        Direction::Deserialize => serializer.is_applicable_deserialize(ty, value),
        Direction::Serialize => serializer.is_applicable_serialize(ty, value),
    };
    applicable && serializer.parameters().accepts(ty.type_parameters().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_counts() {
        assert!(Parameters::Any.accepts(0));
        assert!(Parameters::Any.accepts(3));
        assert!(Parameters::Exactly(1).accepts(1));
        assert!(!Parameters::Exactly(1).accepts(2));
    }
}
