//! Typed accessors over anything that yields a raw value.
//!
//! Every accessor answers with a value, never an error: a missing or
//! unconvertible value falls back to the caller's default (or an empty
//! collection, or `None`). Accessors that take a default pass it through
//! [`ValueHolder::value_or`], so with default-writing enabled the default
//! ends up stored in the tree.

use crate::coerce::{coerce, Coerce};
use crate::descriptor::TypeDescriptor;
use crate::serialization::Serialization;
use crate::setting::Setting;
use crate::value::Value;

/// Something with a current value.
///
/// Implementors provide the three required methods; the rest are derived.
///
/// # Examples
///
/// ```
/// use arbor::{Configuration, ValueHolder, Value};
///
/// let mut config = Configuration::in_memory();
/// config.set("ports", Value::list(["80", "443", "x"])).unwrap();
/// config.set("name", 42).unwrap();
///
/// let mut ports = config.get_node("ports").unwrap();
/// assert_eq!(ports.get_typed::<Vec<i32>>(), None);
/// assert_eq!(ports.get_int_list(), Vec::<i32>::new());
///
/// let mut name = config.get_node("name").unwrap();
/// assert_eq!(name.get_string().as_deref(), Some("42"));
/// assert!(name.get_bool(true));
/// ```
pub trait ValueHolder {
    /// The raw value, or null.
    fn value(&mut self) -> Value;

    /// The raw value, or `default` when there is none.
    fn value_or(&mut self, default: Value) -> Value;

    /// The registry typed reads go through.
    fn serialization(&self) -> Serialization;

    /// The value coerced into `T`.
    fn get_as<T: Coerce>(&mut self) -> Option<T> {
        coerce(&self.value())
    }

    /// The value coerced into `T`, or `default`.
    fn get_or<T: Coerce + Into<Value> + Clone>(&mut self, default: T) -> T {
        coerce(&self.value_or(default.clone().into())).unwrap_or(default)
    }

    /// The value as a boolean, or `default`.
    fn get_bool(&mut self, default: bool) -> bool {
        self.get_or(default)
    }

    /// The value as a 32-bit integer, or `default`.
    fn get_int(&mut self, default: i32) -> i32 {
        self.get_or(default)
    }

    /// The value as a 64-bit integer, or `default`.
    fn get_long(&mut self, default: i64) -> i64 {
        self.get_or(default)
    }

    /// The value as a 64-bit float, or `default`.
    fn get_double(&mut self, default: f64) -> f64 {
        self.get_or(default)
    }

    /// The value rendered as text, if there is one.
    fn get_string(&mut self) -> Option<String> {
        self.get_as()
    }

    /// The value rendered as text, or `default`.
    fn get_string_or(&mut self, default: &str) -> String {
        self.get_or(default.to_string())
    }

    /// The value's elements if it is a list, otherwise empty.
    fn get_list(&mut self) -> Vec<Value> {
        match self.value() {
            Value::List(items) => items,
            _ => Vec::new(),
        }
    }

    /// The value's elements if it is a list, otherwise `default`.
    fn get_list_or(&mut self, default: Vec<Value>) -> Vec<Value> {
        match self.value_or(Value::List(default.clone())) {
            Value::List(items) => items,
            _ => default,
        }
    }

    /// Every element coerced into `T`, or `None` if any element misses.
    fn get_list_of<T: Coerce>(&mut self) -> Option<Vec<T>> {
        match self.value() {
            Value::List(items) => items.iter().map(coerce).collect(),
            _ => None,
        }
    }

    /// The elements as text; empty if the value is not a list or an element
    /// is null.
    fn get_string_list(&mut self) -> Vec<String> {
        self.get_list_of().unwrap_or_default()
    }

    /// The elements as 32-bit integers; empty if any element misses.
    fn get_int_list(&mut self) -> Vec<i32> {
        self.get_list_of().unwrap_or_default()
    }

    /// The elements as 64-bit integers; empty if any element misses.
    fn get_long_list(&mut self) -> Vec<i64> {
        self.get_list_of().unwrap_or_default()
    }

    /// The elements as 64-bit floats; empty if any element misses.
    fn get_double_list(&mut self) -> Vec<f64> {
        self.get_list_of().unwrap_or_default()
    }

    /// The elements as booleans; empty if any element misses.
    fn get_bool_list(&mut self) -> Vec<bool> {
        self.get_list_of().unwrap_or_default()
    }

    /// The value deserialized as `ty`.
    ///
    /// `None` means either that nothing applies to `ty` or that the value
    /// did not convert; the two are not distinguished.
    fn get_typed_value(&mut self, ty: &TypeDescriptor) -> Option<Value> {
        let raw = self.value();
        self.serialization().deserialize(ty, &raw)
    }

    /// The value deserialized as `ty`, or `default`. The default is not
    /// written back.
    fn get_typed_value_or(&mut self, ty: &TypeDescriptor, default: Value) -> Value {
        self.get_typed_value(ty).unwrap_or(default)
    }

    /// The value as a typed setting.
    fn get_typed<T: Setting>(&mut self) -> Option<T> {
        self.get_typed_value(&T::descriptor())
            .and_then(T::from_value)
    }

    /// The value as a typed setting, or `default`.
    fn get_typed_or<T: Setting>(&mut self, default: T) -> T {
        self.get_typed().unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A free-standing holder for exercising the provided methods.
    struct Fixed {
        value: Value,
        written: Option<Value>,
    }

    impl Fixed {
        fn new(value: impl Into<Value>) -> Self {
            Self {
                value: value.into(),
                written: None,
            }
        }
    }

    impl ValueHolder for Fixed {
        fn value(&mut self) -> Value {
            self.value.clone()
        }

        fn value_or(&mut self, default: Value) -> Value {
            if self.value.is_null() {
                self.written = Some(default.clone());
                default
            } else {
                self.value.clone()
            }
        }

        fn serialization(&self) -> Serialization {
            Serialization::new()
        }
    }

    #[test]
    fn test_primitive_accessors() {
        assert_eq!(Fixed::new("12").get_int(0), 12);
        assert_eq!(Fixed::new("x").get_int(7), 7);
        assert_eq!(Fixed::new(3.9).get_long(0), 3);
        assert!((Fixed::new("1.5").get_double(0.0) - 1.5).abs() < f64::EPSILON);
        assert!(!Fixed::new("notabool").get_bool(false));
        assert_eq!(Fixed::new(Value::Null).get_string(), None);
        assert_eq!(Fixed::new(Value::Null).get_string_or("dflt"), "dflt");
    }

    #[test]
    fn test_default_is_offered_for_writing() {
        let mut holder = Fixed::new(Value::Null);
        assert_eq!(holder.get_int(9), 9);
        assert_eq!(holder.written, Some(Value::I32(9)));
    }

    #[test]
    fn test_lists() {
        let mut holder = Fixed::new(Value::list(["1", "2"]));
        assert_eq!(holder.get_int_list(), [1, 2]);
        assert_eq!(holder.get_string_list(), ["1", "2"]);
        assert!(holder.get_bool_list().is_empty());
        assert_eq!(holder.get_list().len(), 2);

        let mut scalar = Fixed::new(1);
        assert!(scalar.get_list().is_empty());
        assert_eq!(scalar.get_list_or(vec![Value::from(0)]), [Value::from(0)]);
    }

    #[test]
    fn test_typed_reads() {
        let mut holder = Fixed::new(Value::list(["1", "2"]));
        assert_eq!(holder.get_typed::<Vec<i64>>(), Some(vec![1, 2]));
        assert_eq!(holder.get_typed::<Vec<bool>>(), None);
        assert_eq!(holder.get_typed_or::<Vec<bool>>(vec![true]), vec![true]);

        let ty: TypeDescriptor = "i32".parse().unwrap();
        let mut missing = Fixed::new(Value::Null);
        assert_eq!(missing.get_typed_value_or(&ty, Value::from(4)), Value::I32(4));
        assert_eq!(missing.written, None);
    }
}
