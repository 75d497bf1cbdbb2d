//! The serializers every registry starts with.
//!
//! They are registered in this order, and the first applicable one wins:
//! same-type passthrough, string, boolean, number, enum, date, byte array,
//! nested section, set, list, map.

use bigdecimal::num_bigint::BigInt;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use crate::coerce::coerce;
use crate::descriptor::{MainType, TypeDescriptor};
use crate::value::Value;

use super::{Parameters, Serialization, Serializer};

/// The default serializers, in dispatch order.
pub(crate) fn defaults() -> Vec<Box<dyn Serializer>> {
    vec![
        Box::new(SameSerializer),
        Box::new(StringSerializer),
        Box::new(BoolSerializer),
        Box::new(NumberSerializer),
        Box::new(EnumSerializer),
        Box::new(DateSerializer),
        Box::new(ByteArraySerializer),
        Box::new(SectionSerializer),
        Box::new(SetSerializer),
        Box::new(ListSerializer),
        Box::new(MapSerializer),
    ]
}

fn main_is(ty: &TypeDescriptor, f: impl FnOnce(&MainType) -> bool) -> bool {
    ty.main_type().is_some_and(f)
}

/// Passes values through untouched when they already have the requested type.
pub struct SameSerializer;

impl SameSerializer {
    fn matches(main: &MainType, value: &Value) -> bool {
        match main {
            MainType::Any => true,
            MainType::Number => value.is_number(),
            MainType::Bool => matches!(value, Value::Bool(_)),
            MainType::I8 => matches!(value, Value::I8(_)),
            MainType::I16 => matches!(value, Value::I16(_)),
            MainType::I32 => matches!(value, Value::I32(_)),
            MainType::I64 => matches!(value, Value::I64(_)),
            MainType::F32 => matches!(value, Value::F32(_)),
            MainType::F64 => matches!(value, Value::F64(_)),
            MainType::BigInt => matches!(value, Value::BigInt(_)),
            MainType::Decimal => matches!(value, Value::Decimal(_)),
            MainType::String => matches!(value, Value::String(_)),
            MainType::Date => matches!(value, Value::Date(_)),
            MainType::List => matches!(value, Value::List(_)),
            MainType::Map => matches!(value, Value::Map(_)),
            MainType::Set | MainType::Enum(_) | MainType::Section(_) => false,
        }
    }
}

impl Serializer for SameSerializer {
    fn name(&self) -> &'static str {
        "same"
    }

    fn parameters(&self) -> Parameters {
        Parameters::Exactly(0)
    }

    fn is_applicable(&self, ty: &TypeDescriptor) -> bool {
        ty.main_type().is_some()
    }

    fn is_applicable_deserialize(&self, ty: &TypeDescriptor, value: &Value) -> bool {
        main_is(ty, |main| Self::matches(main, value))
    }

    fn is_applicable_serialize(&self, ty: &TypeDescriptor, value: &Value) -> bool {
        main_is(ty, |main| Self::matches(main, value))
    }

    fn deserialize(&self, _: &Serialization, _: &TypeDescriptor, value: &Value) -> Option<Value> {
        Some(value.clone())
    }
}

/// Renders any scalar as text.
pub struct StringSerializer;

impl Serializer for StringSerializer {
    fn name(&self) -> &'static str {
        "string"
    }

    fn parameters(&self) -> Parameters {
        Parameters::Exactly(0)
    }

    fn is_applicable(&self, ty: &TypeDescriptor) -> bool {
        main_is(ty, |main| *main == MainType::String)
    }

    fn is_applicable_deserialize(&self, ty: &TypeDescriptor, value: &Value) -> bool {
        self.is_applicable(ty) && value.is_scalar() && !matches!(value, Value::Bytes(_))
    }

    fn deserialize(&self, _: &Serialization, _: &TypeDescriptor, value: &Value) -> Option<Value> {
        coerce::<String>(value).map(Value::String)
    }
}

/// Booleans from booleans or the literals `true`/`false`.
pub struct BoolSerializer;

impl Serializer for BoolSerializer {
    fn name(&self) -> &'static str {
        "boolean"
    }

    fn parameters(&self) -> Parameters {
        Parameters::Exactly(0)
    }

    fn is_applicable(&self, ty: &TypeDescriptor) -> bool {
        main_is(ty, |main| *main == MainType::Bool)
    }

    fn deserialize(&self, _: &Serialization, _: &TypeDescriptor, value: &Value) -> Option<Value> {
        coerce::<bool>(value).map(Value::Bool)
    }
}

/// Every numeric width, with narrowing and text parsing.
pub struct NumberSerializer;

impl NumberSerializer {
    fn any_number(value: &Value) -> Option<Value> {
        if value.is_number() {
            return Some(value.clone());
        }
        let text = coerce::<String>(value)?;
        let text = text.trim();
        text.parse::<i64>()
            .map(Value::I64)
            .or_else(|_| text.parse::<f64>().map(Value::F64))
            .ok()
    }
}

impl Serializer for NumberSerializer {
    fn name(&self) -> &'static str {
        "number"
    }

    fn parameters(&self) -> Parameters {
        Parameters::Exactly(0)
    }

    fn is_applicable(&self, ty: &TypeDescriptor) -> bool {
        main_is(ty, MainType::is_numeric)
    }

    fn deserialize(&self, _: &Serialization, ty: &TypeDescriptor, value: &Value) -> Option<Value> {
        match ty.main_type()? {
            MainType::I8 => coerce::<i8>(value).map(Value::I8),
            MainType::I16 => coerce::<i16>(value).map(Value::I16),
            MainType::I32 => coerce::<i32>(value).map(Value::I32),
            MainType::I64 => coerce::<i64>(value).map(Value::I64),
            MainType::F32 => coerce::<f32>(value).map(Value::F32),
            MainType::F64 => coerce::<f64>(value).map(Value::F64),
            MainType::BigInt => coerce::<BigInt>(value).map(Value::BigInt),
            MainType::Decimal => coerce::<BigDecimal>(value).map(Value::Decimal),
            MainType::Number => Self::any_number(value),
            _ => None,
        }
    }
}

/// Enum constants, matched case-sensitively by name.
pub struct EnumSerializer;

impl EnumSerializer {
    fn is_constant(ty: &TypeDescriptor, value: &Value) -> bool {
        match (ty.main_type(), value.as_str()) {
            (Some(MainType::Enum(e)), Some(name)) => e.contains(name),
            _ => false,
        }
    }
}

impl Serializer for EnumSerializer {
    fn name(&self) -> &'static str {
        "enum"
    }

    fn parameters(&self) -> Parameters {
        Parameters::Exactly(0)
    }

    fn is_applicable(&self, ty: &TypeDescriptor) -> bool {
        main_is(ty, |main| matches!(main, MainType::Enum(_)))
    }

    fn is_applicable_deserialize(&self, ty: &TypeDescriptor, value: &Value) -> bool {
        Self::is_constant(ty, value)
    }

    fn is_applicable_serialize(&self, ty: &TypeDescriptor, value: &Value) -> bool {
        Self::is_constant(ty, value)
    }

    fn deserialize(&self, _: &Serialization, _: &TypeDescriptor, value: &Value) -> Option<Value> {
        Some(value.clone())
    }
}

/// Dates from epoch milliseconds or text.
pub struct DateSerializer;

impl Serializer for DateSerializer {
    fn name(&self) -> &'static str {
        "date"
    }

    fn parameters(&self) -> Parameters {
        Parameters::Exactly(0)
    }

    fn is_applicable(&self, ty: &TypeDescriptor) -> bool {
        main_is(ty, |main| *main == MainType::Date)
    }

    fn deserialize(&self, _: &Serialization, _: &TypeDescriptor, value: &Value) -> Option<Value> {
        coerce::<DateTime<Utc>>(value).map(Value::Date)
    }
}

/// Raw byte arrays.
pub struct ByteArraySerializer;

impl Serializer for ByteArraySerializer {
    fn name(&self) -> &'static str {
        "byte array"
    }

    fn parameters(&self) -> Parameters {
        Parameters::Any
    }

    fn is_applicable(&self, ty: &TypeDescriptor) -> bool {
        ty.element_type()
            .is_some_and(|element| *element == TypeDescriptor::class(MainType::I8))
    }

    fn deserialize(&self, _: &Serialization, _: &TypeDescriptor, value: &Value) -> Option<Value> {
        coerce::<Vec<u8>>(value).map(Value::Bytes)
    }
}

/// Nested sections, materialized from a mapping or from nothing at all.
pub struct SectionSerializer;

impl Serializer for SectionSerializer {
    fn name(&self) -> &'static str {
        "section"
    }

    fn allows_null(&self) -> bool {
        true
    }

    fn parameters(&self) -> Parameters {
        Parameters::Any
    }

    fn is_applicable(&self, ty: &TypeDescriptor) -> bool {
        main_is(ty, |main| matches!(main, MainType::Section(_)))
    }

    fn is_applicable_deserialize(&self, ty: &TypeDescriptor, value: &Value) -> bool {
        self.is_applicable(ty) && matches!(value, Value::Null | Value::Map(_))
    }

    fn is_applicable_serialize(&self, ty: &TypeDescriptor, value: &Value) -> bool {
        self.is_applicable(ty) && matches!(value, Value::Map(_))
    }

    fn deserialize(
        &self,
        serialization: &Serialization,
        ty: &TypeDescriptor,
        value: &Value,
    ) -> Option<Value> {
        match ty.main_type()? {
            MainType::Section(section) => section.schema().normalize(serialization, value),
            _ => None,
        }
    }

    fn serialize(
        &self,
        serialization: &Serialization,
        ty: &TypeDescriptor,
        value: &Value,
    ) -> Option<Value> {
        self.deserialize(serialization, ty, value)
    }
}

fn elements(
    serialization: &Serialization,
    element: &TypeDescriptor,
    items: &[Value],
    unique: bool,
) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        let converted = serialization
            .deserialize(element, item)
            .unwrap_or(Value::Null);
        if !unique || !out.contains(&converted) {
            out.push(converted);
        }
    }
    out
}

fn serialize_elements(
    serialization: &Serialization,
    element: &TypeDescriptor,
    items: &[Value],
    unique: bool,
) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        let converted = serialization.serialize(element, item);
        if !unique || !out.contains(&converted) {
            out.push(converted);
        }
    }
    out
}

/// Sets of one element type; duplicates keep their first position.
pub struct SetSerializer;

impl Serializer for SetSerializer {
    fn name(&self) -> &'static str {
        "set"
    }

    fn parameters(&self) -> Parameters {
        Parameters::Exactly(1)
    }

    fn is_applicable(&self, ty: &TypeDescriptor) -> bool {
        main_is(ty, |main| *main == MainType::Set)
    }

    fn is_applicable_deserialize(&self, ty: &TypeDescriptor, value: &Value) -> bool {
        self.is_applicable(ty) && matches!(value, Value::List(_))
    }

    fn is_applicable_serialize(&self, ty: &TypeDescriptor, value: &Value) -> bool {
        self.is_applicable(ty) && matches!(value, Value::List(_))
    }

    fn deserialize(
        &self,
        serialization: &Serialization,
        ty: &TypeDescriptor,
        value: &Value,
    ) -> Option<Value> {
        let element = ty.type_parameters().first()?;
        Some(Value::List(elements(serialization, element, value.as_list()?, true)))
    }

    fn serialize(
        &self,
        serialization: &Serialization,
        ty: &TypeDescriptor,
        value: &Value,
    ) -> Option<Value> {
        let element = ty.type_parameters().first()?;
        Some(Value::List(serialize_elements(
            serialization,
            element,
            value.as_list()?,
            true,
        )))
    }
}

/// Lists of one element type. Elements that fail to convert become null.
pub struct ListSerializer;

impl Serializer for ListSerializer {
    fn name(&self) -> &'static str {
        "list"
    }

    fn parameters(&self) -> Parameters {
        Parameters::Exactly(1)
    }

    fn is_applicable(&self, ty: &TypeDescriptor) -> bool {
        main_is(ty, |main| *main == MainType::List)
    }

    fn is_applicable_deserialize(&self, ty: &TypeDescriptor, value: &Value) -> bool {
        self.is_applicable(ty) && matches!(value, Value::List(_))
    }

    fn is_applicable_serialize(&self, ty: &TypeDescriptor, value: &Value) -> bool {
        self.is_applicable(ty) && matches!(value, Value::List(_))
    }

    fn deserialize(
        &self,
        serialization: &Serialization,
        ty: &TypeDescriptor,
        value: &Value,
    ) -> Option<Value> {
        let element = ty.type_parameters().first()?;
        Some(Value::List(elements(serialization, element, value.as_list()?, false)))
    }

    fn serialize(
        &self,
        serialization: &Serialization,
        ty: &TypeDescriptor,
        value: &Value,
    ) -> Option<Value> {
        let element = ty.type_parameters().first()?;
        Some(Value::List(serialize_elements(
            serialization,
            element,
            value.as_list()?,
            false,
        )))
    }
}

/// Maps with typed keys and values.
///
/// Keys are converted through the key type and stored as text again; an
/// entry whose key does not convert is dropped.
pub struct MapSerializer;

impl Serializer for MapSerializer {
    fn name(&self) -> &'static str {
        "map"
    }

    fn parameters(&self) -> Parameters {
        Parameters::Exactly(2)
    }

    fn is_applicable(&self, ty: &TypeDescriptor) -> bool {
        main_is(ty, |main| *main == MainType::Map)
    }

    fn is_applicable_deserialize(&self, ty: &TypeDescriptor, value: &Value) -> bool {
        self.is_applicable(ty) && matches!(value, Value::Map(_))
    }

    fn is_applicable_serialize(&self, ty: &TypeDescriptor, value: &Value) -> bool {
        self.is_applicable(ty) && matches!(value, Value::Map(_))
    }

    fn deserialize(
        &self,
        serialization: &Serialization,
        ty: &TypeDescriptor,
        value: &Value,
    ) -> Option<Value> {
        let [key_ty, value_ty] = ty.type_parameters() else {
            return None;
        };
        let mut out = crate::value::Snapshot::new();
        for (key, item) in value.as_map()? {
            let Some(converted) = serialization.deserialize(key_ty, &Value::String(key.clone()))
            else {
                log::debug!("dropping map entry '{key}': key is not a {key_ty}");
                continue;
            };
            let item = serialization
                .deserialize(value_ty, item)
                .unwrap_or(Value::Null);
            out.insert(converted.to_string(), item);
        }
        Some(Value::Map(out))
    }

    fn serialize(
        &self,
        serialization: &Serialization,
        ty: &TypeDescriptor,
        value: &Value,
    ) -> Option<Value> {
        let [key_ty, value_ty] = ty.type_parameters() else {
            return None;
        };
        let out = value
            .as_map()?
            .iter()
            .map(|(key, item)| {
                let key = serialization.serialize(key_ty, &Value::String(key.clone()));
                (key.to_string(), serialization.serialize(value_ty, item))
            })
            .collect();
        Some(Value::Map(out))
    }
}
