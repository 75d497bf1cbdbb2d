//! Reflection-free descriptions of requested target types.
//!
//! A [`TypeDescriptor`] has exactly one of three shapes: a bare class, an
//! array of some element type, or a main type applied to type parameters.
//! Serializer dispatch keys off these shapes and caches its choice per
//! descriptor, so descriptors are immutable and hashable.
//!
//! Descriptors are usually obtained from [`Setting::descriptor`](crate::Setting::descriptor)
//! but can also be parsed from text:
//!
//! ```
//! use arbor::{MainType, TypeDescriptor};
//!
//! let ty: TypeDescriptor = "map<string, list<i32>>".parse().unwrap();
//! assert_eq!(ty.main_type(), Some(&MainType::Map));
//! assert_eq!(ty.type_parameters().len(), 2);
//!
//! let bytes: TypeDescriptor = "byte[]".parse().unwrap();
//! assert!(bytes.is_array());
//!
//! assert!("list<".parse::<TypeDescriptor>().is_err());
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::Error;
use crate::section::SectionSchema;

/// The nominal part of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MainType {
    /// Any value; the upper bound of an unconstrained wildcard.
    Any,
    /// Booleans.
    Bool,
    /// 8-bit integers (bytes).
    I8,
    /// 16-bit integers.
    I16,
    /// 32-bit integers.
    I32,
    /// 64-bit integers.
    I64,
    /// 32-bit floats.
    F32,
    /// 64-bit floats.
    F64,
    /// Any numeric value, left in whatever width it arrived.
    Number,
    /// Arbitrary-precision integers.
    BigInt,
    /// Arbitrary-precision decimals.
    Decimal,
    /// Strings.
    String,
    /// Points in time.
    Date,
    /// Ordered sequences.
    List,
    /// Sequences with set semantics.
    Set,
    /// String-keyed mappings.
    Map,
    /// A closed set of named constants.
    Enum(EnumType),
    /// A nested, node-backed structure.
    Section(SectionType),
}

impl MainType {
    /// Returns `true` for every numeric main type.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::F32
                | Self::F64
                | Self::Number
                | Self::BigInt
                | Self::Decimal
        )
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "any" | "object" | "value" => Self::Any,
            "bool" | "boolean" => Self::Bool,
            "i8" | "byte" => Self::I8,
            "i16" | "short" => Self::I16,
            "i32" | "int" => Self::I32,
            "i64" | "long" => Self::I64,
            "f32" | "float" => Self::F32,
            "f64" | "double" => Self::F64,
            "number" => Self::Number,
            "bigint" => Self::BigInt,
            "decimal" => Self::Decimal,
            "string" => Self::String,
            "date" => Self::Date,
            "list" => Self::List,
            "set" => Self::Set,
            "map" => Self::Map,
            _ => return None,
        })
    }

    const fn is_container(&self) -> bool {
        matches!(self, Self::Any | Self::List | Self::Set | Self::Map)
    }
}

impl fmt::Display for MainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Number => "number",
            Self::BigInt => "bigint",
            Self::Decimal => "decimal",
            Self::String => "string",
            Self::Date => "date",
            Self::List => "list",
            Self::Set => "set",
            Self::Map => "map",
            Self::Enum(e) => &e.name,
            Self::Section(s) => s.name(),
        };
        f.write_str(name)
    }
}

/// An enumeration: its name and declared constants, matched case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumType {
    name: String,
    constants: Vec<String>,
}

impl EnumType {
    /// Declares an enumeration.
    pub fn new<I, S>(name: impl Into<String>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            constants: constants.into_iter().map(Into::into).collect(),
        }
    }

    /// The enumeration's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared constant names, in declaration order.
    #[must_use]
    pub fn constants(&self) -> &[String] {
        &self.constants
    }

    /// Returns `true` if `name` is one of the constants.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constants.iter().any(|c| c == name)
    }
}

/// A nested section type. Identity is by name.
#[derive(Clone)]
pub struct SectionType {
    schema: Arc<dyn SectionSchema>,
}

impl SectionType {
    /// Wraps a schema.
    pub fn new(schema: Arc<dyn SectionSchema>) -> Self {
        Self { schema }
    }

    /// The section's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// The schema used to load and save the nested structure.
    #[must_use]
    pub fn schema(&self) -> &dyn SectionSchema {
        self.schema.as_ref()
    }
}

impl fmt::Debug for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SectionType").field(&self.name()).finish()
    }
}

impl PartialEq for SectionType {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for SectionType {}

impl Hash for SectionType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

/// A description of a requested coercion target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// A bare type.
    Class(MainType),
    /// An array of the element type.
    Array(Box<TypeDescriptor>),
    /// A main type applied to type parameters.
    Parameterized(MainType, Vec<TypeDescriptor>),
}

impl TypeDescriptor {
    /// A bare type.
    #[must_use]
    pub const fn class(main: MainType) -> Self {
        Self::Class(main)
    }

    /// An array of `element`.
    #[must_use]
    pub fn array(element: TypeDescriptor) -> Self {
        Self::Array(Box::new(element))
    }

    /// `main` applied to `parameters`. With no parameters this is a bare type.
    #[must_use]
    pub fn parameterized(main: MainType, parameters: Vec<TypeDescriptor>) -> Self {
        if parameters.is_empty() {
            Self::Class(main)
        } else {
            Self::Parameterized(main, parameters)
        }
    }

    /// `list<element>`.
    #[must_use]
    pub fn list_of(element: TypeDescriptor) -> Self {
        Self::Parameterized(MainType::List, vec![element])
    }

    /// `set<element>`.
    #[must_use]
    pub fn set_of(element: TypeDescriptor) -> Self {
        Self::Parameterized(MainType::Set, vec![element])
    }

    /// `map<key, value>`.
    #[must_use]
    pub fn map_of(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Parameterized(MainType::Map, vec![key, value])
    }

    /// The descriptor of a statically known setting type.
    #[must_use]
    pub fn of<T: crate::Setting>() -> Self {
        T::descriptor()
    }

    /// The main type; `None` for arrays.
    #[must_use]
    pub fn main_type(&self) -> Option<&MainType> {
        match self {
            Self::Class(main) | Self::Parameterized(main, _) => Some(main),
            Self::Array(_) => None,
        }
    }

    /// The type parameters; empty unless parameterized.
    #[must_use]
    pub fn type_parameters(&self) -> &[TypeDescriptor] {
        match self {
            Self::Parameterized(_, params) => params,
            _ => &[],
        }
    }

    /// Returns `true` for array shapes.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// The element type of an array shape.
    #[must_use]
    pub fn element_type(&self) -> Option<&TypeDescriptor> {
        match self {
            Self::Array(element) => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(main) => write!(f, "{main}"),
            Self::Array(element) => write!(f, "{element}[]"),
            Self::Parameterized(main, params) => {
                write!(f, "{main}<")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                f.write_str(">")
            }
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser { input: s, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos < s.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(ty)
    }
}

/// Recursive-descent parser for descriptor text.
///
/// ```text
/// type     := wildcard | name params? "[]"*
/// wildcard := "?" ("extends" type)?
/// params   := "<" type ("," type)* ">"
/// ```
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> Error {
        Error::InvalidType {
            input: self.input.to_string(),
            reason: format!("{reason} at offset {}", self.pos),
        }
    }

    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Option<String> {
        self.skip_ws();
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.rest().len());
        if len == 0 {
            return None;
        }
        let ident = self.rest()[..len].to_ascii_lowercase();
        self.pos += len;
        Some(ident)
    }

    fn parse_type(&mut self) -> Result<TypeDescriptor, Error> {
        let mut ty = if self.eat("?") {
            // A wildcard resolves to its upper bound.
            let checkpoint = self.pos;
            match self.ident() {
                Some(word) if word == "extends" => self.parse_type()?,
                Some(_) => return Err(self.error("expected 'extends' after '?'")),
                None => {
                    self.pos = checkpoint;
                    TypeDescriptor::Class(MainType::Any)
                }
            }
        } else {
            let name = self.ident().ok_or_else(|| self.error("expected a type name"))?;
            let main =
                MainType::from_name(&name).ok_or_else(|| self.error("unknown type name"))?;
            let mut params = Vec::new();
            if self.eat("<") {
                if !main.is_container() {
                    return Err(self.error("type does not take parameters"));
                }
                loop {
                    params.push(self.parse_type()?);
                    if self.eat(">") {
                        break;
                    }
                    if !self.eat(",") {
                        return Err(self.error("expected ',' or '>'"));
                    }
                }
            }
            TypeDescriptor::parameterized(main, params)
        };
        while self.eat("[]") {
            ty = TypeDescriptor::array(ty);
        }
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_types() {
        let ty: TypeDescriptor = "int".parse().unwrap();
        assert_eq!(ty, TypeDescriptor::class(MainType::I32));
        assert!(ty.type_parameters().is_empty());
        assert!(!ty.is_array());
    }

    #[test]
    fn test_parameterized() {
        let ty: TypeDescriptor = "map<string, list<i64>>".parse().unwrap();
        assert_eq!(
            ty,
            TypeDescriptor::map_of(
                TypeDescriptor::class(MainType::String),
                TypeDescriptor::list_of(TypeDescriptor::class(MainType::I64)),
            )
        );
    }

    #[test]
    fn test_arrays() {
        let ty: TypeDescriptor = "byte[]".parse().unwrap();
        assert_eq!(ty.element_type(), Some(&TypeDescriptor::class(MainType::I8)));
        assert_eq!(ty.main_type(), None);

        let nested: TypeDescriptor = "list<int>[][]".parse().unwrap();
        assert!(nested.element_type().unwrap().is_array());
    }

    #[test]
    fn test_wildcards_resolve_to_upper_bound() {
        let bounded: TypeDescriptor = "? extends number".parse().unwrap();
        assert_eq!(bounded, TypeDescriptor::class(MainType::Number));

        let open: TypeDescriptor = "list<?>".parse().unwrap();
        assert_eq!(
            open,
            TypeDescriptor::list_of(TypeDescriptor::class(MainType::Any))
        );
    }

    #[test]
    fn test_unrepresentable_shapes_fail() {
        assert!("".parse::<TypeDescriptor>().is_err());
        assert!("widget".parse::<TypeDescriptor>().is_err());
        assert!("int<string>".parse::<TypeDescriptor>().is_err());
        assert!("list<int".parse::<TypeDescriptor>().is_err());
        assert!("? super int".parse::<TypeDescriptor>().is_err());
        assert!("int string".parse::<TypeDescriptor>().is_err());
    }

    #[test]
    fn test_display_round_trips_text() {
        for text in ["i32", "map<string, list<bool>>", "i8[]", "set<date>"] {
            let ty: TypeDescriptor = text.parse().unwrap();
            assert_eq!(ty.to_string(), text);
        }
    }

    #[test]
    fn test_empty_parameters_collapse_to_class() {
        assert_eq!(
            TypeDescriptor::parameterized(MainType::List, Vec::new()),
            TypeDescriptor::class(MainType::List)
        );
    }

    #[test]
    fn test_enum_type() {
        let e = EnumType::new("Mode", ["Fast", "Slow"]);
        assert!(e.contains("Fast"));
        assert!(!e.contains("fast"));
        assert_eq!(e.constants().len(), 2);
    }
}
