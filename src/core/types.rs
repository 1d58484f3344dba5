//! Language-neutral type descriptors shared by the router and the stub generator.
//!
//! A [`TypeRef`] describes the type of a parameter, return value or field. It
//! has a compact textual form that is used in handler manifests:
//!
//! | text                     | meaning                               |
//! |--------------------------|---------------------------------------|
//! | `int`, `double`, `char`  | primitive                             |
//! | `Integer`, `Boolean`     | boxed (nullable) primitive            |
//! | `string`                 | character sequence                    |
//! | `byte[]`, `Person[]`     | array                                 |
//! | `list<T>`, `set<T>`      | collections                           |
//! | `map<K, V>`              | map                                   |
//! | `date`, `datetime`       | date/time values                      |
//! | `com.example.Person`     | named enum or complex type            |
//!
//! Named types are resolved through a [`TypeCatalog`], which lets type graphs
//! contain cycles without owning pointers between declarations.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::core::error::{Error, Result};

/// Primitive value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
}

impl PrimitiveKind {
    /// Name of the unboxed form
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Char => "char",
        }
    }

    /// Name of the boxed (nullable) wrapper
    pub fn boxed_name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Short => "Short",
            PrimitiveKind::Int => "Integer",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Char => "Character",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, PrimitiveKind::Boolean | PrimitiveKind::Char)
    }

    fn all() -> [PrimitiveKind; 8] {
        [
            PrimitiveKind::Boolean,
            PrimitiveKind::Byte,
            PrimitiveKind::Short,
            PrimitiveKind::Int,
            PrimitiveKind::Long,
            PrimitiveKind::Float,
            PrimitiveKind::Double,
            PrimitiveKind::Char,
        ]
    }
}

/// Date and time flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateKind {
    Date,
    Time,
    DateTime,
    Instant,
}

impl DateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateKind::Date => "date",
            DateKind::Time => "time",
            DateKind::DateTime => "datetime",
            DateKind::Instant => "instant",
        }
    }
}

/// Type of a parameter, return value or field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    Void,
    Any,
    String,
    Primitive(PrimitiveKind),
    Boxed(PrimitiveKind),
    Array(Box<TypeRef>),
    List(Box<TypeRef>),
    Set(Box<TypeRef>),
    Map(Box<TypeRef>, Box<TypeRef>),
    Date(DateKind),
    /// Enum or complex type, resolved through a [`TypeCatalog`]
    Named(String),
}

impl TypeRef {
    pub fn named<S: Into<String>>(name: S) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn array(of: TypeRef) -> Self {
        TypeRef::Array(Box::new(of))
    }

    pub fn list(of: TypeRef) -> Self {
        TypeRef::List(Box::new(of))
    }

    pub fn set(of: TypeRef) -> Self {
        TypeRef::Set(Box::new(of))
    }

    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Map(Box::new(key), Box::new(value))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    /// Primitive kind of a primitive or boxed type
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            TypeRef::Primitive(kind) | TypeRef::Boxed(kind) => Some(*kind),
            _ => None,
        }
    }

    /// `byte[]`, which binds from raw text bytes
    pub fn is_byte_array(&self) -> bool {
        matches!(self, TypeRef::Array(inner) if **inner == TypeRef::Primitive(PrimitiveKind::Byte))
    }

    /// Collects every named type referenced by this type, including
    /// element, key and value types.
    pub fn collect_named<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeRef::Named(name) => out.push(name),
            TypeRef::Array(inner) | TypeRef::List(inner) | TypeRef::Set(inner) => {
                inner.collect_named(out)
            }
            TypeRef::Map(key, value) => {
                key.collect_named(out);
                value.collect_named(out);
            }
            _ => {}
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => write!(f, "void"),
            TypeRef::Any => write!(f, "any"),
            TypeRef::String => write!(f, "string"),
            TypeRef::Primitive(kind) => write!(f, "{}", kind.as_str()),
            TypeRef::Boxed(kind) => write!(f, "{}", kind.boxed_name()),
            TypeRef::Array(inner) => write!(f, "{inner}[]"),
            TypeRef::List(inner) => write!(f, "list<{inner}>"),
            TypeRef::Set(inner) => write!(f, "set<{inner}>"),
            TypeRef::Map(key, value) => write!(f, "map<{key}, {value}>"),
            TypeRef::Date(kind) => write!(f, "{}", kind.as_str()),
            TypeRef::Named(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for TypeRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_type(s)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

fn parse_type(input: &str) -> Result<TypeRef> {
    let s = input.trim();
    if s.is_empty() {
        return Err(Error::type_syntax(input, "empty type expression"));
    }

    if let Some(element) = s.strip_suffix("[]") {
        return Ok(TypeRef::array(parse_type(element)?));
    }

    if let Some(open) = s.find('<') {
        let base = s[..open].trim();
        let args_src = s[open + 1..]
            .strip_suffix('>')
            .ok_or_else(|| Error::type_syntax(input, "unterminated type arguments"))?;
        let args = split_type_arguments(input, args_src)?;

        return match (base, args.as_slice()) {
            ("list", [element]) => Ok(TypeRef::list(parse_type(element)?)),
            ("set", [element]) => Ok(TypeRef::set(parse_type(element)?)),
            ("map", [key, value]) => Ok(TypeRef::map(parse_type(key)?, parse_type(value)?)),
            ("list" | "set", _) => Err(Error::type_syntax(
                input,
                format!("{base} takes exactly one type argument"),
            )),
            ("map", _) => Err(Error::type_syntax(
                input,
                "map takes a key and a value type",
            )),
            _ => Err(Error::type_syntax(
                input,
                format!("unknown generic type '{base}'"),
            )),
        };
    }

    if let Some(kind) = PrimitiveKind::all().into_iter().find(|k| k.as_str() == s) {
        return Ok(TypeRef::Primitive(kind));
    }
    if let Some(kind) = PrimitiveKind::all().into_iter().find(|k| k.boxed_name() == s) {
        return Ok(TypeRef::Boxed(kind));
    }

    match s {
        "void" => Ok(TypeRef::Void),
        "any" => Ok(TypeRef::Any),
        "string" | "String" => Ok(TypeRef::String),
        "list" => Ok(TypeRef::list(TypeRef::Any)),
        "set" => Ok(TypeRef::set(TypeRef::Any)),
        "map" => Ok(TypeRef::map(TypeRef::String, TypeRef::Any)),
        "date" => Ok(TypeRef::Date(DateKind::Date)),
        "time" => Ok(TypeRef::Date(DateKind::Time)),
        "datetime" => Ok(TypeRef::Date(DateKind::DateTime)),
        "instant" => Ok(TypeRef::Date(DateKind::Instant)),
        other if is_qualified_identifier(other) => Ok(TypeRef::Named(other.to_string())),
        _ => Err(Error::type_syntax(input, "not a type name")),
    }
}

/// Splits `a, map<b, c>` at top-level commas.
fn split_type_arguments<'a>(input: &str, src: &'a str) -> Result<Vec<&'a str>> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, ch) in src.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::type_syntax(input, "unbalanced '>'"))?;
            }
            ',' if depth == 0 => {
                args.push(&src[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::type_syntax(input, "unbalanced '<'"));
    }
    args.push(&src[start..]);
    Ok(args)
}

fn is_qualified_identifier(s: &str) -> bool {
    s.split('.').all(|segment| {
        let mut chars = segment.chars();
        match chars.next() {
            Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {
                chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
            }
            _ => false,
        }
    })
}

/// Last segment of a dotted qualified name
pub fn simple_name(qualified: &str) -> &str {
    qualified
        .rsplit_once('.')
        .map(|(_, name)| name)
        .unwrap_or(qualified)
}

/// Everything before the last dot of a qualified name
pub fn namespace(qualified: &str) -> &str {
    qualified
        .rsplit_once('.')
        .map(|(ns, _)| ns)
        .unwrap_or("")
}

/// A field of a complex type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub optional: bool,
}

impl FieldDescriptor {
    pub fn new<S: Into<String>>(name: S, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
        }
    }
}

/// Shape of a declared type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Struct {
        #[serde(default)]
        fields: Vec<FieldDescriptor>,
    },
    Enum {
        #[serde(default)]
        values: Vec<String>,
    },
}

/// A named enum or complex type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    /// Qualified name, e.g. `com.example.dto.Person`
    pub name: String,
    /// Explicit output directory, overriding the namespace-derived one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(flatten)]
    pub kind: TypeKind,
}

impl TypeDeclaration {
    pub fn structure<S: Into<String>>(name: S, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            path: None,
            kind: TypeKind::Struct { fields },
        }
    }

    pub fn enumeration<S: Into<String>>(name: S, values: &[&str]) -> Self {
        Self {
            name: name.into(),
            path: None,
            kind: TypeKind::Enum {
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        }
    }

    pub fn with_path<S: Into<String>>(mut self, path: S) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn namespace(&self) -> &str {
        namespace(&self.name)
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum { .. })
    }
}

/// Lookup table of declared types keyed by qualified name
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    declarations: HashMap<String, TypeDeclaration>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declaration, returning the one it replaced
    pub fn insert(&mut self, declaration: TypeDeclaration) -> Option<TypeDeclaration> {
        self.declarations
            .insert(declaration.name.clone(), declaration)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDeclaration> {
        self.declarations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    /// Constants of a declared enum
    pub fn enum_values(&self, name: &str) -> Option<&[String]> {
        match &self.get(name)?.kind {
            TypeKind::Enum { values } => Some(values),
            TypeKind::Struct { .. } => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.declarations.values()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl FromIterator<TypeDeclaration> for TypeCatalog {
    fn from_iter<I: IntoIterator<Item = TypeDeclaration>>(iter: I) -> Self {
        let mut catalog = TypeCatalog::new();
        for declaration in iter {
            catalog.insert(declaration);
        }
        catalog
    }
}
