//! Maps type descriptors to TypeScript type names

use serde::Serialize;

use crate::core::types::{PrimitiveKind, TypeCatalog, TypeRef, simple_name};

/// TypeScript spelling of a type
pub fn to_typescript(ty: &TypeRef) -> String {
    match ty {
        TypeRef::Void => "void".to_string(),
        TypeRef::Any => "any".to_string(),
        TypeRef::String | TypeRef::Date(_) => "string".to_string(),
        TypeRef::Primitive(kind) | TypeRef::Boxed(kind) => match kind {
            PrimitiveKind::Boolean => "boolean".to_string(),
            PrimitiveKind::Char => "string".to_string(),
            _ => "number".to_string(),
        },
        TypeRef::Array(element) | TypeRef::List(element) | TypeRef::Set(element) => {
            format!("{}[]", to_typescript(element))
        }
        TypeRef::Map(key, value) => format!(
            "{{ [key: {}]: {} }}",
            to_typescript(key),
            to_typescript(value)
        ),
        TypeRef::Named(name) => simple_name(name).to_string(),
    }
}

/// How the client decodes a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Boolean,
    Number,
    String,
    Object,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::Boolean => "boolean",
            ResponseKind::Number => "number",
            ResponseKind::String => "string",
            ResponseKind::Object => "object",
        }
    }
}

/// Response kind of a return type. Scalars are sent as bare text, everything
/// else as JSON. Enum constants serialize as their name, so they decode as
/// strings.
pub fn response_kind(ty: &TypeRef, catalog: &TypeCatalog) -> ResponseKind {
    if let TypeRef::Named(name) = ty {
        if catalog.enum_values(name).is_some() {
            return ResponseKind::String;
        }
    }
    match to_typescript(ty).as_str() {
        "boolean" => ResponseKind::Boolean,
        "number" => ResponseKind::Number,
        "string" => ResponseKind::String,
        _ => ResponseKind::Object,
    }
}
