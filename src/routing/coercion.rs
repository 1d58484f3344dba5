//! Parameter binding
//!
//! Path parameters arrive as strings and are coerced according to the
//! declared parameter type. Payload values arrive as JSON and are passed
//! through structurally, except for strings bound to non-string types, which
//! get the same coercion as path parameters.

use serde_json::{Number, Value};

use crate::core::types::{PrimitiveKind, TypeCatalog, TypeRef};

/// Converts a path parameter string into a value of the declared type
pub fn coerce_path_value(raw: &str, ty: &TypeRef, catalog: &TypeCatalog) -> Result<Value, String> {
    if let Some(kind) = ty.primitive_kind() {
        return coerce_primitive(raw, kind);
    }

    match ty {
        TypeRef::String | TypeRef::Any | TypeRef::Date(_) => Ok(Value::String(raw.to_string())),
        _ if ty.is_byte_array() => Ok(Value::Array(raw.bytes().map(Value::from).collect())),
        TypeRef::Named(name) => match catalog.enum_values(name) {
            Some(values) if values.iter().any(|v| v == raw) => Ok(Value::String(raw.to_string())),
            Some(_) => Err(format!("no enum constant {name}.{raw}")),
            None => Ok(parse_structured(raw)),
        },
        _ => Ok(parse_structured(raw)),
    }
}

/// Binds a payload or named argument value to the declared type.
///
/// An absent value binds as `null`.
pub fn bind_value(value: Option<&Value>, ty: &TypeRef, catalog: &TypeCatalog) -> Result<Value, String> {
    match value {
        None | Some(Value::Null) => Ok(Value::Null),
        Some(Value::String(s)) => coerce_path_value(s, ty, catalog),
        Some(other) => Ok(other.clone()),
    }
}

fn coerce_primitive(raw: &str, kind: PrimitiveKind) -> Result<Value, String> {
    let invalid = |e: &dyn std::fmt::Display| format!("'{raw}' is not a valid {}: {e}", kind.as_str());

    match kind {
        // Anything other than a case-insensitive "true" is false
        PrimitiveKind::Boolean => Ok(Value::Bool(raw.eq_ignore_ascii_case("true"))),
        PrimitiveKind::Byte => raw.parse::<i8>().map(Value::from).map_err(|e| invalid(&e)),
        PrimitiveKind::Short => raw.parse::<i16>().map(Value::from).map_err(|e| invalid(&e)),
        PrimitiveKind::Int => raw.parse::<i32>().map(Value::from).map_err(|e| invalid(&e)),
        PrimitiveKind::Long => raw.parse::<i64>().map(Value::from).map_err(|e| invalid(&e)),
        PrimitiveKind::Float => raw
            .parse::<f32>()
            .map_err(|e| invalid(&e))
            .and_then(|f| float_value(widen(f), raw)),
        PrimitiveKind::Double => raw
            .parse::<f64>()
            .map_err(|e| invalid(&e))
            .and_then(|f| float_value(f, raw)),
        PrimitiveKind::Char => raw
            .chars()
            .next()
            .map(|c| Value::String(c.to_string()))
            .ok_or_else(|| "an empty string cannot be converted to char".to_string()),
    }
}

/// Widens through the shortest decimal form, so `0.1f32` becomes `0.1`
fn widen(f: f32) -> f64 {
    f.to_string().parse().unwrap_or_else(|_| f64::from(f))
}

fn float_value(f: f64, raw: &str) -> Result<Value, String> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| format!("'{raw}' is not a finite number"))
}

/// JSON text becomes its structure, anything else stays a string
fn parse_structured(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
