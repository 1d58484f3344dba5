//! Reply serialization and result sinks
//!
//! A successful result becomes text: `null` is the empty string, strings,
//! numbers and booleans are their bare text form, and everything else is a
//! JSON document. Failures travel separately as a code and a message.
//!
//! Scalars are rendered from the handler's own `Serialize` output rather
//! than through `serde_json::Value`, so an `f32` keeps its shortest form and
//! non-finite floats stay distinguishable from `null`.

use serde::Serialize;
use serde::ser::{self, Impossible, Serializer};
use std::fmt;

use super::errors::QueryError;

/// Converts a handler result into reply text
pub fn serialize_result<T: Serialize + ?Sized>(value: &T) -> Result<String, QueryError> {
    match value.serialize(ScalarText) {
        Ok(text) => Ok(text),
        Err(ScalarError::Compound) => {
            serde_json::to_string(value).map_err(|e| QueryError::Serialization(e.to_string()))
        }
        Err(ScalarError::Custom(message)) => Err(QueryError::Serialization(message)),
    }
}

fn float_text<F: Serialize>(value: F, nan: bool, infinite: bool, negative: bool) -> Result<String, ScalarError> {
    if nan {
        return Ok("NaN".to_string());
    }
    if infinite {
        return Ok(if negative { "-Infinity" } else { "Infinity" }.to_string());
    }
    serde_json::to_string(&value).map_err(|e| ScalarError::Custom(e.to_string()))
}

#[derive(Debug)]
enum ScalarError {
    /// Not a scalar; rendered as a JSON document instead
    Compound,
    Custom(String),
}

impl fmt::Display for ScalarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarError::Compound => f.write_str("compound value"),
            ScalarError::Custom(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for ScalarError {}

impl ser::Error for ScalarError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        ScalarError::Custom(msg.to_string())
    }
}

/// Renders a scalar as bare reply text and refuses everything else
struct ScalarText;

impl Serializer for ScalarText {
    type Ok = String;
    type Error = ScalarError;
    type SerializeSeq = Impossible<String, ScalarError>;
    type SerializeTuple = Impossible<String, ScalarError>;
    type SerializeTupleStruct = Impossible<String, ScalarError>;
    type SerializeTupleVariant = Impossible<String, ScalarError>;
    type SerializeMap = Impossible<String, ScalarError>;
    type SerializeStruct = Impossible<String, ScalarError>;
    type SerializeStructVariant = Impossible<String, ScalarError>;

    fn serialize_bool(self, v: bool) -> Result<String, ScalarError> {
        Ok(v.to_string())
    }

    fn serialize_i8(self, v: i8) -> Result<String, ScalarError> {
        Ok(v.to_string())
    }

    fn serialize_i16(self, v: i16) -> Result<String, ScalarError> {
        Ok(v.to_string())
    }

    fn serialize_i32(self, v: i32) -> Result<String, ScalarError> {
        Ok(v.to_string())
    }

    fn serialize_i64(self, v: i64) -> Result<String, ScalarError> {
        Ok(v.to_string())
    }

    fn serialize_i128(self, v: i128) -> Result<String, ScalarError> {
        Ok(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<String, ScalarError> {
        Ok(v.to_string())
    }

    fn serialize_u16(self, v: u16) -> Result<String, ScalarError> {
        Ok(v.to_string())
    }

    fn serialize_u32(self, v: u32) -> Result<String, ScalarError> {
        Ok(v.to_string())
    }

    fn serialize_u64(self, v: u64) -> Result<String, ScalarError> {
        Ok(v.to_string())
    }

    fn serialize_u128(self, v: u128) -> Result<String, ScalarError> {
        Ok(v.to_string())
    }

    fn serialize_f32(self, v: f32) -> Result<String, ScalarError> {
        float_text(v, v.is_nan(), v.is_infinite(), v.is_sign_negative())
    }

    fn serialize_f64(self, v: f64) -> Result<String, ScalarError> {
        float_text(v, v.is_nan(), v.is_infinite(), v.is_sign_negative())
    }

    fn serialize_char(self, v: char) -> Result<String, ScalarError> {
        Ok(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<String, ScalarError> {
        Ok(v.to_string())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String, ScalarError> {
        Err(ScalarError::Compound)
    }

    fn serialize_none(self) -> Result<String, ScalarError> {
        Ok(String::new())
    }

    fn serialize_some<T>(self, value: &T) -> Result<String, ScalarError>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<String, ScalarError> {
        Ok(String::new())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String, ScalarError> {
        Ok(String::new())
    }

    // Enum constants travel as their name
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String, ScalarError> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<String, ScalarError>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String, ScalarError>
    where
        T: ?Sized + Serialize,
    {
        Err(ScalarError::Compound)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, ScalarError> {
        Err(ScalarError::Compound)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, ScalarError> {
        Err(ScalarError::Compound)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, ScalarError> {
        Err(ScalarError::Compound)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, ScalarError> {
        Err(ScalarError::Compound)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, ScalarError> {
        Err(ScalarError::Compound)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, ScalarError> {
        Err(ScalarError::Compound)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, ScalarError> {
        Err(ScalarError::Compound)
    }
}

/// Outcome of one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QueryReply {
    Success { response: String },
    Failure { code: i32, message: String },
}

impl QueryReply {
    pub fn success<S: Into<String>>(response: S) -> Self {
        Self::Success {
            response: response.into(),
        }
    }

    /// Empty success, as sent for a `null` result or an unmatched route
    pub fn empty() -> Self {
        Self::success(String::new())
    }

    pub fn failure<S: Into<String>>(code: i32, message: S) -> Self {
        Self::Failure {
            code,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryReply::Success { .. })
    }

    /// Reply text of a success
    pub fn response(&self) -> Option<&str> {
        match self {
            QueryReply::Success { response } => Some(response),
            QueryReply::Failure { .. } => None,
        }
    }

    /// Code of a failure
    pub fn code(&self) -> Option<i32> {
        match self {
            QueryReply::Failure { code, .. } => Some(*code),
            QueryReply::Success { .. } => None,
        }
    }

    /// Hands the reply to a result sink
    pub fn complete<C: QueryCallback>(self, callback: C) {
        match self {
            QueryReply::Success { response } => callback.success(response),
            QueryReply::Failure { code, message } => callback.failure(code, message),
        }
    }
}

impl From<&QueryError> for QueryReply {
    fn from(error: &QueryError) -> Self {
        QueryReply::failure(error.code(), error.reply_message())
    }
}

/// Transport-specific result sink, completed exactly once per query
pub trait QueryCallback: Send + 'static {
    fn success(self, response: String);
    fn failure(self, code: i32, message: String);
}

impl QueryCallback for tokio::sync::oneshot::Sender<QueryReply> {
    fn success(self, response: String) {
        if self.send(QueryReply::success(response)).is_err() {
            tracing::debug!("Query reply receiver dropped");
        }
    }

    fn failure(self, code: i32, message: String) {
        if self.send(QueryReply::failure(code, message)).is_err() {
            tracing::debug!("Query reply receiver dropped");
        }
    }
}
