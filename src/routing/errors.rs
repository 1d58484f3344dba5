//! Routing error types

/// Reply code for failures without a more specific code
pub const GENERIC_ERROR_CODE: i32 = -1;
/// Reply code for a query or invocation message that could not be parsed
pub const MALFORMED_QUERY_CODE: i32 = 1001;
/// Reply code for a result that could not be serialized
pub const SERIALIZATION_ERROR_CODE: i32 = 1002;
/// Reply code for an unknown group or operation in an invocation message
pub const UNKNOWN_OPERATION_CODE: i32 = 2001;
/// Reply code for an unmatched route under strict routing
pub const ROUTE_NOT_FOUND_CODE: i32 = 404;

/// Errors raised while building the route table
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("Operation {operation} on route '{route}' has more than one payload parameter: {}", parameters.join(", "))]
    MultiplePayloadParameters {
        route: String,
        operation: String,
        parameters: Vec<String>,
    },

    #[error("Invalid route '{route}': {reason}")]
    InvalidRoute { route: String, reason: String },
}

/// Errors raised while answering a single query.
///
/// Every variant becomes a failure reply; [`QueryError::code`] gives the
/// numeric code and [`QueryError::reply_message`] the message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    /// Business error raised by a handler with its own code
    #[error("{message}")]
    Declared { code: i32, message: String },

    #[error("Internal error: cannot bind parameter '{parameter}': {reason}")]
    Binding { parameter: String, reason: String },

    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Failed to serialize result: {0}")]
    Serialization(String),

    #[error("No handler registered for route '{0}'")]
    RouteNotFound(String),

    #[error("Operation {group}.{operation} is not registered")]
    UnknownOperation { group: String, operation: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueryError {
    pub fn declared<S: Into<String>>(code: i32, message: S) -> Self {
        Self::Declared {
            code,
            message: message.into(),
        }
    }

    pub fn binding<P: Into<String>, R: Into<String>>(parameter: P, reason: R) -> Self {
        Self::Binding {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Wrap any error raised inside a handler
    pub fn internal<E: std::fmt::Display>(error: E) -> Self {
        Self::Internal(error.to_string())
    }

    pub fn code(&self) -> i32 {
        match self {
            QueryError::Declared { code, .. } => *code,
            QueryError::MalformedQuery(_) => MALFORMED_QUERY_CODE,
            QueryError::Serialization(_) => SERIALIZATION_ERROR_CODE,
            QueryError::RouteNotFound(_) => ROUTE_NOT_FOUND_CODE,
            QueryError::UnknownOperation { .. } => UNKNOWN_OPERATION_CODE,
            QueryError::Binding { .. } | QueryError::Internal(_) => GENERIC_ERROR_CODE,
        }
    }

    pub fn reply_message(&self) -> String {
        self.to_string()
    }
}
