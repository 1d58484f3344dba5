//! Runtime query routing
//!
//! Matches `{route, payload}` envelopes and `{className, methodName,
//! parameters}` messages against registered handler operations, binds their
//! arguments and serializes the result into reply text.

pub mod coercion;
pub mod errors;
pub mod registry;
pub mod reply;
pub mod route;
pub mod router;

pub use errors::{
    GENERIC_ERROR_CODE, MALFORMED_QUERY_CODE, QueryError, ROUTE_NOT_FOUND_CODE, RouterError,
    SERIALIZATION_ERROR_CODE, UNKNOWN_OPERATION_CODE,
};
pub use registry::{Args, HandlerGroup};
pub use reply::{QueryCallback, QueryReply};
pub use route::{RoutePattern, build_route};
pub use router::{MethodCall, QueryEnvelope, QueryRouter, RouterConfig};
