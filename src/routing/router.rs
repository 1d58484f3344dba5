//! Query router
//!
//! The route table is built by [`QueryRouter::register`] and is read-only
//! afterwards, so a router behind an `Arc` serves concurrent queries without
//! locking.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::coercion::{bind_value, coerce_path_value};
use super::errors::{QueryError, RouterError};
use super::registry::{Args, HandlerGroup, Invoker};
use super::reply::{QueryCallback, QueryReply};
use super::route::{RoutePattern, build_route};
use crate::core::descriptors::{HandlerGroupDescriptor, HandlerManifest, OperationDescriptor};
use crate::core::types::{TypeCatalog, TypeDeclaration};

/// Router behaviour
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouterConfig {
    /// Reply to unmatched routes with a 404 failure instead of an empty success
    #[serde(default)]
    pub strict_routes: bool,
}

/// Route envelope sent by the front-end
#[derive(Debug, Clone, Deserialize)]
pub struct QueryEnvelope {
    pub route: String,
    #[serde(default)]
    pub payload: Option<Value>,
}

/// Method-invocation message sent by generated stubs
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCall {
    pub class_name: String,
    pub method_name: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

struct RouteEntry {
    group: String,
    pattern: RoutePattern,
    descriptor: OperationDescriptor,
    invoker: Arc<Invoker>,
}

/// Dispatches queries to registered handler operations
#[derive(Default)]
pub struct QueryRouter {
    config: RouterConfig,
    catalog: TypeCatalog,
    entries: Vec<RouteEntry>,
    by_name: HashMap<(String, String), usize>,
    groups: Vec<HandlerGroupDescriptor>,
}

impl QueryRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Declares the enum and complex types referenced by operations
    pub fn with_types<I: IntoIterator<Item = TypeDeclaration>>(mut self, types: I) -> Self {
        for declaration in types {
            self.catalog.insert(declaration);
        }
        self
    }

    /// Adds every operation of `group` to the route table.
    ///
    /// Nothing is added when any operation of the group is invalid.
    pub fn register(&mut self, group: HandlerGroup) -> Result<(), RouterError> {
        let mut entries = Vec::with_capacity(group.operations().len());

        for op in group.operations() {
            let route = build_route(group.route(), &op.descriptor.route);
            let pattern = RoutePattern::compile(&route)?;

            let payload: Vec<String> = op
                .descriptor
                .parameters
                .iter()
                .filter(|p| !pattern.has_param(&p.name))
                .map(|p| p.name.clone())
                .collect();
            if payload.len() > 1 {
                return Err(RouterError::MultiplePayloadParameters {
                    route,
                    operation: op.descriptor.name.clone(),
                    parameters: payload,
                });
            }

            entries.push(RouteEntry {
                group: group.name().to_string(),
                pattern,
                descriptor: op.descriptor.clone(),
                invoker: Arc::clone(&op.invoker),
            });
        }

        for entry in entries {
            if let Some(existing) = self
                .entries
                .iter()
                .find(|e| e.pattern.pattern() == entry.pattern.pattern())
            {
                warn!(
                    route = %entry.pattern.route(),
                    kept = %format!("{}.{}", existing.group, existing.descriptor.name),
                    ignored = %format!("{}.{}", entry.group, entry.descriptor.name),
                    "Duplicate route; the first registered operation wins"
                );
            }

            let key = (entry.group.clone(), entry.descriptor.name.clone());
            if self.by_name.contains_key(&key) {
                warn!(
                    group = %key.0,
                    operation = %key.1,
                    "Duplicate operation name; invocation messages reach the first one"
                );
            } else {
                self.by_name.insert(key, self.entries.len());
            }

            info!(
                route = %entry.pattern.route(),
                pattern = %entry.pattern.pattern(),
                operation = %entry.descriptor.name,
                "Registered operation"
            );
            self.entries.push(entry);
        }

        self.groups.push(group.descriptor());
        Ok(())
    }

    /// Number of registered operations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full route and compiled pattern of every operation, in registration order
    pub fn routes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.pattern.route(), e.pattern.pattern()))
    }

    /// Descriptor manifest of everything registered so far
    pub fn manifest(&self) -> HandlerManifest {
        let mut types: Vec<TypeDeclaration> = self.catalog.iter().cloned().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        HandlerManifest {
            groups: self.groups.clone(),
            types,
            dtos: Vec::new(),
        }
    }

    /// Answers a raw `{route, payload}` query
    pub fn dispatch(&self, raw: &str) -> QueryReply {
        match serde_json::from_str::<QueryEnvelope>(raw) {
            Ok(envelope) => self.dispatch_envelope(&envelope),
            Err(e) => self.fail("<unparsed>", raw, QueryError::MalformedQuery(e.to_string())),
        }
    }

    pub fn dispatch_envelope(&self, envelope: &QueryEnvelope) -> QueryReply {
        let route = envelope.route.as_str();
        let Some((entry, path_params)) = self.resolve(route) else {
            warn!(route = %route, "No handler registered for route");
            if self.config.strict_routes {
                return QueryReply::from(&QueryError::RouteNotFound(route.to_string()));
            }
            return QueryReply::empty();
        };

        let result = self
            .bind_route_args(entry, &path_params, envelope.payload.as_ref())
            .and_then(|args| call(entry, &args));
        self.finish(route, envelope.payload.as_ref(), result)
    }

    /// Answers a raw `{className, methodName, parameters}` message
    pub fn invoke(&self, raw: &str) -> QueryReply {
        match serde_json::from_str::<MethodCall>(raw) {
            Ok(message) => self.invoke_call(&message),
            Err(e) => self.fail("<unparsed>", raw, QueryError::MalformedQuery(e.to_string())),
        }
    }

    pub fn invoke_call(&self, message: &MethodCall) -> QueryReply {
        let target = format!("{}.{}", message.class_name, message.method_name);
        let parameters = Value::Object(message.parameters.clone());

        let key = (message.class_name.clone(), message.method_name.clone());
        let Some(entry) = self.by_name.get(&key).and_then(|&i| self.entries.get(i)) else {
            let err = QueryError::UnknownOperation {
                group: key.0,
                operation: key.1,
            };
            return self.fail(&target, &parameters.to_string(), err);
        };

        let result = self
            .bind_named_args(entry, &message.parameters)
            .and_then(|args| call(entry, &args));
        self.finish(&target, Some(&parameters), result)
    }

    /// Answers a route query on the blocking pool and completes `callback`
    pub async fn dispatch_async<C: QueryCallback>(self: &Arc<Self>, raw: String, callback: C) {
        let router = Arc::clone(self);
        let reply = tokio::task::spawn_blocking(move || router.dispatch(&raw))
            .await
            .unwrap_or_else(|e| QueryReply::from(&QueryError::internal(e)));
        reply.complete(callback);
    }

    /// Answers a method-invocation message on the blocking pool and completes `callback`
    pub async fn invoke_async<C: QueryCallback>(self: &Arc<Self>, raw: String, callback: C) {
        let router = Arc::clone(self);
        let reply = tokio::task::spawn_blocking(move || router.invoke(&raw))
            .await
            .unwrap_or_else(|e| QueryReply::from(&QueryError::internal(e)));
        reply.complete(callback);
    }

    /// First entry, in registration order, whose pattern matches the whole route
    fn resolve(&self, route: &str) -> Option<(&RouteEntry, HashMap<String, String>)> {
        self.entries
            .iter()
            .find_map(|entry| entry.pattern.matches(route).map(|params| (entry, params)))
    }

    fn bind_route_args(
        &self,
        entry: &RouteEntry,
        path_params: &HashMap<String, String>,
        payload: Option<&Value>,
    ) -> Result<Args, QueryError> {
        let mut names = Vec::with_capacity(entry.descriptor.parameters.len());
        let mut values = Vec::with_capacity(entry.descriptor.parameters.len());

        for param in &entry.descriptor.parameters {
            let value = match path_params.get(&param.name) {
                Some(raw) => coerce_path_value(raw, &param.ty, &self.catalog),
                None => bind_value(payload, &param.ty, &self.catalog),
            }
            .map_err(|reason| QueryError::binding(&param.name, reason))?;

            names.push(param.name.clone());
            values.push(value);
        }
        Ok(Args::new(names, values))
    }

    fn bind_named_args(
        &self,
        entry: &RouteEntry,
        parameters: &Map<String, Value>,
    ) -> Result<Args, QueryError> {
        let mut names = Vec::with_capacity(entry.descriptor.parameters.len());
        let mut values = Vec::with_capacity(entry.descriptor.parameters.len());

        for param in &entry.descriptor.parameters {
            let value = bind_value(parameters.get(&param.name), &param.ty, &self.catalog)
                .map_err(|reason| QueryError::binding(&param.name, reason))?;
            names.push(param.name.clone());
            values.push(value);
        }
        Ok(Args::new(names, values))
    }

    fn finish(
        &self,
        target: &str,
        payload: Option<&Value>,
        result: Result<String, QueryError>,
    ) -> QueryReply {
        match result {
            Ok(response) => {
                debug!(call = %target, response = %response, "Query answered");
                QueryReply::success(response)
            }
            Err(err) => {
                let payload = payload.map(Value::to_string).unwrap_or_default();
                self.fail(target, &payload, err)
            }
        }
    }

    fn fail(&self, target: &str, payload: &str, err: QueryError) -> QueryReply {
        error!(
            call = %target,
            payload = %payload,
            code = err.code(),
            error = %err,
            "Query failed"
        );
        QueryReply::from(&err)
    }
}

/// Invokes the handler, which renders its own reply text. A panicking
/// handler is reported as an internal error.
fn call(entry: &RouteEntry, args: &Args) -> Result<String, QueryError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| (entry.invoker)(args)));
    match outcome {
        Ok(result) => result,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "handler panicked".to_string());
            Err(QueryError::Internal(reason))
        }
    }
}
