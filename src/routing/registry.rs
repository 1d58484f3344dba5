//! Handler registration
//!
//! A [`HandlerGroup`] pairs each [`OperationDescriptor`] with an invocation
//! closure. The closure captures whatever instance it needs (usually an
//! `Arc` of the service) and receives the bound arguments as [`Args`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::errors::QueryError;
use super::reply::serialize_result;
use crate::core::descriptors::{HandlerGroupDescriptor, OperationDescriptor};

/// Type-erased invocation handle, yielding the reply text
pub type Invoker = dyn Fn(&Args) -> Result<String, QueryError> + Send + Sync;

/// Arguments bound for one invocation, in declaration order
#[derive(Debug, Clone, Default)]
pub struct Args {
    names: Vec<String>,
    values: Vec<Value>,
}

impl Args {
    pub fn new(names: Vec<String>, values: Vec<Value>) -> Self {
        Self { names, values }
    }

    /// Deserializes the argument at `index` into `T`
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, QueryError> {
        let name = self
            .names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("#{index}"));
        let value = self
            .values
            .get(index)
            .ok_or_else(|| QueryError::binding(&name, "no such argument"))?;
        T::deserialize(value).map_err(|e| QueryError::binding(name, e.to_string()))
    }

    /// Deserializes the argument declared as `name`
    pub fn by_name<T: DeserializeOwned>(&self, name: &str) -> Result<T, QueryError> {
        let index = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| QueryError::binding(name, "no such argument"))?;
        self.get(index)
    }

    pub fn raw(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An operation descriptor together with its invocation handle
#[derive(Clone)]
pub struct BoundOperation {
    pub descriptor: OperationDescriptor,
    pub invoker: Arc<Invoker>,
}

impl fmt::Debug for BoundOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundOperation")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// A handler group under construction
#[derive(Debug, Clone)]
pub struct HandlerGroup {
    name: String,
    route: String,
    path: Option<String>,
    operations: Vec<BoundOperation>,
}

impl HandlerGroup {
    /// Creates a group with a qualified name and a route prefix
    pub fn new<S: Into<String>, R: Into<String>>(name: S, route: R) -> Self {
        Self {
            name: name.into(),
            route: route.into(),
            path: None,
            operations: Vec::new(),
        }
    }

    /// Explicit output directory for the generated service stub
    pub fn with_path<S: Into<String>>(mut self, path: S) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Adds an operation. The handler's result is rendered as reply text; a
    /// rendering failure becomes a serialization error.
    pub fn operation<F, R>(mut self, descriptor: OperationDescriptor, handler: F) -> Self
    where
        F: Fn(&Args) -> Result<R, QueryError> + Send + Sync + 'static,
        R: Serialize,
    {
        let invoker = move |args: &Args| -> Result<String, QueryError> {
            let result = handler(args)?;
            serialize_result(&result)
        };
        self.operations.push(BoundOperation {
            descriptor,
            invoker: Arc::new(invoker),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn operations(&self) -> &[BoundOperation] {
        &self.operations
    }

    /// Descriptor of this group, without invocation handles
    pub fn descriptor(&self) -> HandlerGroupDescriptor {
        HandlerGroupDescriptor {
            name: self.name.clone(),
            route: self.route.clone(),
            path: self.path.clone(),
            operations: self
                .operations
                .iter()
                .map(|op| op.descriptor.clone())
                .collect(),
        }
    }
}
