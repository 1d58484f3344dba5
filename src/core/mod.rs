//! Shared descriptor model
//!
//! Type descriptors and handler descriptors used by both the query router and
//! the stub generator.

pub mod descriptors;
pub mod error;
pub mod types;

pub use descriptors::{
    HandlerGroupDescriptor, HandlerManifest, OperationDescriptor, ParameterDescriptor,
};
pub use error::Error;
pub use types::{
    DateKind, FieldDescriptor, PrimitiveKind, TypeCatalog, TypeDeclaration, TypeKind, TypeRef,
};
