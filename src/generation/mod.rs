//! Generation domain module - TypeScript stub generation
//!
//! Scans a handler manifest for every reachable type, renders one stub per
//! handler group and per declared type, adds the shared support files and
//! hands the results to an [`ArtifactWriter`].

pub mod config;
pub mod errors;
pub mod orchestrator;
pub mod paths;
pub mod renderer;
pub mod scanner;
pub mod support;
pub mod traits;
pub mod type_mapper;
pub mod types;

pub use config::{GeneratorOptions, OptionMap, ServiceFlavor, StubStyle};
pub use errors::*;
pub use orchestrator::*;
pub use traits::*;
pub use types::*;
