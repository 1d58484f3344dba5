//! Infrastructure layer - concrete implementations of domain ports

pub mod http;
pub mod output;
pub mod templates;

pub use output::{FileSystemArtifactWriter, OutputError};
pub use templates::EmbeddedTemplateSource;
