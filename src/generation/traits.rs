//! Port interfaces for the generation domain

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::generation::Artifact;
use crate::infrastructure::output::OutputError;

/// Supplies template sources by name, e.g. `typescript/service.ts.tera`
pub trait TemplateSource: Send + Sync {
    /// Names of all available templates
    fn names(&self) -> Vec<String>;

    /// Source text of a template
    fn get(&self, name: &str) -> Option<String>;
}

/// Persists generated artifacts
#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    /// Writes one artifact below `root` and returns the full path written
    async fn write(&self, root: &Path, artifact: &Artifact) -> Result<PathBuf, OutputError>;
}
