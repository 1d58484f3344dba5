//! Embedded template store

use rust_embed::RustEmbed;
use tracing::warn;

use crate::generation::TemplateSource;

/// Container for all templates embedded at compile time
#[derive(RustEmbed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

/// Top-level folders that hold templates
const TEMPLATE_DIRS: [&str; 2] = ["typescript/", "support/"];

/// Template source backed by the templates compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedTemplateSource;

impl EmbeddedTemplateSource {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateSource for EmbeddedTemplateSource {
    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = EmbeddedTemplates::iter()
            .filter(|path| TEMPLATE_DIRS.iter().any(|dir| path.starts_with(dir)))
            .map(|path| path.into_owned())
            .collect();
        names.sort();
        names
    }

    fn get(&self, name: &str) -> Option<String> {
        let file = EmbeddedTemplates::get(name)?;
        match String::from_utf8(file.data.into_owned()) {
            Ok(content) => Some(content),
            Err(e) => {
                warn!(template = %name, error = %e, "Embedded template is not valid UTF-8");
                None
            }
        }
    }
}
