//! Error types for the generation domain

use thiserror::Error;

/// Errors that can occur during stub generation
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Missing required option '{0}'")]
    MissingOption(String),

    #[error("Invalid value for option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Invalid route: {0}")]
    InvalidRoute(#[from] crate::routing::RouterError),

    #[error("Manifest error: {0}")]
    ManifestError(#[from] crate::core::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl GenerationError {
    pub fn invalid_option<K: Into<String>, R: Into<String>>(key: K, reason: R) -> Self {
        Self::InvalidOption {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<tera::Error> for GenerationError {
    fn from(error: tera::Error) -> Self {
        // Tera nests the useful part of the message in its source chain
        let mut message = error.to_string();
        let mut source = std::error::Error::source(&error);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::RenderError(message)
    }
}
