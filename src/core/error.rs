//! Error handling for handler manifests and type descriptors.
//!
//! This module defines the error type `Error` used when descriptor data is
//! parsed or loaded, along with a convenient `Result` type alias. It uses
//! `thiserror` and implements conversions from the common I/O and parsing
//! errors.
//!
//! # Examples
//!
//! ```
//! use hostbridge::core::error::{Error, Result};
//!
//! fn might_fail() -> Result<()> {
//!     Err(Error::type_syntax("list<", "unterminated type arguments"))
//! }
//!
//! assert!(might_fail().is_err());
//! ```

use thiserror::Error;

/// Result type for descriptor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for descriptor operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A type expression could not be parsed
    #[error("Invalid type '{input}': {reason}")]
    TypeSyntax { input: String, reason: String },

    /// Manifest content is inconsistent
    #[error("Manifest error: {0}")]
    Manifest(String),
}

impl Error {
    /// Create a new type syntax error
    pub fn type_syntax<S: Into<String>, R: Into<String>>(input: S, reason: R) -> Self {
        Self::TypeSyntax {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a new manifest error
    pub fn manifest<S: Into<String>>(msg: S) -> Self {
        Self::Manifest(msg.into())
    }
}
