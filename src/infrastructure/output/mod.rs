//! Artifact writer implementations

pub mod filesystem_output;

pub use filesystem_output::*;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting an artifact
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {}: {source}", path.display())]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Refusing to write outside the output root: {}", path.display())]
    OutsideRoot { path: PathBuf },
}

impl OutputError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            OutputError::CreateDirectory { path, .. }
            | OutputError::WriteFile { path, .. }
            | OutputError::OutsideRoot { path } => path,
        }
    }
}
