//! Core types for the generation domain

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// What a generated file declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Client class for a handler group
    Service,
    Interface,
    Enum,
    /// Runtime helper shared by every stub
    Support,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Service => write!(f, "service"),
            ArtifactKind::Interface => write!(f, "interface"),
            ArtifactKind::Enum => write!(f, "enum"),
            ArtifactKind::Support => write!(f, "support"),
        }
    }
}

/// Generated artifact
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// Path relative to the output root
    pub path: PathBuf,
    pub content: String,
    pub kind: ArtifactKind,
    /// Qualified name of the declaration, or the template name for support files
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A message for the build's diagnostic channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Declaration the message is about
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn error<S: Into<String>, M: Into<String>>(subject: S, message: M) -> Self {
        Self {
            severity: Severity::Error,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn warning<S: Into<String>, M: Into<String>>(subject: S, message: M) -> Self {
        Self {
            severity: Severity::Warning,
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Logs the diagnostic at the matching level
    pub fn log(&self) {
        match self.severity {
            Severity::Warning => {
                tracing::warn!(subject = %self.subject, "{}", self.message)
            }
            Severity::Error => {
                tracing::error!(subject = %self.subject, "{}", self.message)
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{level}: {}: {}", self.subject, self.message)
    }
}

/// Outcome of a generation run
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// Files written, relative to the output root, in write order
    pub written: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationReport {
    /// Records and logs a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}
