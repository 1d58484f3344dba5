//! Filesystem-based artifact writer

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::OutputError;
use crate::generation::{Artifact, ArtifactWriter};

/// Writes artifacts below an output root on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemArtifactWriter;

impl FileSystemArtifactWriter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArtifactWriter for FileSystemArtifactWriter {
    async fn write(&self, root: &Path, artifact: &Artifact) -> Result<PathBuf, OutputError> {
        let escapes = artifact
            .path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(OutputError::OutsideRoot {
                path: artifact.path.clone(),
            });
        }

        let path = root.join(&artifact.path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| OutputError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let write_error = |source| OutputError::WriteFile {
            path: path.clone(),
            source,
        };

        let mut file = fs::File::create(&path).await.map_err(write_error)?;
        file.write_all(artifact.content.as_bytes())
            .await
            .map_err(write_error)?;
        file.flush().await.map_err(write_error)?;

        tracing::debug!(path = %path.display(), kind = %artifact.kind, "Wrote artifact");
        Ok(path)
    }
}
