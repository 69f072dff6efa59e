//! Artifact writes under the output directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::content::{FileIdentity, Slug};
use crate::{Error, Result};

/// Writes `<output>/<slug><ext>`, creating parent directories.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    output_dir: PathBuf,
}

impl OutputWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write one artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the target escapes the output directory or the
    /// write fails.
    pub async fn write(
        &self,
        slug: &Slug,
        ext: &str,
        contents: impl AsRef<[u8]> + Send,
    ) -> Result<FileIdentity> {
        let target = self.target(format!("{slug}{ext}"))?;
        ensure_parent(target.path()).await?;
        tokio::fs::write(target.path(), contents).await?;
        Ok(target)
    }

    /// Copy `source` to `relative` under the output directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the target escapes the output directory or the
    /// copy fails.
    pub async fn copy(&self, source: &Path, relative: &Path) -> Result<FileIdentity> {
        let target = self.target(relative)?;
        ensure_parent(target.path()).await?;
        tokio::fs::copy(source, target.path()).await?;
        Ok(target)
    }

    /// Delete one artifact. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists and cannot be removed.
    pub async fn remove(&self, artifact: &FileIdentity) -> Result<bool> {
        match tokio::fs::remove_file(artifact.path()).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Recursively delete the output directory. A missing directory is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists and cannot be removed.
    pub async fn clean(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.output_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn target(&self, relative: impl AsRef<Path>) -> Result<FileIdentity> {
        let target = FileIdentity::under(&self.output_dir, relative);
        if target.relative_to(&self.output_dir).is_none() {
            return Err(Error::internal(format!(
                "artifact {target} would be written outside {}",
                self.output_dir.display()
            )));
        }
        Ok(target)
    }
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}
