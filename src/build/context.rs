//! Per-build context handed to parsers, filters and emitters.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::content::{absolutize, FileIdentity, Slug};
use crate::Result;

/// Hidden directory under the content root holding link nodes. Hidden paths
/// are never scanned, so no real source can share an identity with one.
const LINK_NAMESPACE: &str = ".links";

/// Configuration plus the derived values every pipeline stage needs.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub config: Arc<Config>,
    /// Absolute content root.
    pub content_dir: PathBuf,
    /// Absolute output directory.
    pub output_dir: PathBuf,
    /// Absolute static directory, if configured.
    pub static_dir: Option<PathBuf>,
    /// Slugs of every known file, content or not.
    pub all_slugs: BTreeSet<Slug>,
}

impl BuildContext {
    /// Create a context, resolving configured directories to absolute paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let content_dir = absolutize(&config.content_dir)?;
        let output_dir = absolutize(&config.output_dir)?;
        let static_dir = config
            .static_dir
            .as_deref()
            .map(absolutize)
            .transpose()?;

        Ok(Self {
            config,
            content_dir,
            output_dir,
            static_dir,
            all_slugs: BTreeSet::new(),
        })
    }

    /// Whether `id` has a content extension.
    #[must_use]
    pub fn is_content(&self, id: &FileIdentity) -> bool {
        self.config.is_content_file(id.path())
    }

    /// Identity of a path relative to the content root.
    #[must_use]
    pub fn source_identity(&self, relative: impl AsRef<std::path::Path>) -> FileIdentity {
        FileIdentity::under(&self.content_dir, relative)
    }

    /// Slug of a source identity. Files outside the content root fall back
    /// to their file name.
    #[must_use]
    pub fn slug_for(&self, id: &FileIdentity) -> Slug {
        let relative = id
            .relative_to(&self.content_dir)
            .unwrap_or_else(|| id.path().file_name().map(PathBuf::from).unwrap_or_default());
        Slug::from_relative_path(&relative, self.is_content(id))
    }

    /// Graph node standing for "some file has `slug`". Pages linking to
    /// `slug` hang off it, so adding or deleting that file reaches them.
    #[must_use]
    pub fn link_identity(&self, slug: &Slug) -> FileIdentity {
        FileIdentity::under(&self.content_dir.join(LINK_NAMESPACE), slug.as_str())
    }

    /// Whether `id` is a link node rather than a file.
    #[must_use]
    pub fn is_link(&self, id: &FileIdentity) -> bool {
        id.relative_to(&self.content_dir.join(LINK_NAMESPACE)).is_some()
    }

    /// Identity of the artifact written for `slug` with extension `ext`.
    #[must_use]
    pub fn output_identity(&self, slug: &Slug, ext: &str) -> FileIdentity {
        FileIdentity::under(&self.output_dir, format!("{slug}{ext}"))
    }
}
