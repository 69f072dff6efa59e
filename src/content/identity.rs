//! File identities: the universal key of the build.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Canonical absolute path of a source file or generated artifact.
///
/// Normalization is lexical so that identities of deleted files still
/// compare equal to the ones recorded when the files existed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileIdentity(PathBuf);

impl FileIdentity {
    /// Create an identity from a path, normalizing it lexically.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(normalize_path(path.as_ref()))
    }

    /// Create an identity for `relative` under `root`.
    pub fn under(root: impl AsRef<Path>, relative: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join(relative))
    }

    /// The normalized path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Path relative to `root`, if this identity lies under it.
    #[must_use]
    pub fn relative_to(&self, root: &Path) -> Option<PathBuf> {
        self.0
            .strip_prefix(normalize_path(root))
            .ok()
            .map(Path::to_path_buf)
    }

    /// Lowercased extension, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.0
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for FileIdentity {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl From<&Path> for FileIdentity {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for FileIdentity {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

/// Fold `.` and `..` components without touching the filesystem.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Make a path absolute against the current directory, then normalize it.
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined.
pub fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(normalize_path(path))
    } else {
        Ok(normalize_path(&std::env::current_dir()?.join(path)))
    }
}
