//! Configuration settings and validation.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Default ignore patterns, matched gitignore-style against the content root.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[".obsidian", "private", "templates"];

/// Default ordered filter plugins.
pub const DEFAULT_FILTERS: &[&str] = &["RemoveDrafts"];

/// Default ordered emitter plugins.
pub const DEFAULT_EMITTERS: &[&str] = &["ContentPage", "ContentIndex", "Static"];

/// Main configuration for a Folio build.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of the content files.
    pub content_dir: PathBuf,

    /// Directory generated artifacts are written to.
    pub output_dir: PathBuf,

    /// Optional directory copied verbatim to `<output>/static`.
    pub static_dir: Option<PathBuf>,

    /// Gitignore-style patterns excluded from the build.
    pub ignore_patterns: Vec<String>,

    /// File extensions (without the dot) treated as content.
    pub content_extensions: Vec<String>,

    /// Use fine-grained partial rebuilds instead of debounced full rebuilds.
    pub fast_rebuild: bool,

    /// Keep watching after the initial build.
    pub serve: bool,

    /// Log every emitted artifact.
    pub verbose: bool,

    /// Host address the preview server binds to.
    pub host: String,

    /// Port the preview server listens on.
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub log_json: bool,

    /// Ordered filter plugin names.
    pub filters: Vec<String>,

    /// Ordered emitter plugin names.
    pub emitters: Vec<String>,

    /// Site title used by page emitters.
    pub site_title: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("./content"),
            output_dir: PathBuf::from("./public"),
            static_dir: None,
            ignore_patterns: to_strings(DEFAULT_IGNORE_PATTERNS),
            content_extensions: vec!["md".to_string()],
            fast_rebuild: false,
            serve: false,
            verbose: false,
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_json: false,
            filters: to_strings(DEFAULT_FILTERS),
            emitters: to_strings(DEFAULT_EMITTERS),
            site_title: "Folio".to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration for the given content and output directories.
    #[must_use]
    pub fn for_dirs(content_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.content_dir.as_os_str().is_empty() {
            return Err(Error::config("content directory cannot be empty"));
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::config("output directory cannot be empty"));
        }

        // The output directory is wiped on every full build
        let content = crate::content::absolutize(&self.content_dir)?;
        let output = crate::content::absolutize(&self.output_dir)?;
        if content.starts_with(&output) {
            return Err(Error::config(format!(
                "output directory {} would contain the content directory {}",
                self.output_dir.display(),
                self.content_dir.display()
            )));
        }

        if self.content_extensions.is_empty() {
            return Err(Error::config("at least one content extension is required"));
        }

        if let Some(ext) = self
            .content_extensions
            .iter()
            .find(|e| e.is_empty() || e.starts_with('.'))
        {
            return Err(Error::config(format!(
                "invalid content extension '{ext}', expected a bare extension such as 'md'"
            )));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.serve {
            if self.port == 0 {
                return Err(Error::config("port cannot be 0"));
            }
            if self.host.is_empty() {
                return Err(Error::config("host cannot be empty"));
            }
        }

        Ok(())
    }

    /// Whether a path has one of the content extensions.
    #[must_use]
    pub fn is_content_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.content_extensions
                    .iter()
                    .any(|e| e.eq_ignore_ascii_case(ext))
            })
    }

    /// Get the server address as a string.
    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
