//! Error types and Result aliases for Folio.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.

use thiserror::Error;

/// Result type alias using Folio's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Folio operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Content parsing error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Emitter error.
    #[error("emit error: {0}")]
    Emit(#[from] EmitError),

    /// Dependency graph error.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// Server error.
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Content parsing errors.
#[derive(Error, Debug)]
pub enum ParseError {
    /// File could not be read.
    #[error("failed to read '{path}': {reason}")]
    Read { path: String, reason: String },

    /// File content is malformed.
    #[error("malformed content in '{path}': {reason}")]
    Malformed { path: String, reason: String },

    /// File lies outside the content root.
    #[error("'{path}' is not under the content directory")]
    OutsideRoot { path: String },
}

/// Emitter errors, always tagged with the emitter that raised them.
#[derive(Error, Debug)]
pub enum EmitError {
    /// Emitter failed while producing artifacts.
    #[error("emitter `{emitter}` failed: {reason}")]
    Failed { emitter: String, reason: String },

    /// Emitter failed while computing its dependency graph.
    #[error("emitter `{emitter}` could not compute dependencies: {reason}")]
    Dependencies { emitter: String, reason: String },

    /// Two emitters registered under the same name.
    #[error("duplicate emitter name `{0}`")]
    Duplicate(String),

    /// No emitter or filter registered under this name.
    #[error("unknown plugin `{0}`")]
    UnknownPlugin(String),
}

/// Dependency graph errors.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A single-node graph described nodes other than the target.
    #[error("graph for '{target}' also describes '{foreign}'")]
    ForeignNode { target: String, foreign: String },

    /// Graph and content store disagree.
    #[error("'{path}' is referenced by emitter `{emitter}` but missing from the content store")]
    Inconsistent { emitter: String, path: String },
}

/// File watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to watch path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// Invalid ignore pattern.
    #[error("invalid ignore pattern: {0}")]
    Pattern(String),

    /// Event queue closed.
    #[error("event queue closed")]
    QueueClosed,
}

/// Server errors.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("failed to bind to {address}: {reason}")]
    BindFailed { address: String, reason: String },

    /// Request handling error.
    #[error("request error: {0}")]
    Request(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the session can keep going after this error.
    ///
    /// Configuration and server errors end the process; everything else
    /// is scoped to a single build attempt.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Server(_))
    }
}

impl ParseError {
    /// Create a read error for a path.
    pub fn read(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::Read {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a malformed-content error for a path.
    pub fn malformed(path: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

impl EmitError {
    /// Create an emit failure tagged with the emitter name.
    pub fn failed(emitter: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Failed {
            emitter: emitter.into(),
            reason: reason.to_string(),
        }
    }

    /// Name of the emitter involved, if any.
    #[must_use]
    pub fn emitter(&self) -> Option<&str> {
        match self {
            Self::Failed { emitter, .. } | Self::Dependencies { emitter, .. } => Some(emitter),
            Self::Duplicate(name) => Some(name),
            Self::UnknownPlugin(_) => None,
        }
    }
}
