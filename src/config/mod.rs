//! Configuration management for Folio.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables
//! - Built-in defaults (lowest priority)

mod settings;

pub use settings::{Config, DEFAULT_EMITTERS, DEFAULT_FILTERS, DEFAULT_IGNORE_PATTERNS};
