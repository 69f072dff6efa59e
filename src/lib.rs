//! Folio Library
//!
//! Incremental static site builder: parses a content directory, runs it
//! through filter and emitter plugins, and keeps the output in sync with
//! edits while serving a live preview.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod build;
pub mod config;
pub mod content;
pub mod emit;
pub mod error;
pub mod graph;
pub mod server;
pub mod watcher;

pub use config::Config;
pub use error::{Error, Result};
