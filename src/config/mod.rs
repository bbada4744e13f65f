//! Configuration management for the sheet editor
//!
//! A single JSON file under the platform config directory, created with
//! defaults on first run and clamped to sane ranges on every load.

mod settings;

pub use settings::{Config, ExportSettings};
