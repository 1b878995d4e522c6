//! Configuration module for FileHash
//!
//! Provides CLI arguments, the JSON configuration file, and the
//! algorithm/mode/encoding enums shared across the crate.

mod settings;

pub use settings::*;
