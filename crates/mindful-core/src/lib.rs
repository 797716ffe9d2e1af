//! Mindful Core: error type, data directories, configuration.

pub mod config;
pub mod error;

pub use config::{DataPaths, MindfulConfig};
pub use error::{Error, Result};
