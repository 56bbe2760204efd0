//! ReviewSweep Core: shared error taxonomy, configuration, data paths.

pub mod config;
pub mod error;

pub use config::{DataPaths, SweepConfig};
pub use error::{Error, Result};
