//! Errors reported by an automation handle.

use thiserror::Error;

/// Failure kinds of a single automation call.
///
/// The kind decides how far a failure travels: a missing element costs one
/// field, a stale or unreadable element costs the whole review block, and a
/// navigation failure aborts the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowserError {
    #[error("no such element: {0}")]
    NoSuchElement(String),

    #[error("stale element: {0}")]
    StaleElement(String),

    #[error("script error: {0}")]
    Script(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("automation session disconnected: {0}")]
    Disconnected(String),
}

impl BrowserError {
    /// Recoverable by substituting a default for one field.
    pub fn is_field_level(&self) -> bool {
        matches!(self, Self::NoSuchElement(_))
    }
}

impl From<BrowserError> for reviewsweep_core::Error {
    fn from(e: BrowserError) -> Self {
        reviewsweep_core::Error::Browser(e.to_string())
    }
}

pub type BrowserResult<T> = std::result::Result<T, BrowserError>;
