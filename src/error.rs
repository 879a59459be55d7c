//! Error taxonomy.
//!
//! Only `Validation` is ever returned to callers of the public surface
//! (saving a region with a bad country code). Provider and cache
//! failures are best-effort concerns: the resolver recovers locally,
//! logs them, and leaves the affected regions unresolved.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A region field failed validation at save time.
    #[error("validation failed on `{field}`: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// The weather provider was unreachable, timed out, or returned a
    /// malformed top-level response. Recovered inside the resolver.
    #[error("weather fetch failed: {0}")]
    Fetch(String),

    /// The weather cache was unavailable. Recovered by degrading to
    /// always-fetch.
    #[error("weather cache unavailable: {0}")]
    Cache(String),
}

impl Error {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
