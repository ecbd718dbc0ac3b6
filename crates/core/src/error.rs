//! Error taxonomy for maskdb
//!
//! All errors surface directly to the caller; the store performs no
//! internal retries. Value decode failures are the one condition handled
//! locally (fallback to raw text) and never reach this enum.

use thiserror::Error;

/// Result alias used across the maskdb crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the store and its supporting types.
#[derive(Debug, Error)]
pub enum Error {
    /// Operation attempted on a closed (or never opened) store.
    #[error("store is not initialized")]
    NotInitialized,

    /// Schema already exists and the caller requested strict creation.
    #[error("database already exists at {path}")]
    CantCreateDatabase {
        /// Path the store was opened against.
        path: String,
    },

    /// Unrecognized range operator.
    #[error("unsupported range operator {0:?}")]
    NoOperations(String),

    /// Undeclared feature name, or a target value whose type does not match
    /// the feature's declared kind.
    #[error("unknown or type-mismatched feature {0:?}")]
    FeatureNotFound(String),

    /// A key that must exist (range-scan anchor, `features` subject) does
    /// not.
    #[error("key not found: {0:?}")]
    CantFoundKey(String),

    /// Invalid feature declaration (bad name, reserved name, duplicate, or
    /// a default that does not match the declared kind).
    #[error("invalid feature declaration: {0}")]
    InvalidFeature(String),

    /// Persistence engine failure.
    ///
    /// Carries the engine's message only; the source error is stringified at
    /// the store boundary so this crate stays engine-free.
    #[error("storage error: {message}")]
    Storage {
        /// Message reported by the persistence engine.
        message: String,
    },
}

impl Error {
    /// Build a `Storage` error from any displayable engine failure.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Error::Storage {
            message: err.to_string(),
        }
    }
}
