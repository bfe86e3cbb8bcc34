//! Error types for sysknobs
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//!
//! Very little here can actually fail at runtime: attribute reads are
//! infallible, malformed writes are logged no-ops, and out-of-range values
//! are clamped rather than rejected. What remains is startup plumbing.

use thiserror::Error;

/// Main error type for sysknobs
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Attribute group registration errors
    ///
    /// Fatal to the registering component's feature availability only;
    /// the daemon keeps serving whatever did register.
    #[error("Attribute registration error: {0}")]
    AttrRegistration(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using sysknobs Error
pub type Result<T> = std::result::Result<T, Error>;
