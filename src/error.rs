//! Error types for service status queries.

use thiserror::Error;

/// Errors produced by the resolver and the platform backends.
///
/// `exists()` never reports an absent service as an error; only
/// `status()` does. An unrecognized but present status value is not an
/// error either, it surfaces as `CanonicalState::Unknown`.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller passed an unusable service name. Raised before any
    /// OS contact is made.
    #[error("invalid service name: {0}")]
    InvalidArgument(String),

    /// The service is conclusively absent from every applicable backend.
    #[error("service '{0}' not found")]
    NotFound(String),

    /// The service manager could not be reached: connection refused,
    /// permission denied, or every query stage exhausted.
    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, Error>;
