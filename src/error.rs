//! use rootca::error::RootCaError;

use std::path::PathBuf;

use thiserror::Error;

/// Represents errors that can occur while issuing or loading a root CA.
///
/// Every variant carries enough context to tell which step failed and why.
#[derive(Debug, Error)]
pub enum RootCaError {
    /// The OS random source could not be read.
    #[error("Entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    /// The template could not be encoded or the signing primitive rejected it.
    #[error("Failed to sign certificate: {0}")]
    SigningFailure(String),

    /// Reading or writing a persisted artifact failed.
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Neither a certificate path nor a key path was given.
    #[error("Certificate or key path has not been provided")]
    MissingInput,

    /// A persisted certificate or key could not be parsed, or they do not match.
    #[error("Malformed artifact: {0}")]
    MalformedArtifact(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RootCaError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RootCaError::Storage {
            path: path.into(),
            source,
        }
    }
}

impl From<rand_core::Error> for RootCaError {
    fn from(err: rand_core::Error) -> Self {
        RootCaError::EntropyUnavailable(err.to_string())
    }
}

impl From<pem::PemError> for RootCaError {
    fn from(err: pem::PemError) -> Self {
        RootCaError::MalformedArtifact(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RootCaError>;
