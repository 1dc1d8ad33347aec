//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
///
/// These describe faults in the collaborators (database, keyring, files).
/// Pipeline outcomes are reported as [`crate::FailureReason`] instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential storage error.
    #[error("Credential error: {0}")]
    Credential(#[from] crate::identity::CredentialError),

    /// The provisioning worker is no longer accepting requests.
    #[error("Provisioning worker has shut down")]
    WorkerClosed,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
