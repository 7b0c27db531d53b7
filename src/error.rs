// Error types shared by every stage of an upload.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can abort (or short-circuit) an upload run.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The credential file is missing, unreadable or has no usable token.
    #[error("failed to load credentials from {path}: {reason}")]
    CredentialLoad { path: PathBuf, reason: String },

    /// Session creation was answered with something other than 200.
    #[error("session creation failed with status {status}: {message}")]
    SessionCreation { status: u16, message: String },

    /// The server broke the resumable upload contract (missing header,
    /// malformed range, unexpected error body).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The remote object is already fully received. Not a failure: callers
    /// treat it as "nothing left to do".
    #[error("upload appears to have already completed")]
    AlreadyComplete,

    /// The persisted session is no longer known to the server.
    #[error("upload session has expired (status {status}); the upload must be restarted")]
    SessionExpired { status: u16 },

    /// A chunk was rejected. The session may still be resumable by a later run.
    #[error("chunk upload aborted with status {status}: {message} (session should be resumable)")]
    ChunkUpload { status: u16, message: String },

    /// Local file system failure.
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transport-level failure talking to the endpoint.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for upload operations.
pub type Result<T> = std::result::Result<T, UploadError>;

impl UploadError {
    /// Create an IO error with the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn credential(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CredentialLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
