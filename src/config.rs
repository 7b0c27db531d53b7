// Configuration for an upload run. Everything the original one-file script
// kept in globals (endpoint, token path, state path, chunk size) lives here
// and is handed to the `Uploader` when it is built.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::error::{Result, UploadError};

/// Resumable upload endpoint for Google Drive v3.
pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/upload/drive/v3/files";

/// 256 KiB. Drive requires every chunk except the last to be a multiple of this.
pub const DEFAULT_CHUNK_SIZE: u64 = 256 * 1024;

pub const DEFAULT_MIME_TYPE: &str = "video/quicktime";

pub const DEFAULT_TOKEN_FILE: &str = "token.json";

/// Session URL of the pending upload, relative to the working directory.
pub const DEFAULT_STATE_FILE: &str = ".upload-session";

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Base URL that accepts `POST ?uploadType=resumable`.
    pub endpoint: String,
    /// JSON file holding an `access_token` field.
    pub token_path: PathBuf,
    /// Where the session URL of an unfinished upload is kept.
    pub state_path: PathBuf,
    pub chunk_size: u64,
    /// `None` keeps the HTTP client's default timeout.
    pub request_timeout: Option<Duration>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token_path: default_token_path(),
            state_path: PathBuf::from(DEFAULT_STATE_FILE),
            chunk_size: DEFAULT_CHUNK_SIZE,
            request_timeout: None,
        }
    }
}

impl UploadConfig {
    /// Reject settings that would make the transfer loop meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(UploadError::InvalidConfig(
                "chunk size must be greater than zero".into(),
            ));
        }
        if self.endpoint.trim().is_empty() {
            return Err(UploadError::InvalidConfig("endpoint must not be empty".into()));
        }
        if self.chunk_size % DEFAULT_CHUNK_SIZE != 0 {
            warn!(
                chunk_size = self.chunk_size,
                "chunk size is not a multiple of 256 KiB; some endpoints will reject it"
            );
        }
        Ok(())
    }
}

/// Prefer `./token.json`, then fall back to `~/.drive-upload/token.json`.
pub fn default_token_path() -> PathBuf {
    let local = Path::new(DEFAULT_TOKEN_FILE);
    if local.exists() {
        return local.to_path_buf();
    }
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(".drive-upload").join(DEFAULT_TOKEN_FILE)
}
