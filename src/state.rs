// Persisted session state.
//
// A single file holds the session URL of the upload in progress. Its
// presence means "resume", its absence means "start fresh". It is removed
// once the server confirms the last byte.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, UploadError};

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored session URL, or `None` when there is nothing to resume.
    pub fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(data) => {
                let url = data.trim();
                if url.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(url.to_string()))
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(UploadError::io(&self.path, e)),
        }
    }

    /// Write the session URL via a temp file and rename, so a crash never
    /// leaves a truncated URL behind.
    pub fn save(&self, session_url: &str) -> Result<()> {
        let tmp = self.tmp_path();
        std::fs::write(&tmp, session_url).map_err(|e| UploadError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| UploadError::io(&self.path, e))?;
        debug!(path = %self.path.display(), "persisted upload session");
        Ok(())
    }

    /// Remove the state file. Clearing an absent file is not an error.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed upload session state");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(UploadError::io(&self.path, e)),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
