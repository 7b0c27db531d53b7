// Upload orchestration.
//
// Drives one file through the resumable protocol:
//
// 1. load the token and probe the file size,
// 2. decide between a fresh session and resuming the persisted one,
// 3. send chunks until the server reports completion,
// 4. clear the persisted session.
//
// Any error aborts the run and leaves the persisted session untouched, so
// the next invocation can pick up where this one stopped.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::chunk::ChunkResult;
use crate::client::UploadClient;
use crate::config::UploadConfig;
use crate::credentials::CredentialProvider;
use crate::error::{Result, UploadError};
use crate::plan::TransferPlan;
use crate::state::SessionStore;

/// What to upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub path: PathBuf,
    pub mime_type: String,
    /// Remote object name; defaults to the file name of `path`.
    pub name: Option<String>,
}

impl UploadRequest {
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.into(),
            name: None,
        }
    }

    pub fn object_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// All bytes are stored remotely.
    Uploaded {
        bytes: u64,
        /// Offset the run resumed from, `None` for a fresh session.
        resumed_from: Option<u64>,
    },
    /// The persisted session was already complete; nothing was sent.
    AlreadyComplete,
}

/// Result of deciding fresh-vs-resume.
enum SessionStart {
    Fresh(String),
    Resumed { session_url: String, offset: u64 },
    AlreadyComplete,
}

pub struct Uploader<C> {
    config: UploadConfig,
    credentials: C,
    store: SessionStore,
    progress: ProgressBar,
}

impl<C: CredentialProvider> Uploader<C> {
    pub fn new(config: UploadConfig, credentials: C) -> Result<Self> {
        config.validate()?;
        let store = SessionStore::new(&config.state_path);
        Ok(Self {
            config,
            credentials,
            store,
            progress: ProgressBar::hidden(),
        })
    }

    /// Report the cursor through `bar` instead of the default hidden one.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = bar;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Upload `request.path`, resuming a persisted session if there is one.
    pub fn run(&self, request: &UploadRequest) -> Result<UploadOutcome> {
        let token = self.credentials.access_token()?;
        let file_size = probe_file_size(&request.path)?;
        let plan = TransferPlan::new(file_size, self.config.chunk_size)?;
        let client = UploadClient::new(&self.config, token)?;

        let (session_url, cursor, resumed_from) =
            match self.open_session(&client, request, file_size)? {
                SessionStart::Fresh(url) => (url, 0, None),
                SessionStart::Resumed {
                    session_url,
                    offset,
                } => (session_url, offset, Some(offset)),
                SessionStart::AlreadyComplete => {
                    info!("upload appears to have completed already; nothing to send");
                    self.store.clear()?;
                    return Ok(UploadOutcome::AlreadyComplete);
                }
            };

        info!(
            file_size,
            chunks = plan.total_chunks(),
            full_chunks = plan.full_chunk_count,
            chunk_size = plan.chunk_size,
            final_chunk_size = plan.remainder_size,
            "planned transfer"
        );

        let bytes = if file_size == 0 {
            0
        } else {
            self.transfer(&client, &session_url, &request.path, &plan, cursor)?
        };

        // `transfer` only returns once every byte is stored.
        info!(bytes, path = %self.store.path().display(), "upload complete, removing session state");
        self.store.clear()?;
        Ok(UploadOutcome::Uploaded {
            bytes,
            resumed_from,
        })
    }

    fn open_session(
        &self,
        client: &UploadClient,
        request: &UploadRequest,
        file_size: u64,
    ) -> Result<SessionStart> {
        match self.store.load()? {
            None => {
                let url = client.begin_session(&request.object_name(), &request.mime_type)?;
                self.store.save(&url)?;
                Ok(SessionStart::Fresh(url))
            }
            Some(url) => match client.resume_session(&url, file_size) {
                Ok(offset) => Ok(SessionStart::Resumed {
                    session_url: url,
                    offset,
                }),
                Err(UploadError::AlreadyComplete) => Ok(SessionStart::AlreadyComplete),
                Err(e) => Err(e),
            },
        }
    }

    /// Send chunks from `cursor` until the server reports completion or the
    /// cursor reaches the end of the file. Returns the bytes known stored.
    fn transfer(
        &self,
        client: &UploadClient,
        session_url: &str,
        source: &Path,
        plan: &TransferPlan,
        mut cursor: u64,
    ) -> Result<u64> {
        info!(cursor, "uploading");
        self.progress.set_length(plan.file_size);
        self.progress.set_position(cursor);

        while cursor < plan.file_size {
            let len = plan.chunk_len_at(cursor);
            match client.send_chunk(session_url, source, cursor, len, plan.file_size)? {
                ChunkResult::Continue(next) => {
                    cursor = next;
                    self.progress.set_position(cursor);
                }
                ChunkResult::Complete(total) => {
                    if cursor + len < plan.file_size {
                        warn!(
                            sent_through = cursor + len,
                            file_size = plan.file_size,
                            "server reported completion before the last chunk"
                        );
                    }
                    self.progress.finish();
                    return Ok(total);
                }
            }
        }

        warn!(
            cursor,
            "every byte was acknowledged but the server never reported completion"
        );
        self.progress.finish();
        Ok(cursor)
    }
}

/// Size of the source, which must be a regular file.
pub fn probe_file_size(path: &Path) -> Result<u64> {
    let meta = std::fs::metadata(path).map_err(|e| UploadError::io(path, e))?;
    if !meta.is_file() {
        return Err(UploadError::io(
            path,
            std::io::Error::new(ErrorKind::InvalidInput, "not a regular file"),
        ));
    }
    Ok(meta.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticToken;
    use tempfile::TempDir;

    #[test]
    fn object_name_defaults_to_file_name() {
        let request = UploadRequest::new("/videos/holiday/clip.mov", "video/quicktime");
        assert_eq!(request.object_name(), "clip.mov");

        let named = UploadRequest {
            name: Some("renamed.mov".into()),
            ..request
        };
        assert_eq!(named.object_name(), "renamed.mov");
    }

    #[test]
    fn directory_is_not_uploadable() {
        let dir = TempDir::new().unwrap();
        match probe_file_size(dir.path()) {
            Err(UploadError::Io { source, .. }) => assert_eq!(source.kind(), ErrorKind::InvalidInput),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = UploadConfig {
            chunk_size: 0,
            ..UploadConfig::default()
        };
        assert!(Uploader::new(config, StaticToken("t".into())).is_err());
    }

    #[test]
    fn missing_source_aborts_before_any_request() {
        let dir = TempDir::new().unwrap();
        let config = UploadConfig {
            endpoint: "http://127.0.0.1:9/unreachable".into(),
            state_path: dir.path().join("state"),
            ..UploadConfig::default()
        };
        let uploader = Uploader::new(config, StaticToken("t".into())).unwrap();
        let result = uploader.run(&UploadRequest::new(dir.path().join("missing.bin"), "x/y"));
        assert!(matches!(result, Err(UploadError::Io { .. })));
        assert!(!dir.path().join("state").exists());
    }
}
