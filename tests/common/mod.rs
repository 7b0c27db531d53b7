//! Common test utilities.
//!
//! The upload client is blocking, so the mock server lives on its own tokio
//! runtime and tests call the client from the plain test thread.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer, Request};

use drive_upload_cli::config::UploadConfig;

pub const TOKEN: &str = "test-token";
pub const UPLOAD_PATH: &str = "/upload/drive/v3/files";
pub const SESSION_PATH: &str = "/session/abc123";
pub const CHUNK: u64 = 262_144;

/// Mock endpoint plus the runtime it runs on. `server` is declared first so
/// it is dropped (and its expectations verified) before the runtime.
pub struct TestServer {
    pub server: MockServer,
    rt: Runtime,
}

impl TestServer {
    pub fn start() -> Self {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    pub fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.uri(), UPLOAD_PATH)
    }

    pub fn session_url(&self) -> String {
        format!("{}{}", self.uri(), SESSION_PATH)
    }

    pub fn received(&self) -> Vec<Request> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    /// `Content-Range` values of every PUT, in order.
    pub fn content_ranges(&self) -> Vec<String> {
        self.received()
            .iter()
            .filter(|r| r.method.as_str() == "PUT")
            .filter_map(|r| r.headers.get("content-range"))
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }
}

/// Scratch directory holding the source file and the session state file.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join(".upload-session")
    }

    /// Write a `len` byte file with a recognisable pattern and return its path.
    pub fn source_file(&self, name: &str, len: usize) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, pattern(len)).unwrap();
        path
    }

    pub fn config(&self, server: &TestServer) -> UploadConfig {
        UploadConfig {
            endpoint: server.endpoint(),
            token_path: self.dir.path().join("token.json"),
            state_path: self.state_path(),
            chunk_size: CHUNK,
            request_timeout: Some(Duration::from_secs(10)),
        }
    }
}

pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub fn error_body(code: u16, message: &str) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": code,
            "message": message,
            "errors": [{"domain": "global", "reason": "test", "message": message}]
        }
    })
}
