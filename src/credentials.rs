// Credential loading. Obtaining or refreshing the token is somebody else's
// job; this module only reads a bearer token that already exists.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Result, UploadError};

/// Anything that can hand out a bearer token for the upload endpoint.
pub trait CredentialProvider {
    fn access_token(&self) -> Result<String>;
}

/// Shape of the stored token file. Only `access_token` is required; other
/// OAuth fields (refresh token, expiry...) are ignored.
#[derive(Deserialize, Debug)]
struct StoredToken {
    access_token: String,
}

/// Reads the token from a JSON file each time it is asked.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialProvider for TokenFile {
    fn access_token(&self) -> Result<String> {
        let data = std::fs::read_to_string(&self.path)
            .map_err(|e| UploadError::credential(&self.path, e.to_string()))?;
        let token: StoredToken = serde_json::from_str(&data)
            .map_err(|e| UploadError::credential(&self.path, e.to_string()))?;
        let access_token = token.access_token.trim();
        if access_token.is_empty() {
            return Err(UploadError::credential(&self.path, "access_token is empty"));
        }
        Ok(access_token.to_string())
    }
}

/// A token known up front, e.g. injected by a wrapper script or a test.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl CredentialProvider for StaticToken {
    fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn token_file(contents: &str) -> (TempDir, TokenFile) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, contents).unwrap();
        (dir, TokenFile::new(path))
    }

    #[test]
    fn reads_access_token_and_ignores_other_fields() {
        let (_dir, file) = token_file(
            r#"{"access_token":"ya29.abc","refresh_token":"1//x","expiry_date":1700000000}"#,
        );
        assert_eq!(file.access_token().unwrap(), "ya29.abc");
    }

    #[test]
    fn missing_file_is_credential_error() {
        let dir = TempDir::new().unwrap();
        let file = TokenFile::new(dir.path().join("nope.json"));
        assert!(matches!(
            file.access_token(),
            Err(UploadError::CredentialLoad { .. })
        ));
    }

    #[test]
    fn malformed_json_is_credential_error() {
        let (_dir, file) = token_file("not json");
        assert!(matches!(
            file.access_token(),
            Err(UploadError::CredentialLoad { .. })
        ));
    }

    #[test]
    fn missing_field_is_credential_error() {
        let (_dir, file) = token_file(r#"{"token":"abc"}"#);
        assert!(matches!(
            file.access_token(),
            Err(UploadError::CredentialLoad { .. })
        ));
    }

    #[test]
    fn blank_token_is_credential_error() {
        let (_dir, file) = token_file(r#"{"access_token":"  "}"#);
        assert!(file.access_token().is_err());
    }
}
