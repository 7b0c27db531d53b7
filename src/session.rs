// Upload session management: creating a resumable session and asking an
// existing one how far it got.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::header::{CONTENT_RANGE, LOCATION, RANGE};
use serde::Serialize;
use tracing::info;

use crate::client::{server_message, UploadClient};
use crate::error::{Result, UploadError};

/// Status the server uses for "session alive, more bytes expected".
pub const RESUME_INCOMPLETE: u16 = 308;

/// Metadata sent when a session is created.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SessionMetadata<'a> {
    mime_type: &'a str,
    name: &'a str,
}

impl UploadClient {
    /// Open a resumable session for `name` and return its session URL.
    pub fn begin_session(&self, name: &str, mime_type: &str) -> Result<String> {
        info!(object = name, mime_type, "requesting creation of upload session");
        let metadata = SessionMetadata { mime_type, name };
        let res = self
            .authorized(self.http.post(&self.endpoint))
            .query(&[("uploadType", "resumable")])
            .json(&metadata)
            .send()?;

        let status = res.status().as_u16();
        if status != 200 {
            let body = res.text()?;
            let message = server_message(status, &body)?;
            return Err(UploadError::SessionCreation { status, message });
        }

        let location = res
            .headers()
            .get(LOCATION)
            .ok_or_else(|| {
                UploadError::Protocol("session creation response has no Location header".into())
            })?
            .to_str()
            .map_err(|e| UploadError::Protocol(format!("Location header is not text: {e}")))?
            .to_string();
        info!(session_url = %location, "upload session created");
        Ok(location)
    }

    /// Ask the server which bytes it already holds and return the offset of
    /// the next byte to send.
    ///
    /// A status below 308 means the object is already complete
    /// ([`UploadError::AlreadyComplete`]); above 308 means the session is
    /// gone ([`UploadError::SessionExpired`]).
    pub fn resume_session(&self, session_url: &str, file_size: u64) -> Result<u64> {
        info!(session_url, "querying upload session progress");
        let res = self
            .authorized(self.http.put(session_url))
            .header(CONTENT_RANGE, format!("bytes */{file_size}"))
            .body(Vec::new())
            .send()?;

        let status = res.status().as_u16();
        if status < RESUME_INCOMPLETE {
            return Err(UploadError::AlreadyComplete);
        }
        if status > RESUME_INCOMPLETE {
            return Err(UploadError::SessionExpired { status });
        }

        let Some(range) = res.headers().get(RANGE) else {
            info!("server holds no bytes yet, resuming from 0");
            return Ok(0);
        };
        let range = range
            .to_str()
            .map_err(|e| UploadError::Protocol(format!("Range header is not text: {e}")))?;
        let next = parse_acknowledged_range(range)?;
        if next > file_size {
            return Err(UploadError::Protocol(format!(
                "server acknowledged {next} bytes of a {file_size} byte file"
            )));
        }
        info!(range, next, "resuming upload");
        Ok(next)
    }
}

/// Parse a `Range: bytes=0-N` response header into the next offset (`N + 1`).
pub fn parse_acknowledged_range(value: &str) -> Result<u64> {
    static MATCHER: OnceLock<Regex> = OnceLock::new();
    let matcher = MATCHER.get_or_init(|| {
        Regex::new(r"bytes\D\d+-(\d+)").expect("range pattern is a valid regex")
    });

    let end = matcher
        .captures(value)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| UploadError::Protocol(format!("unrecognised Range header '{value}'")))?
        .as_str()
        .parse::<u64>()
        .map_err(|e| UploadError::Protocol(format!("Range end in '{value}': {e}")))?;
    end.checked_add(1)
        .ok_or_else(|| UploadError::Protocol(format!("Range end in '{value}' overflows")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_end_plus_one_is_next_offset() {
        assert_eq!(parse_acknowledged_range("bytes=0-99").unwrap(), 100);
        assert_eq!(parse_acknowledged_range("bytes=0-262143").unwrap(), 262_144);
    }

    #[test]
    fn any_non_digit_separator_after_bytes_is_accepted() {
        assert_eq!(parse_acknowledged_range("bytes 0-0").unwrap(), 1);
        assert_eq!(parse_acknowledged_range("bytes:0-524287").unwrap(), 524_288);
    }

    #[test]
    fn malformed_range_is_protocol_error() {
        for value in ["", "bytes=abc", "0-99", "bytes=0-", "items=0-99"] {
            assert!(
                matches!(parse_acknowledged_range(value), Err(UploadError::Protocol(_))),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn overflowing_range_is_protocol_error() {
        assert!(parse_acknowledged_range("bytes=0-18446744073709551615").is_err());
        assert!(parse_acknowledged_range("bytes=0-99999999999999999999999").is_err());
    }

    #[test]
    fn metadata_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(SessionMetadata {
            mime_type: "video/quicktime",
            name: "clip.mov",
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"mimeType": "video/quicktime", "name": "clip.mov"})
        );
    }
}
