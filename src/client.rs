// HTTP client module: a small blocking client that talks to a resumable
// upload endpoint. Session calls live in `session`, chunk PUTs in `chunk`;
// this file holds what they share (the reqwest client, the bearer token and
// the error-body envelope).

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::AUTHORIZATION;
use reqwest::redirect::Policy;
use serde::Deserialize;

use crate::config::UploadConfig;
use crate::error::{Result, UploadError};

/// Blocking client bound to one endpoint and one bearer token.
#[derive(Clone)]
pub struct UploadClient {
    pub(crate) http: Client,
    pub(crate) endpoint: String,
    token: String,
}

/// Error body returned by Google-style APIs:
/// `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`.
/// Only the message is surfaced; other fields are ignored.
#[derive(Deserialize, Debug)]
pub struct ErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Deserialize, Debug)]
pub struct ApiErrorBody {
    pub message: String,
}

impl UploadClient {
    pub fn new(config: &UploadConfig, token: impl Into<String>) -> Result<Self> {
        // 308 means "resume incomplete" here, so it must never be followed
        // as a redirect.
        let mut builder = Client::builder().redirect(Policy::none());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(UploadClient {
            http,
            endpoint: config.endpoint.clone(),
            token: token.into(),
        })
    }

    /// Attach the bearer token to a request.
    pub(crate) fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(AUTHORIZATION, format!("Bearer {}", self.token))
    }
}

/// Pull `error.message` out of a failed response body. A body that does not
/// match the envelope is a contract violation, reported with the status.
pub(crate) fn server_message(status: u16, body: &str) -> Result<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .map_err(|e| {
            UploadError::Protocol(format!(
                "unexpected error body for status {status} ({e}): {}",
                truncate(body, 200)
            ))
        })
}

fn truncate(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
