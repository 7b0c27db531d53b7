// Library root
// -----------
// This crate exposes the resumable upload engine behind the CLI. The binary
// (`main.rs`) parses arguments, builds an `UploadConfig` and runs an
// `Uploader`.
//
// Module responsibilities:
// - `config`: endpoint, chunk size and file locations for one run.
// - `credentials`: loads the bearer token (`CredentialProvider`).
// - `state`: persists the session URL between invocations.
// - `client`: blocking HTTP client and the server error envelope.
// - `session`: begins a resumable session or queries its progress.
// - `chunk`: reads a byte range and PUTs it to the session.
// - `plan`: chunk boundary arithmetic.
// - `uploader`: fresh-vs-resume decision and the chunk loop.
// - `ui`: progress bar and result text for the terminal.
pub mod chunk;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod plan;
pub mod session;
pub mod state;
pub mod ui;
pub mod uploader;

pub use error::{Result, UploadError};
