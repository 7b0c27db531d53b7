// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, build the config, run one upload.
// - Returns `anyhow::Result` so any aborted run exits non-zero.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use indicatif::ProgressBar;
use tracing_subscriber::EnvFilter;

use drive_upload_cli::config::{
    default_token_path, UploadConfig, DEFAULT_CHUNK_SIZE, DEFAULT_ENDPOINT, DEFAULT_MIME_TYPE,
    DEFAULT_STATE_FILE,
};
use drive_upload_cli::credentials::TokenFile;
use drive_upload_cli::ui;
use drive_upload_cli::uploader::{UploadRequest, Uploader};
use drive_upload_cli::UploadError;

/// Upload one large file through a resumable, chunked HTTP session.
///
/// Progress is kept in a state file, so rerunning the same command after an
/// interruption resumes instead of starting over.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// File to upload
    file: PathBuf,

    /// MIME type declared for the remote object
    #[arg(default_value = DEFAULT_MIME_TYPE)]
    mime_type: String,

    /// Remote object name (defaults to the file name)
    #[arg(long)]
    name: Option<String>,

    /// JSON file containing an `access_token` field
    #[arg(long, env = "UPLOAD_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    /// Where the pending session URL is kept between runs
    #[arg(long, env = "UPLOAD_STATE_FILE", default_value = DEFAULT_STATE_FILE)]
    state_file: PathBuf,

    /// Bytes per chunk; the endpoint may require a multiple of 262144
    #[arg(long, env = "UPLOAD_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: u64,

    /// Resumable upload endpoint
    #[arg(long, env = "UPLOAD_ENDPOINT_URL", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Per-request timeout in seconds (defaults to the HTTP client's)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Discard any persisted session and start a fresh upload
    #[arg(long)]
    restart: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let bar = ui::transfer_bar();
    init_tracing(&bar);

    let config = UploadConfig {
        endpoint: cli.endpoint,
        token_path: cli.token_file.unwrap_or_else(default_token_path),
        state_path: cli.state_file,
        chunk_size: cli.chunk_size,
        request_timeout: cli.timeout_secs.map(Duration::from_secs),
    };
    let state_path = config.state_path.clone();
    let credentials = TokenFile::new(&config.token_path);

    let uploader = Uploader::new(config, credentials)?.with_progress(bar);
    if cli.restart {
        tracing::info!(path = %state_path.display(), "discarding persisted upload session");
        uploader.store().clear()?;
    }

    let request = UploadRequest {
        path: cli.file,
        mime_type: cli.mime_type,
        name: cli.name,
    };
    let outcome = match uploader.run(&request) {
        Ok(outcome) => outcome,
        Err(e @ UploadError::SessionExpired { .. }) => {
            return Err(e).with_context(|| {
                format!(
                    "delete {} or pass --restart to begin a fresh upload",
                    state_path.display()
                )
            });
        }
        Err(e) => return Err(e).context("Upload failed"),
    };

    println!("{}", ui::describe_outcome(&request.path, &outcome));
    Ok(())
}

/// Log lines go through the progress bar so they never tear it.
fn init_tracing(bar: &ProgressBar) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(ui::BarLogWriter::new(bar.clone()))
        .try_init();
}
