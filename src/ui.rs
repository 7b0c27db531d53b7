// UI layer: terminal presentation for the CLI. The upload logic never
// prints; it reports through the progress bar handed to it and the
// outcome value it returns, and this module turns those into output.

use std::io::{self, Write};
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::fmt::MakeWriter;

use crate::uploader::UploadOutcome;

/// Byte-level progress bar for the chunk loop. Length is set by the
/// uploader once the file size is known.
pub fn transfer_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    // Fall back to the default look if the template ever fails to parse.
    let style = ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] [{bar:40}] {bytes}/{total_bytes} ({percent}%) {bytes_per_sec}",
    )
    .map(|s| s.progress_chars("=> "))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

/// Log writer for `tracing_subscriber` that clears the progress bar while a
/// line goes to stderr and redraws it afterwards.
#[derive(Clone)]
pub struct BarLogWriter {
    bar: ProgressBar,
}

impl BarLogWriter {
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Write for BarLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bar.suspend(|| io::stderr().write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.bar.suspend(|| io::stderr().write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

impl<'a> MakeWriter<'a> for BarLogWriter {
    type Writer = BarLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// One-line summary printed after a run that did not fail.
pub fn describe_outcome(path: &Path, outcome: &UploadOutcome) -> String {
    match outcome {
        UploadOutcome::Uploaded {
            bytes,
            resumed_from: Some(offset),
        } => format!(
            "{}: {bytes}b uploaded successfully (resumed from byte {offset})",
            path.display()
        ),
        UploadOutcome::Uploaded {
            bytes,
            resumed_from: None,
        } => format!("{}: {bytes}b uploaded successfully", path.display()),
        UploadOutcome::AlreadyComplete => format!(
            "{}: upload had already completed, nothing to send",
            path.display()
        ),
    }
}
