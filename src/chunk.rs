// Chunk transfer: read one byte range of the source file and PUT it to the
// session URL.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use reqwest::header::CONTENT_RANGE;
use tracing::debug;

use crate::client::{server_message, UploadClient};
use crate::error::{Result, UploadError};
use crate::session::RESUME_INCOMPLETE;

/// How the server answered a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkResult {
    /// Chunk accepted, send the next one from this offset.
    Continue(u64),
    /// The object is fully stored; carries the total file size.
    Complete(u64),
}

/// Read exactly `len` bytes at `offset`. The file is opened per call.
pub fn read_chunk(path: &Path, offset: u64, len: u64) -> Result<Vec<u8>> {
    let len = usize::try_from(len).map_err(|_| {
        UploadError::InvalidConfig(format!("chunk of {len} bytes does not fit in memory"))
    })?;
    let mut file = File::open(path).map_err(|e| UploadError::io(path, e))?;
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| UploadError::io(path, e))?;
    let mut buf = vec![0u8; len];
    file.read_exact(&mut buf)
        .map_err(|e| UploadError::io(path, e))?;
    Ok(buf)
}

impl UploadClient {
    /// Send `len` bytes of `source` starting at `start` as one request.
    pub fn send_chunk(
        &self,
        session_url: &str,
        source: &Path,
        start: u64,
        len: u64,
        file_size: u64,
    ) -> Result<ChunkResult> {
        if len == 0 {
            return Err(UploadError::InvalidConfig("refusing to send an empty chunk".into()));
        }
        let next = start.checked_add(len).ok_or_else(|| {
            UploadError::InvalidConfig(format!("chunk of {len} bytes at {start} overflows"))
        })?;
        let end = next - 1;
        let body = read_chunk(source, start, len)?;
        debug!(start, end, file_size, "sending chunk");

        // Content-Length comes from the body.
        let res = self
            .authorized(self.http.put(session_url))
            .header(CONTENT_RANGE, format!("bytes {start}-{end}/{file_size}"))
            .body(body)
            .send()?;

        let status = res.status().as_u16();
        if status < RESUME_INCOMPLETE {
            debug!(status, "server reports upload complete");
            return Ok(ChunkResult::Complete(file_size));
        }
        if status > RESUME_INCOMPLETE {
            let body = res.text()?;
            let message = server_message(status, &body)?;
            return Err(UploadError::ChunkUpload { status, message });
        }
        Ok(ChunkResult::Continue(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use tempfile::NamedTempFile;

    fn source(len: usize) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        std::fs::write(file.path(), data).unwrap();
        file
    }

    #[test]
    fn reads_requested_range() {
        let file = source(1000);
        let buf = read_chunk(file.path(), 500, 10).unwrap();
        let expected: Vec<u8> = (500..510).map(|i| (i % 251) as u8).collect();
        assert_eq!(buf, expected);
    }

    #[test]
    fn reads_final_partial_range_exactly() {
        let file = source(1000);
        let buf = read_chunk(file.path(), 990, 10).unwrap();
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn short_read_is_io_error() {
        let file = source(1000);
        match read_chunk(file.path(), 995, 10) {
            Err(UploadError::Io { source, .. }) => {
                assert_eq!(source.kind(), ErrorKind::UnexpectedEof)
            }
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            read_chunk(&dir.path().join("gone.bin"), 0, 1),
            Err(UploadError::Io { .. })
        ));
    }
}
