// Chunk arithmetic for one file.

use crate::error::{Result, UploadError};

/// How a file of `file_size` bytes splits into `chunk_size` pieces.
///
/// `full_chunk_count * chunk_size + remainder_size == file_size` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPlan {
    pub file_size: u64,
    pub chunk_size: u64,
    pub full_chunk_count: u64,
    pub remainder_size: u64,
}

impl TransferPlan {
    pub fn new(file_size: u64, chunk_size: u64) -> Result<Self> {
        if chunk_size == 0 {
            return Err(UploadError::InvalidConfig(
                "chunk size must be greater than zero".into(),
            ));
        }
        Ok(Self {
            file_size,
            chunk_size,
            full_chunk_count: file_size / chunk_size,
            remainder_size: file_size % chunk_size,
        })
    }

    /// Offset where the trailing partial chunk begins (equals `file_size`
    /// when there is no remainder).
    pub fn final_chunk_start(&self) -> u64 {
        self.file_size - self.remainder_size
    }

    pub fn total_chunks(&self) -> u64 {
        self.full_chunk_count + u64::from(self.remainder_size > 0)
    }

    /// Length of the chunk that starts at `cursor`.
    ///
    /// For cursors on a chunk boundary this yields `chunk_size` before
    /// [`final_chunk_start`](Self::final_chunk_start) and `remainder_size`
    /// at it. A cursor off the boundary (the server acknowledged an odd
    /// offset) gets whatever fits, so a read never runs past the end.
    pub fn chunk_len_at(&self, cursor: u64) -> u64 {
        self.chunk_size.min(self.file_size.saturating_sub(cursor))
    }
}
