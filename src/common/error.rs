use crate::common::config::PageId;

/// Errors surfaced by the storage and buffer layers.
///
/// Mirrors the opaque error-code taxonomy of the subsystem: callers get a
/// typed reason rather than a raw `io::Error`, and every failure is returned
/// to the caller unchanged — nothing here is swallowed or retried.
#[derive(thiserror::Error, Debug)]
pub enum BufferError {
    /// `open`/`destroy` of a file that does not exist.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Request for a page id outside file bounds, unpin of a non-resident
    /// page, or pin when every frame is pinned and no victim is available.
    #[error("page {0} does not exist or is not resident")]
    ReadNonExistingPage(PageId),

    /// Any write-side I/O failure, including short writes and capacity growth.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// A `ReplacementStrategy` variant that is reserved but not implemented.
    #[error("replacement strategy not implemented: {0}")]
    NotImplemented(&'static str),

    /// `BufferPool::init` called with a pool capacity below the minimum of 1.
    #[error("buffer pool capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),
}

impl From<std::io::Error> for BufferError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => BufferError::FileNotFound(e.to_string()),
            _ => BufferError::WriteFailed(e.to_string()),
        }
    }
}
