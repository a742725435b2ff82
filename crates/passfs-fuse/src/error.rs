//! Error handling for the FUSE dispatcher.
//!
//! Core failures already carry their mapped kind; this layer only adds the
//! dispatcher's own bookkeeping failures (unknown inode or handle).

use passfs_core::FsError;
use thiserror::Error;

/// Errors that can occur while dispatching a FUSE request.
#[derive(Debug, Error)]
pub enum FuseError {
    /// Error from the passthrough operation.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// Inode not present in the inode table.
    #[error("Invalid inode: {0}")]
    InvalidInode(u64),

    /// File or directory handle not present in its table.
    #[error("Invalid file handle: {0}")]
    InvalidHandle(u64),
}

impl FuseError {
    /// Converts this error to a libc error code for FUSE.
    pub fn to_errno(&self) -> i32 {
        match self {
            FuseError::Fs(e) => e.to_errno(),
            FuseError::InvalidInode(_) => libc::ENOENT,
            FuseError::InvalidHandle(_) => libc::EBADF,
        }
    }
}

/// Result type for FUSE operations.
pub type FuseResult<T> = Result<T, FuseError>;
