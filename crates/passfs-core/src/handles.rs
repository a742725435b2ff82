//! Read-only file handles.
//!
//! A [`FileHandle`] owns one backing descriptor from `open` until it is
//! released. Reads are positioned explicitly: each call seeks to the
//! requested offset and then reads, so the descriptor's own cursor carries
//! no meaning between calls.
//!
//! The seek and the read are two separate system calls. That is fine while
//! requests on a handle are dispatched one at a time, but two concurrent
//! reads on the same handle could interleave their offsets.

use crate::error::{FsError, FsResult};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// An open, read-only backing file.
#[derive(Debug)]
pub struct FileHandle {
    file: File,
    path: PathBuf,
}

impl FileHandle {
    /// Opens `backing` read-only.
    pub fn open(backing: &Path) -> FsResult<Self> {
        let file = File::open(backing).map_err(|e| FsError::from_io(backing, e))?;
        Ok(Self {
            file,
            path: backing.to_path_buf(),
        })
    }

    /// Reads up to `size` bytes starting at `offset` from the start of the
    /// file. Returns fewer bytes at end of file and none past it.
    pub fn read_at(&mut self, size: usize, offset: u64) -> FsResult<Vec<u8>> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| FsError::from_io(&self.path, e))?;

        // Grows with the data actually read, not with the requested size
        let mut buf = Vec::new();
        (&mut self.file)
            .take(size as u64)
            .read_to_end(&mut buf)
            .map_err(|e| FsError::from_io(&self.path, e))?;
        Ok(buf)
    }

    /// Closes the descriptor.
    ///
    /// Consumes the handle, so it cannot be used or released again.
    pub fn release(self) {
        drop(self.file);
    }

    /// Backing path this handle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
