//! The operation set exposed to the dispatcher.

use crate::attr::{resolve_attributes, AttributeSnapshot};
use crate::config::MountConfig;
use crate::dir::{list_directory, DirectoryListing};
use crate::error::FsResult;
use crate::handles::FileHandle;
use crate::path::{PathTranslator, VirtualPath};
use tracing::{debug, trace};

/// Filesystem operations a dispatcher can invoke.
///
/// Every failure is reported as an [`FsError`](crate::FsError); the
/// dispatcher turns it into an errno with `to_errno`.
pub trait FilesystemOps {
    /// Fresh metadata for `path`. `NotFound` if it does not exist.
    fn getattr(&self, path: &VirtualPath) -> FsResult<AttributeSnapshot>;

    /// Lazy listing of `path`, starting with `.` and `..`.
    /// `NotADirectory` if `path` is not a directory.
    fn readdir(&self, path: &VirtualPath) -> FsResult<DirectoryListing>;

    /// Opens `path`. The handle is always read-only, whatever `flags` ask for.
    fn open(&self, path: &VirtualPath, flags: i32) -> FsResult<FileHandle>;

    /// Reads up to `size` bytes at `offset`.
    fn read(&self, handle: &mut FileHandle, size: usize, offset: u64) -> FsResult<Vec<u8>>;

    /// Closes `handle`.
    fn release(&self, path: &VirtualPath, handle: FileHandle) -> FsResult<()>;
}

/// Passthrough onto a backing directory.
#[derive(Debug, Clone)]
pub struct Passthrough {
    translator: PathTranslator,
}

impl Passthrough {
    /// Creates the passthrough for `config`'s backing root.
    pub fn new(config: &MountConfig) -> Self {
        Self {
            translator: PathTranslator::new(config.backing_root()),
        }
    }

    /// The translator used to derive backing paths.
    pub fn translator(&self) -> &PathTranslator {
        &self.translator
    }
}

impl FilesystemOps for Passthrough {
    fn getattr(&self, path: &VirtualPath) -> FsResult<AttributeSnapshot> {
        let backing = self.translator.translate(path);
        trace!(path = %path, backing = %backing.display(), "getattr");
        resolve_attributes(&backing)
    }

    fn readdir(&self, path: &VirtualPath) -> FsResult<DirectoryListing> {
        let backing = self.translator.translate(path);
        trace!(path = %path, backing = %backing.display(), "readdir");
        list_directory(&backing)
    }

    fn open(&self, path: &VirtualPath, flags: i32) -> FsResult<FileHandle> {
        let backing = self.translator.translate(path);
        trace!(path = %path, flags, "open");

        if flags & libc::O_ACCMODE != libc::O_RDONLY {
            debug!(path = %path, flags, "Write access requested on read-only mount, opening read-only");
        }
        FileHandle::open(&backing)
    }

    fn read(&self, handle: &mut FileHandle, size: usize, offset: u64) -> FsResult<Vec<u8>> {
        trace!(backing = %handle.path().display(), size, offset, "read");
        handle.read_at(size, offset)
    }

    fn release(&self, path: &VirtualPath, handle: FileHandle) -> FsResult<()> {
        trace!(path = %path, "release");
        handle.release();
        Ok(())
    }
}
