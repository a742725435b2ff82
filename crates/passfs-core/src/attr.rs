//! Attribute snapshots read from the backing store.
//!
//! Every call goes to the backing store; nothing is memoized, so a snapshot
//! is always consistent with the disk at the time of the call.

use crate::error::{FsError, FsResult};
use std::fs::{self, Metadata};
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Kind of a backing entry, derived from its mode bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Directory.
    Directory,
    /// Regular file.
    RegularFile,
    /// Symbolic link (never followed).
    Symlink,
    /// Block device.
    BlockDevice,
    /// Character device.
    CharDevice,
    /// FIFO.
    NamedPipe,
    /// Unix domain socket.
    Socket,
}

impl EntryKind {
    /// Classifies a `std::fs::FileType`.
    pub fn from_file_type(ft: fs::FileType) -> Self {
        if ft.is_dir() {
            EntryKind::Directory
        } else if ft.is_symlink() {
            EntryKind::Symlink
        } else if ft.is_block_device() {
            EntryKind::BlockDevice
        } else if ft.is_char_device() {
            EntryKind::CharDevice
        } else if ft.is_fifo() {
            EntryKind::NamedPipe
        } else if ft.is_socket() {
            EntryKind::Socket
        } else {
            EntryKind::RegularFile
        }
    }
}

/// Immutable metadata record for one backing path.
///
/// Field-for-field what `lstat` reports; the link itself is described for
/// symbolic links, not its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSnapshot {
    /// Full `st_mode`, file type bits included.
    pub mode: u32,
    /// Backing inode number.
    pub ino: u64,
    /// Device id of the backing filesystem.
    pub dev: u64,
    /// Hard link count.
    pub nlink: u64,
    /// Owner user id.
    pub uid: u32,
    /// Owner group id.
    pub gid: u32,
    /// Size in bytes.
    pub size: u64,
    /// Number of 512-byte blocks allocated.
    pub blocks: u64,
    /// Preferred I/O block size.
    pub blksize: u64,
    /// Device id for special files.
    pub rdev: u64,
    /// Last access time.
    pub atime: SystemTime,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Last status change time.
    pub ctime: SystemTime,
    /// Entry kind derived from `mode`.
    pub kind: EntryKind,
}

impl AttributeSnapshot {
    /// Builds a snapshot from `lstat`-style metadata.
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self {
            mode: meta.mode(),
            ino: meta.ino(),
            dev: meta.dev(),
            nlink: meta.nlink(),
            uid: meta.uid(),
            gid: meta.gid(),
            size: meta.size(),
            blocks: meta.blocks(),
            blksize: meta.blksize(),
            rdev: meta.rdev(),
            atime: unix_time(meta.atime(), meta.atime_nsec()),
            mtime: unix_time(meta.mtime(), meta.mtime_nsec()),
            ctime: unix_time(meta.ctime(), meta.ctime_nsec()),
            kind: EntryKind::from_file_type(meta.file_type()),
        }
    }

    /// Permission bits (including setuid, setgid and sticky).
    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }

    /// Returns `true` if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Converts `st_*time` seconds and nanoseconds to a `SystemTime`.
fn unix_time(secs: i64, nsecs: i64) -> SystemTime {
    let nanos = u32::try_from(nsecs).unwrap_or(0);
    if secs >= 0 {
        UNIX_EPOCH + Duration::new(secs.unsigned_abs(), nanos)
    } else {
        // Pre-epoch: secs is negative and nanos counts forward from it.
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs()) + Duration::from_nanos(u64::from(nanos))
    }
}

/// Reads a fresh attribute snapshot for `backing`.
///
/// Existence is checked following symbolic links, so a dangling link is
/// reported as missing; the snapshot itself is taken with `lstat`.
pub fn resolve_attributes(backing: &Path) -> FsResult<AttributeSnapshot> {
    fs::metadata(backing).map_err(|e| FsError::from_io(backing, e))?;
    let meta = fs::symlink_metadata(backing).map_err(|e| FsError::from_io(backing, e))?;
    Ok(AttributeSnapshot::from_metadata(&meta))
}
