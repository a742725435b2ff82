//! FUSE filesystem implementation for the read-only passthrough.
//!
//! This module implements the fuser `Filesystem` trait on top of a
//! [`FilesystemOps`] implementation. The dispatcher owns the inode table and
//! the handle tables; everything that touches the backing directory goes
//! through the ops.
//!
//! ## Operation Summary
//!
//! | Operation | Notes |
//! |-----------|-------|
//! | init/destroy | Logging only |
//! | lookup | Increments nlookup via `get_or_insert` |
//! | forget/batch_forget | Decrements nlookup, evicts at 0 |
//! | getattr | Fresh `lstat` on every call, zero TTL |
//! | open/read/release | Read-only handles, keyed by `fh` |
//! | opendir/readdir/releasedir | Listing snapshotted at `opendir` |
//! | access | `W_OK` is refused with `EROFS` |
//! | statfs | Statistics of the backing filesystem |
//!
//! Every operation not listed falls through to fuser's defaults (`ENOSYS`),
//! and the mount is `ro`, so the kernel rejects writes before they arrive.

use crate::error::{FuseError, FuseResult};
use crate::handles::{DirHandle, HandleTable};
use crate::inode::InodeTable;
use fuser::{
    FileAttr, FileType, Filesystem, KernelConfig, ReplyAttr, ReplyData, ReplyDirectory,
    ReplyEmpty, ReplyEntry, ReplyOpen, ReplyStatfs, Request,
};
use libc::c_int;
use passfs_core::{AttributeSnapshot, DirectoryEntry, EntryKind, FileHandle, FilesystemOps, VirtualPath};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Attribute and entry TTL replied to the kernel.
///
/// Zero: the kernel asks again on every access, so metadata and listings
/// always reflect the backing directory.
pub const ATTR_TTL: Duration = Duration::ZERO;

/// Preferred I/O size reported when the backing one does not fit in `u32`.
const BLOCK_SIZE: u32 = 4096;

/// An open file: the path it was opened under and the backing handle.
#[derive(Debug)]
struct OpenFile {
    path: VirtualPath,
    handle: FileHandle,
}

/// Converts an attribute snapshot into a FUSE `FileAttr` for `inode`.
///
/// The kernel uses `FileAttr::ino` as the node id, so it must be the
/// dispatcher's inode rather than the backing one.
pub fn to_file_attr(inode: u64, snapshot: &AttributeSnapshot) -> FileAttr {
    // Masked to 0o7777
    #[allow(clippy::cast_possible_truncation)]
    let perm = snapshot.permissions() as u16;
    // Device numbers are 32-bit in the FUSE ABI
    #[allow(clippy::cast_possible_truncation)]
    let rdev = snapshot.rdev as u32;

    FileAttr {
        ino: inode,
        size: snapshot.size,
        blocks: snapshot.blocks,
        atime: snapshot.atime,
        mtime: snapshot.mtime,
        ctime: snapshot.ctime,
        crtime: snapshot.ctime,
        kind: to_file_type(snapshot.kind),
        perm,
        nlink: u32::try_from(snapshot.nlink).unwrap_or(u32::MAX),
        uid: snapshot.uid,
        gid: snapshot.gid,
        rdev,
        blksize: u32::try_from(snapshot.blksize).unwrap_or(BLOCK_SIZE),
        flags: 0,
    }
}

fn to_file_type(kind: EntryKind) -> FileType {
    match kind {
        EntryKind::Directory => FileType::Directory,
        EntryKind::RegularFile => FileType::RegularFile,
        EntryKind::Symlink => FileType::Symlink,
        EntryKind::BlockDevice => FileType::BlockDevice,
        EntryKind::CharDevice => FileType::CharDevice,
        EntryKind::NamedPipe => FileType::NamedPipe,
        EntryKind::Socket => FileType::Socket,
    }
}

/// FUSE filesystem forwarding every request to a [`FilesystemOps`].
pub struct PassthroughFS<O> {
    ops: O,
    /// Directory queried for `statfs`.
    backing_root: PathBuf,
    inodes: InodeTable,
    files: HandleTable<OpenFile>,
    dirs: HandleTable<DirHandle>,
}

impl<O: FilesystemOps> PassthroughFS<O> {
    /// Creates the filesystem. `backing_root` is only used for `statfs`.
    pub fn new(ops: O, backing_root: impl Into<PathBuf>) -> Self {
        Self {
            ops,
            backing_root: backing_root.into(),
            inodes: InodeTable::new(),
            files: HandleTable::new(),
            dirs: HandleTable::new(),
        }
    }

    /// The inode table.
    pub fn inodes(&self) -> &InodeTable {
        &self.inodes
    }

    /// Number of open file handles.
    pub fn open_files(&self) -> usize {
        self.files.len()
    }

    /// Number of open directory handles.
    pub fn open_dirs(&self) -> usize {
        self.dirs.len()
    }

    fn path_of(&self, inode: u64) -> FuseResult<VirtualPath> {
        self.inodes.path(inode).ok_or(FuseError::InvalidInode(inode))
    }

    /// Resolves `name` under `parent` and counts one lookup on success.
    fn lookup_child(&self, parent: u64, name: &OsStr) -> FuseResult<FileAttr> {
        let path = self.path_of(parent)?.join(name);
        let snapshot = self.ops.getattr(&path)?;
        let inode = self.inodes.get_or_insert(&path);
        Ok(to_file_attr(inode, &snapshot))
    }

    fn attr_of(&self, inode: u64) -> FuseResult<FileAttr> {
        let path = self.path_of(inode)?;
        let snapshot = self.ops.getattr(&path)?;
        Ok(to_file_attr(inode, &snapshot))
    }

    fn open_file(&self, inode: u64, flags: i32) -> FuseResult<u64> {
        let path = self.path_of(inode)?;
        let handle = self.ops.open(&path, flags)?;
        Ok(self.files.insert_auto(OpenFile { path, handle }))
    }

    fn read_file(&self, fh: u64, size: u32, offset: u64) -> FuseResult<Vec<u8>> {
        let mut open = self.files.get_mut(fh).ok_or(FuseError::InvalidHandle(fh))?;
        let data = self.ops.read(&mut open.handle, size as usize, offset)?;
        Ok(data)
    }

    fn release_file(&self, fh: u64) -> FuseResult<()> {
        let OpenFile { path, handle } = self.files.remove(fh).ok_or(FuseError::InvalidHandle(fh))?;
        self.ops.release(&path, handle)?;
        Ok(())
    }

    /// Lists `inode` and assigns an inode to every entry.
    ///
    /// Entries reached through `readdir` do not count as lookups.
    fn snapshot_dir(&self, inode: u64) -> FuseResult<DirHandle> {
        let path = self.path_of(inode)?;
        let entries = self.ops.readdir(&path)?.collect::<Result<Vec<DirectoryEntry>, _>>()?;
        Ok(DirHandle::new(entries, |entry| {
            if entry.name == "." {
                inode
            } else if entry.name == ".." {
                self.inodes.parent_of(inode)
            } else {
                self.inodes.get_or_insert_no_lookup_inc(&path.join(&entry.name))
            }
        }))
    }

    fn open_dir(&self, inode: u64) -> FuseResult<u64> {
        let snapshot = self.snapshot_dir(inode)?;
        Ok(self.dirs.insert_auto(snapshot))
    }

    /// Read and execute checks are left to `default_permissions`; this only
    /// confirms the entry still exists.
    fn check_exists(&self, inode: u64) -> FuseResult<()> {
        let path = self.path_of(inode)?;
        self.ops.getattr(&path)?;
        Ok(())
    }
}

impl<O: FilesystemOps> Filesystem for PassthroughFS<O> {
    fn init(&mut self, _req: &Request<'_>, _config: &mut KernelConfig) -> Result<(), c_int> {
        info!(backing = %self.backing_root.display(), "FUSE filesystem initialized");
        Ok(())
    }

    fn destroy(&mut self) {
        info!(
            open_files = self.files.len(),
            open_dirs = self.dirs.len(),
            "FUSE filesystem destroyed"
        );
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        trace!(parent = parent, name = ?name, "lookup");
        match self.lookup_child(parent, name) {
            Ok(attr) => reply.entry(&ATTR_TTL, &attr, 0),
            Err(e) => {
                trace!(parent = parent, name = ?name, error = %e, "lookup failed");
                reply.error(e.to_errno());
            }
        }
    }

    fn forget(&mut self, _req: &Request<'_>, ino: u64, nlookup: u64) {
        trace!(inode = ino, nlookup = nlookup, "forget");
        self.inodes.forget(ino, nlookup);
    }

    fn batch_forget(&mut self, _req: &Request<'_>, nodes: &[fuser::fuse_forget_one]) {
        trace!(count = nodes.len(), "batch_forget");
        for node in nodes {
            self.inodes.forget(node.nodeid, node.nlookup);
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        trace!(inode = ino, "getattr");
        match self.attr_of(ino) {
            Ok(attr) => reply.attr(&ATTR_TTL, &attr),
            Err(e) => {
                debug!(inode = ino, error = %e, "getattr failed");
                reply.error(e.to_errno());
            }
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        trace!(inode = ino, flags = flags, "open");
        match self.open_file(ino, flags) {
            Ok(fh) => reply.opened(fh, 0),
            Err(e) => {
                debug!(inode = ino, error = %e, "open failed");
                reply.error(e.to_errno());
            }
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        trace!(inode = ino, fh = fh, offset = offset, size = size, "read");
        let Ok(offset) = u64::try_from(offset) else {
            reply.error(libc::EINVAL);
            return;
        };
        match self.read_file(fh, size, offset) {
            Ok(data) => reply.data(&data),
            Err(e) => {
                debug!(inode = ino, fh = fh, error = %e, "read failed");
                reply.error(e.to_errno());
            }
        }
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        trace!(inode = ino, fh = fh, "release");
        match self.release_file(fh) {
            Ok(()) => reply.ok(),
            Err(e) => {
                debug!(inode = ino, fh = fh, error = %e, "release failed");
                reply.error(e.to_errno());
            }
        }
    }

    fn opendir(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        trace!(inode = ino, "opendir");
        match self.open_dir(ino) {
            Ok(fh) => reply.opened(fh, 0),
            Err(e) => {
                debug!(inode = ino, error = %e, "opendir failed");
                reply.error(e.to_errno());
            }
        }
    }

    /// Read directory entries.
    ///
    /// `offset` is the value returned with the previous `reply.add()`, which
    /// is the entry index + 1. Entries come from the snapshot taken at
    /// `opendir`; a handle that is not ours gets a fresh listing.
    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        trace!(inode = ino, fh = fh, offset = offset, "readdir");
        let Ok(offset) = usize::try_from(offset) else {
            reply.error(libc::EINVAL);
            return;
        };

        let fresh;
        let guard = self.dirs.get(fh);
        let snapshot = match guard.as_deref() {
            Some(snapshot) => snapshot,
            None => match self.snapshot_dir(ino) {
                Ok(snapshot) => {
                    fresh = snapshot;
                    &fresh
                }
                Err(e) => {
                    debug!(inode = ino, error = %e, "readdir failed");
                    reply.error(e.to_errno());
                    return;
                }
            },
        };

        for (next_offset, entry) in snapshot.entries_from(offset) {
            if reply.add(entry.inode, next_offset, to_file_type(entry.kind), &entry.name) {
                break;
            }
        }
        reply.ok();
    }

    fn releasedir(&mut self, _req: &Request<'_>, ino: u64, fh: u64, _flags: i32, reply: ReplyEmpty) {
        trace!(inode = ino, fh = fh, "releasedir");
        self.dirs.remove(fh);
        reply.ok();
    }

    fn access(&mut self, _req: &Request<'_>, ino: u64, mask: i32, reply: ReplyEmpty) {
        trace!(inode = ino, mask = mask, "access");
        if mask & libc::W_OK != 0 {
            reply.error(libc::EROFS);
            return;
        }
        match self.check_exists(ino) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn statfs(&mut self, _req: &Request<'_>, _ino: u64, reply: ReplyStatfs) {
        // Query real filesystem statistics from the backing directory
        match nix::sys::statvfs::statvfs(&self.backing_root) {
            Ok(stat) => {
                // Nautilus tests namelen+1 when validating names, so cap at 254
                #[allow(clippy::cast_possible_truncation)]
                #[cfg(target_os = "linux")]
                let name_max = std::cmp::min(stat.name_max() as u32, 254);
                #[allow(clippy::cast_possible_truncation)]
                #[cfg(not(target_os = "linux"))]
                let name_max = stat.name_max() as u32;

                // fragment_size is typically 4096-8192, which fits in u32
                #[allow(clippy::cast_possible_truncation)]
                let fragment_size = stat.fragment_size() as u32;

                reply.statfs(
                    u64::from(stat.blocks()),
                    u64::from(stat.blocks_free()),
                    u64::from(stat.blocks_available()),
                    u64::from(stat.files()),
                    u64::from(stat.files_free()),
                    fragment_size,
                    name_max,
                    fragment_size,
                );
            }
            Err(e) => {
                debug!(error = %e, "statfs on backing root failed");
                reply.error(e as i32);
            }
        }
    }
}
