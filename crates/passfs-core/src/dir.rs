//! Directory enumeration.
//!
//! A [`DirectoryListing`] is a finite, non-restartable iterator: it yields
//! `.` and `..`, then the backing directory's entries in whatever order the
//! OS returns them. Entries are pulled from the OS on demand. The first
//! error ends the sequence, and callers are expected to exhaust it (for
//! example with `collect::<FsResult<Vec<_>>>()`) before replying, so a
//! failure never produces a partial listing.

use crate::attr::EntryKind;
use crate::error::{FsError, FsResult};
use std::ffi::{OsStr, OsString};
use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};

/// One name in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Entry name (no path separators).
    pub name: OsString,
    /// Entry kind as reported by the directory scan, links not followed.
    pub kind: EntryKind,
}

impl DirectoryEntry {
    /// Creates an entry.
    pub fn new(name: impl Into<OsString>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Returns `true` for the synthetic `.` and `..` entries.
    pub fn is_dot(&self) -> bool {
        self.name == OsStr::new(".") || self.name == OsStr::new("..")
    }
}

/// Lazy listing of a backing directory.
#[derive(Debug)]
pub struct DirectoryListing {
    path: PathBuf,
    /// Synthetic entries still to be yielded (2, 1, 0).
    dots: u8,
    inner: Option<ReadDir>,
}

impl DirectoryListing {
    /// Backing directory being listed.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for DirectoryListing {
    type Item = FsResult<DirectoryEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.dots {
            2 => {
                self.dots = 1;
                return Some(Ok(DirectoryEntry::new(".", EntryKind::Directory)));
            }
            1 => {
                self.dots = 0;
                return Some(Ok(DirectoryEntry::new("..", EntryKind::Directory)));
            }
            _ => {}
        }

        let next = self.inner.as_mut()?.next()?;
        let item = next
            .and_then(|entry| {
                let kind = EntryKind::from_file_type(entry.file_type()?);
                Ok(DirectoryEntry::new(entry.file_name(), kind))
            })
            .map_err(|e| FsError::from_io(&self.path, e));

        if item.is_err() {
            self.inner = None;
        }
        Some(item)
    }
}

/// Opens a listing of `backing`.
///
/// Fails with [`FsError::NotFound`] if the path is missing and with
/// [`FsError::NotADirectory`] if it does not resolve to a directory.
/// A symbolic link to a directory is listed as that directory.
pub fn list_directory(backing: &Path) -> FsResult<DirectoryListing> {
    let meta = fs::metadata(backing).map_err(|e| FsError::from_io(backing, e))?;
    if !meta.is_dir() {
        return Err(FsError::not_a_directory(backing));
    }

    let inner = fs::read_dir(backing).map_err(|e| FsError::from_io(backing, e))?;
    Ok(DirectoryListing {
        path: backing.to_path_buf(),
        dots: 2,
        inner: Some(inner),
    })
}
