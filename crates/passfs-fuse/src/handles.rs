//! Handle tables for open files and directories.
//!
//! # Handle Lifecycle
//!
//! 1. **Insert**: `open`/`opendir` store the value and reply its id
//! 2. **Get**: `read`/`readdir` borrow it by id
//! 3. **Remove**: `release`/`releasedir` take it back out exactly once

use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::{Ref, RefMut};
use dashmap::DashMap;
use passfs_core::{DirectoryEntry, EntryKind};
use std::ffi::OsString;
use std::sync::atomic::{AtomicU64, Ordering};

/// Handle table with auto-incrementing `u64` ids.
///
/// Ids start at 1; 0 is reserved for "no handle", which is what FUSE passes
/// when a directory was never opened through `opendir`.
#[derive(Debug)]
pub struct HandleTable<V> {
    handles: DashMap<u64, V>,
    next_id: AtomicU64,
}

impl<V> HandleTable<V> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            handles: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Inserts `value` under a fresh id and returns the id.
    pub fn insert_auto(&self, value: V) -> u64 {
        let mut value = Some(value);
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if id == 0 {
                continue;
            }
            if let Entry::Vacant(entry) = self.handles.entry(id)
                && let Some(v) = value.take()
            {
                entry.insert(v);
                return id;
            }
        }
    }

    /// Shared access to a handle by id.
    pub fn get(&self, id: u64) -> Option<Ref<'_, u64, V>> {
        self.handles.get(&id)
    }

    /// Mutable access to a handle by id.
    pub fn get_mut(&self, id: u64) -> Option<RefMut<'_, u64, V>> {
        self.handles.get_mut(&id)
    }

    /// Removes and returns a handle.
    pub fn remove(&self, id: u64) -> Option<V> {
        self.handles.remove(&id).map(|(_, v)| v)
    }

    /// Check if a handle exists.
    pub fn contains(&self, id: u64) -> bool {
        self.handles.contains_key(&id)
    }

    /// Number of open handles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Returns `true` if no handles are open.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl<V> Default for HandleTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// One entry of a directory snapshot, ready for `ReplyDirectory::add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirSnapshotEntry {
    /// Inode number replied to the kernel.
    pub inode: u64,
    /// Entry kind.
    pub kind: EntryKind,
    /// Entry name.
    pub name: OsString,
}

/// Point-in-time listing taken at `opendir`.
///
/// The kernel reads a directory in several `readdir` calls, resuming at an
/// offset. Serving all of them from the listing taken when the directory
/// was opened keeps offsets stable even if the backing directory changes
/// in between.
#[derive(Debug, Clone, Default)]
pub struct DirHandle {
    entries: Vec<DirSnapshotEntry>,
}

impl DirHandle {
    /// Builds a snapshot from listed entries and a function assigning inodes.
    pub fn new(entries: Vec<DirectoryEntry>, mut inode_for: impl FnMut(&DirectoryEntry) -> u64) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| DirSnapshotEntry {
                inode: inode_for(&entry),
                kind: entry.kind,
                name: entry.name,
            })
            .collect();
        Self { entries }
    }

    /// Entries after `offset` paired with the offset of the following entry.
    pub fn entries_from(&self, offset: usize) -> impl Iterator<Item = (i64, &DirSnapshotEntry)> {
        self.entries
            .iter()
            .enumerate()
            .skip(offset)
            .map(|(i, entry)| (i64::try_from(i + 1).unwrap_or(i64::MAX), entry))
    }

    /// Number of entries, `.` and `..` included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the snapshot has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
