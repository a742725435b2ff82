//! Inode management for the FUSE filesystem.
//!
//! FUSE addresses nodes by number while the core works on virtual paths.
//! The [`InodeTable`] keeps the bidirectional mapping together with the
//! kernel's lookup count, so an inode is only dropped once the kernel has
//! forgotten every reference it was handed.

use dashmap::mapref::one::Ref;
use dashmap::DashMap;
use passfs_core::VirtualPath;
use std::sync::atomic::{AtomicU64, Ordering};

/// The root inode number (FUSE convention).
pub const ROOT_INODE: u64 = 1;

/// An entry in the inode table.
#[derive(Debug)]
pub struct InodeEntry {
    /// The virtual path this inode stands for.
    pub path: VirtualPath,
    /// Lookup count for proper `forget()` handling.
    nlookup: AtomicU64,
}

impl InodeEntry {
    /// Creates an entry with the given initial lookup count.
    fn with_nlookup(path: VirtualPath, nlookup: u64) -> Self {
        Self {
            path,
            nlookup: AtomicU64::new(nlookup),
        }
    }

    /// Increments the lookup count and returns the new value.
    pub fn inc_nlookup(&self) -> u64 {
        self.nlookup.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Decrements the lookup count by `count` and returns the new value,
    /// or `None` if that would underflow (the count is left untouched).
    pub fn dec_nlookup(&self, count: u64) -> Option<u64> {
        self.nlookup
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(count))
            .ok()
            .map(|old| old - count)
    }

    /// Returns the current lookup count.
    pub fn nlookup(&self) -> u64 {
        self.nlookup.load(Ordering::Relaxed)
    }
}

/// Table mapping inode numbers to virtual paths.
pub struct InodeTable {
    entries: DashMap<u64, InodeEntry>,
    by_path: DashMap<VirtualPath, u64>,
    next_inode: AtomicU64,
}

impl InodeTable {
    /// Creates a table with the root directory pre-allocated.
    pub fn new() -> Self {
        let entries = DashMap::new();
        let by_path = DashMap::new();
        entries.insert(ROOT_INODE, InodeEntry::with_nlookup(VirtualPath::root(), 1));
        by_path.insert(VirtualPath::root(), ROOT_INODE);
        Self {
            entries,
            by_path,
            next_inode: AtomicU64::new(ROOT_INODE + 1),
        }
    }

    /// Returns the inode for `path`, allocating one if needed, and
    /// increments its lookup count. Used for `lookup` replies.
    pub fn get_or_insert(&self, path: &VirtualPath) -> u64 {
        self.allocate(path, true)
    }

    /// Returns the inode for `path`, allocating one with a zero lookup count
    /// if needed. Entries returned from `readdir` must not affect the count.
    pub fn get_or_insert_no_lookup_inc(&self, path: &VirtualPath) -> u64 {
        self.allocate(path, false)
    }

    fn allocate(&self, path: &VirtualPath, count_lookup: bool) -> u64 {
        let inode = *self.by_path.entry(path.clone()).or_insert_with(|| {
            let inode = self.next_inode.fetch_add(1, Ordering::Relaxed);
            self.entries
                .insert(inode, InodeEntry::with_nlookup(path.clone(), 0));
            inode
        });
        if count_lookup && let Some(entry) = self.entries.get(&inode) {
            entry.inc_nlookup();
        }
        inode
    }

    /// Looks up an entry by inode number.
    pub fn get(&self, inode: u64) -> Option<Ref<'_, u64, InodeEntry>> {
        self.entries.get(&inode)
    }

    /// Returns a copy of the virtual path for `inode`.
    pub fn path(&self, inode: u64) -> Option<VirtualPath> {
        self.entries.get(&inode).map(|e| e.path.clone())
    }

    /// Looks up an inode by virtual path.
    pub fn get_inode(&self, path: &VirtualPath) -> Option<u64> {
        self.by_path.get(path).map(|i| *i)
    }

    /// Inode of the parent directory of `inode`; the root is its own parent.
    pub fn parent_of(&self, inode: u64) -> u64 {
        self.path(inode)
            .and_then(|p| p.parent())
            .and_then(|parent| self.get_inode(&parent))
            .unwrap_or(ROOT_INODE)
    }

    /// Decrements the lookup count for an inode.
    /// Returns `true` if the inode reached zero and was evicted.
    pub fn forget(&self, inode: u64, nlookup: u64) -> bool {
        if inode == ROOT_INODE {
            return false;
        }

        let remaining = self
            .entries
            .get(&inode)
            .and_then(|entry| entry.dec_nlookup(nlookup));
        if remaining == Some(0) {
            return self.evict(inode);
        }
        false
    }

    fn evict(&self, inode: u64) -> bool {
        match self.entries.remove(&inode) {
            Some((_, entry)) => {
                self.by_path.remove_if(&entry.path, |_, mapped| *mapped == inode);
                true
            }
            None => false,
        }
    }

    /// Returns the number of inodes currently in the table, root included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table only contains the root inode.
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}
