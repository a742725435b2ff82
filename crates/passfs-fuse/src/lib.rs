//! Read-only FUSE passthrough filesystem.
//!
//! This crate is the dispatcher side of `passfs`: it receives kernel
//! requests through the fuser [`Filesystem`](fuser::Filesystem) trait,
//! maps inode numbers and file handles to the core's virtual paths and
//! [`FileHandle`](passfs_core::FileHandle)s, and forwards each request to a
//! [`FilesystemOps`](passfs_core::FilesystemOps) implementation.
//!
//! # Features
//!
//! - Read-only mount (`lookup`, `getattr`, `readdir`, `open`, `read`, `release`,
//!   plus `access` and `statfs`)
//! - Zero attribute TTL: the kernel re-asks for every stat, so metadata is
//!   always current with the backing directory
//! - One dispatch thread; requests are handled strictly one at a time
//!
//! # Usage
//!
//! ```ignore
//! use passfs_core::{MountConfig, Passthrough};
//! use passfs_fuse::{spawn_mount, PassthroughFS};
//!
//! let config = MountConfig::new("nfs", "/mnt/all-projects")?;
//! let fs = PassthroughFS::new(Passthrough::new(&config), config.backing_root());
//! let mount = spawn_mount(fs, &config)?;
//! ```

pub mod error;
pub mod filesystem;
pub mod handles;
pub mod inode;
pub mod mount;

pub use error::{FuseError, FuseResult};
pub use filesystem::{to_file_attr, PassthroughFS, ATTR_TTL};
pub use handles::{DirHandle, DirSnapshotEntry, HandleTable};
pub use inode::{InodeEntry, InodeTable, ROOT_INODE};
pub use mount::{ensure_mountpoint, mount_options, spawn_mount, PassfsMount, SUBTYPE};
