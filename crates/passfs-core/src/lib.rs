//! Read-only passthrough core for the `passfs` filesystem.
//!
//! Every operation issued against the mount point is translated into the
//! equivalent operation on a backing directory tree. This crate holds that
//! translation layer and nothing FUSE-specific, so it can be exercised
//! without a kernel module.
//!
//! # Components
//!
//! - [`PathTranslator`] - maps a [`VirtualPath`] onto the backing root
//! - [`resolve_attributes`] - fresh `lstat` snapshot as an [`AttributeSnapshot`]
//! - [`list_directory`] - lazy [`DirectoryListing`] starting with `.` and `..`
//! - [`FileHandle`] - read-only descriptor with the open/read/release lifecycle
//! - [`FsError`] - the mapped error vocabulary (`ENOENT`, `ENOTDIR`, OS code)
//!
//! [`Passthrough`] wires these together behind the [`FilesystemOps`] trait,
//! which is what the dispatcher (see `passfs-fuse`) calls into.
//!
//! # Usage
//!
//! ```no_run
//! use passfs_core::{FilesystemOps, MountConfig, Passthrough, VirtualPath};
//!
//! let config = MountConfig::new("nfs", "/mnt/all-projects")?;
//! let ops = Passthrough::new(&config);
//!
//! let path = VirtualPath::new("/project-1/main.py");
//! let mut handle = ops.open(&path, libc::O_RDONLY)?;
//! let data = ops.read(&mut handle, 4096, 0)?;
//! ops.release(&path, handle)?;
//! # let _ = data;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

pub mod attr;
pub mod config;
pub mod dir;
pub mod error;
pub mod handles;
pub mod ops;
pub mod path;

pub use attr::{resolve_attributes, AttributeSnapshot, EntryKind};
pub use config::{ConfigError, MountConfig, DEFAULT_BACKING_DIR, DEFAULT_FS_NAME, DEFAULT_MOUNTPOINT};
pub use dir::{list_directory, DirectoryEntry, DirectoryListing};
pub use error::{io_error_to_errno, FsError, FsResult, ToErrno};
pub use handles::FileHandle;
pub use ops::{FilesystemOps, Passthrough};
pub use path::{PathTranslator, VirtualPath};
