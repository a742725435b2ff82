//! Mount configuration.
//!
//! A [`MountConfig`] is built once at startup and handed by reference to
//! every component that needs the backing root or the mount point.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default backing directory, relative to the working directory.
pub const DEFAULT_BACKING_DIR: &str = "nfs";

/// Default mount point.
pub const DEFAULT_MOUNTPOINT: &str = "/mnt/all-projects";

/// Default filesystem name reported in the mount table.
pub const DEFAULT_FS_NAME: &str = "passfs";

/// Errors raised while building a [`MountConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The backing root could not be resolved to an absolute path.
    #[error("Backing root {} is not accessible: {source}", path.display())]
    BackingRoot {
        /// The configured backing root.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The backing root exists but is not a directory.
    #[error("Backing root is not a directory: {}", path.display())]
    NotADirectory {
        /// The resolved backing root.
        path: PathBuf,
    },
}

/// Configuration for a passthrough mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountConfig {
    backing_root: PathBuf,
    mountpoint: PathBuf,
    fs_name: String,
}

impl MountConfig {
    /// Creates a configuration for `backing_root` mounted at `mountpoint`.
    ///
    /// The backing root is canonicalized so every backing path derived from
    /// it is absolute. Fails if it is missing or not a directory.
    pub fn new(
        backing_root: impl AsRef<Path>,
        mountpoint: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let requested = backing_root.as_ref();
        let backing_root =
            requested
                .canonicalize()
                .map_err(|source| ConfigError::BackingRoot {
                    path: requested.to_path_buf(),
                    source,
                })?;
        if !backing_root.is_dir() {
            return Err(ConfigError::NotADirectory { path: backing_root });
        }

        Ok(Self {
            backing_root,
            mountpoint: mountpoint.into(),
            fs_name: DEFAULT_FS_NAME.to_string(),
        })
    }

    /// Sets the filesystem name shown in the mount table.
    #[must_use]
    pub fn fs_name(mut self, name: impl Into<String>) -> Self {
        self.fs_name = name.into();
        self
    }

    /// Absolute path of the backing directory.
    pub fn backing_root(&self) -> &Path {
        &self.backing_root
    }

    /// Directory the filesystem is mounted on.
    pub fn mountpoint(&self) -> &Path {
        &self.mountpoint
    }

    /// Filesystem name shown in the mount table.
    pub fn name(&self) -> &str {
        &self.fs_name
    }
}
