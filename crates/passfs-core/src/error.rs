//! Error mapping for passthrough operations.
//!
//! Every failure coming back from the backing store is mapped here, at the
//! point of interaction, into one of three kinds the dispatcher understands:
//! a missing path, a directory operation on a non-directory, or any other
//! I/O failure carrying the OS error code. Nothing is retried.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors returned by the passthrough operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// The backing path does not exist.
    #[error("No such file or directory: {}", path.display())]
    NotFound {
        /// Backing path that was looked up.
        path: PathBuf,
    },

    /// A directory operation targeted something that is not a directory.
    #[error("Not a directory: {}", path.display())]
    NotADirectory {
        /// Backing path that was expected to be a directory.
        path: PathBuf,
    },

    /// Any other backing-store failure (permissions, I/O errors, ...).
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Backing path the failing call was made against.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Maps an `io::Error` raised while touching `path`.
    ///
    /// `ENOENT` and `ENOTDIR` both become [`FsError::NotFound`]: a path
    /// that runs through a regular file has no backing entry either.
    /// Everything else is kept as [`FsError::Io`] with its OS code.
    /// [`FsError::NotADirectory`] is only raised by the directory lister,
    /// after it has seen the target itself.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound || source.raw_os_error() == Some(libc::ENOTDIR) {
            return FsError::NotFound { path };
        }
        FsError::Io { path, source }
    }

    /// Shorthand for [`FsError::NotFound`].
    pub fn not_found(path: &Path) -> Self {
        FsError::NotFound {
            path: path.to_path_buf(),
        }
    }

    /// Shorthand for [`FsError::NotADirectory`].
    pub fn not_a_directory(path: &Path) -> Self {
        FsError::NotADirectory {
            path: path.to_path_buf(),
        }
    }

    /// The backing path this error refers to.
    pub fn path(&self) -> &Path {
        match self {
            FsError::NotFound { path }
            | FsError::NotADirectory { path }
            | FsError::Io { path, .. } => path,
        }
    }

    /// Converts this error to a libc error code for the dispatcher.
    pub fn to_errno(&self) -> i32 {
        match self {
            FsError::NotFound { .. } => libc::ENOENT,
            FsError::NotADirectory { .. } => libc::ENOTDIR,
            FsError::Io { source, .. } => io_error_to_errno(source),
        }
    }
}

/// Result type for passthrough operations.
pub type FsResult<T> = Result<T, FsError>;

/// Extension trait to convert errors to errno.
pub trait ToErrno {
    /// Converts this error to a libc error code.
    fn to_errno(&self) -> i32;
}

impl ToErrno for FsError {
    fn to_errno(&self) -> i32 {
        FsError::to_errno(self)
    }
}

impl ToErrno for io::Error {
    fn to_errno(&self) -> i32 {
        io_error_to_errno(self)
    }
}

/// Converts an `io::Error` to an errno, falling back to `EIO` when the
/// error did not originate from the OS.
pub fn io_error_to_errno(e: &io::Error) -> i32 {
    e.raw_os_error().unwrap_or(libc::EIO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mapping() {
        let e = io::Error::from_raw_os_error(libc::EACCES);
        assert_eq!(io_error_to_errno(&e), libc::EACCES);

        let e = io::Error::other("custom error");
        assert_eq!(io_error_to_errno(&e), libc::EIO);
    }

    #[test]
    fn test_from_io_not_found() {
        let e = FsError::from_io("/backing/missing", io::Error::from_raw_os_error(libc::ENOENT));
        assert!(matches!(e, FsError::NotFound { .. }));
        assert_eq!(e.to_errno(), libc::ENOENT);
        assert_eq!(e.path(), Path::new("/backing/missing"));
    }

    #[test]
    fn test_from_io_path_through_file_is_not_found() {
        let e = FsError::from_io("/backing/main.py/x", io::Error::from_raw_os_error(libc::ENOTDIR));
        assert!(matches!(e, FsError::NotFound { .. }));
        assert_eq!(e.to_errno(), libc::ENOENT);
    }

    #[test]
    fn test_not_a_directory_errno() {
        let e = FsError::not_a_directory(Path::new("/backing/main.py"));
        assert_eq!(e.to_errno(), libc::ENOTDIR);
    }

    #[test]
    fn test_from_io_keeps_os_code() {
        let codes = [libc::EACCES, libc::EPERM, libc::EIO, libc::ELOOP, libc::EISDIR];
        for code in codes {
            let e = FsError::from_io("/backing/f", io::Error::from_raw_os_error(code));
            assert!(matches!(e, FsError::Io { .. }), "errno {code} should stay Io");
            assert_eq!(e.to_errno(), code);
        }
    }

    #[test]
    fn test_custom_io_error_maps_to_eio() {
        let e = FsError::from_io("/backing/f", io::Error::other("short read"));
        assert_eq!(e.to_errno(), libc::EIO);
    }

    #[test]
    fn test_display_includes_path() {
        let e = FsError::not_found(Path::new("/backing/nfs/missing.txt"));
        assert!(e.to_string().contains("missing.txt"));

        let e = FsError::not_a_directory(Path::new("/backing/main.py"));
        assert!(e.to_string().contains("main.py"));
    }

    #[test]
    fn test_to_errno_trait() {
        let e = io::Error::from_raw_os_error(libc::EROFS);
        assert_eq!(ToErrno::to_errno(&e), libc::EROFS);

        let e = FsError::not_found(Path::new("/x"));
        assert_eq!(ToErrno::to_errno(&e), libc::ENOENT);
    }
}
