//! Virtual paths and their translation onto the backing root.
//!
//! A [`VirtualPath`] is what clients of the mount point see. The
//! [`PathTranslator`] turns it into a backing path by stripping one leading
//! separator and appending the rest to the backing root.
//!
//! # Traversal
//!
//! No normalization is performed: `..` segments are passed through, so a
//! virtual path such as `/../etc` addresses a location outside the backing
//! root. The FUSE dispatcher never builds such paths (the kernel resolves
//! `.` and `..` itself and only hands over single names), but callers of the
//! core API directly are responsible for their own input.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// A path as addressed by clients of the mount point.
///
/// Usually absolute (`/project-1/main.py`); a relative form is accepted and
/// translated the same way minus the leading separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualPath(PathBuf);

impl VirtualPath {
    /// Creates a virtual path from anything path-like.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// The root of the mount (`/`).
    pub fn root() -> Self {
        Self(PathBuf::from("/"))
    }

    /// Returns `true` for `/`.
    pub fn is_root(&self) -> bool {
        self.0.as_os_str() == "/"
    }

    /// Appends a single entry name.
    #[must_use]
    pub fn join(&self, name: impl AsRef<OsStr>) -> Self {
        Self(self.0.join(name.as_ref()))
    }

    /// Parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        self.0.parent().map(|p| Self(p.to_path_buf()))
    }

    /// Final component, or `None` for the root.
    pub fn file_name(&self) -> Option<&OsStr> {
        self.0.file_name()
    }

    /// Borrows the path.
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

impl From<&str> for VirtualPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl AsRef<Path> for VirtualPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Maps virtual paths onto the backing root.
///
/// Deterministic and side-effect-free; the backing path is recomputed on
/// every call and never stored.
#[derive(Debug, Clone)]
pub struct PathTranslator {
    root: PathBuf,
}

impl PathTranslator {
    /// Creates a translator for the given backing root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The backing root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Translates `path` to its backing path.
    ///
    /// Exactly one leading separator is stripped; the remainder is appended
    /// to the root byte-for-byte. `Path::join` is not used because it would
    /// let a remaining absolute path replace the root entirely.
    pub fn translate(&self, path: &VirtualPath) -> PathBuf {
        let raw = path.as_path().as_os_str().as_bytes();
        let relative = raw.strip_prefix(b"/").unwrap_or(raw);
        if relative.is_empty() {
            return self.root.clone();
        }

        let mut backing = OsString::from(self.root.as_os_str());
        if !self.root.as_os_str().as_bytes().ends_with(b"/") {
            backing.push("/");
        }
        backing.push(OsStr::from_bytes(relative));
        PathBuf::from(backing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator() -> PathTranslator {
        PathTranslator::new("/srv/nfs")
    }

    #[test]
    fn test_root_maps_to_backing_root() {
        assert_eq!(translator().translate(&VirtualPath::root()), PathBuf::from("/srv/nfs"));
    }

    #[test]
    fn test_strips_single_leading_separator() {
        let t = translator();
        assert_eq!(
            t.translate(&VirtualPath::new("/project-1/main.py")),
            PathBuf::from("/srv/nfs/project-1/main.py")
        );
        assert_eq!(
            t.translate(&VirtualPath::new("project-1/main.py")),
            PathBuf::from("/srv/nfs/project-1/main.py")
        );
    }

    #[test]
    fn test_double_separator_stays_under_root() {
        let backing = translator().translate(&VirtualPath::new("//etc/passwd"));
        assert_eq!(backing.as_os_str(), "/srv/nfs//etc/passwd");
        assert!(backing.starts_with("/srv/nfs"));
    }

    #[test]
    fn test_parent_segments_are_not_normalized() {
        let backing = translator().translate(&VirtualPath::new("/../etc/passwd"));
        assert_eq!(backing, PathBuf::from("/srv/nfs/../etc/passwd"));
    }

    #[test]
    fn test_root_with_trailing_separator() {
        let t = PathTranslator::new("/srv/nfs/");
        assert_eq!(
            t.translate(&VirtualPath::new("/a")),
            PathBuf::from("/srv/nfs/a")
        );
    }

    #[test]
    fn test_translate_is_deterministic() {
        let t = translator();
        let p = VirtualPath::new("/project-2/entrypoint.py");
        assert_eq!(t.translate(&p), t.translate(&p));
    }

    #[test]
    fn test_virtual_path_navigation() {
        let root = VirtualPath::root();
        assert!(root.is_root());
        assert!(root.parent().is_none());

        let child = root.join("project-1").join("main.py");
        assert_eq!(child.as_path(), Path::new("/project-1/main.py"));
        assert_eq!(child.file_name(), Some(OsStr::new("main.py")));
        assert_eq!(child.parent(), Some(VirtualPath::new("/project-1")));
        assert_eq!(child.parent().and_then(|p| p.parent()), Some(root));
        assert_eq!(child.to_string(), "/project-1/main.py");
    }
}
