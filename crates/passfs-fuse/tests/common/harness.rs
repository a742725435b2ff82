//! Test mount harness for FUSE integration tests.
//!
//! Provides `TestMount`, which builds a temporary backing tree, mounts it
//! read-only and unmounts on drop.

// Not all tests use all TestMount methods
#![allow(dead_code)]

use passfs_core::{MountConfig, Passthrough};
use passfs_fuse::{spawn_mount, PassfsMount, PassthroughFS};
use std::fs::{self, File, Metadata};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// How long to wait for mount to become ready.
const MOUNT_READY_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait between mount readiness checks.
const MOUNT_CHECK_INTERVAL: Duration = Duration::from_millis(100);

pub const MAIN_PY: &str = "print(\"Hello from main.py in project-1\")\n";
pub const ENTRYPOINT_PY: &str = "print(\"Starting project-2 entrypoint\")\n";
pub const COMMON_LIB_PY: &str = "def util(): return \"Shared util function\"\n";

/// A mounted passthrough over a temporary backing tree.
///
/// ```ignore
/// let mount = TestMount::with_sample_tree().unwrap();
/// assert_eq!(mount.read("project-1/main.py").unwrap(), MAIN_PY.as_bytes());
/// ```
pub struct TestMount {
    /// The mount handle (unmounts on drop).
    _mount: PassfsMount,
    /// Path where the backing tree is mounted.
    pub mount_path: PathBuf,
    /// Backing directory exposed by the mount.
    pub backing_path: PathBuf,
    /// Holds both the backing tree and the mount point.
    _temp: TempDir,
}

impl TestMount {
    /// Mount the two-project sample tree.
    pub fn with_sample_tree() -> Result<Self, String> {
        let temp = TempDir::new().map_err(|e| format!("Failed to create temp dir: {e}"))?;
        let backing_path = temp.path().join("nfs");
        create_sample_tree(&backing_path).map_err(|e| format!("Failed to create backing tree: {e}"))?;

        let mount_path = temp.path().join("mnt");
        fs::create_dir(&mount_path).map_err(|e| format!("Failed to create mount point: {e}"))?;

        let config = MountConfig::new(&backing_path, &mount_path)
            .map_err(|e| format!("Invalid config: {e}"))?
            .fs_name("passfs-test");
        let fs = PassthroughFS::new(Passthrough::new(&config), config.backing_root());

        let mount = spawn_mount(fs, &config).map_err(|e| format!("Failed to mount: {e}"))?;

        Self::wait_for_mount(&mount_path)?;

        Ok(Self {
            _mount: mount,
            mount_path,
            backing_path,
            _temp: temp,
        })
    }

    /// Wait until the mount point has a different device ID than its
    /// parent, which indicates the FUSE filesystem is mounted there.
    fn wait_for_mount(mount_path: &Path) -> Result<(), String> {
        use std::os::unix::fs::MetadataExt;

        let parent_path = mount_path.parent().ok_or("mount_path has no parent")?;
        let parent_dev = fs::metadata(parent_path)
            .map_err(|e| format!("Failed to stat parent: {e}"))?
            .dev();

        let deadline = Instant::now() + MOUNT_READY_TIMEOUT;
        while Instant::now() < deadline {
            if let Ok(mount_meta) = fs::metadata(mount_path)
                && mount_meta.dev() != parent_dev
            {
                return Ok(());
            }
            thread::sleep(MOUNT_CHECK_INTERVAL);
        }
        Err("Mount did not become ready in time (device ID unchanged)".to_string())
    }

    /// Unmount explicitly and return the (now plain) mount point path.
    ///
    /// The backing tree is removed once the returned `TempDir` is dropped.
    pub fn unmount(self) -> (PathBuf, TempDir) {
        self._mount.unmount();
        (self.mount_path, self._temp)
    }

    // =========================================================================
    // Filesystem convenience methods
    // =========================================================================

    /// Build a full path under the mount from a relative path.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.mount_path.join(relative.trim_start_matches('/'))
    }

    /// Build a full path under the backing tree from a relative path.
    pub fn backing(&self, relative: &str) -> PathBuf {
        self.backing_path.join(relative.trim_start_matches('/'))
    }

    /// Read a file's contents through the mount.
    pub fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        let mut content = Vec::new();
        File::open(self.path(path))?.read_to_end(&mut content)?;
        Ok(content)
    }

    /// List a directory through the mount (sorted, without `.`/`..`).
    pub fn list(&self, path: &str) -> io::Result<Vec<String>> {
        let mut names: Vec<String> = fs::read_dir(self.path(path))?
            .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<io::Result<_>>()?;
        names.sort();
        Ok(names)
    }

    /// `lstat` through the mount.
    pub fn metadata(&self, path: &str) -> io::Result<Metadata> {
        fs::symlink_metadata(self.path(path))
    }
}

fn create_sample_tree(root: &Path) -> io::Result<()> {
    let project1 = root.join("project-1");
    let project2 = root.join("project-2");
    fs::create_dir_all(&project1)?;
    fs::create_dir_all(&project2)?;
    fs::write(project1.join("main.py"), MAIN_PY)?;
    fs::write(project1.join("common-lib.py"), COMMON_LIB_PY)?;
    fs::write(project2.join("entrypoint.py"), ENTRYPOINT_PY)?;
    fs::write(project2.join("common-lib.py"), COMMON_LIB_PY)?;
    Ok(())
}

/// Check if FUSE is available on this system.
pub fn fuse_available() -> bool {
    #[cfg(target_os = "linux")]
    {
        Path::new("/dev/fuse").exists()
    }
    #[cfg(target_os = "macos")]
    {
        Path::new("/Library/Filesystems/macfuse.fs").exists()
            || Path::new("/Library/Filesystems/osxfuse.fs").exists()
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        false
    }
}

/// Skip test if FUSE is not available.
#[macro_export]
macro_rules! skip_if_no_fuse {
    () => {
        if !$crate::common::harness::fuse_available() {
            eprintln!("Skipping test: FUSE not available on this system");
            return;
        }
    };
}

/// Skip test if mounting fails (common in CI environments).
#[macro_export]
macro_rules! require_mount {
    ($mount_result:expr) => {
        match $mount_result {
            Ok(m) => m,
            Err(e) => {
                eprintln!("Skipping test: {}", e);
                return;
            }
        }
    };
}
