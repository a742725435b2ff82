//! Mounting and unmounting the passthrough filesystem.

use crate::filesystem::PassthroughFS;
use fuser::{BackgroundSession, MountOption};
use passfs_core::{FilesystemOps, MountConfig};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

/// Subtype reported for the mount (`fuse.passfs` in `/proc/mounts`).
pub const SUBTYPE: &str = "passfs";

/// Timeout for graceful `session.join()` before forcing unmount.
/// The join thread may leak on timeout rather than block the caller.
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates the mountpoint and any missing parents.
///
/// Succeeds if the directory already exists.
pub fn ensure_mountpoint(mountpoint: &Path) -> io::Result<()> {
    fs::create_dir_all(mountpoint)
}

/// Mount options for `config`: read-only, with the kernel enforcing the
/// permission bits reported by `getattr`.
pub fn mount_options(config: &MountConfig) -> Vec<MountOption> {
    vec![
        MountOption::FSName(config.name().to_string()),
        MountOption::Subtype(SUBTYPE.to_string()),
        MountOption::RO,
        MountOption::DefaultPermissions,
    ]
}

/// Mounts `fs` at `config`'s mountpoint and serves it on a background thread.
///
/// Requests are dispatched one at a time by that thread.
pub fn spawn_mount<O>(fs: PassthroughFS<O>, config: &MountConfig) -> io::Result<PassfsMount>
where
    O: FilesystemOps + Send + 'static,
{
    let mountpoint = config.mountpoint().to_path_buf();
    let options = mount_options(config);
    tracing::debug!(mountpoint = %mountpoint.display(), ?options, "Spawning FUSE session");

    let session = fuser::spawn_mount2(fs, &mountpoint, &options)?;
    tracing::info!(mountpoint = %mountpoint.display(), "FUSE filesystem mounted");

    Ok(PassfsMount {
        session: Some(session),
        mountpoint,
    })
}

/// Handle to a mounted passthrough filesystem.
///
/// Wraps the fuser `BackgroundSession`. Dropping this handle triggers unmount.
pub struct PassfsMount {
    session: Option<BackgroundSession>,
    mountpoint: PathBuf,
}

impl PassfsMount {
    /// Where the filesystem is mounted.
    pub fn mountpoint(&self) -> &Path {
        &self.mountpoint
    }

    /// Unmounts and waits for the session thread to finish.
    ///
    /// May block while files under the mount are still in use.
    pub fn unmount(mut self) {
        tracing::info!(mountpoint = %self.mountpoint.display(), "Unmounting FUSE filesystem");
        if let Some(session) = self.session.take() {
            session.join();
        }
        tracing::info!(mountpoint = %self.mountpoint.display(), "FUSE unmount successful");
    }

    /// Force unmount the filesystem using system tools.
    /// This is a fallback when the normal unmount is blocked.
    fn force_unmount(&self) {
        #[cfg(target_os = "linux")]
        {
            // Lazy unmount detaches even while busy
            let _ = std::process::Command::new("fusermount")
                .args(["-uz"])
                .arg(&self.mountpoint)
                .output();
        }

        #[cfg(target_os = "macos")]
        {
            let _ = std::process::Command::new("umount")
                .arg("-f")
                .arg(&self.mountpoint)
                .output();
        }
    }
}

impl Drop for PassfsMount {
    fn drop(&mut self) {
        // Ensure session is dropped even if unmount() wasn't called
        if let Some(session) = self.session.take() {
            tracing::debug!("Unmounting FUSE filesystem at {}", self.mountpoint.display());

            let (tx, rx) = mpsc::channel();
            std::thread::spawn(move || {
                session.join();
                let _ = tx.send(());
            });

            match rx.recv_timeout(JOIN_TIMEOUT) {
                Ok(()) => {
                    tracing::debug!("Graceful unmount completed for {}", self.mountpoint.display());
                }
                Err(_) => {
                    tracing::warn!(
                        "session.join() timed out after {:?} for {}, forcing unmount",
                        JOIN_TIMEOUT,
                        self.mountpoint.display()
                    );
                    self.force_unmount();
                }
            }
        }
    }
}
