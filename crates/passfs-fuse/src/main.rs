//! passfs - Mount a directory tree read-only through FUSE.
//!
//! Usage: passfs [BACKING_ROOT] [MOUNTPOINT]

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use passfs_core::{MountConfig, Passthrough, DEFAULT_BACKING_DIR, DEFAULT_FS_NAME, DEFAULT_MOUNTPOINT};
use passfs_fuse::{ensure_mountpoint, spawn_mount, PassthroughFS};
use std::path::PathBuf;
use std::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "passfs")]
#[command(about = "Mount a directory tree read-only through FUSE")]
#[command(version)]
struct Cli {
    /// Directory whose contents are exposed
    #[arg(default_value = DEFAULT_BACKING_DIR)]
    backing_root: PathBuf,

    /// Mountpoint for the filesystem (created if missing)
    #[arg(default_value = DEFAULT_MOUNTPOINT)]
    mountpoint: PathBuf,

    /// Filesystem name shown in the mount table
    #[arg(long, default_value = DEFAULT_FS_NAME)]
    fs_name: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let config = MountConfig::new(&cli.backing_root, cli.mountpoint)
        .context("Invalid backing root")?
        .fs_name(cli.fs_name);

    ensure_mountpoint(config.mountpoint()).with_context(|| {
        format!("Failed to create mountpoint {}", config.mountpoint().display())
    })?;

    info!(
        backing = %config.backing_root().display(),
        mount = %config.mountpoint().display(),
        "Mounting passthrough"
    );

    mount_and_wait(&config)
}

/// Mount the filesystem and wait for Ctrl+C.
fn mount_and_wait(config: &MountConfig) -> Result<()> {
    let fs = PassthroughFS::new(Passthrough::new(config), config.backing_root());

    // Set up channel for signal handling
    let (tx, rx) = mpsc::channel::<()>();

    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("Failed to set signal handler")?;

    info!("Mounting filesystem (press Ctrl+C to unmount)");

    let mount = spawn_mount(fs, config).map_err(|e| {
        error!(error = %e, "Mount failed");
        anyhow::anyhow!("Failed to mount filesystem: {}", e)
    })?;

    match rx.recv() {
        Ok(()) => {
            info!("Received interrupt signal, unmounting...");
        }
        Err(_) => {
            warn!("Signal channel closed unexpectedly");
        }
    }

    mount.unmount();
    Ok(())
}
