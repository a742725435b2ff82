//! Sample backing tree shared by the integration tests.
//!
//! Mirrors the layout the deployment bootstrap produces: two projects
//! under `nfs/` sharing a `common-lib.py`, plus an empty `ssd/` sibling.

// Not all tests use every helper
#![allow(dead_code)]

use passfs_core::{MountConfig, Passthrough};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const MAIN_PY: &str = "print(\"Hello from main.py in project-1\")\n";
pub const ENTRYPOINT_PY: &str = "print(\"Starting project-2 entrypoint\")\n";
pub const COMMON_LIB_PY: &str = "def util(): return \"Shared util function\"\n";

/// Layout of the sample tree: directory -> files.
const LAYOUT: &[(&str, &[&str])] = &[
    ("ssd", &[]),
    ("nfs/project-1", &["main.py", "common-lib.py"]),
    ("nfs/project-2", &["entrypoint.py", "common-lib.py"]),
];

fn sample_content(name: &str) -> &'static str {
    match name {
        "main.py" => MAIN_PY,
        "entrypoint.py" => ENTRYPOINT_PY,
        _ => COMMON_LIB_PY,
    }
}

/// A temporary copy of the sample tree, removed on drop.
pub struct SampleTree {
    temp: TempDir,
}

impl SampleTree {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        for (dir, files) in LAYOUT {
            let dir_path = temp.path().join(dir);
            fs::create_dir_all(&dir_path).expect("failed to create sample dir");
            for file in *files {
                fs::write(dir_path.join(file), sample_content(file))
                    .expect("failed to write sample file");
            }
        }
        Self { temp }
    }

    /// The base directory containing `nfs/` and `ssd/`.
    pub fn base(&self) -> &Path {
        self.temp.path()
    }

    /// The `nfs/` directory, used as backing root.
    pub fn nfs(&self) -> PathBuf {
        self.temp.path().join("nfs")
    }

    /// Passthrough rooted at `nfs/`.
    pub fn passthrough(&self) -> Passthrough {
        let config = MountConfig::new(self.nfs(), self.temp.path().join("mnt"))
            .expect("sample nfs dir should be a valid backing root");
        Passthrough::new(&config)
    }

    /// Passthrough rooted at the base directory, so virtual paths start with `nfs/`.
    pub fn passthrough_at_base(&self) -> Passthrough {
        let config = MountConfig::new(self.base(), self.temp.path().join("mnt"))
            .expect("sample base dir should be a valid backing root");
        Passthrough::new(&config)
    }
}
