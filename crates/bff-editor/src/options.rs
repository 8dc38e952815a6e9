//! Runtime options — where buffers live between invocations.
//!
//! Resolution order for the scratch directory:
//!
//! | Source                        | Example                              |
//! |-------------------------------|--------------------------------------|
//! | `--scratch-dir <dir>` flag    | `bff --scratch-dir ./s -b x print`   |
//! | `BFF_SCRATCH_DIR` environment | `BFF_SCRATCH_DIR=./s bff -b x print` |
//! | default                       | `<system temp dir>/bff_buffers`      |
//!
//! The binary's argument parser folds the first two into a single
//! `Option<PathBuf>`; [`Options::new`] supplies the default.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the default scratch directory.
pub const SCRATCH_DIR_ENV: &str = "BFF_SCRATCH_DIR";

/// Directory name used under the system temp dir when nothing is configured.
pub const DEFAULT_SCRATCH_DIR_NAME: &str = "bff_buffers";

/// Resolved options for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    scratch_dir: PathBuf,
}

impl Options {
    /// Build options from an explicitly configured scratch directory, falling
    /// back to [`default_scratch_dir`](Self::default_scratch_dir).
    #[must_use]
    pub fn new(scratch_dir: Option<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.unwrap_or_else(Self::default_scratch_dir),
        }
    }

    /// `<system temp dir>/bff_buffers`.
    #[must_use]
    pub fn default_scratch_dir() -> PathBuf {
        env::temp_dir().join(DEFAULT_SCRATCH_DIR_NAME)
    }

    /// The directory holding one scratch file pair per buffer.
    #[inline]
    #[must_use]
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new(None)
    }
}
