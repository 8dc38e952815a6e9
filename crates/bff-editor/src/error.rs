//! Error type shared by every fallible editor operation.

use std::io;
use std::path::{Path, PathBuf};

/// Everything that can go wrong while running one command.
///
/// Line-range problems are ordinary results, not panics: the command layer
/// reports them and the process exits non-zero.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("line {line} is out of range (buffer has {len} lines)")]
    LineOutOfRange { line: usize, len: usize },

    #[error("buffer '{buffer}' has no file path; give one to `save`")]
    NoFilePath { buffer: String },

    #[error("invalid buffer name {0:?}")]
    InvalidBufferName(String),

    #[error("line text must not contain a newline")]
    MultilineText,

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: could not encode buffer metadata: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl EditorError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
