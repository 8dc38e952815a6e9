//! Buffer store — named buffers that outlive the process.
//!
//! Each `bff` invocation is a separate process, so a "session" only exists
//! on disk. The [`BufferStore`] keeps the buffers touched by this process in
//! memory and mirrors every change into the scratch directory:
//!
//! ```text
//! <scratch>/
//!   notes.tmp          one line per buffer line, each `\n`-terminated
//!   notes.meta.json    {"path": "/home/me/notes.txt", "modified": true, "line_ending": "lf"}
//! ```
//!
//! A buffer is created on first reference: if no scratch file exists for a
//! name, an empty buffer is made and persisted right away. Later processes
//! load it back by the same name. Concurrent invocations are not
//! coordinated; the last writer wins.
//!
//! The `.tmp` file is the source of truth for content. A missing or damaged
//! `.meta.json` only loses the file path, modified flag and line ending.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::buffer::{Buffer, LineEnding};
use crate::error::{EditorError, Result};
use crate::options::Options;

// ---------------------------------------------------------------------------
// Scratch directory
// ---------------------------------------------------------------------------

/// Buffer metadata stored next to the line file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ScratchMeta {
    path: Option<PathBuf>,
    modified: bool,
    line_ending: LineEnding,
}

/// The on-disk half of the store: file naming, loading and saving.
#[derive(Debug, Clone)]
struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    fn lines_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.tmp"))
    }

    fn meta_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.meta.json"))
    }

    /// Load `name`, or `None` if it has never been persisted.
    fn load(&self, name: &str) -> Result<Option<Buffer>> {
        let lines_path = self.lines_path(name);
        let text = match fs::read_to_string(&lines_path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(EditorError::io(&lines_path, e)),
        };
        let meta = self.load_meta(name);
        debug!(buffer = name, path = %lines_path.display(), "loaded scratch buffer");
        Ok(Some(Buffer::from_scratch(
            &text,
            meta.path,
            meta.modified,
            meta.line_ending,
        )))
    }

    fn load_meta(&self, name: &str) -> ScratchMeta {
        let meta_path = self.meta_path(name);
        let raw = match fs::read_to_string(&meta_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return ScratchMeta::default(),
            Err(e) => {
                warn!(path = %meta_path.display(), error = %e, "unreadable buffer metadata, using defaults");
                return ScratchMeta::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %meta_path.display(), error = %e, "malformed buffer metadata, using defaults");
            ScratchMeta::default()
        })
    }

    fn save(&self, name: &str, buf: &Buffer) -> Result<()> {
        let lines_path = self.lines_path(name);
        fs::write(&lines_path, buf.contents()).map_err(|e| EditorError::io(&lines_path, e))?;

        let meta_path = self.meta_path(name);
        let meta = ScratchMeta {
            path: buf.path().map(Path::to_path_buf),
            modified: buf.is_modified(),
            line_ending: buf.line_ending(),
        };
        let json = serde_json::to_string_pretty(&meta).map_err(|source| EditorError::Metadata {
            path: meta_path.clone(),
            source,
        })?;
        fs::write(&meta_path, json).map_err(|e| EditorError::io(&meta_path, e))?;

        debug!(buffer = name, lines = buf.line_count(), "persisted scratch buffer");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// BufferStore
// ---------------------------------------------------------------------------

/// Named buffers for one invocation, backed by a scratch directory.
///
/// Buffers are value-typed entries of a map; callers reach them through
/// [`buffer`](Self::buffer) for reads and [`edit`](Self::edit) for changes.
/// `edit` persists after the closure succeeds, so a mutation can't be
/// forgotten on disk.
#[derive(Debug)]
pub struct BufferStore {
    scratch: ScratchDir,
    buffers: BTreeMap<String, Buffer>,
}

impl BufferStore {
    /// Open the store rooted at the configured scratch directory, creating
    /// the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Io`] if the directory can't be created.
    pub fn open(options: &Options) -> Result<Self> {
        let root = options.scratch_dir().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| EditorError::io(&root, e))?;
        debug!(scratch_dir = %root.display(), "opened buffer store");
        Ok(Self {
            scratch: ScratchDir { root },
            buffers: BTreeMap::new(),
        })
    }

    /// The directory buffers are persisted to.
    #[inline]
    #[must_use]
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch.root
    }

    /// The buffer called `name`, loading it from scratch storage or creating
    /// an empty one on first reference.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidBufferName`] for names that can't be
    /// file names, or [`EditorError::Io`] if scratch storage fails.
    pub fn buffer(&mut self, name: &str) -> Result<&Buffer> {
        self.ensure_loaded(name)?;
        Ok(&*self.buffers.entry(name.to_owned()).or_default())
    }

    /// Run `f` on the buffer called `name` and persist the result.
    ///
    /// Nothing is persisted when `f` fails; buffer operations validate before
    /// they mutate, so the scratch copy still matches memory.
    ///
    /// # Errors
    ///
    /// Propagates the error from `f`, plus everything [`buffer`](Self::buffer)
    /// can return.
    pub fn edit<T>(&mut self, name: &str, f: impl FnOnce(&mut Buffer) -> Result<T>) -> Result<T> {
        self.ensure_loaded(name)?;
        let buf = self.buffers.entry(name.to_owned()).or_default();
        let out = f(&mut *buf)?;
        self.scratch.save(name, buf)?;
        Ok(out)
    }

    /// Replace the buffer called `name` with the contents of `path`.
    ///
    /// The file is read before anything else is touched: if it can't be
    /// read, the existing buffer (in memory and on disk) is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidBufferName`] or [`EditorError::Io`].
    pub fn open_file(&mut self, name: &str, path: &Path) -> Result<&Buffer> {
        validate_name(name)?;
        let buf = Buffer::from_file(path)?;
        self.scratch.save(name, &buf)?;
        info!(
            buffer = name,
            path = %path.display(),
            lines = buf.line_count(),
            line_ending = %buf.line_ending(),
            "opened file"
        );
        self.buffers.insert(name.to_owned(), buf);
        Ok(&*self.buffers.entry(name.to_owned()).or_default())
    }

    /// Write the buffer called `name` to `path`, or to its own file path
    /// when `path` is `None`. Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::NoFilePath`] if neither path exists, or
    /// [`EditorError::Io`] if the write fails.
    pub fn save_file(&mut self, name: &str, path: Option<&Path>) -> Result<PathBuf> {
        self.ensure_loaded(name)?;
        let buf = self.buffers.entry(name.to_owned()).or_default();
        let target = match path {
            Some(path) => path.to_path_buf(),
            None => buf
                .path()
                .map(Path::to_path_buf)
                .ok_or_else(|| EditorError::NoFilePath {
                    buffer: name.to_owned(),
                })?,
        };
        buf.save_as(&target)?;
        self.scratch.save(name, buf)?;
        info!(buffer = name, path = %target.display(), lines = buf.line_count(), "saved file");
        Ok(target)
    }

    /// Reset the buffer called `name` to empty and unmodified, associated
    /// with `path` if given.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidBufferName`] or [`EditorError::Io`].
    pub fn create(&mut self, name: &str, path: Option<PathBuf>) -> Result<&Buffer> {
        validate_name(name)?;
        let buf = self.buffers.entry(name.to_owned()).or_default();
        buf.reset(path);
        self.scratch.save(name, buf)?;
        Ok(&*buf)
    }

    fn ensure_loaded(&mut self, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.buffers.contains_key(name) {
            return Ok(());
        }
        let buf = if let Some(buf) = self.scratch.load(name)? {
            buf
        } else {
            let buf = Buffer::new();
            self.scratch.save(name, &buf)?;
            debug!(buffer = name, "created buffer");
            buf
        };
        self.buffers.insert(name.to_owned(), buf);
        Ok(())
    }
}

/// A buffer name becomes a file name in the scratch directory, so it must
/// stay a single, ordinary path component.
fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(EditorError::InvalidBufferName(name.to_owned()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> BufferStore {
        BufferStore::open(&Options::new(Some(dir.path().join("scratch")))).unwrap()
    }

    fn lines_of(store: &mut BufferStore, name: &str) -> Vec<String> {
        store.buffer(name).unwrap().lines().map(String::from).collect()
    }

    // -- Creation and names -------------------------------------------------

    #[test]
    fn open_creates_scratch_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.scratch_dir().is_dir());
    }

    #[test]
    fn first_reference_creates_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        assert!(store.buffer("fresh").unwrap().is_empty());
        assert!(store.scratch_dir().join("fresh.tmp").is_file());
        assert!(store.scratch_dir().join("fresh.meta.json").is_file());
    }

    #[test]
    fn invalid_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        for name in ["", ".", "..", "a/b", "a\\b", "nul\0"] {
            assert!(
                matches!(store.buffer(name), Err(EditorError::InvalidBufferName(_))),
                "{name:?} should be rejected"
            );
        }
        assert!(store.buffer("notes.v2").is_ok());
    }

    // -- Persistence across store instances ---------------------------------

    #[test]
    fn edits_are_visible_to_a_new_store() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = store_in(&dir);
            store.edit("s", |b| b.append("one")).unwrap();
            store.edit("s", |b| b.append("two")).unwrap();
            store.edit("s", |b| b.insert(1, "zero")).unwrap();
        }
        let mut store = store_in(&dir);
        assert_eq!(lines_of(&mut store, "s"), ["zero", "one", "two"]);
        assert!(store.buffer("s").unwrap().is_modified());
    }

    #[test]
    fn scratch_file_is_one_line_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.edit("s", |b| b.append("alpha")).unwrap();
        store.edit("s", |b| b.append("")).unwrap();
        let raw = fs::read_to_string(store.scratch_dir().join("s.tmp")).unwrap();
        assert_eq!(raw, "alpha\n\n");
    }

    #[test]
    fn failed_edit_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.edit("s", |b| b.append("only")).unwrap();
        let err = store.edit("s", |b| b.delete(5)).unwrap_err();
        assert!(matches!(err, EditorError::LineOutOfRange { line: 5, len: 1 }));

        let mut again = store_in(&dir);
        assert_eq!(lines_of(&mut again, "s"), ["only"]);
    }

    #[test]
    fn missing_metadata_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.scratch_dir().join("bare.tmp"), "x\ny\n").unwrap();

        let mut store = store_in(&dir);
        let buf = store.buffer("bare").unwrap();
        assert_eq!(buf.line_count(), 2);
        assert!(buf.path().is_none());
        assert!(!buf.is_modified());
    }

    #[test]
    fn malformed_metadata_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.scratch_dir().join("m.tmp"), "x\n").unwrap();
        fs::write(store.scratch_dir().join("m.meta.json"), "{not json").unwrap();

        let mut store = store_in(&dir);
        assert_eq!(lines_of(&mut store, "m"), ["x"]);
        assert!(store.buffer("m").unwrap().path().is_none());
    }

    #[test]
    fn scratch_keeps_carriage_returns_inside_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.edit("cr", |b| b.append("a\rb")).unwrap();

        let mut again = store_in(&dir);
        assert_eq!(lines_of(&mut again, "cr"), ["a\rb"]);
    }

    #[test]
    fn carriage_returns_survive_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lf.txt");
        let mut store = store_in(&dir);
        store.edit("lf", |b| b.append("x\r")).unwrap();
        store.edit("lf", |b| b.append("y")).unwrap();
        store.save_file("lf", Some(&file)).unwrap();

        let mut again = store_in(&dir);
        again.open_file("lf", &file).unwrap();
        assert_eq!(lines_of(&mut again, "lf"), ["x\r", "y"]);
    }

    #[test]
    fn cr_file_with_inner_carriage_return_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("mac.txt");
        fs::write(&file, "a\rb\r").unwrap();

        store_in(&dir).open_file("mac", &file).unwrap();
        let mut store = store_in(&dir);
        store.edit("mac", |b| b.replace(1, "p\rq")).unwrap();
        store.save_file("mac", None).unwrap();

        let mut again = store_in(&dir);
        again.open_file("mac", &file).unwrap();
        assert_eq!(lines_of(&mut again, "mac"), ["p\rq", "b"]);
    }

    // -- open / save / create -----------------------------------------------

    #[test]
    fn open_save_reopen_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.txt");
        fs::write(&file, "first\nsecond\n").unwrap();

        {
            let mut store = store_in(&dir);
            store.open_file("doc", &file).unwrap();
        }
        {
            let mut store = store_in(&dir);
            store.edit("doc", |b| b.replace(2, "SECOND")).unwrap();
        }
        {
            let mut store = store_in(&dir);
            assert_eq!(store.save_file("doc", None).unwrap(), file);
            assert!(!store.buffer("doc").unwrap().is_modified());
        }

        assert_eq!(fs::read_to_string(&file).unwrap(), "first\nSECOND\n");
        let mut store = store_in(&dir);
        store.open_file("doc", &file).unwrap();
        assert_eq!(lines_of(&mut store, "doc"), ["first", "SECOND"]);
    }

    #[test]
    fn open_keeps_crlf_across_processes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("win.txt");
        fs::write(&file, "a\r\nb\r\n").unwrap();

        store_in(&dir).open_file("w", &file).unwrap();
        let mut store = store_in(&dir);
        store.edit("w", |b| b.append("c")).unwrap();
        store.save_file("w", None).unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "a\r\nb\r\nc\r\n");
    }

    #[test]
    fn failed_open_leaves_buffer_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.edit("keep", |b| b.append("precious")).unwrap();

        let missing = dir.path().join("nope.txt");
        assert!(matches!(
            store.open_file("keep", &missing),
            Err(EditorError::Io { .. })
        ));

        assert_eq!(lines_of(&mut store, "keep"), ["precious"]);
        let mut again = store_in(&dir);
        assert_eq!(lines_of(&mut again, "keep"), ["precious"]);
    }

    #[test]
    fn save_without_any_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.edit("s", |b| b.append("x")).unwrap();
        let err = store.save_file("s", None).unwrap_err();
        assert!(matches!(err, EditorError::NoFilePath { ref buffer } if buffer == "s"));
    }

    #[test]
    fn save_with_path_adopts_it() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.txt");
        let mut store = store_in(&dir);
        store.edit("s", |b| b.append("x")).unwrap();
        store.save_file("s", Some(&file)).unwrap();

        let mut again = store_in(&dir);
        let buf = again.buffer("s").unwrap();
        assert_eq!(buf.path(), Some(file.as_path()));
        assert!(!buf.is_modified());
    }

    #[test]
    fn create_resets_existing_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.edit("s", |b| b.append("old")).unwrap();
        let target = dir.path().join("new.txt");
        store.create("s", Some(target.clone())).unwrap();

        let mut again = store_in(&dir);
        let buf = again.buffer("s").unwrap();
        assert!(buf.is_empty());
        assert!(!buf.is_modified());
        assert_eq!(buf.path(), Some(target.as_path()));
    }
}
