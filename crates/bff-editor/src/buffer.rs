//! Line buffer — the fundamental unit of text storage.
//!
//! A `Buffer` wraps a [`ropey::Rope`] with line-oriented editing operations,
//! file I/O, and metadata tracking (path, modified flag, line endings).
//!
//! # Design choices
//!
//! - **Every line is `\n`-terminated inside the rope.** The rope is either
//!   empty or ends with `\n`, so the number of text lines is always
//!   `len_lines() - 1` and a line's content is its rope line minus the final
//!   char. ropey is built without `cr_lines`/`unicode_lines`, so a stray `\r`
//!   or U+2028 is plain content, never a line break.
//!
//! - **Line numbers are 1-based.** This is the command-layer contract: every
//!   operation validates its line number against `1..=line_count()` and
//!   returns [`EditorError::LineOutOfRange`] instead of panicking. Conversion
//!   to rope indices happens in exactly one place, `index_of`.
//!
//! - **Line endings are detected on load** and restored on save. Internally
//!   the rope only ever holds `\n`; the `line_ending` field records the style
//!   the file had so that a CRLF file stays CRLF.

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use ropey::{Rope, RopeSlice};
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};

// ---------------------------------------------------------------------------
// Line ending detection
// ---------------------------------------------------------------------------

/// Line ending style of a file.
///
/// Detected on load with [`LineEnding::detect`]. Defaults to `Lf` for
/// new buffers (the Unix standard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\n` — Unix, macOS, Linux.
    #[default]
    Lf,
    /// `\r\n` — Windows, DOS.
    CrLf,
    /// `\r` — Classic Mac (pre-OS X). Rare but we handle it.
    Cr,
}

impl LineEnding {
    /// The string representation of this line ending.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }

    /// Detect the line ending of a file's text.
    ///
    /// A file is CRLF only if every `\n` follows a `\r`, and CR only if it
    /// has no `\n` at all. Anything else is LF, and its stray `\r`s are line
    /// content. Returns `Lf` if no line endings are found.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        let newlines = text.matches('\n').count();
        if newlines == 0 {
            return if text.contains('\r') { Self::Cr } else { Self::Lf };
        }
        if text.matches("\r\n").count() == newlines {
            Self::CrLf
        } else {
            Self::Lf
        }
    }

    /// Rewrite `text` so that this ending becomes `\n`. Other bytes are left
    /// alone, so a lone `\r` inside an LF file survives as content.
    fn to_lf(self, text: &str) -> Cow<'_, str> {
        match self {
            Self::Lf => Cow::Borrowed(text),
            Self::CrLf => Cow::Owned(text.replace("\r\n", "\n")),
            Self::Cr => Cow::Owned(text.replace('\r', "\n")),
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lf => f.write_str("LF"),
            Self::CrLf => f.write_str("CRLF"),
            Self::Cr => f.write_str("CR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// An ordered list of text lines backed by a rope.
///
/// The buffer tracks:
///
/// - The text content (via `ropey::Rope`, one `\n`-terminated line per entry)
/// - The file path (if backed by a file)
/// - Whether the content has been modified since last open/save
/// - The line ending style (for consistent saves)
///
/// Buffers don't know their own name; names are keys in the
/// [`BufferStore`](crate::store::BufferStore).
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
    path: Option<PathBuf>,
    modified: bool,
    line_ending: LineEnding,
}

impl Buffer {
    // -- Construction -------------------------------------------------------

    /// Create an empty buffer with no file path.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            path: None,
            modified: false,
            line_ending: LineEnding::Lf,
        }
    }

    /// Create a buffer from text, splitting on its detected line ending.
    ///
    /// A missing final line ending is tolerated: `"a\nb"` and `"a\nb\n"` both
    /// produce the two lines `a` and `b`.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let line_ending = LineEnding::detect(text);
        Self {
            rope: terminated_rope(&line_ending.to_lf(text)),
            path: None,
            modified: false,
            line_ending,
        }
    }

    /// Create a buffer from already-split lines.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::MultilineText`] if any line contains `\n`.
    pub fn from_lines<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        for line in lines {
            let line = line.as_ref();
            check_text(line)?;
            text.push_str(line);
            text.push('\n');
        }
        Ok(Self {
            rope: Rope::from_str(&text),
            ..Self::new()
        })
    }

    /// Load a buffer from a file.
    ///
    /// Detects line endings from the file content. The buffer starts in an
    /// unmodified state with its path set to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Io`] if the file cannot be read or contains
    /// invalid UTF-8.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| EditorError::io(path, e))?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            ..Self::from_text(&text)
        })
    }

    /// Rebuild a buffer from scratch-file text plus its saved metadata.
    ///
    /// Scratch text is always `\n`-separated regardless of `line_ending`, so
    /// no conversion happens here.
    pub(crate) fn from_scratch(
        text: &str,
        path: Option<PathBuf>,
        modified: bool,
        line_ending: LineEnding,
    ) -> Self {
        Self {
            rope: terminated_rope(text),
            path,
            modified,
            line_ending,
        }
    }

    // -- Text access --------------------------------------------------------

    /// Number of text lines. An empty buffer has 0 lines.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rope.len_lines() - 1
    }

    /// True when the buffer holds no lines.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Line `n` (1-based) without its line ending, as a zero-copy slice.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::LineOutOfRange`] unless `1 <= n <= line_count()`.
    pub fn line(&self, n: usize) -> Result<RopeSlice<'_>> {
        let idx = self.index_of(n)?;
        Ok(self.content_at(idx))
    }

    /// Line `n` (1-based) as an owned `String`.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::LineOutOfRange`] unless `1 <= n <= line_count()`.
    pub fn get(&self, n: usize) -> Result<String> {
        self.line(n).map(String::from)
    }

    /// Iterate over all lines (without line endings), first to last.
    pub fn lines(&self) -> impl Iterator<Item = RopeSlice<'_>> {
        (0..self.line_count()).map(|idx| self.content_at(idx))
    }

    /// All lines, each followed by `\n`. This is the scratch-file format.
    #[must_use]
    pub fn contents(&self) -> String {
        self.rope.to_string()
    }

    /// Clamp `start..=end` (1-based) to the lines that exist.
    ///
    /// `start` below 1 becomes 1 and `end` past the last line becomes the last
    /// line. The result may be empty (`start > end`), e.g. for an empty
    /// buffer or a reversed request; callers iterate it as-is.
    #[must_use]
    pub fn clamp_range(&self, start: usize, end: usize) -> RangeInclusive<usize> {
        start.max(1)..=end.min(self.line_count())
    }

    // -- Editing ------------------------------------------------------------

    /// Add a line after the last one.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::MultilineText`] if `text` contains `\n`.
    pub fn append(&mut self, text: &str) -> Result<()> {
        check_text(text)?;
        let end = self.rope.len_chars();
        self.insert_at(end, text);
        Ok(())
    }

    /// Overwrite line `n` with `text`.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::LineOutOfRange`] for a bad `n`, or
    /// [`EditorError::MultilineText`] if `text` contains `\n`.
    pub fn replace(&mut self, n: usize, text: &str) -> Result<()> {
        check_text(text)?;
        let idx = self.index_of(n)?;
        let start = self.rope.line_to_char(idx);
        let end = start + self.content_at(idx).len_chars();
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        self.modified = true;
        Ok(())
    }

    /// Insert `text` as a new line before line `n`.
    ///
    /// A line number past the end appends, so `insert(line_count() + 1, ..)`
    /// and `insert(usize::MAX, ..)` both add a last line.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::LineOutOfRange`] when `n` is 0, or
    /// [`EditorError::MultilineText`] if `text` contains `\n`.
    pub fn insert(&mut self, n: usize, text: &str) -> Result<()> {
        check_text(text)?;
        if n == 0 {
            return Err(self.out_of_range(n));
        }
        let idx = (n - 1).min(self.line_count());
        let at = self.rope.line_to_char(idx);
        self.insert_at(at, text);
        Ok(())
    }

    /// Remove line `n` and return its text.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::LineOutOfRange`] unless `1 <= n <= line_count()`.
    pub fn delete(&mut self, n: usize) -> Result<String> {
        let idx = self.index_of(n)?;
        Ok(self.remove_at(idx))
    }

    /// Move line `from` so that it lands before the line that was at `to`.
    ///
    /// The line is removed first, which shifts everything after it up by one;
    /// a target below the source is adjusted for that shift. Moving a line
    /// onto itself, or onto the line right after it, leaves the order as is.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::LineOutOfRange`] if either line number is
    /// outside `1..=line_count()`. The buffer is unchanged on error.
    pub fn move_line(&mut self, from: usize, to: usize) -> Result<()> {
        let from_idx = self.index_of(from)?;
        let to_idx = self.index_of(to)?;
        let text = self.remove_at(from_idx);
        let to_idx = if to_idx > from_idx { to_idx - 1 } else { to_idx };
        let at = self.rope.line_to_char(to_idx);
        self.insert_at(at, &text);
        Ok(())
    }

    /// Insert a duplicate of line `from` before line `to`. The original line
    /// stays where it was (shifted down by one if it followed `to`).
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::LineOutOfRange`] if either line number is
    /// outside `1..=line_count()`.
    pub fn copy_line(&mut self, from: usize, to: usize) -> Result<()> {
        let from_idx = self.index_of(from)?;
        let to_idx = self.index_of(to)?;
        let text = self.content_at(from_idx).to_string();
        let at = self.rope.line_to_char(to_idx);
        self.insert_at(at, &text);
        Ok(())
    }

    /// Drop all lines and reset metadata, as if freshly created with `path`.
    pub fn reset(&mut self, path: Option<PathBuf>) {
        *self = Self {
            path,
            ..Self::new()
        };
    }

    // -- Metadata -----------------------------------------------------------

    /// The file path this buffer is associated with, if any.
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// True if the buffer has been modified since the last open or save.
    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// The detected (or configured) line ending style.
    #[inline]
    #[must_use]
    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    // -- File I/O -----------------------------------------------------------

    /// Write the buffer to `path` using its line ending style, then make
    /// `path` the buffer's file and mark it unmodified.
    ///
    /// If `\r`s in the lines would make the file read back differently in
    /// the buffer's own style, it is written as CRLF instead and the buffer
    /// adopts that style.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Io`] if the write fails. The buffer's path and
    /// modified flag are unchanged in that case.
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        let line_ending = self.save_line_ending();
        fs::write(path, self.text_with_line_endings(line_ending))
            .map_err(|e| EditorError::io(path, e))?;
        self.path = Some(path.to_path_buf());
        self.modified = false;
        self.line_ending = line_ending;
        Ok(())
    }

    /// The style to write with: the buffer's own unless [`LineEnding::detect`]
    /// would misread the result. CRLF always reads back exactly.
    fn save_line_ending(&self) -> LineEnding {
        let ambiguous = match self.line_ending {
            LineEnding::CrLf => false,
            LineEnding::Cr => self.lines().any(|line| line.chars().any(|c| c == '\r')),
            LineEnding::Lf => {
                !self.is_empty()
                    && self.lines().all(|line| {
                        line.len_chars() > 0 && line.char(line.len_chars() - 1) == '\r'
                    })
            }
        };
        if ambiguous {
            LineEnding::CrLf
        } else {
            self.line_ending
        }
    }

    fn text_with_line_endings(&self, line_ending: LineEnding) -> String {
        let raw = self.rope.to_string();
        match line_ending {
            LineEnding::Lf => raw,
            ending => raw.replace('\n', ending.as_str()),
        }
    }

    // -- Internals ----------------------------------------------------------

    /// Convert a 1-based line number to a 0-based rope line index.
    fn index_of(&self, n: usize) -> Result<usize> {
        if n == 0 || n > self.line_count() {
            return Err(self.out_of_range(n));
        }
        Ok(n - 1)
    }

    fn out_of_range(&self, line: usize) -> EditorError {
        EditorError::LineOutOfRange {
            line,
            len: self.line_count(),
        }
    }

    /// Content of rope line `idx`, minus its `\n`. `idx` must be in range.
    fn content_at(&self, idx: usize) -> RopeSlice<'_> {
        let line = self.rope.line(idx);
        line.slice(..line.len_chars() - 1)
    }

    /// Insert `text` plus a line break at char index `at` (a line start).
    fn insert_at(&mut self, at: usize, text: &str) {
        self.rope.insert_char(at, '\n');
        self.rope.insert(at, text);
        self.modified = true;
    }

    /// Remove rope line `idx` including its `\n`. `idx` must be in range.
    fn remove_at(&mut self, idx: usize) -> String {
        let text = self.content_at(idx).to_string();
        let start = self.rope.line_to_char(idx);
        let end = self.rope.line_to_char(idx + 1);
        self.rope.remove(start..end);
        self.modified = true;
        text
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("lines", &self.line_count())
            .field("modified", &self.modified)
            .field("line_ending", &self.line_ending)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a rope from `\n`-separated text, adding the final `\n` if missing.
fn terminated_rope(text: &str) -> Rope {
    let mut rope = Rope::from_str(text);
    let len = rope.len_chars();
    if len > 0 && rope.char(len - 1) != '\n' {
        rope.insert_char(len, '\n');
    }
    rope
}

/// Reject text that would split into more than one line.
fn check_text(text: &str) -> Result<()> {
    if text.contains('\n') {
        return Err(EditorError::MultilineText);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
