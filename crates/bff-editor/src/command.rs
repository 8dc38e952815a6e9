//! Commands — one parsed invocation, applied to one named buffer.
//!
//! The binary turns its arguments into a [`Command`] and hands it to
//! [`execute`] together with the buffer name. `execute` performs exactly one
//! store or buffer operation and returns the lines to print on stdout.
//!
//! # Buffer commands
//!
//! | Command          | Action                                            |
//! |------------------|---------------------------------------------------|
//! | `open <path>`    | Load a file into the buffer                       |
//! | `print`          | Show every line, numbered (also the default)      |
//! | `append <text>`  | Add a line at the end                             |
//! | `save [<path>]`  | Write to `<path>`, or to the buffer's own file    |
//! | `new [<path>]`   | Reset to an empty buffer, optionally tied to path |
//!
//! # Line commands (`line <n> ...`)
//!
//! | Command          | Action                                            |
//! |------------------|---------------------------------------------------|
//! | `replace <text>` | Overwrite line n                                  |
//! | `insert <text>`  | Insert before line n (appends past the end)       |
//! | `delete`         | Remove line n                                     |
//! | `move <m>`       | Move line n to before the line at m               |
//! | `copy <m>`       | Duplicate line n before the line at m             |
//! | `get`            | Show line n, raw                                  |
//! | `print`          | Show line n, numbered                             |
//! | `range <m>`      | Show lines n..=m, numbered, clamped to the buffer |
//!
//! Line numbers are 1-based throughout.

use std::path::PathBuf;

use tracing::debug;

use crate::error::Result;
use crate::store::BufferStore;
use crate::view;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// An operation on a whole buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferCommand {
    /// `open <path>` — replace the buffer with a file's lines.
    Open(PathBuf),

    /// `print` — show every line, numbered.
    Print,

    /// `append <text>` — add a last line.
    Append(String),

    /// `save [<path>]` — write to a path, or to the buffer's own file.
    Save(Option<PathBuf>),

    /// `new [<path>]` — reset to empty, optionally tied to a path.
    New(Option<PathBuf>),
}

/// An operation on one line, addressed by the enclosing [`Command::Line`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineCommand {
    Replace(String),
    Insert(String),
    Delete,
    /// Target line number.
    Move(usize),
    /// Target line number.
    Copy(usize),
    Get,
    Print,
    /// Last line of the range (inclusive).
    Range(usize),
}

/// A parsed command, minus the buffer name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Buffer(BufferCommand),
    Line { line: usize, op: LineCommand },
}

impl Default for Command {
    /// `bff -b <name>` with nothing else prints the buffer.
    fn default() -> Self {
        Self::Buffer(BufferCommand::Print)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Apply `command` to the buffer called `name`.
///
/// Returns the lines to print on success: a confirmation message for edits,
/// the requested text for reads. Any failure is returned as an error and
/// leaves the buffer as it was.
///
/// # Errors
///
/// Everything the underlying [`BufferStore`] and
/// [`Buffer`](crate::buffer::Buffer) operations can return.
pub fn execute(store: &mut BufferStore, name: &str, command: &Command) -> Result<Vec<String>> {
    debug!(buffer = name, ?command, "executing");
    match command {
        Command::Buffer(op) => execute_buffer(store, name, op),
        Command::Line { line, op } => execute_line(store, name, *line, op),
    }
}

fn execute_buffer(store: &mut BufferStore, name: &str, op: &BufferCommand) -> Result<Vec<String>> {
    let message = match op {
        BufferCommand::Open(path) => {
            store.open_file(name, path)?;
            format!("File opened in buffer '{name}'")
        }
        BufferCommand::Print => return Ok(view::render_all(store.buffer(name)?)),
        BufferCommand::Append(text) => {
            store.edit(name, |buf| buf.append(text))?;
            format!("Content appended to buffer '{name}'")
        }
        BufferCommand::Save(path) => {
            let written = store.save_file(name, path.as_deref())?;
            format!("Buffer '{name}' saved to {}", written.display())
        }
        BufferCommand::New(path) => {
            store.create(name, path.clone())?;
            format!("New buffer '{name}' created")
        }
    };
    Ok(vec![message])
}

fn execute_line(
    store: &mut BufferStore,
    name: &str,
    line: usize,
    op: &LineCommand,
) -> Result<Vec<String>> {
    let message = match op {
        LineCommand::Replace(text) => {
            store.edit(name, |buf| buf.replace(line, text))?;
            format!("Line {line} replaced in buffer '{name}'")
        }
        LineCommand::Insert(text) => {
            store.edit(name, |buf| buf.insert(line, text))?;
            format!("Line inserted at position {line} in buffer '{name}'")
        }
        LineCommand::Delete => {
            store.edit(name, |buf| buf.delete(line))?;
            format!("Line {line} deleted from buffer '{name}'")
        }
        LineCommand::Move(to) => {
            store.edit(name, |buf| buf.move_line(line, *to))?;
            format!("Line {line} moved to position {to}")
        }
        LineCommand::Copy(to) => {
            store.edit(name, |buf| buf.copy_line(line, *to))?;
            format!("Line {line} copied to position {to}")
        }
        LineCommand::Get => store.buffer(name)?.get(line)?,
        LineCommand::Print => {
            let buf = store.buffer(name)?;
            let text = buf.line(line)?;
            view::numbered(line, text, view::gutter_width(buf.line_count()))
        }
        LineCommand::Range(end) => {
            let buf = store.buffer(name)?;
            return Ok(view::render(buf, buf.clamp_range(line, *end)));
        }
    };
    Ok(vec![message])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
