//! Command-line surface.
//!
//! ```text
//! bff -b <name> [open <path> | print | append <text> | save [<path>] | new [<path>]
//!              | line <n> <replace <text> | insert <text> | delete | move <m>
//!                         | copy <m> | get | print | range <m>>]
//! ```
//!
//! Parsing only; [`Command`] conversion is lossless and execution lives in
//! `bff_editor::command`.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use bff_editor::command::{BufferCommand, Command, LineCommand};
use bff_editor::options::SCRATCH_DIR_ENV;

const EXAMPLES: &str = "\
Buffer commands:
  bff -b test open /path/to/file.txt
  bff -b test print
  bff -b test append \"new content\"
  bff -b test save /new/path/file.txt
  bff -b test new /path/to/newfile.txt

Line commands:
  bff -b test line 10 replace \"return 0;\"
  bff -b test line 5 insert \"// New comment\"
  bff -b test line 3 delete
  bff -b test line 7 move 2
  bff -b test line 4 copy 8
  bff -b test line 6 get
  bff -b test line 2 print
  bff -b test line 1 range 10

Text is taken literally, even `--help`. Put `--` before text that starts
with a dash and matches a global flag such as `-v`:
  bff -b test append -- -v";

/// Edit named line buffers, one command per invocation.
///
/// Buffers persist in a scratch directory between invocations, so a buffer
/// opened by one call can be edited and saved by later ones.
#[derive(Debug, Parser)]
#[command(name = "bff", version, after_help = EXAMPLES)]
pub struct Cli {
    /// Buffer to operate on.
    #[arg(short = 'b', long = "buffer", value_name = "NAME")]
    pub buffer: String,

    /// Directory holding persisted buffers [default: <temp dir>/bff_buffers].
    #[arg(long, global = true, env = SCRATCH_DIR_ENV, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Log more to stderr (-v info, -vv debug, -vvv trace). `RUST_LOG` wins.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// What to do with the buffer. Prints it when omitted.
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Load a file into the buffer, replacing its lines.
    Open { path: PathBuf },

    /// Print every line, numbered.
    Print,

    /// Add a line at the end.
    #[command(disable_help_flag = true)]
    Append {
        #[arg(allow_hyphen_values = true)]
        text: String,
    },

    /// Write the buffer to PATH, or to the file it came from.
    Save { path: Option<PathBuf> },

    /// Reset to an empty buffer, optionally tied to PATH.
    New { path: Option<PathBuf> },

    /// Operate on line N (1-based).
    Line {
        #[arg(value_name = "N", value_parser = line_number)]
        line: usize,

        #[command(subcommand)]
        op: LineOp,
    },
}

#[derive(Debug, Subcommand)]
pub enum LineOp {
    /// Overwrite the line.
    #[command(disable_help_flag = true)]
    Replace {
        #[arg(allow_hyphen_values = true)]
        text: String,
    },

    /// Insert a line before it (appends past the end).
    #[command(disable_help_flag = true)]
    Insert {
        #[arg(allow_hyphen_values = true)]
        text: String,
    },

    /// Remove the line.
    Delete,

    /// Move the line to before line TO.
    Move {
        #[arg(value_name = "TO")]
        to: usize,
    },

    /// Duplicate the line before line TO.
    Copy {
        #[arg(value_name = "TO")]
        to: usize,
    },

    /// Print the line's raw text.
    Get,

    /// Print the line, numbered.
    Print,

    /// Print lines N through END, numbered, clamped to the buffer.
    Range {
        #[arg(value_name = "END")]
        end: usize,
    },
}

/// Parse a 1-based line number.
fn line_number(arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(0) => Err("line numbers start at 1".to_owned()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("not a line number: {e}")),
    }
}

impl Cli {
    /// The command to run; `print` when none was given.
    #[must_use]
    pub fn to_command(&self) -> Command {
        self.command.as_ref().map_or_else(Command::default, Command::from)
    }
}

impl From<&CliCommand> for Command {
    fn from(cmd: &CliCommand) -> Self {
        match cmd {
            CliCommand::Open { path } => Self::Buffer(BufferCommand::Open(path.clone())),
            CliCommand::Print => Self::Buffer(BufferCommand::Print),
            CliCommand::Append { text } => Self::Buffer(BufferCommand::Append(text.clone())),
            CliCommand::Save { path } => Self::Buffer(BufferCommand::Save(path.clone())),
            CliCommand::New { path } => Self::Buffer(BufferCommand::New(path.clone())),
            CliCommand::Line { line, op } => Self::Line {
                line: *line,
                op: LineCommand::from(op),
            },
        }
    }
}

impl From<&LineOp> for LineCommand {
    fn from(op: &LineOp) -> Self {
        match op {
            LineOp::Replace { text } => Self::Replace(text.clone()),
            LineOp::Insert { text } => Self::Insert(text.clone()),
            LineOp::Delete => Self::Delete,
            LineOp::Move { to } => Self::Move(*to),
            LineOp::Copy { to } => Self::Copy(*to),
            LineOp::Get => Self::Get,
            LineOp::Print => Self::Print,
            LineOp::Range { end } => Self::Range(*end),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
