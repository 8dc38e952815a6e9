// SPDX-License-Identifier: MIT
//
// bff — a command-line line-buffer editor.
//
// Each invocation runs exactly one command against one named buffer and
// exits. Buffers live in a scratch directory between invocations, which is
// what makes a sequence of calls feel like an editing session:
//
//   bff -b notes open notes.txt
//   bff -b notes line 3 replace "fixed"
//   bff -b notes save
//
// Flow:
//
//   argv → clap (cli.rs) → Command → bff_editor::command::execute
//        → BufferStore (load / mutate / persist) → stdout lines
//
// Exit status is 0 on success and 1 on any failure, usage errors included.
// Logs go to stderr so stdout only ever carries command output.

mod cli;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bff_editor::options::Options;
use bff_editor::store::BufferStore;
use bff_editor::{EditorError, command};

use crate::cli::Cli;

/// Install the stderr logger. `RUST_LOG` overrides the `-v` count.
fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Run the parsed invocation and return the lines it produced.
fn run(cli: &Cli) -> Result<Vec<String>, EditorError> {
    let options = Options::new(cli.scratch_dir.clone());
    let mut store = BufferStore::open(&options)?;
    command::execute(&mut store, &cli.buffer, &cli.to_command())
}

/// Exit status for a parse that didn't produce a [`Cli`]. `--help` and
/// `--version` land here too, on stdout, and succeed.
fn exit_code(e: &clap::Error) -> ExitCode {
    if e.use_stderr() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return exit_code(&e);
        }
    };

    init_logging(cli.verbose);

    match run(&cli) {
        Ok(lines) => {
            let mut out = io::stdout().lock();
            for line in lines {
                if writeln!(out, "{line}").is_err() {
                    // Closed pipe (e.g. `| head`); nothing left to report to.
                    break;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("bff: {e}");
            ExitCode::FAILURE
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
