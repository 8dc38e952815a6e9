//! # bff-editor — Editor core for bff
//!
//! This crate contains everything except argument parsing:
//!
//! - **[`buffer`]** — `Buffer`, a rope of 1-based lines with editing and file I/O
//! - **[`store`]** — `BufferStore`, named buffers persisted to a scratch directory
//! - **[`command`]** — `Command` and the `execute` dispatcher
//! - **[`view`]** — numbered line rendering for the print commands
//! - **[`options`]** — runtime options (scratch directory)
//! - **[`error`]** — `EditorError` and the crate `Result`

pub mod buffer;
pub mod command;
pub mod error;
pub mod options;
pub mod store;
pub mod view;

pub use error::{EditorError, Result};
