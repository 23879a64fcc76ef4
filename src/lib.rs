//! A small interactive command shell.
//!
//! The crate reads one line of input at a time, interprets the shell
//! metacharacters `|`, `>`/`>>`, `;` and `&&`, and materializes the result as
//! operating-system processes with correctly wired standard streams. Exactly
//! one operator kind is honored per line, checked in that order; a line with
//! none of them is a plain command.
//!
//! The main entry point is [`Interpreter`], which owns the session state
//! (working directory, variables) and executes parsed lines. Built-in
//! commands (`cd`, `exit`) run in-process through a set of pluggable
//! factories; everything else is resolved against `PATH` and spawned as a
//! child process.

mod builtin;
pub mod command;
pub mod env;
mod external;
mod interpreter;
mod lexer;
mod parser;

/// Re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
