use crate::env::Environment;
use anyhow::Result;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure,
/// matching the convention observed by `&&` and by POSIX tools.
pub type ExitCode = i32;

/// Status reported when a command name cannot be resolved to an executable.
pub const NOT_FOUND: ExitCode = 127;

/// Status reported when the OS refuses to create or wait on a process.
pub const SPAWN_FAILED: ExitCode = 126;

/// Status reported for lines the parser rejects.
pub const SYNTAX_ERROR: ExitCode = 2;

/// Object-safe trait for a command the shell runs in-process.
///
/// Implemented by built-ins via a blanket impl in the `builtin` module.
/// External programs do not go through this trait; they are spawned as child
/// processes instead.
pub trait ExecutableCommand {
    /// Executes the command, writing its regular output to `stdout`.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`, letting the
/// interpreter fall through to the next factory or to process spawning.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
