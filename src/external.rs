//! Locating and spawning external programs.

use crate::command::{ExitCode, NOT_FOUND, SPAWN_FAILED};
use crate::env::Environment;
use crate::parser::Command;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus, Stdio};

/// Resolve a command name to an executable path the way a shell would.
///
/// A name containing a directory component (absolute, `./`-prefixed, or
/// multi-part relative) is taken as-is when it exists; a bare name is
/// searched left to right through the directories of `PATH`. An empty name
/// resolves to nothing.
pub fn resolve_program(env: &Environment, name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    let path = Path::new(name);
    if path.is_absolute() || path.components().count() > 1 {
        return path.exists().then(|| path.to_path_buf());
    }
    let search = env.get_var("PATH")?;
    std::env::split_paths(&search)
        .map(|dir| dir.join(path))
        .find(|candidate| candidate.exists())
}

/// Spawn `program` with the given stream wiring, the session's working
/// directory and its variables. The caller owns the returned child and is
/// responsible for waiting on it.
pub fn spawn(
    env: &Environment,
    program: &Path,
    args: &[String],
    stdin: Stdio,
    stdout: Stdio,
) -> io::Result<Child> {
    std::process::Command::new(program)
        .args(args)
        .stdin(stdin)
        .stdout(stdout)
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir)
        .spawn()
}

/// Run one external command to completion, inheriting the shell's stdin and
/// writing to `stdout`. Resolution and spawn failures are reported on the
/// error stream and surface only as an exit status; they never become
/// shell-level faults.
pub fn run(env: &Environment, command: &Command, stdout: Stdio) -> ExitCode {
    let Some(program) = resolve_program(env, command.name()) else {
        eprintln!("{}: command not found", command.name());
        return NOT_FOUND;
    };
    match spawn(env, &program, command.args(), Stdio::inherit(), stdout) {
        Ok(mut child) => wait_for(&mut child, command.name()),
        Err(e) => {
            eprintln!("{}: {}", command.name(), e);
            SPAWN_FAILED
        }
    }
}

/// Block until this specific child terminates and adopt its status.
pub fn wait_for(child: &mut Child, name: &str) -> ExitCode {
    match child.wait() {
        Ok(status) => exit_code(status),
        Err(e) => {
            eprintln!("{}: wait: {}", name, e);
            SPAWN_FAILED
        }
    }
}

/// Map an OS exit status to the shell convention: the child's own code, or
/// `128 + signal` for signal-terminated children.
pub fn exit_code(status: ExitStatus) -> ExitCode {
    signal_code(&status).unwrap_or_else(|| status.code().unwrap_or(-1))
}

#[cfg(unix)]
fn signal_code(status: &ExitStatus) -> Option<ExitCode> {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(|signal| 128 + signal)
}

#[cfg(not(unix))]
fn signal_code(_status: &ExitStatus) -> Option<ExitCode> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_with_path(path: &str) -> Environment {
        let mut vars = HashMap::new();
        vars.insert("PATH".to_string(), path.to_string());
        Environment {
            vars,
            current_dir: std::env::temp_dir(),
            should_exit: false,
        }
    }

    #[test]
    #[cfg(unix)]
    fn absolute_existing_path_resolves_to_itself() {
        let env = env_with_path("/bin");
        assert_eq!(resolve_program(&env, "/bin/sh"), Some(PathBuf::from("/bin/sh")));
    }

    #[test]
    #[cfg(unix)]
    fn absolute_missing_path_does_not_resolve() {
        let env = env_with_path("/bin");
        assert_eq!(resolve_program(&env, "/bin/no_such_binary"), None);
    }

    #[test]
    #[cfg(unix)]
    fn bare_name_is_searched_through_path() {
        let env = env_with_path("/definitely/absent:/bin");
        assert_eq!(resolve_program(&env, "sh"), Some(PathBuf::from("/bin/sh")));
    }

    #[test]
    fn bare_name_missing_from_path_does_not_resolve() {
        let env = env_with_path("/definitely/absent");
        assert_eq!(resolve_program(&env, "no_such_binary_zz"), None);
    }

    #[test]
    fn empty_name_does_not_resolve() {
        let env = env_with_path("/bin");
        assert_eq!(resolve_program(&env, ""), None);
    }

    #[test]
    #[cfg(unix)]
    fn run_reports_the_child_exit_status() {
        let _lock = crate::env::lock_current_dir();
        let env = Environment::new();
        let ok = Command { argv: vec!["true".to_string()] };
        let fail = Command { argv: vec!["false".to_string()] };
        assert_eq!(run(&env, &ok, Stdio::null()), 0);
        assert_ne!(run(&env, &fail, Stdio::null()), 0);
    }

    #[test]
    fn run_reports_not_found_without_spawning() {
        let env = Environment::new();
        let missing = Command { argv: vec!["no_such_binary_zz".to_string()] };
        assert_eq!(run(&env, &missing, Stdio::null()), NOT_FOUND);
    }
}
