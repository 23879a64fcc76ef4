use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Mutable, per-session view of the shell's ambient state.
///
/// Holding this state in an explicit value rather than reading process
/// globals keeps the execution engine testable: a test can hand the
/// interpreter any directory or variable set it likes.
///
/// The environment carries:
/// - `vars`: variables made visible to executed commands (PATH lives here).
/// - `current_dir`: the working directory children are spawned in; the only
///   state that survives from one prompt to the next, mutated by `cd`.
/// - `should_exit`: set by the `exit` built-in; the read loop checks it
///   after every line.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state into a new `Environment`.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// Get a variable, falling back to the process environment for keys the
    /// session has never touched.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override a session variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Render the interactive prompt, `[user@host:cwd]$ `.
    pub fn prompt(&self) -> String {
        let user = self.get_var("USER").unwrap_or_else(|| "?".to_string());
        let host = self.get_var("HOSTNAME").unwrap_or_else(|| "localhost".to_string());
        format!("[{}@{}:{}]$ ", user, host, self.current_dir.display())
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializes tests that read or mutate the process-wide working directory.
/// The lock is shared across modules so a `cd` test cannot pull the directory
/// out from under a test that is spawning a child.
#[cfg(test)]
pub(crate) fn lock_current_dir() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX.get_or_init(|| Mutex::new(())).lock().unwrap()
}
