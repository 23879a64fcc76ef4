use crate::builtin::{Cd, Exit, Factory};
use crate::command::{CommandFactory, ExitCode, NOT_FOUND, SPAWN_FAILED, SYNTAX_ERROR};
use crate::env::Environment;
use crate::external;
use crate::parser::{self, Command, ParsedLine, RedirectMode};
use anyhow::Result;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::process::{Child, Stdio};

/// The shell's execution engine.
///
/// One interpreter owns the session [`Environment`] and a chain of factories
/// for the built-in commands. [`Interpreter::eval`] takes a raw input line
/// through parsing and execution and returns the line's exit status; every
/// failure below the parser is reported on the error stream in place, so the
/// read loop only ever sees a status.
///
/// Example
/// ```no_run
/// use minish::Interpreter;
/// let mut sh = Interpreter::default();
/// let code = sh.eval("echo hello").unwrap();
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    env: Environment,
    builtins: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create an interpreter with a custom set of built-in factories.
    pub fn new(builtins: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            env: Environment::new(),
            builtins,
        }
    }

    /// The session state, read-only. The prompt renderer uses this.
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// True once the `exit` built-in has run.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Parse and execute one input line, returning its exit status.
    pub fn eval(&mut self, line: &str) -> Result<ExitCode> {
        let parsed = match parser::parse(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("{}", e);
                return Ok(SYNTAX_ERROR);
            }
        };
        match parsed {
            ParsedLine::Empty => Ok(0),
            ParsedLine::Simple(command) => self.run_command(&command),
            ParsedLine::Pipeline(stages) => Ok(self.run_pipeline(&stages, Stdio::inherit())),
            ParsedLine::Redirect { command, target, mode } => {
                self.run_redirect(&command, &target, mode)
            }
            ParsedLine::Sequence(commands) => self.run_sequence(&commands),
            ParsedLine::AndSequence(commands) => self.run_and_sequence(&commands),
        }
    }

    /// Execute one command, built-in or external, waiting for completion.
    fn run_command(&mut self, command: &Command) -> Result<ExitCode> {
        if command.argv.is_empty() {
            return Ok(0);
        }
        if let Some(code) = self.run_builtin(command, &mut io::stdout())? {
            return Ok(code);
        }
        Ok(external::run(&self.env, command, Stdio::inherit()))
    }

    /// Try the built-in factories; `Some` when one of them claimed the name.
    fn run_builtin(&mut self, command: &Command, stdout: &mut dyn Write) -> Result<Option<ExitCode>> {
        let args: Vec<&str> = command.args().iter().map(String::as_str).collect();
        for factory in &self.builtins {
            if let Some(cmd) = factory.try_create(&self.env, command.name(), &args) {
                return match cmd.execute(stdout, &mut self.env) {
                    Ok(code) => Ok(Some(code)),
                    Err(e) => {
                        eprintln!("{}", e);
                        Ok(Some(1))
                    }
                };
            }
        }
        Ok(None)
    }

    /// Run a `|` chain: spawn every stage first, then wait on all of them in
    /// stage order. The last stage writes to `last_stdout`.
    ///
    /// Spawning everything before the first wait lets early stages block on
    /// full pipe buffers while their consumers already exist; the chain's
    /// status is the last stage's status. Stage names are resolved up front
    /// so a misspelled command spawns nothing at all. Built-in names are not
    /// recognized inside pipelines; every stage is an external process.
    fn run_pipeline(&mut self, stages: &[Command], last_stdout: Stdio) -> ExitCode {
        let mut programs = Vec::with_capacity(stages.len());
        for stage in stages {
            match external::resolve_program(&self.env, stage.name()) {
                Some(program) => programs.push(program),
                None => {
                    eprintln!("{}: command not found", stage.name());
                    return NOT_FOUND;
                }
            }
        }

        let mut children: Vec<Child> = Vec::with_capacity(stages.len());
        let mut last_stdout = Some(last_stdout);
        for (i, (stage, program)) in stages.iter().zip(&programs).enumerate() {
            // The previous stage's captured stdout becomes this stage's
            // stdin; the handle moves into the child, leaving no copy open
            // in the parent.
            let stdin = match children.last_mut().and_then(|prev| prev.stdout.take()) {
                Some(upstream) => Stdio::from(upstream),
                None => Stdio::inherit(),
            };
            let stdout = if i + 1 == stages.len() {
                last_stdout.take().unwrap_or_else(Stdio::inherit)
            } else {
                Stdio::piped()
            };
            match external::spawn(&self.env, program, stage.args(), stdin, stdout) {
                Ok(child) => children.push(child),
                Err(e) => {
                    eprintln!("{}: {}", stage.name(), e);
                    for mut child in children {
                        let _ = child.kill();
                        let _ = child.wait();
                    }
                    return SPAWN_FAILED;
                }
            }
        }

        let mut code = 0;
        for (child, stage) in children.iter_mut().zip(stages) {
            code = external::wait_for(child, stage.name());
        }
        code
    }

    /// Open the redirection target, then run the command with its stdout
    /// re-homed to the file. The file is opened before anything executes; an
    /// open failure means the command never runs.
    fn run_redirect(&mut self, command: &Command, target: &Path, mode: RedirectMode) -> Result<ExitCode> {
        let mut file = match open_target(target, mode) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("{}: {}", target.display(), e);
                return Ok(1);
            }
        };
        if let Some(code) = self.run_builtin(command, &mut file)? {
            return Ok(code);
        }
        Ok(external::run(&self.env, command, Stdio::from(file)))
    }

    /// Run every `;` segment in order; a failure never stops the chain.
    fn run_sequence(&mut self, commands: &[Command]) -> Result<ExitCode> {
        let mut code = 0;
        for command in commands {
            code = self.run_command(command)?;
            if self.env.should_exit {
                break;
            }
        }
        Ok(code)
    }

    /// Run `&&` segments left to right, stopping at the first segment whose
    /// own observed status is non-zero.
    fn run_and_sequence(&mut self, commands: &[Command]) -> Result<ExitCode> {
        let mut code = 0;
        for command in commands {
            code = self.run_command(command)?;
            if code != 0 || self.env.should_exit {
                break;
            }
        }
        Ok(code)
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default built-ins, `cd` and `exit`.
    fn default() -> Self {
        Self::new(vec![
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Exit>::default()),
        ])
    }
}

fn open_target(path: &Path, mode: RedirectMode) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true);
    match mode {
        RedirectMode::Truncate => options.truncate(true),
        RedirectMode::Append => options.append(true),
    };
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options.open(path)
}
