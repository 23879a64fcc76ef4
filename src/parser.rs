//! Turning a raw input line into exactly one executable form.
//!
//! The dispatcher inspects the line for `|`, then `>`/`>>`, then `;`, then
//! `&&`: first match wins, and operators never combine. A line such as
//! `a | b > file` is therefore a two-stage pipeline whose second stage
//! receives `>` and `file` as ordinary arguments. This mirrors the mutual
//! exclusivity contract of the line grammar rather than a general shell
//! grammar.

use crate::lexer;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Longest accepted input line, in bytes.
pub const MAX_LINE_BYTES: usize = 4096;

/// Most stages a single pipeline may have. Exceeding it is a syntax error,
/// never a silent truncation.
pub const MAX_PIPELINE_STAGES: usize = 64;

/// One command invocation: the program or built-in name followed by its
/// arguments. `argv` never contains empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub argv: Vec<String>,
}

impl Command {
    /// Tokenize a raw line segment into a command.
    pub fn from_text(text: &str) -> Self {
        Self { argv: lexer::split_words(text) }
    }

    /// The program or built-in name, empty when the command has no words.
    pub fn name(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }

    /// The arguments following the name.
    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }
}

/// How a redirection target file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// `>`: create the file if absent, discard previous contents.
    Truncate,
    /// `>>`: create the file if absent, keep contents and write at the end.
    Append,
}

/// The single parsed form of one input line.
#[derive(Debug, PartialEq)]
pub enum ParsedLine {
    /// Nothing but whitespace.
    Empty,
    /// A plain command with no operators.
    Simple(Command),
    /// Two or more commands chained stdout-to-stdin by `|`.
    Pipeline(Vec<Command>),
    /// One command with its stdout rebound to a file.
    Redirect {
        command: Command,
        target: PathBuf,
        mode: RedirectMode,
    },
    /// Commands separated by `;`, run unconditionally in order.
    Sequence(Vec<Command>),
    /// Commands separated by `&&`, run while the previous one succeeded.
    AndSequence(Vec<Command>),
}

/// Syntax problems detected before anything executes.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The line exceeds [`MAX_LINE_BYTES`].
    LineTooLong(usize),
    /// A `|`-delimited segment tokenized to nothing (leading, trailing or
    /// doubled pipe).
    EmptyPipelineStage,
    /// The pipeline has more than [`MAX_PIPELINE_STAGES`] stages.
    TooManyStages(usize),
    /// `>` or `>>` with no target word after it.
    MissingRedirectTarget,
    /// Words found after the redirection target.
    TrailingRedirectTokens(String),
    /// `>` or `>>` with no command before it.
    EmptyRedirectCommand,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::LineTooLong(n) => {
                write!(f, "line too long: {} bytes, limit {}", n, MAX_LINE_BYTES)
            }
            ParseError::EmptyPipelineStage => write!(f, "syntax error: empty pipeline stage"),
            ParseError::TooManyStages(n) => {
                write!(f, "pipeline too long: {} stages, limit {}", n, MAX_PIPELINE_STAGES)
            }
            ParseError::MissingRedirectTarget => {
                write!(f, "syntax error: missing redirection target")
            }
            ParseError::TrailingRedirectTokens(extra) => {
                write!(f, "syntax error: unexpected text after redirection target: {}", extra)
            }
            ParseError::EmptyRedirectCommand => write!(f, "syntax error: nothing to redirect"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse one input line into its executable form.
pub fn parse(line: &str) -> Result<ParsedLine, ParseError> {
    if line.len() > MAX_LINE_BYTES {
        return Err(ParseError::LineTooLong(line.len()));
    }
    let line = line.trim();
    if line.is_empty() {
        return Ok(ParsedLine::Empty);
    }

    if line.contains('|') {
        return parse_pipeline(line);
    }
    if line.contains('>') {
        return parse_redirect(line);
    }
    if line.contains(';') {
        return Ok(ParsedLine::Sequence(split_segments(line, ";")));
    }
    if line.contains("&&") {
        return Ok(ParsedLine::AndSequence(split_segments(line, "&&")));
    }
    Ok(ParsedLine::Simple(Command::from_text(line)))
}

fn parse_pipeline(line: &str) -> Result<ParsedLine, ParseError> {
    let mut stages = Vec::new();
    for segment in line.split('|') {
        let command = Command::from_text(segment);
        if command.argv.is_empty() {
            return Err(ParseError::EmptyPipelineStage);
        }
        stages.push(command);
    }
    if stages.len() > MAX_PIPELINE_STAGES {
        return Err(ParseError::TooManyStages(stages.len()));
    }
    Ok(ParsedLine::Pipeline(stages))
}

// Lazily splits the line at the first redirection operator; the alternation
// tries `>>` before `>` so an append never reads as truncate-plus-argument.
static REDIRECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)^(.*?)(>>|>)(.*)$").unwrap());

fn parse_redirect(line: &str) -> Result<ParsedLine, ParseError> {
    let Some(parts) = REDIRECT.captures(line) else {
        // Unreachable in practice: the dispatcher only routes here when the
        // line contains `>`.
        return Ok(ParsedLine::Simple(Command::from_text(line)));
    };

    let command = Command::from_text(&parts[1]);
    if command.argv.is_empty() {
        return Err(ParseError::EmptyRedirectCommand);
    }
    let mode = if &parts[2] == ">>" { RedirectMode::Append } else { RedirectMode::Truncate };

    let mut rest = parts[3].split_whitespace();
    let Some(target) = rest.next() else {
        return Err(ParseError::MissingRedirectTarget);
    };
    let extra: Vec<&str> = rest.collect();
    if !extra.is_empty() {
        return Err(ParseError::TrailingRedirectTokens(extra.join(" ")));
    }

    Ok(ParsedLine::Redirect {
        command,
        target: PathBuf::from(lexer::strip_quotes(target)),
        mode,
    })
}

/// Split a compound line on `separator`, dropping segments that tokenize to
/// nothing (`a ;; b` has two segments, not three).
fn split_segments(line: &str, separator: &str) -> Vec<Command> {
    line.split(separator)
        .map(Command::from_text)
        .filter(|command| !command.argv.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(command: &Command) -> Vec<&str> {
        command.argv.iter().map(String::as_str).collect()
    }

    #[test]
    fn blank_line_parses_to_empty() {
        assert_eq!(parse("").unwrap(), ParsedLine::Empty);
        assert_eq!(parse("   \t ").unwrap(), ParsedLine::Empty);
    }

    #[test]
    fn plain_command_parses_to_simple() {
        let ParsedLine::Simple(command) = parse("ls -l /tmp").unwrap() else {
            panic!("expected Simple");
        };
        assert_eq!(argv(&command), ["ls", "-l", "/tmp"]);
    }

    #[test]
    fn pipeline_splits_into_stages() {
        let ParsedLine::Pipeline(stages) = parse("seq 1 3 | wc -l").unwrap() else {
            panic!("expected Pipeline");
        };
        assert_eq!(stages.len(), 2);
        assert_eq!(argv(&stages[0]), ["seq", "1", "3"]);
        assert_eq!(argv(&stages[1]), ["wc", "-l"]);
    }

    #[test]
    fn trailing_pipe_is_rejected() {
        assert_eq!(parse("seq 1 3 |").unwrap_err(), ParseError::EmptyPipelineStage);
        assert_eq!(parse("| wc").unwrap_err(), ParseError::EmptyPipelineStage);
        assert_eq!(parse("a || b").unwrap_err(), ParseError::EmptyPipelineStage);
    }

    #[test]
    fn pipe_takes_precedence_over_redirect() {
        // Single-operator dispatch: the `>` stays a plain argument here.
        let ParsedLine::Pipeline(stages) = parse("a | b > f").unwrap() else {
            panic!("expected Pipeline");
        };
        assert_eq!(argv(&stages[1]), ["b", ">", "f"]);
    }

    #[test]
    fn redirect_truncate_parses() {
        let parsed = parse("echo hi > out.txt").unwrap();
        let ParsedLine::Redirect { command, target, mode } = parsed else {
            panic!("expected Redirect");
        };
        assert_eq!(argv(&command), ["echo", "hi"]);
        assert_eq!(target, PathBuf::from("out.txt"));
        assert_eq!(mode, RedirectMode::Truncate);
    }

    #[test]
    fn redirect_append_is_not_read_as_truncate() {
        let parsed = parse("echo hi >> out.txt").unwrap();
        let ParsedLine::Redirect { command, mode, .. } = parsed else {
            panic!("expected Redirect");
        };
        assert_eq!(argv(&command), ["echo", "hi"]);
        assert_eq!(mode, RedirectMode::Append);
    }

    #[test]
    fn redirect_without_target_is_rejected() {
        assert_eq!(parse("echo hi >").unwrap_err(), ParseError::MissingRedirectTarget);
        assert_eq!(parse("echo hi >>  ").unwrap_err(), ParseError::MissingRedirectTarget);
    }

    #[test]
    fn redirect_with_trailing_words_is_rejected() {
        assert_eq!(
            parse("echo hi > out.txt junk more").unwrap_err(),
            ParseError::TrailingRedirectTokens("junk more".to_string()),
        );
    }

    #[test]
    fn redirect_without_command_is_rejected() {
        assert_eq!(parse("> out.txt").unwrap_err(), ParseError::EmptyRedirectCommand);
    }

    #[test]
    fn quoted_redirect_target_is_unquoted() {
        let ParsedLine::Redirect { target, .. } = parse(r#"echo hi > "out.txt""#).unwrap() else {
            panic!("expected Redirect");
        };
        assert_eq!(target, PathBuf::from("out.txt"));
    }

    #[test]
    fn sequence_splits_and_skips_empty_segments() {
        let ParsedLine::Sequence(commands) = parse("true ;; echo done ;").unwrap() else {
            panic!("expected Sequence");
        };
        assert_eq!(commands.len(), 2);
        assert_eq!(argv(&commands[0]), ["true"]);
        assert_eq!(argv(&commands[1]), ["echo", "done"]);
    }

    #[test]
    fn semicolon_is_checked_before_and() {
        let ParsedLine::Sequence(commands) = parse("a ; b && c").unwrap() else {
            panic!("expected Sequence");
        };
        // The `&&` inside the second segment is not re-dispatched.
        assert_eq!(argv(&commands[1]), ["b", "&&", "c"]);
    }

    #[test]
    fn and_sequence_splits() {
        let ParsedLine::AndSequence(commands) = parse("true && echo ok").unwrap() else {
            panic!("expected AndSequence");
        };
        assert_eq!(commands.len(), 2);
        assert_eq!(argv(&commands[0]), ["true"]);
        assert_eq!(argv(&commands[1]), ["echo", "ok"]);
    }

    #[test]
    fn oversized_pipeline_is_rejected() {
        let line = vec!["true"; MAX_PIPELINE_STAGES + 1].join(" | ");
        assert_eq!(
            parse(&line).unwrap_err(),
            ParseError::TooManyStages(MAX_PIPELINE_STAGES + 1),
        );
    }

    #[test]
    fn oversized_line_is_rejected() {
        let line = "x".repeat(MAX_LINE_BYTES + 1);
        assert_eq!(parse(&line).unwrap_err(), ParseError::LineTooLong(MAX_LINE_BYTES + 1));
    }
}
