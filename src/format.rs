//! Source formatters applied after rendering.
//!
//! A [`Formatter`] takes rendered Python source and returns it normalised.
//! Every implementation must be idempotent: formatting formatted output
//! changes nothing.
//!
//! - [`BuiltinFormatter`] - a small token-aware normaliser with no external
//!   dependencies (double quotes, trailing whitespace, blank lines)
//! - [`CommandFormatter`] - pipes the source through an external program such
//!   as `black -q -`

use std::{
    fmt,
    io::{self, Write},
    process::{Command, Stdio},
    thread,
};

use tracing::debug;

use crate::{
    ast::Token,
    lexer::{LexError, Lexer},
    parser::SyntaxError,
};

/// Failure to format source text.
#[derive(Debug)]
pub enum FormatError {
    /// The input could not be tokenized
    Syntax(SyntaxError),
    /// The external formatter could not be run
    Io(io::Error),
    /// The external formatter exited unsuccessfully
    Command {
        program: String,
        status: Option<i32>,
        stderr: String,
    },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Syntax(e) => write!(f, "cannot format invalid source: {}", e),
            FormatError::Io(e) => write!(f, "formatter I/O error: {}", e),
            FormatError::Command {
                program,
                status,
                stderr,
            } => {
                match status {
                    Some(code) => write!(f, "{} exited with status {}", program, code)?,
                    None => write!(f, "{} was terminated by a signal", program)?,
                }
                if !stderr.trim().is_empty() {
                    write!(f, ": {}", stderr.trim())?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormatError::Syntax(e) => Some(e),
            FormatError::Io(e) => Some(e),
            FormatError::Command { .. } => None,
        }
    }
}

impl From<SyntaxError> for FormatError {
    fn from(e: SyntaxError) -> Self {
        FormatError::Syntax(e)
    }
}

impl From<LexError> for FormatError {
    fn from(e: LexError) -> Self {
        FormatError::Syntax(e.into())
    }
}

impl From<io::Error> for FormatError {
    fn from(e: io::Error) -> Self {
        FormatError::Io(e)
    }
}

pub trait Formatter {
    /// Short name for diagnostics.
    fn name(&self) -> &str;

    fn format(&self, source: &str) -> Result<String, FormatError>;
}

/// Token-aware normaliser.
///
/// - single-quoted strings become double-quoted when that needs no new escapes
/// - trailing whitespace outside strings is removed
/// - leading blank lines are dropped and runs of blank lines are capped at two
/// - the file ends with exactly one newline
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFormatter;

impl BuiltinFormatter {
    pub fn new() -> Self {
        BuiltinFormatter
    }
}

impl Formatter for BuiltinFormatter {
    fn name(&self) -> &str {
        "builtin"
    }

    fn format(&self, source: &str) -> Result<String, FormatError> {
        let quoted = normalize_quotes(source)?;
        normalize_whitespace(&quoted)
    }
}

/// `'text'` as `"text"`, or `None` when the literal should stay as it is.
fn double_quoted(raw: &str) -> Option<String> {
    let prefix_len = raw.find(['\'', '"'])?;
    let (prefix, quoted) = raw.split_at(prefix_len);

    if prefix.contains(['f', 'F']) || !quoted.starts_with('\'') || quoted.starts_with("'''") {
        return None;
    }
    let body = &quoted[1..quoted.len() - 1];
    if body.contains('"') {
        return None;
    }

    let body = if prefix.contains(['r', 'R']) {
        body.to_string()
    } else {
        let mut unescaped = String::with_capacity(body.len());
        let mut chars = body.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                unescaped.push(c);
                continue;
            }
            match chars.next() {
                Some('\'') => unescaped.push('\''),
                Some(other) => {
                    unescaped.push('\\');
                    unescaped.push(other);
                }
                None => unescaped.push('\\'),
            }
        }
        unescaped
    };

    Some(format!("{}\"{}\"", prefix, body))
}

fn normalize_quotes(source: &str) -> Result<String, FormatError> {
    let tokens = Lexer::new(source).tokenize()?;

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for spanned in &tokens {
        if let Token::String(raw) = &spanned.token
            && let Some(replacement) = double_quoted(raw)
        {
            out.push_str(&source[cursor..spanned.span.start]);
            out.push_str(&replacement);
            cursor = spanned.span.end;
        }
    }
    out.push_str(&source[cursor..]);
    Ok(out)
}

fn normalize_whitespace(source: &str) -> Result<String, FormatError> {
    // Line breaks inside these byte ranges belong to a string literal
    let protected: Vec<(usize, usize)> = Lexer::new(source)
        .tokenize()?
        .into_iter()
        .filter(|t| matches!(&t.token, Token::String(raw) if raw.contains('\n')))
        .map(|t| (t.span.start, t.span.end))
        .collect();
    let in_string = |offset: usize| {
        protected
            .iter()
            .any(|(start, end)| *start < offset && offset < *end)
    };

    let mut out = String::with_capacity(source.len());
    let mut blank_run = 0;
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        let break_offset = offset + line.trim_end_matches(['\n', '\r']).len();
        offset += line.len();

        if in_string(break_offset) {
            out.push_str(line);
            blank_run = 0;
            continue;
        }

        let content = line
            .trim_end_matches(['\n', '\r'])
            .trim_end_matches([' ', '\t', '\x0c']);
        if content.is_empty() {
            blank_run += 1;
            continue;
        }

        if !out.is_empty() {
            for _ in 0..blank_run.min(2) {
                out.push('\n');
            }
        }
        blank_run = 0;
        out.push_str(content);
        out.push('\n');
    }

    Ok(out)
}

/// Runs an external formatter that reads source on stdin and writes the
/// result to stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
}

impl CommandFormatter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        CommandFormatter {
            program: program.into(),
            args,
        }
    }

    /// Splits a command line on whitespace; `None` when it is empty.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(CommandFormatter::new(program, parts.collect()))
    }

    /// `black -q -`
    pub fn black() -> Self {
        CommandFormatter::new("black", vec!["-q".to_string(), "-".to_string()])
    }
}

impl Formatter for CommandFormatter {
    fn name(&self) -> &str {
        &self.program
    }

    fn format(&self, source: &str) -> Result<String, FormatError> {
        debug!(program = %self.program, args = ?self.args, "running external formatter");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Feed stdin from another thread so a large output cannot block us
        let writer = child.stdin.take().map(|mut stdin| {
            let input = source.to_string();
            thread::spawn(move || stdin.write_all(input.as_bytes()))
        });

        let output = child.wait_with_output()?;
        let written = match writer {
            Some(writer) => writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("formatter input thread panicked"))),
            None => Ok(()),
        };

        if !output.status.success() {
            return Err(FormatError::Command {
                program: self.program.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
        written?;

        String::from_utf8(output.stdout)
            .map_err(|e| FormatError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

#[test]
fn test_quotes_become_double() {
    let formatter = BuiltinFormatter::new();
    assert_eq!(
        formatter.format("x = {'a': 'b'}\n").unwrap(),
        "x = {\"a\": \"b\"}\n"
    );
    assert_eq!(
        formatter.format("x = 'it\\'s'\n").unwrap(),
        "x = \"it's\"\n"
    );
    assert_eq!(
        formatter.format("x = ['say \"hi\"', f'{y}', r'\\d']\n").unwrap(),
        "x = ['say \"hi\"', f'{y}', r\"\\d\"]\n"
    );
}

#[test]
fn test_whitespace_normalization() {
    let formatter = BuiltinFormatter::new();
    assert_eq!(
        formatter.format("\n\nx = 1   \n\n\n\n\ny = 2").unwrap(),
        "x = 1\n\n\ny = 2\n"
    );
    assert_eq!(formatter.format("").unwrap(), "");
}

#[test]
fn test_multiline_strings_are_untouched() {
    let source = "doc = \"\"\"line   \n\n\n\n  end\"\"\"\n";
    assert_eq!(BuiltinFormatter::new().format(source).unwrap(), source);
}

#[test]
fn test_builtin_is_idempotent() {
    let formatter = BuiltinFormatter::new();
    let once = formatter
        .format("\na = ['x', 'y']  \n\n\n\n\nb = {'k': \"v\"}   # note  \n")
        .unwrap();
    assert_eq!(formatter.format(&once).unwrap(), once);
}

#[test]
fn test_command_line_parsing() {
    assert_eq!(CommandFormatter::parse("black -q -"), Some(CommandFormatter::black()));
    assert_eq!(CommandFormatter::parse("   "), None);
}
