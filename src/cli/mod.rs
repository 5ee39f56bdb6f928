//! CLI support for pycraft
//!
//! Provides programmatic access to the pycraft commands for embedding in
//! other tools. The binary in `main.rs` is a thin clap front end over these.

mod convert;
mod edit;
mod inspect;

pub use convert::{json_to_value, parse_value, parse_values, value_to_json};
pub use edit::{EditCommand, EditOptions, EditResult, execute_edit, execute_format};
pub use inspect::{ShowResult, execute_list, execute_show};

use std::io;

use crate::{EditError, FormatError, SessionError, SyntaxError, locator::ContainerKind};

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Source file could not be parsed
    Syntax(SyntaxError),
    /// Container operation failed
    Edit(EditError),
    /// Formatter failed
    Format(FormatError),
    /// Reading or writing the file failed
    Session(SessionError),
    /// JSON parsing error
    Json(serde_json::Error),
    /// IO error
    Io(io::Error),
    /// No binding of that name holds a container of that kind
    NotFound { name: String, kind: ContainerKind },
    /// No value argument and nothing on stdin
    NoValue,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Syntax(e) => write!(f, "Syntax error: {}", e),
            CliError::Edit(e) => write!(f, "Edit error: {}", e),
            CliError::Format(e) => write!(f, "Format error: {}", e),
            CliError::Session(e) => write!(f, "{}", e),
            CliError::Json(e) => write!(f, "Invalid JSON: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NotFound { name, kind } => {
                write!(f, "No {} named '{}' found.\nRun 'pycraft list <FILE>' to see the bindings.", kind, name)
            }
            CliError::NoValue => write!(f, "No value provided. Pass it as an argument or pipe it to stdin."),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Syntax(e) => Some(e),
            CliError::Edit(e) => Some(e),
            CliError::Format(e) => Some(e),
            CliError::Session(e) => Some(e),
            CliError::Json(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SyntaxError> for CliError {
    fn from(e: SyntaxError) -> Self {
        CliError::Syntax(e)
    }
}

impl From<EditError> for CliError {
    fn from(e: EditError) -> Self {
        CliError::Edit(e)
    }
}

impl From<FormatError> for CliError {
    fn from(e: FormatError) -> Self {
        CliError::Format(e)
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        CliError::Session(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
