//! Read-only commands: list bindings and show one value

use std::{fs, path::Path};

use super::{CliError, value_to_json};
use crate::{Document, document::BindingInfo, output::to_source};

/// Result of the show command
#[derive(Debug, Clone, PartialEq)]
pub struct ShowResult {
    /// Value source as it would be rendered now
    pub source: String,
    /// The value as JSON, when it is a plain literal
    pub json: Option<serde_json::Value>,
}

/// All top-level bindings of a file
pub fn execute_list(path: &Path) -> Result<Vec<BindingInfo>, CliError> {
    let source = fs::read_to_string(path)?;
    let document = Document::parse(&source)?;
    Ok(document.bindings())
}

/// The value of the first binding of `name`
pub fn execute_show(path: &Path, name: &str) -> Result<Option<ShowResult>, CliError> {
    let source = fs::read_to_string(path)?;
    let document = Document::parse(&source)?;

    Ok(document.get(name).map(|expr| ShowResult {
        source: to_source(expr),
        json: expr.to_value().map(value_to_json),
    }))
}
