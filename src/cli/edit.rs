//! Apply one container operation to a file

use std::path::PathBuf;

use super::CliError;
use crate::{
    Document, FileSession, MappingOps, SequenceOps, SessionOptions, SetOps, Value, ast::Expr,
    edit_file, locator::ContainerKind,
};

/// One container operation, named after the Python method it mirrors.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    DictSet { key: Value, value: Value },
    DictPop { key: Value },
    DictClear,
    ListAppend(Value),
    ListExtend(Vec<Value>),
    ListInsert { index: isize, value: Value },
    ListRemove(Value),
    ListPop(isize),
    ListClear,
    ListReverse,
    SetAdd(Value),
    SetRemove(Value),
    SetDiscard(Value),
    SetUpdate(Vec<Value>),
}

impl EditCommand {
    /// Kind of container the command applies to.
    pub fn kind(&self) -> ContainerKind {
        use EditCommand::*;
        match self {
            DictSet { .. } | DictPop { .. } | DictClear => ContainerKind::Mapping,
            ListAppend(_) | ListExtend(_) | ListInsert { .. } | ListRemove(_) | ListPop(_)
            | ListClear | ListReverse => ContainerKind::Sequence,
            SetAdd(_) | SetRemove(_) | SetDiscard(_) | SetUpdate(_) => ContainerKind::Set,
        }
    }
}

/// Options for an edit command
#[derive(Debug, Clone)]
pub struct EditOptions {
    /// Python file to edit
    pub path: PathBuf,
    /// Binding name
    pub name: String,
    pub command: EditCommand,
    /// Formatting before write-back
    pub session: SessionOptions,
    /// Render the result instead of writing it
    pub dry_run: bool,
}

/// Result of an edit command
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditResult {
    /// Element removed by a pop
    pub removed: Option<Expr>,
    /// Rendered file, for a dry run
    pub preview: Option<String>,
}

fn apply(doc: &mut Document, name: &str, command: &EditCommand) -> Result<Option<Expr>, CliError> {
    let not_found = || CliError::NotFound {
        name: name.to_string(),
        kind: command.kind(),
    };

    match command {
        EditCommand::DictSet { key, value } => {
            let mut mapping = doc.find_mapping(name).ok_or_else(not_found)?;
            mapping.set(key.clone(), value.clone())?;
            Ok(None)
        }
        EditCommand::DictPop { key } => {
            let mut mapping = doc.find_mapping(name).ok_or_else(not_found)?;
            Ok(mapping.pop(key.clone()))
        }
        EditCommand::DictClear => {
            doc.find_mapping(name).ok_or_else(not_found)?.clear();
            Ok(None)
        }
        EditCommand::ListAppend(value) => {
            doc.find_sequence(name).ok_or_else(not_found)?.append(value.clone());
            Ok(None)
        }
        EditCommand::ListExtend(values) => {
            doc.find_sequence(name).ok_or_else(not_found)?.extend(values.iter().cloned());
            Ok(None)
        }
        EditCommand::ListInsert { index, value } => {
            doc.find_sequence(name).ok_or_else(not_found)?.insert(*index, value.clone());
            Ok(None)
        }
        EditCommand::ListRemove(value) => {
            doc.find_sequence(name).ok_or_else(not_found)?.remove(value.clone())?;
            Ok(None)
        }
        EditCommand::ListPop(index) => {
            let removed = doc.find_sequence(name).ok_or_else(not_found)?.pop(*index)?;
            Ok(Some(removed))
        }
        EditCommand::ListClear => {
            doc.find_sequence(name).ok_or_else(not_found)?.clear();
            Ok(None)
        }
        EditCommand::ListReverse => {
            doc.find_sequence(name).ok_or_else(not_found)?.reverse();
            Ok(None)
        }
        EditCommand::SetAdd(value) => {
            doc.find_set(name).ok_or_else(not_found)?.add(value.clone());
            Ok(None)
        }
        EditCommand::SetRemove(value) => {
            doc.find_set(name).ok_or_else(not_found)?.remove(value.clone())?;
            Ok(None)
        }
        EditCommand::SetDiscard(value) => {
            doc.find_set(name).ok_or_else(not_found)?.discard(value.clone());
            Ok(None)
        }
        EditCommand::SetUpdate(values) => {
            doc.find_set(name).ok_or_else(not_found)?.update(values.iter().cloned());
            Ok(None)
        }
    }
}

/// Execute an edit command
///
/// The file is only written when the operation succeeds, and never for a
/// dry run.
pub fn execute_edit(options: &EditOptions) -> Result<EditResult, CliError> {
    if options.dry_run {
        let mut session = FileSession::open_with(&options.path, options.session.clone())?;
        let removed = apply(session.document_mut(), &options.name, &options.command)?;
        let preview = session.render()?;
        session.discard();
        return Ok(EditResult {
            removed,
            preview: Some(preview),
        });
    }

    let removed = edit_file(&options.path, options.session.clone(), |doc| {
        apply(doc, &options.name, &options.command)
    })?;
    Ok(EditResult {
        removed,
        preview: None,
    })
}

/// Format a file in place without editing it. Returns the formatted text
/// instead of writing it for a dry run.
pub fn execute_format(
    path: &std::path::Path,
    session: SessionOptions,
    dry_run: bool,
) -> Result<Option<String>, CliError> {
    let session = FileSession::open_with(
        path,
        SessionOptions {
            format: true,
            ..session
        },
    )?;

    if dry_run {
        let output = session.render()?;
        session.discard();
        return Ok(Some(output));
    }
    session.commit()?;
    Ok(None)
}
