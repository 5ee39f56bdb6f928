use crate::{ast::Expr, lexer::Position, output::SourcePrinter};

/// Top-level statement of a module.
///
/// Statements are stored in document order and cover the whole source text:
/// concatenating their rendered text reproduces the input exactly until a
/// binding is mutated.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Anything that is not a binding, carried byte for byte
    ///
    /// This includes comments and blank lines between statements, imports,
    /// function and class definitions with their bodies, and assignments that
    /// do not have a single plain name as target.
    ///
    /// # Example
    /// ```text
    /// import os
    ///
    /// def main():
    ///     ...
    /// ```
    Verbatim(String),

    /// `name = value` or `name: annotation = value`
    ///
    /// # Example
    /// ```text
    /// my_dict = {'key': 'value'}  # trailing comment survives edits
    /// ```
    Binding(Binding),
}

impl Statement {
    /// Source text of this statement in its current state.
    pub fn to_source(&self) -> String {
        match self {
            Statement::Verbatim(text) => text.clone(),
            Statement::Binding(binding) => binding.to_source(),
        }
    }
}

/// A located `name = value` statement.
///
/// The value expression is owned here and mutated in place by container
/// handles. The surrounding text (target, spacing, annotation, trailing
/// comment and line break) is kept as written.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Target identifier
    pub name: String,

    /// Annotation text for `name: annotation = value`
    pub annotation: Option<String>,

    /// The bound value expression
    pub value: Expr,

    /// Where the statement starts, for diagnostics
    pub position: Position,

    /// Text from the start of the line up to the value
    pub(crate) leading: String,

    /// Value text as written
    pub(crate) original: String,

    /// Text after the value through the end of the line
    pub(crate) trailing: String,

    /// Set by container handles once the value has actually changed
    pub(crate) edited: bool,
}

impl Binding {
    /// True once a mutation has changed the value.
    pub fn is_edited(&self) -> bool {
        self.edited
    }

    /// Source text of the value as it was read.
    pub fn original_value(&self) -> &str {
        &self.original
    }

    /// Source text of this statement in its current state.
    ///
    /// Unedited bindings come back exactly as they were read. Edited values are
    /// re-printed; a value that spanned several lines is laid out one element
    /// per line.
    pub fn to_source(&self) -> String {
        if !self.edited {
            return format!("{}{}{}", self.leading, self.original, self.trailing);
        }

        let printer = SourcePrinter::new(self.original.contains('\n'));
        format!("{}{}{}", self.leading, printer.print(&self.value), self.trailing)
    }
}
