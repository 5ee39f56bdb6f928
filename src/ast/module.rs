use crate::ast::{Binding, Statement};

/// A parsed source file.
///
/// Statements are the top-level statements in document order; nested blocks
/// are part of the statement that opens them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub statements: Vec<Statement>,
}

impl Module {
    /// Top-level bindings in document order.
    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::Binding(binding) => Some(binding),
            Statement::Verbatim(_) => None,
        })
    }

    pub fn bindings_mut(&mut self) -> impl Iterator<Item = &mut Binding> {
        self.statements.iter_mut().filter_map(|statement| match statement {
            Statement::Binding(binding) => Some(binding),
            Statement::Verbatim(_) => None,
        })
    }

    /// True once any binding value has been mutated.
    pub fn is_edited(&self) -> bool {
        self.bindings().any(Binding::is_edited)
    }

    /// Renders the module in its current state.
    pub fn to_source(&self) -> String {
        self.statements.iter().map(Statement::to_source).collect()
    }
}
