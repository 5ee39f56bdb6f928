use std::{fmt, str::FromStr};

use crate::{
    ast::{Binding, Expr, Module},
    container::{Mapping, Sequence, Set},
    locator::{self, ContainerKind, Representation, classify},
    parser::{self, SyntaxError},
};

/// Summary of one top-level binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInfo {
    pub name: String,
    pub line: usize,
    /// `None` when the value is not a container
    pub kind: Option<ContainerKind>,
    pub representation: Option<Representation>,
}

/// A parsed Python source file whose container bindings can be edited.
///
/// The source is parsed once. Handles returned by the `find_*` methods
/// borrow the document mutably, so only one can be alive at a time and none
/// can outlive it. Rendering reproduces the input exactly until a handle
/// actually changes something.
///
/// # Examples
///
/// ```
/// use pycraft::{Document, MappingOps, SequenceOps};
///
/// let mut doc = Document::parse("my_list = [1, 2, 3]\nmy_dict = dict(key='value')\n").unwrap();
///
/// doc.find_sequence("my_list").unwrap().append(4);
/// doc.find_mapping("my_dict").unwrap().set("num", 42).unwrap();
///
/// assert_eq!(
///     doc.to_source(),
///     "my_list = [1, 2, 3, 4]\nmy_dict = dict(key='value', num=42)\n"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    module: Module,
}

impl Document {
    pub fn parse(source: &str) -> Result<Self, SyntaxError> {
        let module = parser::parse(source)?;
        Ok(Document { module })
    }

    /// First binding of `name` holding a dict display or a `dict(...)` call.
    pub fn find_mapping(&mut self, name: &str) -> Option<Mapping<'_>> {
        locator::locate_mapping(&mut self.module, name)
    }

    /// First binding of `name` holding a list display or a `list(...)` call.
    pub fn find_sequence(&mut self, name: &str) -> Option<Sequence<'_>> {
        locator::locate_sequence(&mut self.module, name)
    }

    /// First binding of `name` holding a set display or a `set(...)` call.
    pub fn find_set(&mut self, name: &str) -> Option<Set<'_>> {
        locator::locate_set(&mut self.module, name)
    }

    /// Value of the first binding of `name`, whatever it holds.
    pub fn get(&self, name: &str) -> Option<&Expr> {
        self.module
            .bindings()
            .find(|binding| binding.name == name)
            .map(|binding| &binding.value)
    }

    /// All top-level bindings in document order.
    pub fn bindings(&self) -> Vec<BindingInfo> {
        self.module
            .bindings()
            .map(|binding: &Binding| {
                let classified = classify(&binding.value);
                BindingInfo {
                    name: binding.name.clone(),
                    line: binding.position.line,
                    kind: classified.map(|(kind, _)| kind),
                    representation: classified.map(|(_, representation)| representation),
                }
            })
            .collect()
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    /// True once any handle has changed a binding.
    pub fn is_modified(&self) -> bool {
        self.module.is_edited()
    }

    /// Source text for the current state.
    pub fn to_source(&self) -> String {
        self.module.to_source()
    }
}

impl FromStr for Document {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Document::parse(s)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_source())
    }
}
