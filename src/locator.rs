use std::fmt;

use tracing::{debug, trace};

use crate::{
    ast::{Binding, Expr, Module},
    container::{
        CallMapping, CallSequence, CallSet, LiteralMapping, LiteralSequence, LiteralSet, Mapping,
        Sequence, Set,
    },
};

/// The three container contracts a binding can be located as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// `{'k': v}` or `dict(k=v)`
    Mapping,
    /// `[a, b]` or `list(a, b)`
    Sequence,
    /// `{a, b}` or `set(a, b)`
    Set,
}

impl ContainerKind {
    /// Name of the builtin whose call spells this kind.
    pub fn constructor(self) -> &'static str {
        match self {
            ContainerKind::Mapping => "dict",
            ContainerKind::Sequence => "list",
            ContainerKind::Set => "set",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerKind::Mapping => "mapping",
            ContainerKind::Sequence => "sequence",
            ContainerKind::Set => "set",
        };
        write!(f, "{}", name)
    }
}

/// How a container is spelled in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    /// Bracket or brace display
    Literal,
    /// Call to `dict`, `list` or `set`
    Call,
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Representation::Literal => write!(f, "literal"),
            Representation::Call => write!(f, "call"),
        }
    }
}

/// Kind and representation of a value expression, if it is a container.
///
/// # Examples
///
/// ```
/// use pycraft::locator::{classify, ContainerKind, Representation};
/// use pycraft::parser::parse_expression;
///
/// let expr = parse_expression("list(1, 2)").unwrap();
/// assert_eq!(classify(&expr), Some((ContainerKind::Sequence, Representation::Call)));
///
/// // a comprehension is not a container display
/// let expr = parse_expression("[x for x in y]").unwrap();
/// assert_eq!(classify(&expr), None);
/// ```
pub fn classify(expr: &Expr) -> Option<(ContainerKind, Representation)> {
    match expr {
        Expr::Call { func, .. } => {
            let Expr::Name(name) = func.as_ref() else {
                return None;
            };
            let kind = match name.as_str() {
                "dict" => ContainerKind::Mapping,
                "list" => ContainerKind::Sequence,
                "set" => ContainerKind::Set,
                _ => return None,
            };
            Some((kind, Representation::Call))
        }
        Expr::Dict(_) => Some((ContainerKind::Mapping, Representation::Literal)),
        Expr::List(_) => Some((ContainerKind::Sequence, Representation::Literal)),
        Expr::Set(_) => Some((ContainerKind::Set, Representation::Literal)),
        _ => None,
    }
}

/// A located container of any kind.
#[derive(Debug)]
pub enum Handle<'a> {
    Mapping(Mapping<'a>),
    Sequence(Sequence<'a>),
    Set(Set<'a>),
}

impl Handle<'_> {
    pub fn kind(&self) -> ContainerKind {
        match self {
            Handle::Mapping(_) => ContainerKind::Mapping,
            Handle::Sequence(_) => ContainerKind::Sequence,
            Handle::Set(_) => ContainerKind::Set,
        }
    }
}

/// First top-level binding of `name` whose value is a container of `kind`,
/// in document order.
///
/// Bindings of the same name with another kind are skipped, not reported.
pub fn locate<'m>(module: &'m mut Module, name: &str, kind: ContainerKind) -> Option<Handle<'m>> {
    let binding = module.bindings_mut().find(|binding| {
        let matched = binding.name == name
            && classify(&binding.value).is_some_and(|(found, _)| found == kind);
        trace!(binding = %binding.name, line = binding.position.line, matched, "scanning binding");
        matched
    });

    let Some(binding) = binding else {
        debug!(name, %kind, "no matching binding");
        return None;
    };
    debug!(name, %kind, line = binding.position.line, "located binding");

    let Binding { value, edited, .. } = binding;
    match (kind, value) {
        (ContainerKind::Mapping, Expr::Dict(items)) => Some(Handle::Mapping(Mapping::Literal(
            LiteralMapping::new(items, edited),
        ))),
        (ContainerKind::Mapping, Expr::Call { args, keywords, .. }) => Some(Handle::Mapping(
            Mapping::Call(CallMapping::new(args, keywords, edited)),
        )),
        (ContainerKind::Sequence, Expr::List(elements)) => Some(Handle::Sequence(
            Sequence::Literal(LiteralSequence::new(elements, edited)),
        )),
        (ContainerKind::Sequence, Expr::Call { args, .. }) => {
            Some(Handle::Sequence(Sequence::Call(CallSequence::new(args, edited))))
        }
        (ContainerKind::Set, Expr::Set(elements)) => {
            Some(Handle::Set(Set::Literal(LiteralSet::new(elements, edited))))
        }
        (ContainerKind::Set, Expr::Call { args, .. }) => {
            Some(Handle::Set(Set::Call(CallSet::new(args, edited))))
        }
        _ => None,
    }
}

pub fn locate_mapping<'m>(module: &'m mut Module, name: &str) -> Option<Mapping<'m>> {
    match locate(module, name, ContainerKind::Mapping)? {
        Handle::Mapping(mapping) => Some(mapping),
        _ => None,
    }
}

pub fn locate_sequence<'m>(module: &'m mut Module, name: &str) -> Option<Sequence<'m>> {
    match locate(module, name, ContainerKind::Sequence)? {
        Handle::Sequence(sequence) => Some(sequence),
        _ => None,
    }
}

pub fn locate_set<'m>(module: &'m mut Module, name: &str) -> Option<Set<'m>> {
    match locate(module, name, ContainerKind::Set)? {
        Handle::Set(set) => Some(set),
        _ => None,
    }
}
