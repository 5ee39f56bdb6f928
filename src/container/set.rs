use crate::{
    ast::Expr,
    container::{EditError, elements::ElementList},
    locator::Representation,
    value::Value,
};

/// Mutation contract of a set.
///
/// Members are kept in source order and new members are appended.
pub trait SetOps {
    /// Append `value` unless an equal constant member exists.
    fn add(&mut self, value: impl Into<Value>);

    /// [`add`](SetOps::add) for each value in order.
    fn update<I, T>(&mut self, values: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        for value in values {
            self.add(value);
        }
    }

    /// Remove the equal constant member, failing when there is none.
    fn remove(&mut self, value: impl Into<Value>) -> Result<(), EditError>;

    /// Remove the equal constant member if there is one.
    fn discard(&mut self, value: impl Into<Value>);

    fn contains(&self, value: impl Into<Value>) -> bool;

    fn elements(&self) -> &[Expr];

    fn len(&self) -> usize {
        self.elements().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn add_member(list: &mut ElementList<'_>, value: impl Into<Value>) {
    let value = value.into();
    if !list.contains(&value) {
        list.push(&value);
    }
}

fn remove_member(list: &mut ElementList<'_>, value: impl Into<Value>) -> Result<(), EditError> {
    let value = value.into();
    match list.remove_first(&value) {
        Some(_) => Ok(()),
        None => Err(EditError::KeyNotFound(value.to_string())),
    }
}

/// `{a, b}`
#[derive(Debug)]
pub struct LiteralSet<'a>(ElementList<'a>);

impl<'a> LiteralSet<'a> {
    pub fn new(elements: &'a mut Vec<Expr>, edited: &'a mut bool) -> Self {
        LiteralSet(ElementList::new(elements, edited))
    }
}

impl SetOps for LiteralSet<'_> {
    fn add(&mut self, value: impl Into<Value>) {
        add_member(&mut self.0, value);
    }

    fn remove(&mut self, value: impl Into<Value>) -> Result<(), EditError> {
        remove_member(&mut self.0, value)
    }

    fn discard(&mut self, value: impl Into<Value>) {
        self.0.remove_first(&value.into());
    }

    fn contains(&self, value: impl Into<Value>) -> bool {
        self.0.contains(&value.into())
    }

    fn elements(&self) -> &[Expr] {
        self.0.as_slice()
    }
}

/// `set(a, b)`
///
/// Positional arguments are the members.
#[derive(Debug)]
pub struct CallSet<'a>(ElementList<'a>);

impl<'a> CallSet<'a> {
    pub fn new(args: &'a mut Vec<Expr>, edited: &'a mut bool) -> Self {
        CallSet(ElementList::new(args, edited))
    }
}

impl SetOps for CallSet<'_> {
    fn add(&mut self, value: impl Into<Value>) {
        add_member(&mut self.0, value);
    }

    fn remove(&mut self, value: impl Into<Value>) -> Result<(), EditError> {
        remove_member(&mut self.0, value)
    }

    fn discard(&mut self, value: impl Into<Value>) {
        self.0.remove_first(&value.into());
    }

    fn contains(&self, value: impl Into<Value>) -> bool {
        self.0.contains(&value.into())
    }

    fn elements(&self) -> &[Expr] {
        self.0.as_slice()
    }
}

/// A set handle of either representation.
#[derive(Debug)]
pub enum Set<'a> {
    Literal(LiteralSet<'a>),
    Call(CallSet<'a>),
}

impl Set<'_> {
    pub fn representation(&self) -> Representation {
        match self {
            Set::Literal(_) => Representation::Literal,
            Set::Call(_) => Representation::Call,
        }
    }
}

impl SetOps for Set<'_> {
    fn add(&mut self, value: impl Into<Value>) {
        match self {
            Set::Literal(s) => s.add(value),
            Set::Call(s) => s.add(value),
        }
    }

    fn remove(&mut self, value: impl Into<Value>) -> Result<(), EditError> {
        match self {
            Set::Literal(s) => s.remove(value),
            Set::Call(s) => s.remove(value),
        }
    }

    fn discard(&mut self, value: impl Into<Value>) {
        match self {
            Set::Literal(s) => s.discard(value),
            Set::Call(s) => s.discard(value),
        }
    }

    fn contains(&self, value: impl Into<Value>) -> bool {
        match self {
            Set::Literal(s) => s.contains(value),
            Set::Call(s) => s.contains(value),
        }
    }

    fn elements(&self) -> &[Expr] {
        match self {
            Set::Literal(s) => s.elements(),
            Set::Call(s) => s.elements(),
        }
    }
}
