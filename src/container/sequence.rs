use crate::{
    ast::Expr,
    container::{EditError, elements::ElementList},
    locator::Representation,
    value::Value,
};

/// Mutation contract of a list.
pub trait SequenceOps {
    fn append(&mut self, value: impl Into<Value>);

    /// [`append`](SequenceOps::append) for each value in order.
    fn extend<I, T>(&mut self, values: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        for value in values {
            self.append(value);
        }
    }

    /// Insert before `index`, with `list.insert` semantics: negative indices
    /// count from the end and out-of-range indices clamp to either end.
    fn insert(&mut self, index: isize, value: impl Into<Value>);

    /// Remove the first constant element equal to `value`.
    fn remove(&mut self, value: impl Into<Value>) -> Result<(), EditError>;

    /// Remove and return the element at `index`; negative indices count from the end.
    fn pop(&mut self, index: isize) -> Result<Expr, EditError>;

    /// Remove and return the last element.
    fn pop_last(&mut self) -> Result<Expr, EditError> {
        self.pop(-1)
    }

    fn clear(&mut self);

    fn reverse(&mut self);

    fn elements(&self) -> &[Expr];

    fn len(&self) -> usize {
        self.elements().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn remove_value(list: &mut ElementList<'_>, value: impl Into<Value>) -> Result<(), EditError> {
    let value = value.into();
    match list.remove_first(&value) {
        Some(_) => Ok(()),
        None => Err(EditError::ValueNotFound(value.to_string())),
    }
}

/// `[a, b]`
#[derive(Debug)]
pub struct LiteralSequence<'a>(ElementList<'a>);

impl<'a> LiteralSequence<'a> {
    pub fn new(elements: &'a mut Vec<Expr>, edited: &'a mut bool) -> Self {
        LiteralSequence(ElementList::new(elements, edited))
    }
}

impl SequenceOps for LiteralSequence<'_> {
    fn append(&mut self, value: impl Into<Value>) {
        self.0.push(&value.into());
    }

    fn insert(&mut self, index: isize, value: impl Into<Value>) {
        self.0.insert(index, &value.into());
    }

    fn remove(&mut self, value: impl Into<Value>) -> Result<(), EditError> {
        remove_value(&mut self.0, value)
    }

    fn pop(&mut self, index: isize) -> Result<Expr, EditError> {
        self.0.pop(index)
    }

    fn clear(&mut self) {
        self.0.clear();
    }

    fn reverse(&mut self) {
        self.0.reverse();
    }

    fn elements(&self) -> &[Expr] {
        self.0.as_slice()
    }
}

/// `list(a, b)`
///
/// Positional arguments are the elements, in argument order.
#[derive(Debug)]
pub struct CallSequence<'a>(ElementList<'a>);

impl<'a> CallSequence<'a> {
    pub fn new(args: &'a mut Vec<Expr>, edited: &'a mut bool) -> Self {
        CallSequence(ElementList::new(args, edited))
    }
}

impl SequenceOps for CallSequence<'_> {
    fn append(&mut self, value: impl Into<Value>) {
        self.0.push(&value.into());
    }

    fn insert(&mut self, index: isize, value: impl Into<Value>) {
        self.0.insert(index, &value.into());
    }

    fn remove(&mut self, value: impl Into<Value>) -> Result<(), EditError> {
        remove_value(&mut self.0, value)
    }

    fn pop(&mut self, index: isize) -> Result<Expr, EditError> {
        self.0.pop(index)
    }

    fn clear(&mut self) {
        self.0.clear();
    }

    fn reverse(&mut self) {
        self.0.reverse();
    }

    fn elements(&self) -> &[Expr] {
        self.0.as_slice()
    }
}

/// A sequence handle of either representation.
#[derive(Debug)]
pub enum Sequence<'a> {
    Literal(LiteralSequence<'a>),
    Call(CallSequence<'a>),
}

impl Sequence<'_> {
    pub fn representation(&self) -> Representation {
        match self {
            Sequence::Literal(_) => Representation::Literal,
            Sequence::Call(_) => Representation::Call,
        }
    }
}

impl SequenceOps for Sequence<'_> {
    fn append(&mut self, value: impl Into<Value>) {
        match self {
            Sequence::Literal(s) => s.append(value),
            Sequence::Call(s) => s.append(value),
        }
    }

    fn insert(&mut self, index: isize, value: impl Into<Value>) {
        match self {
            Sequence::Literal(s) => s.insert(index, value),
            Sequence::Call(s) => s.insert(index, value),
        }
    }

    fn remove(&mut self, value: impl Into<Value>) -> Result<(), EditError> {
        match self {
            Sequence::Literal(s) => s.remove(value),
            Sequence::Call(s) => s.remove(value),
        }
    }

    fn pop(&mut self, index: isize) -> Result<Expr, EditError> {
        match self {
            Sequence::Literal(s) => s.pop(index),
            Sequence::Call(s) => s.pop(index),
        }
    }

    fn clear(&mut self) {
        match self {
            Sequence::Literal(s) => s.clear(),
            Sequence::Call(s) => s.clear(),
        }
    }

    fn reverse(&mut self) {
        match self {
            Sequence::Literal(s) => s.reverse(),
            Sequence::Call(s) => s.reverse(),
        }
    }

    fn elements(&self) -> &[Expr] {
        match self {
            Sequence::Literal(s) => s.elements(),
            Sequence::Call(s) => s.elements(),
        }
    }
}
