use rust_decimal::{Decimal, prelude::FromPrimitive};

use crate::{
    ast::{Expr, Scalar},
    container::EditError,
    convert::value_to_expr,
    value::Value,
};

enum Number {
    Int(i64),
    Float(f64),
}

fn number(scalar: &Scalar) -> Option<Number> {
    match scalar {
        Scalar::Bool(b) => Some(Number::Int(i64::from(*b))),
        Scalar::Int(n) => Some(Number::Int(*n)),
        Scalar::Float(f) => Some(Number::Float(*f)),
        _ => None,
    }
}

fn numbers_equal(a: Number, b: Number) -> bool {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x == y,
        (Number::Float(x), Number::Float(y)) => x == y,
        (Number::Int(i), Number::Float(f)) | (Number::Float(f), Number::Int(i)) => {
            // Only an integral float can equal an integer
            if f.fract() != 0.0 {
                return false;
            }
            if let Some(id) = Decimal::from_i64(i)
                && let Some(fd) = Decimal::from_f64(f)
            {
                id == fd
            } else {
                false
            }
        }
    }
}

/// Python `==` between two constants.
pub(crate) fn scalar_eq(a: &Scalar, b: &Scalar) -> bool {
    match (a, b) {
        (Scalar::None, Scalar::None) | (Scalar::Ellipsis, Scalar::Ellipsis) => true,
        (Scalar::Str(x), Scalar::Str(y)) => x == y,
        (Scalar::Bytes(x), Scalar::Bytes(y)) => x == y,
        (Scalar::BigInt(x), Scalar::BigInt(y)) => x == y,
        (Scalar::Complex(x), Scalar::Complex(y)) => x == y,
        _ => match (number(a), number(b)) {
            (Some(x), Some(y)) => numbers_equal(x, y),
            _ => false,
        },
    }
}

/// True when `expr` is a constant equal to the scalar value `value`, or a
/// tuple display of such constants equal to a tuple value. Other container
/// values never match.
pub(crate) fn constant_matches(expr: &Expr, value: &Value) -> bool {
    if let (Expr::Tuple(items), Value::Tuple(values)) = (expr, value) {
        return items.len() == values.len()
            && items.iter().zip(values).all(|(e, v)| constant_matches(e, v));
    }
    match (expr.as_constant(), value.as_scalar()) {
        (Some(constant), Some(scalar)) => scalar_eq(constant, &scalar),
        _ => false,
    }
}

pub(crate) fn position_of(elements: &[Expr], value: &Value) -> Option<usize> {
    elements.iter().position(|e| constant_matches(e, value))
}

/// Position for `list.insert`: negative counts from the end, and anything
/// outside the list is clamped to its ends.
pub(crate) fn insert_position(index: isize, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs())
    } else {
        index.unsigned_abs().min(len)
    }
}

/// Position for `list.pop`: negative counts from the end.
pub(crate) fn pop_position(index: isize, len: usize) -> Result<usize, EditError> {
    let position = if index < 0 {
        len.checked_sub(index.unsigned_abs())
    } else {
        Some(index.unsigned_abs()).filter(|p| *p < len)
    };
    position.ok_or(EditError::IndexOutOfRange { index, len })
}

/// Ordered element list of a list/set display or of a call's positional
/// arguments. Shared by the sequence and set handles of both representations.
#[derive(Debug)]
pub(crate) struct ElementList<'a> {
    elements: &'a mut Vec<Expr>,
    edited: &'a mut bool,
}

impl<'a> ElementList<'a> {
    pub(crate) fn new(elements: &'a mut Vec<Expr>, edited: &'a mut bool) -> Self {
        ElementList { elements, edited }
    }

    pub(crate) fn as_slice(&self) -> &[Expr] {
        self.elements.as_slice()
    }

    pub(crate) fn contains(&self, value: &Value) -> bool {
        position_of(self.elements.as_slice(), value).is_some()
    }

    pub(crate) fn push(&mut self, value: &Value) {
        self.elements.push(value_to_expr(value));
        *self.edited = true;
    }

    pub(crate) fn insert(&mut self, index: isize, value: &Value) {
        let position = insert_position(index, self.elements.len());
        self.elements.insert(position, value_to_expr(value));
        *self.edited = true;
    }

    /// Removes the first constant equal to `value`.
    pub(crate) fn remove_first(&mut self, value: &Value) -> Option<Expr> {
        let position = position_of(self.elements.as_slice(), value)?;
        *self.edited = true;
        Some(self.elements.remove(position))
    }

    pub(crate) fn pop(&mut self, index: isize) -> Result<Expr, EditError> {
        let position = pop_position(index, self.elements.len())?;
        *self.edited = true;
        Ok(self.elements.remove(position))
    }

    pub(crate) fn clear(&mut self) {
        if !self.elements.is_empty() {
            self.elements.clear();
            *self.edited = true;
        }
    }

    pub(crate) fn reverse(&mut self) {
        if self.elements.len() > 1 {
            self.elements.reverse();
            *self.edited = true;
        }
    }
}

#[test]
fn test_scalar_equality_follows_python() {
    assert!(scalar_eq(&Scalar::Int(1), &Scalar::Float(1.0)));
    assert!(scalar_eq(&Scalar::Bool(true), &Scalar::Int(1)));
    assert!(scalar_eq(&Scalar::Bool(false), &Scalar::Float(0.0)));
    assert!(!scalar_eq(&Scalar::Int(1), &Scalar::Float(1.1)));
    assert!(!scalar_eq(&Scalar::Str("1".into()), &Scalar::Int(1)));
    assert!(!scalar_eq(&Scalar::Str("a".into()), &Scalar::Bytes(b"a".to_vec())));
    assert!(!scalar_eq(&Scalar::Float(f64::NAN), &Scalar::Float(f64::NAN)));
}

#[test]
fn test_insert_position_clamps() {
    assert_eq!(insert_position(0, 3), 0);
    assert_eq!(insert_position(2, 3), 2);
    assert_eq!(insert_position(10, 3), 3);
    assert_eq!(insert_position(-1, 3), 2);
    assert_eq!(insert_position(-10, 3), 0);
}

#[test]
fn test_pop_position() {
    assert_eq!(pop_position(0, 3), Ok(0));
    assert_eq!(pop_position(-1, 3), Ok(2));
    assert_eq!(pop_position(-3, 3), Ok(0));
    assert_eq!(
        pop_position(3, 3),
        Err(EditError::IndexOutOfRange { index: 3, len: 3 })
    );
    assert_eq!(
        pop_position(-4, 3),
        Err(EditError::IndexOutOfRange { index: -4, len: 3 })
    );
    assert!(pop_position(0, 0).is_err());
}
