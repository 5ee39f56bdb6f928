//! Conversion between runtime [`Value`]s and expression nodes.

use crate::{
    ast::{DictItem, Expr, Scalar, UnaryOp},
    value::Value,
};

/// Build the expression node for a value.
///
/// Every value has a literal spelling, so this never fails. An empty set has
/// no display form and becomes the call `set()`.
pub fn value_to_expr(value: &Value) -> Expr {
    match value {
        Value::None => Expr::constant(Scalar::None),
        Value::Bool(b) => Expr::constant(Scalar::Bool(*b)),
        Value::Int(n) => Expr::constant(Scalar::Int(*n)),
        Value::Float(f) => Expr::constant(Scalar::Float(*f)),
        Value::Str(s) => Expr::constant(Scalar::Str(s.clone())),
        Value::Bytes(b) => Expr::constant(Scalar::Bytes(b.clone())),
        Value::List(items) => Expr::List(items.iter().map(value_to_expr).collect()),
        Value::Tuple(items) => Expr::Tuple(items.iter().map(value_to_expr).collect()),
        Value::Set(items) if items.is_empty() => Expr::call("set", Vec::new(), Vec::new()),
        Value::Set(items) => Expr::Set(items.iter().map(value_to_expr).collect()),
        Value::Dict(entries) => Expr::Dict(
            entries
                .iter()
                .map(|(key, value)| DictItem {
                    key: Some(value_to_expr(key)),
                    value: value_to_expr(value),
                })
                .collect(),
        ),
    }
}

/// Read an expression back as a value.
///
/// Returns `None` for anything that is not a plain literal: names, calls
/// other than the container constructors, operations, `**` unpacking, and
/// constants that [`Value`] cannot hold (big integers, complex numbers, `...`).
///
/// `dict(k=v)`, `list(a, b)` and `set(a, b)` read as their containers, the
/// same way the container handles treat them.
pub fn expr_to_value(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Constant(constant) => match &constant.value {
            Scalar::None => Some(Value::None),
            Scalar::Bool(b) => Some(Value::Bool(*b)),
            Scalar::Int(n) => Some(Value::Int(*n)),
            Scalar::Float(f) => Some(Value::Float(*f)),
            Scalar::Str(s) => Some(Value::Str(s.clone())),
            Scalar::Bytes(b) => Some(Value::Bytes(b.clone())),
            Scalar::BigInt(_) | Scalar::Complex(_) | Scalar::Ellipsis => None,
        },
        Expr::UnaryOp { op, operand } => match (op, expr_to_value(operand)?) {
            (UnaryOp::USub, Value::Int(n)) => n.checked_neg().map(Value::Int),
            (UnaryOp::USub, Value::Float(f)) => Some(Value::Float(-f)),
            (UnaryOp::UAdd, value @ (Value::Int(_) | Value::Float(_))) => Some(value),
            _ => None,
        },
        Expr::List(elements) => elements_to_values(elements).map(Value::List),
        Expr::Tuple(elements) => elements_to_values(elements).map(Value::Tuple),
        Expr::Set(elements) => elements_to_values(elements).map(Value::Set),
        Expr::Dict(items) => items
            .iter()
            .map(|item| Some((expr_to_value(item.key.as_ref()?)?, expr_to_value(&item.value)?)))
            .collect::<Option<Vec<_>>>()
            .map(Value::Dict),
        Expr::Call {
            func,
            args,
            keywords,
        } => match func.as_ref() {
            Expr::Name(name) if name == "dict" && args.is_empty() => keywords
                .iter()
                .map(|keyword| {
                    let key = Value::Str(keyword.arg.clone()?);
                    Some((key, expr_to_value(&keyword.value)?))
                })
                .collect::<Option<Vec<_>>>()
                .map(Value::Dict),
            Expr::Name(name) if name == "list" && keywords.is_empty() => {
                elements_to_values(args).map(Value::List)
            }
            Expr::Name(name) if name == "set" && keywords.is_empty() => {
                elements_to_values(args).map(Value::Set)
            }
            _ => None,
        },
        _ => None,
    }
}

fn elements_to_values(elements: &[Expr]) -> Option<Vec<Value>> {
    elements.iter().map(expr_to_value).collect()
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        value_to_expr(&value)
    }
}

impl From<&Value> for Expr {
    fn from(value: &Value) -> Self {
        value_to_expr(value)
    }
}

impl Expr {
    /// The literal value of this expression, see [`expr_to_value`].
    pub fn to_value(&self) -> Option<Value> {
        expr_to_value(self)
    }
}

#[test]
fn test_empty_set_becomes_call() {
    let expr = value_to_expr(&Value::Set(Vec::new()));
    assert!(expr.is_call_to("set"));
    assert_eq!(expr.to_value(), Some(Value::Set(Vec::new())));
}

#[test]
fn test_parsed_literals_read_back() {
    let expr = crate::parser::parse_expression("{'a': [-1, 2.5, None], 'b': (b'x',)}").unwrap();
    assert_eq!(
        expr.to_value(),
        Some(Value::Dict(vec![
            (
                Value::from("a"),
                Value::List(vec![Value::Int(-1), Value::Float(2.5), Value::None])
            ),
            (
                Value::from("b"),
                Value::Tuple(vec![Value::bytes(b"x".to_vec())])
            ),
        ]))
    );
}

#[test]
fn test_non_literals_have_no_value() {
    for source in ["x", "f(1)", "{**base}", "1 + 2", "10 ** 40", "dict(**kw)"] {
        let expr = crate::parser::parse_expression(source).unwrap();
        assert_eq!(expr.to_value(), None, "{}", source);
    }
}
