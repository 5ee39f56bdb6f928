use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use crate::{ast::Scalar, container::elements::scalar_eq, convert::value_to_expr, output::to_source};

/// A runtime value that can be written into a Python container.
///
/// Values are converted into expression nodes before they are inserted, and
/// existing elements can be read back as values. The variants cover what a
/// Python literal can spell without running code.
///
/// # Equality
///
/// The derived `PartialEq` is structural. [`Value::python_eq`] follows
/// Python's `==` instead, so `Value::Int(1)`, `Value::Float(1.0)` and
/// `Value::Bool(true)` all compare equal there.
///
/// # Examples
///
/// ```
/// use pycraft::Value;
///
/// let list = Value::from(vec![1, 2, 3]);
/// assert_eq!(list.to_string(), "[1, 2, 3]");
///
/// let dict = Value::dict([(Value::from("a"), Value::from(1.5))]);
/// assert_eq!(dict.to_string(), "{'a': 1.5}");
///
/// assert_eq!(Value::set(Vec::<Value>::new()).to_string(), "set()");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `None`
    None,

    /// `True` / `False`
    Bool(bool),

    /// Integer
    Int(i64),

    /// Floating-point number
    Float(f64),

    /// Text string
    Str(String),

    /// Bytes string
    Bytes(Vec<u8>),

    /// `[a, b]`
    List(Vec<Value>),

    /// `(a, b)`
    Tuple(Vec<Value>),

    /// `{a, b}`, kept in insertion order
    Set(Vec<Value>),

    /// `{k: v}`, kept in insertion order
    Dict(Vec<(Value, Value)>),
}

impl Value {
    /// Builds a set, dropping members equal to an earlier one.
    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let mut members: Vec<Value> = Vec::new();
        for item in items {
            let item = item.into();
            if !members.iter().any(|m| m.python_eq(&item)) {
                members.push(item);
            }
        }
        Value::Set(members)
    }

    /// Builds a dict. A repeated key keeps its first position and its last
    /// value, as a Python dict display does.
    pub fn dict<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        let mut items: Vec<(Value, Value)> = Vec::new();
        for (key, value) in entries {
            let (key, value) = (key.into(), value.into());
            match items.iter_mut().find(|(k, _)| k.python_eq(&key)) {
                Some(entry) => entry.1 = value,
                None => items.push((key, value)),
            }
        }
        Value::Dict(items)
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(bytes.into())
    }

    /// Name of the Python type this value spells.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Dict(_) => "dict",
        }
    }

    /// The scalar for a non-container value.
    pub fn as_scalar(&self) -> Option<Scalar> {
        let scalar = match self {
            Value::None => Scalar::None,
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Int(n) => Scalar::Int(*n),
            Value::Float(f) => Scalar::Float(*f),
            Value::Str(s) => Scalar::Str(s.clone()),
            Value::Bytes(b) => Scalar::Bytes(b.clone()),
            _ => return None,
        };
        Some(scalar)
    }

    /// Whether Python could use the value as a dict key.
    pub fn is_hashable(&self) -> bool {
        match self {
            Value::List(_) | Value::Set(_) | Value::Dict(_) => false,
            Value::Tuple(items) => items.iter().all(Value::is_hashable),
            _ => true,
        }
    }

    /// Python `==`.
    pub fn python_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.python_eq(y))
            }
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| x.python_eq(y)))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.iter()
                            .any(|(k, v)| key.python_eq(k) && value.python_eq(v))
                    })
            }
            _ => match (self.as_scalar(), other.as_scalar()) {
                (Some(a), Some(b)) => scalar_eq(&a, &b),
                _ => false,
            },
        }
    }
}

/// Python `repr()` of the value.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_source(&value_to_expr(self)))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(option: Option<T>) -> Self {
        option.map_or(Value::None, Into::into)
    }
}

impl<K: Into<Value>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(map: BTreeMap<K, V>) -> Self {
        Value::dict(map)
    }
}

impl<T: Into<Value>> From<BTreeSet<T>> for Value {
    fn from(set: BTreeSet<T>) -> Self {
        Value::set(set)
    }
}
