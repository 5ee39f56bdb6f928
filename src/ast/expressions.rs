use crate::ast::{BinOp, BoolOp, CmpOp, UnaryOp};

/// A scalar constant value carried by a [`Constant`] node.
///
/// Only scalar constants take part in element identity: two elements are
/// considered equal when both are constants and their scalars compare equal
/// under Python's `==`.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// `None`
    None,

    /// `True` / `False`
    Bool(bool),

    /// Integer that fits in 64 bits
    Int(i64),

    /// Integer literal too large for `i64`, kept as normalized digits
    ///
    /// Equality is textual, so `0xFFFFFFFFFFFFFFFFFF` only equals the same spelling.
    BigInt(String),

    /// Floating point number
    Float(f64),

    /// Imaginary literal (`2j`), holding the imaginary part
    Complex(f64),

    /// Text string with escapes decoded
    Str(String),

    /// Bytes literal with escapes decoded
    Bytes(Vec<u8>),

    /// `...`
    Ellipsis,
}

/// A constant leaf.
///
/// `raw` holds the exact source spelling when the constant was parsed, so that
/// re-rendering a mutated container keeps `"double"` quotes, `0x10` or `1_000`
/// as the author wrote them. Constants created from runtime values have no raw
/// text and render with Python `repr` rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub value: Scalar,
    pub raw: Option<String>,
}

impl Constant {
    pub fn new(value: Scalar) -> Self {
        Constant { value, raw: None }
    }

    pub fn with_raw(value: Scalar, raw: impl Into<String>) -> Self {
        Constant {
            value,
            raw: Some(raw.into()),
        }
    }
}

/// One entry of a dict display.
///
/// A missing key marks a `**mapping` unpacking entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DictItem {
    pub key: Option<Expr>,
    pub value: Expr,
}

/// Keyword argument of a call.
///
/// A missing name marks a `**kwargs` unpacking argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub arg: Option<String>,
    pub value: Expr,
}

/// `for target in iter if cond` clause of a comprehension.
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub target: Expr,
    pub iter: Expr,
    pub ifs: Vec<Expr>,
    pub is_async: bool,
}

/// Kind of a lambda parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// `name` or `name=default`
    Plain,
    /// `*name`
    VarArgs,
    /// `**name`
    KwArgs,
    /// Bare `*` separating keyword-only parameters
    KeywordOnlyMarker,
    /// `/` closing positional-only parameters
    PositionalOnlyMarker,
}

/// Lambda parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub kind: ParamKind,
    pub name: Option<String>,
    pub default: Option<Expr>,
}

/// Expression node.
///
/// Parentheses are not represented; the printer re-inserts them from operator
/// precedence.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Leaves
    /// Scalar constant
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 'a' "b"
    /// None
    /// ```
    Constant(Constant),

    /// Formatted string literal, kept verbatim
    ///
    /// f-strings are never constants: they cannot match a search value.
    FString(String),

    /// Variable reference
    Name(String),

    // Displays
    /// List display `[a, b]`
    List(Vec<Expr>),

    /// Tuple `(a, b)` or `a, b`
    Tuple(Vec<Expr>),

    /// Set display `{a, b}`
    Set(Vec<Expr>),

    /// Dict display `{k: v, **m}`
    Dict(Vec<DictItem>),

    /// `[elt for ...]`
    ListComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },

    /// `{elt for ...}`
    SetComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },

    /// `(elt for ...)`
    GeneratorExp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },

    /// `{key: value for ...}`
    DictComp {
        key: Box<Expr>,
        value: Box<Expr>,
        generators: Vec<Comprehension>,
    },

    // Access
    /// `func(args, kw=value)`
    ///
    /// Positional arguments are kept in source order, `*args` as [`Expr::Starred`].
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
    },

    /// `value.attr`
    Attribute { value: Box<Expr>, attr: String },

    /// `value[slice]`
    Subscript { value: Box<Expr>, slice: Box<Expr> },

    /// `lower:upper:step` inside a subscript
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },

    /// `*value`
    Starred(Box<Expr>),

    // Operations
    /// Arithmetic or bitwise binary operation
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },

    /// `not x`, `-x`, `+x`, `~x`
    UnaryOp { op: UnaryOp, operand: Box<Expr> },

    /// `a and b and c`
    BoolOp { op: BoolOp, values: Vec<Expr> },

    /// `a < b <= c`
    Compare {
        left: Box<Expr>,
        comparisons: Vec<(CmpOp, Expr)>,
    },

    /// `body if test else orelse`
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },

    /// `lambda params: body`
    Lambda { params: Vec<Param>, body: Box<Expr> },

    /// `target := value`
    NamedExpr { target: String, value: Box<Expr> },

    /// `await value`
    Await(Box<Expr>),

    /// `yield` / `yield value`
    Yield(Option<Box<Expr>>),

    /// `yield from value`
    YieldFrom(Box<Expr>),
}

impl Expr {
    /// Builds a constant node without source spelling.
    pub fn constant(value: Scalar) -> Self {
        Expr::Constant(Constant::new(value))
    }

    pub fn name(name: impl Into<String>) -> Self {
        Expr::Name(name.into())
    }

    /// Builds `func()` for a bare function name.
    pub fn call(func: impl Into<String>, args: Vec<Expr>, keywords: Vec<Keyword>) -> Self {
        Expr::Call {
            func: Box::new(Expr::Name(func.into())),
            args,
            keywords,
        }
    }

    /// Returns the scalar when this node is a constant.
    pub fn as_constant(&self) -> Option<&Scalar> {
        match self {
            Expr::Constant(constant) => Some(&constant.value),
            _ => None,
        }
    }

    /// True when this is a reference to the plain name `name`.
    pub fn is_name(&self, name: &str) -> bool {
        matches!(self, Expr::Name(n) if n == name)
    }

    /// True when this is a call whose callee is the plain name `name`.
    pub fn is_call_to(&self, name: &str) -> bool {
        matches!(self, Expr::Call { func, .. } if func.is_name(name))
    }
}
