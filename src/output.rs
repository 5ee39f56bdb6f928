//! Python source output for expression trees.
//!
//! This module turns an [`Expr`] back into Python source text. It is used to
//! re-render a binding after one of its containers was mutated.
//!
//! # Features
//!
//! - **Source fidelity** - parsed constants keep their original spelling
//!   (quote style, string prefixes, `0x` numbers, `1_000`)
//! - **Python `repr`** - constants created at runtime are written the way
//!   Python's `repr()` writes them
//! - **Minimal parentheses** - re-inserted from operator precedence
//! - **Multiline layout** via [`to_source_multiline()`] - one element per line
//!   with four-space indentation and a trailing comma
//!
//! # Examples
//!
//! ```
//! use pycraft::output::to_source;
//! use pycraft::parser::parse_expression;
//!
//! let expr = parse_expression("{'a': [1, 2], \"b\": 0x10}").unwrap();
//! assert_eq!(to_source(&expr), "{'a': [1, 2], \"b\": 0x10}");
//! ```

use crate::ast::{BinOp, BoolOp, Comprehension, Constant, Expr, Param, ParamKind, Scalar, UnaryOp};

const INDENT: &str = "    ";

/// Binding strength, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    NamedExpr,
    Tuple,
    Yield,
    Test,
    Or,
    And,
    Not,
    Cmp,
    BitOr,
    BitXor,
    BitAnd,
    Shift,
    Arith,
    Term,
    Factor,
    Power,
    Await,
    Atom,
}

impl Precedence {
    fn next(self) -> Self {
        match self {
            Precedence::NamedExpr => Precedence::Tuple,
            Precedence::Tuple => Precedence::Yield,
            Precedence::Yield => Precedence::Test,
            Precedence::Test => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Not,
            Precedence::Not => Precedence::Cmp,
            Precedence::Cmp => Precedence::BitOr,
            Precedence::BitOr => Precedence::BitXor,
            Precedence::BitXor => Precedence::BitAnd,
            Precedence::BitAnd => Precedence::Shift,
            Precedence::Shift => Precedence::Arith,
            Precedence::Arith => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Power,
            Precedence::Power => Precedence::Await,
            Precedence::Await | Precedence::Atom => Precedence::Atom,
        }
    }

    fn of_binop(op: BinOp) -> Self {
        match op {
            BinOp::BitOr => Precedence::BitOr,
            BinOp::BitXor => Precedence::BitXor,
            BinOp::BitAnd => Precedence::BitAnd,
            BinOp::LShift | BinOp::RShift => Precedence::Shift,
            BinOp::Add | BinOp::Sub => Precedence::Arith,
            BinOp::Mult | BinOp::MatMult | BinOp::Div | BinOp::FloorDiv | BinOp::Mod => {
                Precedence::Term
            }
            BinOp::Pow => Precedence::Power,
        }
    }
}

pub struct SourcePrinter {
    multiline: bool,
}

impl SourcePrinter {
    pub fn new(multiline: bool) -> Self {
        SourcePrinter { multiline }
    }

    pub fn print(&self, expr: &Expr) -> String {
        if self.multiline
            && let Some(text) = self.print_expanded(expr)
        {
            return text;
        }
        self.print_expr(expr, Precedence::Test)
    }

    /// One element per line. Only the outermost container is expanded; empty
    /// containers stay on one line.
    fn print_expanded(&self, expr: &Expr) -> Option<String> {
        let (open, items, close) = match expr {
            Expr::List(elements) if !elements.is_empty() => {
                ("[".to_string(), self.print_elements(elements), "]")
            }
            Expr::Set(elements) if !elements.is_empty() => {
                ("{".to_string(), self.print_elements(elements), "}")
            }
            Expr::Dict(items) if !items.is_empty() => (
                "{".to_string(),
                items
                    .iter()
                    .map(|item| self.print_dict_item(item.key.as_ref(), &item.value))
                    .collect(),
                "}",
            ),
            Expr::Call {
                func,
                args,
                keywords,
            } if !args.is_empty() || !keywords.is_empty() => (
                format!("{}(", self.print_expr(func, Precedence::Atom)),
                self.print_arguments(args, keywords),
                ")",
            ),
            _ => return None,
        };

        let mut result = open;
        result.push('\n');
        for item in items {
            result.push_str(INDENT);
            result.push_str(&item);
            result.push_str(",\n");
        }
        result.push_str(close);
        Some(result)
    }

    fn print_elements(&self, elements: &[Expr]) -> Vec<String> {
        elements
            .iter()
            .map(|e| self.print_expr(e, Precedence::Test))
            .collect()
    }

    fn print_dict_item(&self, key: Option<&Expr>, value: &Expr) -> String {
        match key {
            Some(key) => format!(
                "{}: {}",
                self.print_expr(key, Precedence::Test),
                self.print_expr(value, Precedence::Test)
            ),
            None => format!("**{}", self.print_expr(value, Precedence::BitOr)),
        }
    }

    fn print_arguments(&self, args: &[Expr], keywords: &[crate::ast::Keyword]) -> Vec<String> {
        let mut items = self.print_elements(args);
        items.extend(keywords.iter().map(|keyword| match &keyword.arg {
            Some(arg) => format!("{}={}", arg, self.print_expr(&keyword.value, Precedence::Test)),
            None => format!("**{}", self.print_expr(&keyword.value, Precedence::Test)),
        }));
        items
    }

    fn print_expr(&self, expr: &Expr, level: Precedence) -> String {
        let (text, precedence) = self.print_unwrapped(expr);
        if precedence < level {
            format!("({})", text)
        } else {
            text
        }
    }

    /// Source text of `expr` without outer parentheses, with the precedence
    /// it binds at.
    fn print_unwrapped(&self, expr: &Expr) -> (String, Precedence) {
        match expr {
            Expr::Constant(constant) => {
                let text = constant_source(constant);
                let precedence = if text.starts_with('-') {
                    Precedence::Factor
                } else {
                    Precedence::Atom
                };
                (text, precedence)
            }
            Expr::FString(raw) => (raw.clone(), Precedence::Atom),
            Expr::Name(name) => (name.clone(), Precedence::Atom),

            Expr::List(elements) => (
                format!("[{}]", self.print_elements(elements).join(", ")),
                Precedence::Atom,
            ),
            Expr::Tuple(elements) => {
                let text = match elements.as_slice() {
                    [] => "()".to_string(),
                    [only] => format!("({},)", self.print_expr(only, Precedence::Test)),
                    _ => format!("({})", self.print_elements(elements).join(", ")),
                };
                (text, Precedence::Atom)
            }
            Expr::Set(elements) if elements.is_empty() => ("set()".to_string(), Precedence::Atom),
            Expr::Set(elements) => (
                format!("{{{}}}", self.print_elements(elements).join(", ")),
                Precedence::Atom,
            ),
            Expr::Dict(items) => {
                let items: Vec<String> = items
                    .iter()
                    .map(|item| self.print_dict_item(item.key.as_ref(), &item.value))
                    .collect();
                (format!("{{{}}}", items.join(", ")), Precedence::Atom)
            }

            Expr::ListComp { elt, generators } => (
                format!(
                    "[{}{}]",
                    self.print_expr(elt, Precedence::Test),
                    self.print_generators(generators)
                ),
                Precedence::Atom,
            ),
            Expr::SetComp { elt, generators } => (
                format!(
                    "{{{}{}}}",
                    self.print_expr(elt, Precedence::Test),
                    self.print_generators(generators)
                ),
                Precedence::Atom,
            ),
            Expr::GeneratorExp { elt, generators } => (
                format!(
                    "({}{})",
                    self.print_expr(elt, Precedence::Test),
                    self.print_generators(generators)
                ),
                Precedence::Atom,
            ),
            Expr::DictComp {
                key,
                value,
                generators,
            } => (
                format!(
                    "{{{}: {}{}}}",
                    self.print_expr(key, Precedence::Test),
                    self.print_expr(value, Precedence::Test),
                    self.print_generators(generators)
                ),
                Precedence::Atom,
            ),

            Expr::Call {
                func,
                args,
                keywords,
            } => (
                format!(
                    "{}({})",
                    self.print_expr(func, Precedence::Atom),
                    self.print_arguments(args, keywords).join(", ")
                ),
                Precedence::Atom,
            ),
            Expr::Attribute { value, attr } => {
                // `1.real` would lex as a float
                let base = match value.as_ref() {
                    Expr::Constant(Constant {
                        value: Scalar::Int(_) | Scalar::BigInt(_),
                        ..
                    }) => format!("({})", self.print_expr(value, Precedence::Test)),
                    _ => self.print_expr(value, Precedence::Atom),
                };
                (format!("{}.{}", base, attr), Precedence::Atom)
            }
            Expr::Subscript { value, slice } => {
                let index = match slice.as_ref() {
                    Expr::Tuple(elements) if elements.len() == 1 => {
                        format!("{},", self.print_expr(&elements[0], Precedence::Test))
                    }
                    Expr::Tuple(elements) if !elements.is_empty() => {
                        self.print_elements(elements).join(", ")
                    }
                    other => self.print_expr(other, Precedence::Test),
                };
                (
                    format!("{}[{}]", self.print_expr(value, Precedence::Atom), index),
                    Precedence::Atom,
                )
            }
            Expr::Slice { lower, upper, step } => {
                let bound = |part: &Option<Box<Expr>>| {
                    part.as_ref()
                        .map(|e| self.print_expr(e, Precedence::Test))
                        .unwrap_or_default()
                };
                let mut text = format!("{}:{}", bound(lower), bound(upper));
                if step.is_some() {
                    text.push(':');
                    text.push_str(&bound(step));
                }
                (text, Precedence::Test)
            }
            Expr::Starred(value) => (
                format!("*{}", self.print_expr(value, Precedence::BitOr)),
                Precedence::Test,
            ),

            Expr::BinOp { left, op, right } => {
                let precedence = Precedence::of_binop(*op);
                let (left_level, right_level) = if *op == BinOp::Pow {
                    (Precedence::Await, Precedence::Factor)
                } else {
                    (precedence, precedence.next())
                };
                (
                    format!(
                        "{} {} {}",
                        self.print_expr(left, left_level),
                        op.symbol(),
                        self.print_expr(right, right_level)
                    ),
                    precedence,
                )
            }
            Expr::UnaryOp { op, operand } => {
                let precedence = if *op == UnaryOp::Not {
                    Precedence::Not
                } else {
                    Precedence::Factor
                };
                (
                    format!("{}{}", op.symbol(), self.print_expr(operand, precedence)),
                    precedence,
                )
            }
            Expr::BoolOp { op, values } => {
                let precedence = match op {
                    BoolOp::Or => Precedence::Or,
                    BoolOp::And => Precedence::And,
                };
                let separator = format!(" {} ", op.keyword());
                let text = values
                    .iter()
                    .map(|v| self.print_expr(v, precedence.next()))
                    .collect::<Vec<_>>()
                    .join(&separator);
                (text, precedence)
            }
            Expr::Compare { left, comparisons } => {
                let mut text = self.print_expr(left, Precedence::BitOr);
                for (op, operand) in comparisons {
                    text.push(' ');
                    text.push_str(op.symbol());
                    text.push(' ');
                    text.push_str(&self.print_expr(operand, Precedence::BitOr));
                }
                (text, Precedence::Cmp)
            }
            Expr::IfExp { test, body, orelse } => (
                format!(
                    "{} if {} else {}",
                    self.print_expr(body, Precedence::Or),
                    self.print_expr(test, Precedence::Or),
                    self.print_expr(orelse, Precedence::Test)
                ),
                Precedence::Test,
            ),
            Expr::Lambda { params, body } => {
                let params = self.print_params(params);
                let body = self.print_expr(body, Precedence::Test);
                let text = if params.is_empty() {
                    format!("lambda: {}", body)
                } else {
                    format!("lambda {}: {}", params, body)
                };
                (text, Precedence::Test)
            }
            Expr::NamedExpr { target, value } => (
                format!("{} := {}", target, self.print_expr(value, Precedence::Test)),
                Precedence::NamedExpr,
            ),
            Expr::Await(value) => (
                format!("await {}", self.print_expr(value, Precedence::Atom)),
                Precedence::Await,
            ),
            Expr::Yield(None) => ("yield".to_string(), Precedence::Yield),
            Expr::Yield(Some(value)) => (
                format!("yield {}", self.print_expr(value, Precedence::Tuple)),
                Precedence::Yield,
            ),
            Expr::YieldFrom(value) => (
                format!("yield from {}", self.print_expr(value, Precedence::Test)),
                Precedence::Yield,
            ),
        }
    }

    fn print_generators(&self, generators: &[Comprehension]) -> String {
        let mut text = String::new();
        for generator in generators {
            if generator.is_async {
                text.push_str(" async");
            }
            let target = match &generator.target {
                Expr::Tuple(elements) if elements.len() > 1 => {
                    self.print_elements(elements).join(", ")
                }
                other => self.print_expr(other, Precedence::BitOr),
            };
            text.push_str(&format!(
                " for {} in {}",
                target,
                self.print_expr(&generator.iter, Precedence::Or)
            ));
            for condition in &generator.ifs {
                text.push_str(&format!(" if {}", self.print_expr(condition, Precedence::Or)));
            }
        }
        text
    }

    fn print_params(&self, params: &[Param]) -> String {
        params
            .iter()
            .map(|param| {
                let name = param.name.as_deref().unwrap_or_default();
                match param.kind {
                    ParamKind::Plain => match &param.default {
                        Some(default) => {
                            format!("{}={}", name, self.print_expr(default, Precedence::Test))
                        }
                        None => name.to_string(),
                    },
                    ParamKind::VarArgs => format!("*{}", name),
                    ParamKind::KwArgs => format!("**{}", name),
                    ParamKind::KeywordOnlyMarker => "*".to_string(),
                    ParamKind::PositionalOnlyMarker => "/".to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Render an expression on one line.
pub fn to_source(expr: &Expr) -> String {
    SourcePrinter::new(false).print(expr)
}

/// Render an expression with its outermost container expanded one element
/// per line.
pub fn to_source_multiline(expr: &Expr) -> String {
    SourcePrinter::new(true).print(expr)
}

fn constant_source(constant: &Constant) -> String {
    if let Some(raw) = &constant.raw {
        return raw.clone();
    }
    scalar_repr(&constant.value)
}

/// Python `repr()` of a scalar.
pub fn scalar_repr(value: &Scalar) -> String {
    match value {
        Scalar::None => "None".to_string(),
        Scalar::Bool(true) => "True".to_string(),
        Scalar::Bool(false) => "False".to_string(),
        Scalar::Int(n) => n.to_string(),
        Scalar::BigInt(digits) => digits.clone(),
        Scalar::Float(f) => python_float_repr(*f),
        Scalar::Complex(imaginary) => format!("{}j", python_float_repr(*imaginary)),
        Scalar::Str(s) => python_str_repr(s),
        Scalar::Bytes(bytes) => python_bytes_repr(bytes),
        Scalar::Ellipsis => "...".to_string(),
    }
}

/// Python `repr()` of a float, made valid source for non-finite values.
pub fn python_float_repr(f: f64) -> String {
    if f.is_nan() {
        return "(1e309 - 1e309)".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "1e309" } else { "-1e309" }.to_string();
    }

    let text = format!("{:?}", f);
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => text,
    }
}

fn quote_for(has_single: bool, has_double: bool) -> char {
    if has_single && !has_double { '"' } else { '\'' }
}

/// Python `repr()` of a text string.
pub fn python_str_repr(s: &str) -> String {
    let quote = quote_for(s.contains('\''), s.contains('"'));

    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let code = u32::from(c);
                if code <= 0xff {
                    out.push_str(&format!("\\x{:02x}", code));
                } else {
                    out.push_str(&format!("\\u{:04x}", code));
                }
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Python `repr()` of a bytes value.
pub fn python_bytes_repr(bytes: &[u8]) -> String {
    let quote = quote_for(bytes.contains(&b'\''), bytes.contains(&b'"'));

    let mut out = String::with_capacity(bytes.len() + 3);
    out.push('b');
    out.push(quote);
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            b if char::from(b) == quote => {
                out.push('\\');
                out.push(quote);
            }
            0x20..=0x7e => out.push(char::from(b)),
            b => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out.push(quote);
    out
}

#[test]
fn test_float_repr() {
    assert_eq!(python_float_repr(1.0), "1.0");
    assert_eq!(python_float_repr(0.1), "0.1");
    assert_eq!(python_float_repr(-2.5), "-2.5");
    assert_eq!(python_float_repr(1e16), "1e+16");
    assert_eq!(python_float_repr(1.5e-7), "1.5e-07");
    assert_eq!(python_float_repr(f64::INFINITY), "1e309");
}

#[test]
fn test_str_repr_quotes() {
    assert_eq!(python_str_repr("abc"), "'abc'");
    assert_eq!(python_str_repr("it's"), "\"it's\"");
    assert_eq!(python_str_repr("both ' and \""), "'both \\' and \"'");
    assert_eq!(python_str_repr("line\nbreak"), "'line\\nbreak'");
    assert_eq!(python_bytes_repr(b"a\x00"), "b'a\\x00'");
}

#[test]
fn test_runtime_constants_use_repr() {
    let expr = Expr::List(vec![
        Expr::constant(Scalar::Int(-3)),
        Expr::constant(Scalar::Str("x".to_string())),
        Expr::constant(Scalar::None),
        Expr::Tuple(vec![Expr::constant(Scalar::Int(1))]),
        Expr::Set(Vec::new()),
    ]);
    assert_eq!(to_source(&expr), "[-3, 'x', None, (1,), set()]");
}

#[test]
fn test_parentheses_follow_precedence() {
    let sum = Expr::BinOp {
        left: Box::new(Expr::name("a")),
        op: BinOp::Add,
        right: Box::new(Expr::name("b")),
    };
    let product = Expr::BinOp {
        left: Box::new(sum.clone()),
        op: BinOp::Mult,
        right: Box::new(Expr::name("c")),
    };
    assert_eq!(to_source(&product), "(a + b) * c");

    let power = Expr::BinOp {
        left: Box::new(Expr::constant(Scalar::Int(-2))),
        op: BinOp::Pow,
        right: Box::new(Expr::constant(Scalar::Int(2))),
    };
    assert_eq!(to_source(&power), "(-2) ** 2");
}

#[test]
fn test_multiline_layout() {
    let expr = Expr::Dict(vec![crate::ast::DictItem {
        key: Some(Expr::constant(Scalar::Str("a".to_string()))),
        value: Expr::List(vec![Expr::constant(Scalar::Int(1))]),
    }]);
    assert_eq!(to_source_multiline(&expr), "{\n    'a': [1],\n}");
    assert_eq!(to_source_multiline(&Expr::List(Vec::new())), "[]");

    let call = Expr::call("dict", Vec::new(), vec![crate::ast::Keyword {
        arg: Some("a".to_string()),
        value: Expr::constant(Scalar::Int(1)),
    }]);
    assert_eq!(to_source_multiline(&call), "dict(\n    a=1,\n)");
}
