//! # Syntax tree for Python source
//!
//! This module defines the tokens and syntax tree that `pycraft` works on.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (constants, displays, calls, operations)
//! - **[operators]** - Binary, unary, boolean and comparison operators
//! - **[statements]** - Top-level statements: verbatim text or bindings
//! - **[module]** - A whole parsed file
//!
//! ## Bindings and verbatim text
//!
//! The tree is deliberately shallow at the statement level. Every top-level
//! `name = value` (or `name: annotation = value`) becomes a [`Binding`] whose
//! value is parsed into a full [`Expr`]. Everything else, from imports to class
//! bodies, is kept as [`Statement::Verbatim`] text:
//!
//! ```text
//! import os                        <- Verbatim
//!
//! SETTINGS = {'debug': False}      <- Binding(SETTINGS, Dict)
//! PLUGINS = list('a', 'b')         <- Binding(PLUGINS, Call)
//!
//! def main():                      <- Verbatim (with its body)
//!     local = [1, 2]
//! ```
//!
//! ## Containers
//!
//! The container kinds recognised by the locator are:
//!
//! - **Mapping** - `{'k': v}` or `dict(k=v)`
//! - **Sequence** - `[a, b]` or `list(a, b)`
//! - **Set** - `{a, b}` or `set(a, b)`
pub mod tokens;
pub mod expressions;
pub mod operators;
pub mod statements;
pub mod module;

pub use tokens::Token;
pub use expressions::{Comprehension, Constant, DictItem, Expr, Keyword, Param, ParamKind, Scalar};
pub use operators::{BinOp, BoolOp, CmpOp, UnaryOp};
pub use statements::{Binding, Statement};
pub use module::Module;
