pub mod ast;
pub mod cli;
pub mod container;
pub mod convert;
pub mod document;
pub mod format;
pub mod lexer;
pub mod locator;
pub mod output;
pub mod parser;
pub mod session;
pub mod value;

pub use ast::{Binding, Expr, Module, Scalar, Statement, Token};
pub use container::{EditError, Mapping, MappingOps, Sequence, SequenceOps, Set, SetOps};
pub use document::{BindingInfo, Document};
pub use format::{BuiltinFormatter, CommandFormatter, FormatError, Formatter};
pub use lexer::{LexError, Lexer, Position};
pub use locator::{ContainerKind, Representation};
pub use output::{to_source, to_source_multiline};
pub use parser::{Parser, SyntaxError, parse, parse_expression};
pub use session::{FileSession, FormatterChoice, SessionError, SessionOptions, edit_file};
pub use value::Value;
