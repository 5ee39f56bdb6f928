//! # Container handles
//!
//! A handle is a short-lived mutable view over the value of one located
//! binding. It borrows the syntax tree, so it cannot outlive the document it
//! came from, and every change is visible to the next render.
//!
//! There are three kinds, each with its own contract:
//!
//! - **[`MappingOps`]** - `get`, `set`/`update`, `pop`, `clear`
//! - **[`SequenceOps`]** - `append`/`extend`, `insert`, `remove`, `pop`, `clear`, `reverse`
//! - **[`SetOps`]** - `add`/`update`, `remove`, `discard`
//!
//! and two representations of each:
//!
//! ```text
//!             literal              constructor call
//! mapping     {'a': 1}             dict(a=1)
//! sequence    [1, 2]               list(1, 2)
//! set         {1, 2}               set(1, 2)
//! ```
//!
//! [`Mapping`], [`Sequence`] and [`Set`] wrap the two representations of
//! their kind and implement the same trait, so callers rarely need to know
//! which form the source used.
//!
//! ## Element identity
//!
//! Lookups and removals compare by constant equality only: an element matches
//! a search value when it is a constant and equal under Python's `==`.
//! Names, calls and other expressions never match and are left in place.
use std::fmt;

pub(crate) mod elements;
pub mod mapping;
pub mod sequence;
pub mod set;

pub use mapping::{CallMapping, LiteralMapping, Mapping, MappingOps};
pub use sequence::{CallSequence, LiteralSequence, Sequence, SequenceOps};
pub use set::{CallSet, LiteralSet, Set, SetOps};

/// Failure of a container operation.
#[derive(Debug, Clone, PartialEq)]
pub enum EditError {
    /// `remove` on a sequence found no equal constant element
    ValueNotFound(String),

    /// `remove` on a set found no equal constant element
    KeyNotFound(String),

    /// `pop` with an index outside the sequence
    IndexOutOfRange { index: isize, len: usize },

    /// Key that cannot be spelled as a keyword argument of `dict(...)`
    InvalidKeyword(String),

    /// List, set or dict used as a mapping key
    UnhashableKey(String),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::ValueNotFound(value) => write!(f, "value not found: {}", value),
            EditError::KeyNotFound(key) => write!(f, "key not found: {}", key),
            EditError::IndexOutOfRange { index, len } => {
                write!(f, "index {} out of range for length {}", index, len)
            }
            EditError::InvalidKeyword(key) => {
                write!(f, "{} cannot be used as a keyword argument", key)
            }
            EditError::UnhashableKey(key) => write!(f, "unhashable key: {}", key),
        }
    }
}

impl std::error::Error for EditError {}
