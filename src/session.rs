//! Scoped editing of a Python file on disk.
//!
//! A [`FileSession`] reads and parses a file once, hands out its
//! [`Document`] for editing, and writes the rendered (and optionally
//! formatted) result back on [`FileSession::commit`]. Nothing is written
//! unless the session is committed, so a failed edit leaves the file as it
//! was. [`edit_file`] wraps the whole cycle around a closure.
//!
//! # Examples
//!
//! ```no_run
//! use pycraft::{SequenceOps, SessionOptions, edit_file};
//!
//! edit_file("settings.py", SessionOptions::default(), |doc| {
//!     if let Some(mut apps) = doc.find_sequence("INSTALLED_APPS") {
//!         apps.append("reports");
//!     }
//!     Ok::<_, pycraft::SessionError>(())
//! })?;
//! # Ok::<_, pycraft::SessionError>(())
//! ```

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{
    container::{Mapping, Sequence, Set},
    document::Document,
    format::{BuiltinFormatter, CommandFormatter, FormatError, Formatter},
    parser::SyntaxError,
};

#[derive(Debug)]
pub enum SessionError {
    Io(io::Error),
    Syntax(SyntaxError),
    Format(FormatError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Io(e) => write!(f, "I/O error: {}", e),
            SessionError::Syntax(e) => write!(f, "Syntax error: {}", e),
            SessionError::Format(e) => write!(f, "Format error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Io(e) => Some(e),
            SessionError::Syntax(e) => Some(e),
            SessionError::Format(e) => Some(e),
        }
    }
}

impl From<io::Error> for SessionError {
    fn from(e: io::Error) -> Self {
        SessionError::Io(e)
    }
}

impl From<SyntaxError> for SessionError {
    fn from(e: SyntaxError) -> Self {
        SessionError::Syntax(e)
    }
}

impl From<FormatError> for SessionError {
    fn from(e: FormatError) -> Self {
        SessionError::Format(e)
    }
}

/// Which formatter a session runs before writing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormatterChoice {
    #[default]
    Builtin,
    /// Program and arguments of an external stdin/stdout formatter
    Command(Vec<String>),
}

impl FormatterChoice {
    pub fn build(&self) -> Box<dyn Formatter> {
        match self {
            FormatterChoice::Builtin => Box::new(BuiltinFormatter::new()),
            FormatterChoice::Command(parts) => match parts.split_first() {
                Some((program, args)) => {
                    Box::new(CommandFormatter::new(program.clone(), args.to_vec()))
                }
                None => Box::new(BuiltinFormatter::new()),
            },
        }
    }
}

/// Options for a file session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Run the formatter before writing (default: true)
    pub format: bool,
    pub formatter: FormatterChoice,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            format: true,
            formatter: FormatterChoice::Builtin,
        }
    }
}

impl SessionOptions {
    /// Write rendered source without formatting it.
    pub fn unformatted() -> Self {
        SessionOptions {
            format: false,
            ..SessionOptions::default()
        }
    }
}

/// An open file whose bindings are being edited.
pub struct FileSession {
    path: PathBuf,
    document: Document,
    options: SessionOptions,
    finished: bool,
}

impl FileSession {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        FileSession::open_with(path, SessionOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: SessionOptions) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();
        debug!(path = %path.display(), "reading source");

        let source = fs::read_to_string(&path)?;
        let document = Document::parse(&source)?;

        Ok(FileSession {
            path,
            document,
            options,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn find_mapping(&mut self, name: &str) -> Option<Mapping<'_>> {
        self.document.find_mapping(name)
    }

    pub fn find_sequence(&mut self, name: &str) -> Option<Sequence<'_>> {
        self.document.find_sequence(name)
    }

    pub fn find_set(&mut self, name: &str) -> Option<Set<'_>> {
        self.document.find_set(name)
    }

    /// The text [`commit`](FileSession::commit) would write.
    pub fn render(&self) -> Result<String, SessionError> {
        let source = self.document.to_source();
        if !self.options.format {
            return Ok(source);
        }

        let formatter = self.options.formatter.build();
        debug!(formatter = formatter.name(), "formatting output");
        Ok(formatter.format(&source)?)
    }

    /// Render, format and write back. A formatting failure leaves the file
    /// untouched.
    pub fn commit(mut self) -> Result<(), SessionError> {
        let output = self.render()?;
        fs::write(&self.path, output)?;
        self.finished = true;
        debug!(path = %self.path.display(), "wrote source");
        Ok(())
    }

    /// Close without writing.
    pub fn discard(mut self) {
        self.finished = true;
        debug!(path = %self.path.display(), "discarded session");
    }
}

impl Drop for FileSession {
    fn drop(&mut self) {
        if !self.finished && self.document.is_modified() {
            warn!(path = %self.path.display(), "edits were not written back");
        }
    }
}

/// Open `path`, run `body` on its document, and write the result back if
/// `body` succeeds.
///
/// An error from `body` is returned as is and the file is not touched. An
/// error while reading, parsing, formatting or writing is converted into the
/// caller's error type.
pub fn edit_file<T, E, F>(path: impl AsRef<Path>, options: SessionOptions, body: F) -> Result<T, E>
where
    F: FnOnce(&mut Document) -> Result<T, E>,
    E: From<SessionError>,
{
    let mut session = FileSession::open_with(path, options)?;

    match body(session.document_mut()) {
        Ok(result) => {
            session.commit()?;
            Ok(result)
        }
        Err(e) => {
            debug!(path = %session.path().display(), "edit failed, leaving file unchanged");
            session.discard();
            Err(e)
        }
    }
}
