//! Error types for INI parsing, encoding and binding.
//!
//! Every fallible operation in this crate returns [`Result<T>`], whose error
//! type is the single [`Error`] enum below.
//!
//! ## Error Categories
//!
//! - **Malformed lines**: a line break inside a key. Only an error in strict
//!   mode; otherwise it is reported through the parser's warning callback.
//! - **Structural errors**: blank section names or keys, section headers that
//!   span lines, items before any section, input after the parser finished.
//! - **Escape errors**: unknown escape letters and bad `\uXXXX` sequences in
//!   quoted values.
//! - **Usage errors**: reading a tree before the parser finished, finishing in
//!   the middle of a line, reusing a parser after a fatal error.
//! - **Encoding errors**: trees that cannot be written back as INI text.
//! - **Binding errors**: codec and mapper failures.
//!
//! Parser errors carry the character offset at which they were detected,
//! counted from the start of the stream across every fed chunk.
//!
//! ## Examples
//!
//! ```rust
//! use initree::{parse_str, Error};
//!
//! let err = parse_str("key = value").unwrap_err();
//! assert!(matches!(err, Error::ValueOutsideSection { .. }));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors produced by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// A malformed line, promoted to an error by strict mode
    #[error("{msg} at offset {offset}")]
    MalformedLine { msg: String, offset: usize },

    /// A section header with an empty or whitespace-only name
    #[error("blank section name at offset {offset}")]
    BlankSectionName { offset: usize },

    /// A key/value line with an empty or whitespace-only key
    #[error("blank key at offset {offset}")]
    BlankKey { offset: usize },

    /// A line break inside a `[section]` header
    #[error("section header is not closed before the line break at offset {offset}")]
    UnterminatedSection { offset: usize },

    /// A key/value pair that appears before any section header
    #[error("value for key `{key}` outside of any section at offset {offset}")]
    ValueOutsideSection { key: String, offset: usize },

    /// An escape letter not present in the escape table
    #[error("unknown escape `\\{ch}` at offset {offset}")]
    UnknownEscape { ch: char, offset: usize },

    /// A non-hexadecimal digit inside a `\uXXXX` escape
    #[error("invalid hex digit `{ch}` in unicode escape at offset {offset}")]
    InvalidUnicodeEscape { ch: char, offset: usize },

    /// A `\uXXXX` escape naming a surrogate code point
    #[error("unicode escape \\u{code:04X} is not a valid character at offset {offset}")]
    InvalidCodePoint { code: u16, offset: usize },

    /// Input dispatched after the parser reached its terminal state
    #[error("parser already finished, unexpected input at offset {offset}")]
    AlreadyFinished { offset: usize },

    /// The parser was finished while a key, header or quoted value was still open
    #[error("input ended inside {state} at offset {offset}")]
    Unterminated { state: &'static str, offset: usize },

    /// The tree was requested before the parser finished
    #[error("parser has not finished, the tree is not readable yet")]
    NotFinished,

    /// The parser was used again after a fatal error
    #[error("parser aborted on an earlier error and cannot be reused")]
    Poisoned,

    /// A tree that cannot be written as INI text without changing its meaning
    #[error("cannot encode {what}: {reason}")]
    Unencodable { what: String, reason: String },

    /// No codec registered for the requested type
    #[error("no codec registered for type {0}")]
    NoCodec(&'static str),

    /// A codec failed to decode a stored value
    #[error("cannot decode [{section}] {key}: {msg}")]
    Codec {
        section: String,
        key: String,
        msg: String,
    },

    /// A bound key is absent and the binding has no default
    #[error("[{section}] {key} not found and no default was provided")]
    MissingValue { section: String, key: String },

    /// The mapper refused to store because a bound key disappeared from the tree
    #[error("tree is missing bound keys: {0}")]
    InvalidBindings(String),

    /// A binding path without a `Section:key` separator
    #[error("invalid binding path `{0}`, expected `Section:key`")]
    InvalidBindingPath(String),

    /// Unsupported type for the Serde bridge
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates an encoding error for the element described by `what`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use initree::Error;
    ///
    /// let err = Error::unencodable("key `a=b`", "keys cannot contain `=`");
    /// assert!(err.to_string().contains("cannot encode key"));
    /// ```
    pub fn unencodable(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Unencodable {
            what: what.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unsupported type error for the Serde bridge.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use initree::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns the character offset for errors raised by the parser.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::MalformedLine { offset, .. }
            | Error::BlankSectionName { offset }
            | Error::BlankKey { offset }
            | Error::UnterminatedSection { offset }
            | Error::ValueOutsideSection { offset, .. }
            | Error::UnknownEscape { offset, .. }
            | Error::InvalidUnicodeEscape { offset, .. }
            | Error::InvalidCodePoint { offset, .. }
            | Error::AlreadyFinished { offset }
            | Error::Unterminated { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::io(&err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
