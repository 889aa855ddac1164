//! # initree
//!
//! An incremental INI parser that keeps the whole document: sections, items
//! and comments, in their original order.
//!
//! ## Key Features
//!
//! - **Streaming**: [`Parser`] is a character-level state machine; feed it
//!   chunks of any size and it never looks ahead
//! - **Order preserving**: an [`IniTree`] holds sections, items and comments
//!   exactly as they appeared, duplicates included
//! - **Round trips**: the [`Encoder`] writes a tree back so it parses to the
//!   same tree, and refuses nodes it could not write faithfully
//! - **Typed access**: [`IniMapper`] reads and writes values through a
//!   [`CodecRegistry`], and the Serde bridge maps whole documents onto structs
//!
//! ## Quick Start
//!
//! ```rust
//! use initree::{encode, parse_str};
//!
//! let mut tree = parse_str("; app settings\n[db]\nhost = localhost\nport = 5432\n").unwrap();
//! assert_eq!(tree.get("db", "port"), Some("5432"));
//!
//! tree.section_mut("db").unwrap().set("port", "6543");
//! assert_eq!(
//!     encode(&tree).unwrap(),
//!     ";app settings\n[db]\nhost = localhost\nport = 6543\n"
//! );
//! ```
//!
//! ### Options
//!
//! ```rust
//! use initree::{parse_with_options, Error, ParserOptions};
//!
//! let input = "[s]\nmotd = \"line one\\nline two\"\nno separator\n";
//!
//! let options = ParserOptions::new().with_wrapped_value(true);
//! let tree = parse_with_options(input, options).unwrap();
//! assert_eq!(tree.get("s", "motd"), Some("line one\nline two"));
//!
//! let strict = options.with_strict(true);
//! assert!(matches!(
//!     parse_with_options(input, strict),
//!     Err(Error::MalformedLine { .. })
//! ));
//! ```
//!
//! ### Serde
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use initree::{from_str, to_string};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Config {
//!     server: Server,
//! }
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Server {
//!     host: String,
//!     port: u16,
//! }
//!
//! let config: Config = from_str("[server]\nhost = example.org\nport = 8080\n").unwrap();
//! assert_eq!(config.server.port, 8080);
//! assert_eq!(to_string(&config).unwrap(), "[server]\nhost = example.org\nport = 8080\n");
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events: `warn` for every malformed line dropped
//! in lenient mode and `debug` when a parse finishes or a store is read or
//! written. Install any `tracing` subscriber to see them.
//!
//! ## Examples
//!
//! See the `demos/` directory:
//!
//! - **`simple.rs`** - parse, edit and encode a document
//! - **`streaming.rs`** - feeding a parser chunk by chunk
//! - **`typed_bindings.rs`** - `IniMapper` and bindings over a file
//! - **`serde_config.rs`** - loading a config struct with Serde
//! - **`custom_options.rs`** - strict mode, quoted values and CRLF output
//!
//! Run any example with: `cargo run --example <name>`

pub mod codec;
pub mod de;
pub mod encoder;
pub mod error;
pub mod escape;
pub mod mapper;
pub mod options;
pub mod parser;
pub mod ser;
pub mod store;
pub mod tree;

pub use codec::{Codec, CodecRegistry};
pub use de::Deserializer;
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use mapper::{Binding, IniMapper};
pub use options::{EncodeOptions, Feature, LineEnding, ParserOptions};
pub use parser::Parser;
pub use ser::Serializer;
pub use store::{FileStore, IniStore, MemoryStore};
pub use tree::{Comment, Element, Entry, IniTree, Item, Section};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io;

/// Parse INI text with the default (lenient) options.
///
/// # Examples
///
/// ```rust
/// use initree::parse_str;
///
/// let tree = parse_str("[a]\nx = 1\n").unwrap();
/// assert_eq!(tree.get("a", "x"), Some("1"));
/// ```
///
/// # Errors
///
/// Any fatal parse error; see [`Parser`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_str(input: &str) -> Result<IniTree> {
    parse_with_options(input, ParserOptions::default())
}

/// Parse INI text with custom options.
///
/// # Errors
///
/// Any fatal parse error, or a malformed line under
/// [`Feature::Strict`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_with_options(input: &str, options: ParserOptions) -> Result<IniTree> {
    let mut parser = Parser::new(options);
    parser.feed(input)?;
    parser.finish()?;
    parser.into_tree()
}

/// Parse INI text from a buffered reader, line by line.
///
/// # Examples
///
/// ```rust
/// use initree::parse_reader;
/// use std::io::Cursor;
///
/// let tree = parse_reader(Cursor::new("[a]\nx = 1\n")).unwrap();
/// assert_eq!(tree.get("a", "x"), Some("1"));
/// ```
///
/// # Errors
///
/// [`Error::Io`] if reading fails, or any parse error.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_reader<R: io::BufRead>(reader: R) -> Result<IniTree> {
    parse_reader_with_options(reader, ParserOptions::default())
}

/// Parse INI text from a buffered reader with custom options.
///
/// # Errors
///
/// [`Error::Io`] if reading fails, or any parse error.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_reader_with_options<R: io::BufRead>(
    reader: R,
    options: ParserOptions,
) -> Result<IniTree> {
    let mut parser = Parser::new(options);
    parser.feed_reader(reader)?;
    parser.finish()?;
    parser.into_tree()
}

/// Encode a tree as INI text with the default options.
///
/// # Errors
///
/// [`Error::Unencodable`] if a node cannot be written so that it parses back
/// unchanged.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode(tree: &IniTree) -> Result<String> {
    encode_with_options(tree, EncodeOptions::default())
}

/// Encode a tree as INI text with custom options.
///
/// # Errors
///
/// [`Error::Unencodable`] as for [`encode`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode_with_options(tree: &IniTree, options: EncodeOptions) -> Result<String> {
    let mut encoder = Encoder::new(options);
    encoder.encode_tree(tree)?;
    Ok(encoder.into_inner())
}

/// Encode a tree to a writer.
///
/// The whole document is encoded before anything is written.
///
/// # Errors
///
/// [`Error::Unencodable`], or [`Error::Io`] if writing fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode_to_writer<W: io::Write>(
    mut writer: W,
    tree: &IniTree,
    options: EncodeOptions,
) -> Result<()> {
    let text = encode_with_options(tree, options)?;
    writer.write_all(text.as_bytes())?;
    Ok(())
}

/// Convert any `T: Serialize` into an [`IniTree`].
///
/// # Errors
///
/// [`Error::UnsupportedType`] if `T` is not a struct or map of sections.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_tree<T>(value: &T) -> Result<IniTree>
where
    T: ?Sized + Serialize,
{
    let mut serializer = Serializer::new();
    value.serialize(&mut serializer)?;
    Ok(serializer.into_inner())
}

/// Serialize any `T: Serialize` to INI text.
///
/// # Errors
///
/// Returns an error if `T` does not have the shape of an INI document, or a
/// value cannot be encoded.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, EncodeOptions::default())
}

/// Serialize any `T: Serialize` to INI text with custom options.
///
/// # Errors
///
/// Same as [`to_string`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T>(value: &T, options: EncodeOptions) -> Result<String>
where
    T: ?Sized + Serialize,
{
    encode_with_options(&to_tree(value)?, options)
}

/// Serialize any `T: Serialize` to a writer as INI text.
///
/// # Errors
///
/// Same as [`to_string`], or [`Error::Io`] if writing fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    encode_to_writer(writer, &to_tree(value)?, EncodeOptions::default())
}

/// Deserialize an instance of `T` from a parsed tree.
///
/// Borrowed string fields point into the tree.
///
/// # Errors
///
/// Returns an error if the tree cannot be read as `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_tree<'de, T>(tree: &'de IniTree) -> Result<T>
where
    T: Deserialize<'de>,
{
    T::deserialize(&mut Deserializer::from_tree(tree))
}

/// Deserialize an instance of `T` from INI text.
///
/// # Examples
///
/// ```rust
/// use initree::from_str;
/// use std::collections::HashMap;
///
/// let map: HashMap<String, HashMap<String, i32>> = from_str("[a]\nx = 1\n").unwrap();
/// assert_eq!(map["a"]["x"], 1);
/// ```
///
/// # Errors
///
/// Any parse error, or an error if the document cannot be read as `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    from_str_with_options(s, ParserOptions::default())
}

/// Deserialize an instance of `T` from INI text parsed with custom options.
///
/// # Errors
///
/// Same as [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str_with_options<T>(s: &str, options: ParserOptions) -> Result<T>
where
    T: DeserializeOwned,
{
    let tree = parse_with_options(s, options)?;
    from_tree(&tree)
}

/// Deserialize an instance of `T` from an I/O stream of INI text.
///
/// # Errors
///
/// [`Error::Io`] if reading fails, any parse error, or an error if the
/// document cannot be read as `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(reader: R) -> Result<T>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let tree = parse_reader(io::BufReader::new(reader))?;
    from_tree(&tree)
}

/// Deserialize an instance of `T` from bytes of INI text.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8, or as [`from_str`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let s = std::str::from_utf8(v).map_err(|e| Error::custom(e.to_string()))?;
    from_str(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io::Cursor;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Config {
        db: Db,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Db {
        host: String,
        port: u16,
    }

    #[test]
    fn test_parse_and_encode() {
        let input = "[a]\nx = 1\n;note\n";
        let tree = parse_str(input).unwrap();
        assert_eq!(encode(&tree).unwrap(), input);
    }

    #[test]
    fn test_reader_matches_str() {
        let input = "\u{FEFF};top\n[a]\r\nx=1\r\n[b]\ny = two words\n";
        let from_reader = parse_reader(Cursor::new(input)).unwrap();
        assert_eq!(from_reader, parse_str(input).unwrap());
    }

    #[test]
    fn test_encode_to_writer() {
        let tree = parse_str("[a]\nx = 1\n").unwrap();
        let mut buffer = Vec::new();
        encode_to_writer(
            &mut buffer,
            &tree,
            EncodeOptions::new().with_line_ending(LineEnding::Crlf),
        )
        .unwrap();
        assert_eq!(buffer, b"[a]\r\nx = 1\r\n");
    }

    #[test]
    fn test_serde_round_trip() {
        let config = Config {
            db: Db {
                host: "localhost".to_string(),
                port: 5432,
            },
        };
        let text = to_string(&config).unwrap();
        assert_eq!(text, "[db]\nhost = localhost\nport = 5432\n");
        assert_eq!(from_str::<Config>(&text).unwrap(), config);
        assert_eq!(from_slice::<Config>(text.as_bytes()).unwrap(), config);
        assert_eq!(from_reader::<_, Config>(text.as_bytes()).unwrap(), config);

        let mut buffer = Vec::new();
        to_writer(&mut buffer, &config).unwrap();
        assert_eq!(buffer, text.as_bytes());
    }

    #[test]
    fn test_from_slice_invalid_utf8() {
        let err = from_slice::<BTreeMap<String, BTreeMap<String, String>>>(b"[a]\n\xFF\n");
        assert!(matches!(err, Err(Error::Custom(_))));
    }

    #[test]
    fn test_from_str_reports_parse_errors() {
        let err = from_str::<Config>("x = 1\n").unwrap_err();
        assert!(matches!(err, Error::ValueOutsideSection { .. }));
    }

    #[test]
    fn test_serialized_value_needs_wrapping() {
        let mut map = BTreeMap::new();
        map.insert("s", BTreeMap::from([("k", "a\nb")]));
        assert!(matches!(
            to_string(&map),
            Err(Error::Unencodable { .. })
        ));
        let wrapped =
            to_string_with_options(&map, EncodeOptions::new().with_wrap_values(true)).unwrap();
        assert_eq!(wrapped, "[s]\nk = \"a\\nb\"\n");
        let back: BTreeMap<String, BTreeMap<String, String>> =
            from_str_with_options(&wrapped, ParserOptions::new().with_wrapped_value(true))
                .unwrap();
        assert_eq!(back["s"]["k"], "a\nb");
    }
}
