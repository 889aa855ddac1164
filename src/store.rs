//! Loading and saving trees.
//!
//! [`IniStore`] is the seam between the tree and wherever the text lives. Two
//! implementations are provided: [`FileStore`] for a path on disk and
//! [`MemoryStore`] for an in-memory buffer.
//!
//! ```rust
//! use initree::{IniStore, MemoryStore};
//!
//! let store = MemoryStore::new("[s]\nk = v\n");
//! let mut tree = store.load().unwrap();
//! tree.section_mut("s").unwrap().set("k", "w");
//! store.store(&tree).unwrap();
//! assert_eq!(store.contents(), "[s]\nk = w\n");
//! ```

use crate::tree::IniTree;
use crate::{encode_with_options, parse_with_options, EncodeOptions, Parser, ParserOptions, Result};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// Somewhere a tree can be loaded from and stored back to.
pub trait IniStore {
    fn load(&self) -> Result<IniTree>;
    fn store(&self, tree: &IniTree) -> Result<()>;
}

/// A store backed by a file.
///
/// Loading streams the file through the parser line by line; storing encodes
/// the whole tree first, so an unencodable tree leaves the file untouched.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
    parser_options: ParserOptions,
    encode_options: EncodeOptions,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore {
            path: path.into(),
            parser_options: ParserOptions::default(),
            encode_options: EncodeOptions::default(),
        }
    }

    #[must_use]
    pub fn with_parser_options(mut self, options: ParserOptions) -> Self {
        self.parser_options = options;
        self
    }

    #[must_use]
    pub fn with_encode_options(mut self, options: EncodeOptions) -> Self {
        self.encode_options = options;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IniStore for FileStore {
    fn load(&self) -> Result<IniTree> {
        tracing::debug!(path = %self.path.display(), "loading INI file");
        let file = File::open(&self.path)?;
        let mut parser = Parser::new(self.parser_options);
        parser.feed_reader(BufReader::new(file))?;
        parser.finish()?;
        parser.into_tree()
    }

    fn store(&self, tree: &IniTree) -> Result<()> {
        let text = encode_with_options(tree, self.encode_options)?;
        tracing::debug!(path = %self.path.display(), bytes = text.len(), "storing INI file");
        let mut file = File::create(&self.path)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// A store backed by a string buffer.
#[derive(Debug, Default)]
pub struct MemoryStore {
    text: RefCell<String>,
    parser_options: ParserOptions,
    encode_options: EncodeOptions,
}

impl MemoryStore {
    pub fn new(text: impl Into<String>) -> Self {
        MemoryStore {
            text: RefCell::new(text.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_parser_options(mut self, options: ParserOptions) -> Self {
        self.parser_options = options;
        self
    }

    #[must_use]
    pub fn with_encode_options(mut self, options: EncodeOptions) -> Self {
        self.encode_options = options;
        self
    }

    /// Returns the current buffer.
    pub fn contents(&self) -> String {
        self.text.borrow().clone()
    }
}

impl IniStore for MemoryStore {
    fn load(&self) -> Result<IniTree> {
        parse_with_options(&self.text.borrow(), self.parser_options)
    }

    fn store(&self, tree: &IniTree) -> Result<()> {
        let text = encode_with_options(tree, self.encode_options)?;
        *self.text.borrow_mut() = text;
        Ok(())
    }
}

impl<S: IniStore + ?Sized> IniStore for &S {
    fn load(&self) -> Result<IniTree> {
        (**self).load()
    }

    fn store(&self, tree: &IniTree) -> Result<()> {
        (**self).store(tree)
    }
}
