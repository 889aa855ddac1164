//! INI encoding.
//!
//! The [`Encoder`] writes an [`IniTree`] back to text, one element per line:
//!
//! ```text
//! ;text
//! [name]
//! key = value
//! ```
//!
//! Nothing is reordered and no blank lines are inserted. Before writing, every
//! node is checked so the output reads back as the same tree. A section name
//! containing `]`, a key containing `=`, or any line break outside a value
//! is rejected with [`Error::Unencodable`]. Values containing line breaks are
//! rejected too, unless [`EncodeOptions::wrap_values`] is set, in which case
//! they are written quoted and escaped.
//!
//! ## Examples
//!
//! ```rust
//! use initree::{encode, encode_with_options, parse_str, EncodeOptions, Item};
//!
//! let mut tree = parse_str("[s]\na = 1\n").unwrap();
//! assert_eq!(encode(&tree).unwrap(), "[s]\na = 1\n");
//!
//! tree.section_mut("s").unwrap().push_item(Item {
//!     key: "b".into(),
//!     value: "two\nlines".into(),
//! });
//! assert!(encode(&tree).is_err());
//!
//! let options = EncodeOptions::new().with_wrap_values(true);
//! assert_eq!(
//!     encode_with_options(&tree, options).unwrap(),
//!     "[s]\na = 1\nb = \"two\\nlines\"\n"
//! );
//! ```

use crate::escape;
use crate::tree::{Comment, Element, Entry, IniTree, Item, Section};
use crate::{EncodeOptions, Error, Result};

/// Converts an [`IniTree`] into INI text.
pub struct Encoder {
    output: String,
    options: EncodeOptions,
}

impl Encoder {
    pub fn new(options: EncodeOptions) -> Self {
        Encoder {
            output: String::with_capacity(256),
            options,
        }
    }

    pub fn into_inner(self) -> String {
        self.output
    }

    /// Appends every element of `tree`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unencodable`] for the first node that cannot be
    /// written without changing the tree. Output written before the failing
    /// node stays in the buffer.
    pub fn encode_tree(&mut self, tree: &IniTree) -> Result<()> {
        for element in &tree.elements {
            match element {
                Element::Section(section) => self.encode_section(section)?,
                Element::Comment(comment) => self.encode_comment(comment)?,
            }
        }
        Ok(())
    }

    pub fn encode_section(&mut self, section: &Section) -> Result<()> {
        let name = section.name.trim();
        if name.is_empty() {
            return Err(Error::unencodable("section", "name is blank"));
        }
        if name.contains(']') || has_line_break(name) {
            return Err(Error::unencodable(
                format!("section `{}`", name.escape_debug()),
                "names cannot contain `]` or line breaks",
            ));
        }
        self.output.push('[');
        self.output.push_str(name);
        self.output.push(']');
        self.end_line();

        for entry in &section.entries {
            match entry {
                Entry::Item(item) => self.encode_item(item)?,
                Entry::Comment(comment) => self.encode_comment(comment)?,
            }
        }
        Ok(())
    }

    pub fn encode_item(&mut self, item: &Item) -> Result<()> {
        let key = item.key.trim();
        if key.is_empty() {
            return Err(Error::unencodable("item", "key is blank"));
        }
        if key.contains('=') || has_line_break(key) || key.starts_with(['[', ';']) {
            return Err(Error::unencodable(
                format!("key `{}`", key.escape_debug()),
                "keys cannot contain `=` or line breaks, or start with `[` or `;`",
            ));
        }

        let value = item.value.trim();
        let needs_wrap = has_line_break(value) || value.starts_with('"');
        if has_line_break(value) && !self.options.wrap_values {
            return Err(Error::unencodable(
                format!("value of `{}`", key),
                "values with line breaks need EncodeOptions::wrap_values",
            ));
        }

        self.output.push_str(key);
        self.output.push_str(" = ");
        if needs_wrap && self.options.wrap_values {
            escape::write_quoted(value, &mut self.output);
        } else {
            self.output.push_str(value);
        }
        self.end_line();
        Ok(())
    }

    pub fn encode_comment(&mut self, comment: &Comment) -> Result<()> {
        let text = comment.text.trim();
        if has_line_break(text) {
            return Err(Error::unencodable(
                format!("comment `{}`", text.escape_debug()),
                "comments cannot contain line breaks",
            ));
        }
        self.output.push(';');
        self.output.push_str(text);
        self.end_line();
        Ok(())
    }

    fn end_line(&mut self) {
        self.output.push_str(self.options.line_ending.as_str());
    }
}

fn has_line_break(s: &str) -> bool {
    s.contains(['\r', '\n'])
}
