//! The incremental INI parser.
//!
//! [`Parser`] is a character-level state machine. It accepts input in chunks
//! of any size (down to a single character) through [`Parser::feed`], never
//! looks ahead, and builds an [`IniTree`] as it goes. Because values and
//! comments are only committed when a line break is seen, the caller must
//! call [`Parser::finish`] once the input is exhausted; only then does the
//! tree become readable.
//!
//! ## Grammar
//!
//! ```text
//! [section name]          ; header, name trimmed, must not span lines
//! key = value             ; key trimmed and non-blank, value trimmed
//! ; free text             ; comment, trimmed
//! key = "quoted\tvalue"   ; only with Feature::WrappedValue
//! ```
//!
//! - A leading byte order mark (`U+FEFF` or `U+FFFE`) is skipped.
//! - `\r` and `\n` each end a line on their own.
//! - Comments before the first header are kept at the top level; a key/value
//!   pair before the first header is an error.
//! - A quoted value may span lines and ends at the next unescaped `"`. The
//!   escapes are listed in [`crate::escape`].
//!
//! ## Errors and warnings
//!
//! A line without `=` is a *malformed line*. In strict mode it aborts parsing
//! with [`Error::MalformedLine`]; otherwise the line is dropped and the
//! warning handler (if any) is called with a message and the character
//! offset of the line break. Every other violation aborts parsing regardless
//! of mode, and leaves the parser unusable.
//!
//! ## Examples
//!
//! ```rust
//! use initree::{Parser, ParserOptions};
//!
//! let mut warnings = Vec::new();
//! let mut parser = Parser::new(ParserOptions::new())
//!     .with_warn_handler(|msg, offset| warnings.push((msg.to_string(), offset)));
//!
//! parser.feed("[server]\nhost = loc").unwrap();
//! parser.feed("alhost\nbroken line\n").unwrap();
//! parser.finish().unwrap();
//!
//! let tree = parser.into_tree().unwrap();
//! assert_eq!(tree.get("server", "host"), Some("localhost"));
//! assert_eq!(warnings.len(), 1);
//! ```

use crate::escape::{self, UNICODE_ESCAPE};
use crate::tree::{Comment, Element, Entry, IniTree, Item, Section};
use crate::{Error, ParserOptions, Result};
use std::io::BufRead;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Init,
    Idle,
    SectionIdentify,
    Key,
    BeforeValue,
    CommonValue,
    WrappedValue,
    Escape,
    UnicodeEscape,
    Comment,
    Eof,
}

impl State {
    fn describe(self) -> &'static str {
        match self {
            State::Init | State::Idle => "a blank line",
            State::SectionIdentify => "a section header",
            State::Key => "a key",
            State::BeforeValue | State::CommonValue => "a value",
            State::WrappedValue => "a quoted value",
            State::Escape | State::UnicodeEscape => "an escape sequence",
            State::Comment => "a comment",
            State::Eof => "the end of input",
        }
    }
}

/// Whether the current character was consumed or must be dispatched again in
/// the new state.
enum Step {
    Consumed,
    Redispatch,
}

type WarnHandler<'a> = Box<dyn FnMut(&str, usize) + 'a>;

/// The INI parser.
///
/// A parser is single-use: once [`finish`](Parser::finish) succeeds it is
/// terminal, and once any call fails it is poisoned. Create a new one per
/// document.
pub struct Parser<'a> {
    options: ParserOptions,
    state: State,
    buffer: String,
    key: String,
    section: Option<usize>,
    unicode: u16,
    unicode_digits: u8,
    tree: IniTree,
    offset: usize,
    poisoned: bool,
    warn_handler: Option<WarnHandler<'a>>,
}

impl<'a> Parser<'a> {
    pub fn new(options: ParserOptions) -> Self {
        Parser {
            options,
            state: State::Init,
            buffer: String::new(),
            key: String::new(),
            section: None,
            unicode: 0,
            unicode_digits: 0,
            tree: IniTree::new(),
            offset: 0,
            poisoned: false,
            warn_handler: None,
        }
    }

    /// Registers the warning handler, called with a message and a character
    /// offset for every dropped malformed line.
    #[must_use]
    pub fn with_warn_handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&str, usize) + 'a,
    {
        self.set_warn_handler(handler);
        self
    }

    pub fn set_warn_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&str, usize) + 'a,
    {
        self.warn_handler = Some(Box::new(handler));
    }

    pub fn options(&self) -> ParserOptions {
        self.options
    }

    /// Number of characters consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns `true` once [`finish`](Parser::finish) has succeeded.
    pub fn is_finished(&self) -> bool {
        self.state == State::Eof && !self.poisoned
    }

    /// Feeds a chunk of input.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error found in the chunk, or a malformed line
    /// in strict mode. The parser is poisoned afterwards.
    pub fn feed(&mut self, chunk: &str) -> Result<()> {
        for ch in chunk.chars() {
            self.feed_char(ch)?;
        }
        Ok(())
    }

    /// Feeds a single character.
    pub fn feed_char(&mut self, ch: char) -> Result<()> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        let result = self.dispatch(ch);
        self.offset += 1;
        // Input after a successful finish leaves the finished tree intact.
        if result.is_err() && self.state != State::Eof {
            self.poisoned = true;
        }
        result
    }

    /// Feeds everything `reader` yields, one line at a time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if reading fails or the input is not UTF-8, or
    /// any error [`feed`](Parser::feed) returns.
    pub fn feed_reader<R: BufRead>(&mut self, mut reader: R) -> Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Ok(());
            }
            self.feed(&line)?;
        }
    }

    /// Signals the end of input.
    ///
    /// A final line break is dispatched so the last value or comment gets
    /// committed, then the parser must be back between lines.
    ///
    /// # Errors
    ///
    /// [`Error::Unterminated`] if input ended inside a section header, a
    /// quoted value or an escape; [`Error::AlreadyFinished`] if called twice.
    pub fn finish(&mut self) -> Result<()> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        if self.state == State::Eof {
            return Err(Error::AlreadyFinished {
                offset: self.offset,
            });
        }
        let end = self.offset;
        if matches!(self.state, State::Escape | State::UnicodeEscape) {
            self.poisoned = true;
            return Err(Error::Unterminated {
                state: self.state.describe(),
                offset: end,
            });
        }
        self.feed_char('\n')?;
        if self.state != State::Idle {
            self.poisoned = true;
            return Err(Error::Unterminated {
                state: self.state.describe(),
                offset: end,
            });
        }
        self.state = State::Eof;
        tracing::debug!(
            elements = self.tree.len(),
            chars = end,
            "finished parsing INI"
        );
        Ok(())
    }

    /// Returns the parsed tree.
    ///
    /// # Errors
    ///
    /// [`Error::NotFinished`] before [`finish`](Parser::finish) succeeded,
    /// [`Error::Poisoned`] after a fatal error.
    pub fn tree(&self) -> Result<&IniTree> {
        self.check_finished()?;
        Ok(&self.tree)
    }

    /// Consumes the parser and returns the parsed tree.
    ///
    /// # Errors
    ///
    /// Same as [`tree`](Parser::tree).
    pub fn into_tree(self) -> Result<IniTree> {
        self.check_finished()?;
        Ok(self.tree)
    }

    fn check_finished(&self) -> Result<()> {
        if self.poisoned {
            Err(Error::Poisoned)
        } else if self.state != State::Eof {
            Err(Error::NotFinished)
        } else {
            Ok(())
        }
    }

    fn dispatch(&mut self, ch: char) -> Result<()> {
        while let Step::Redispatch = self.step(ch)? {}
        Ok(())
    }

    fn step(&mut self, ch: char) -> Result<Step> {
        match self.state {
            State::Init => {
                if ch == '\u{FEFF}' || ch == '\u{FFFE}' {
                    return Ok(Step::Consumed);
                }
                self.state = State::Idle;
                return Ok(Step::Redispatch);
            }
            State::Idle => match ch {
                '[' => self.state = State::SectionIdentify,
                ';' => self.state = State::Comment,
                c if c.is_whitespace() => {}
                _ => {
                    self.state = State::Key;
                    return Ok(Step::Redispatch);
                }
            },
            State::SectionIdentify => match ch {
                ']' => {
                    self.end_section()?;
                    self.state = State::Idle;
                }
                '\r' | '\n' => {
                    return Err(Error::UnterminatedSection {
                        offset: self.offset,
                    })
                }
                c => self.buffer.push(c),
            },
            State::Key => match ch {
                '=' => {
                    self.end_key()?;
                    self.state = State::BeforeValue;
                }
                '\r' | '\n' => {
                    self.buffer.clear();
                    self.state = State::Idle;
                    self.warn("line has no `=` separator")?;
                }
                c => self.buffer.push(c),
            },
            State::BeforeValue => match ch {
                '\r' | '\n' => {
                    self.end_value()?;
                    self.state = State::Idle;
                }
                ' ' | '\t' => {}
                '"' if self.options.wrapped_value => self.state = State::WrappedValue,
                _ => {
                    self.state = State::CommonValue;
                    return Ok(Step::Redispatch);
                }
            },
            State::CommonValue => match ch {
                '\r' | '\n' => {
                    self.end_value()?;
                    self.state = State::Idle;
                }
                c => self.buffer.push(c),
            },
            State::WrappedValue => match ch {
                '"' => {
                    self.end_value()?;
                    self.state = State::Idle;
                }
                '\\' => self.state = State::Escape,
                c => self.buffer.push(c),
            },
            State::Escape => {
                if let Some(c) = escape::unescape(ch) {
                    self.buffer.push(c);
                    self.state = State::WrappedValue;
                } else if ch == UNICODE_ESCAPE {
                    self.unicode = 0;
                    self.unicode_digits = 0;
                    self.state = State::UnicodeEscape;
                } else {
                    return Err(Error::UnknownEscape {
                        ch,
                        offset: self.offset,
                    });
                }
            }
            State::UnicodeEscape => {
                let digit = ch.to_digit(16).ok_or(Error::InvalidUnicodeEscape {
                    ch,
                    offset: self.offset,
                })?;
                self.unicode = (self.unicode << 4) | digit as u16;
                self.unicode_digits += 1;
                if self.unicode_digits == 4 {
                    let decoded =
                        char::from_u32(u32::from(self.unicode)).ok_or(Error::InvalidCodePoint {
                            code: self.unicode,
                            offset: self.offset,
                        })?;
                    self.buffer.push(decoded);
                    self.state = State::WrappedValue;
                }
            }
            State::Comment => match ch {
                '\r' | '\n' => {
                    self.end_comment();
                    self.state = State::Idle;
                }
                c => self.buffer.push(c),
            },
            State::Eof => {
                return Err(Error::AlreadyFinished {
                    offset: self.offset,
                })
            }
        }
        Ok(Step::Consumed)
    }

    fn warn(&mut self, msg: &str) -> Result<()> {
        if self.options.strict {
            return Err(Error::MalformedLine {
                msg: msg.to_string(),
                offset: self.offset,
            });
        }
        tracing::warn!(offset = self.offset, "{}", msg);
        if let Some(handler) = self.warn_handler.as_mut() {
            handler(msg, self.offset);
        }
        Ok(())
    }

    fn take_buffer(&mut self) -> String {
        let text = self.buffer.trim().to_string();
        self.buffer.clear();
        text
    }

    fn current_section(&mut self) -> Option<&mut Section> {
        match self.tree.elements.get_mut(self.section?) {
            Some(Element::Section(section)) => Some(section),
            _ => None,
        }
    }

    fn end_section(&mut self) -> Result<()> {
        let name = self.take_buffer();
        if name.is_empty() {
            return Err(Error::BlankSectionName {
                offset: self.offset,
            });
        }
        self.section = Some(self.tree.elements.len());
        self.tree.elements.push(Element::Section(Section {
            name,
            entries: Vec::new(),
        }));
        Ok(())
    }

    fn end_key(&mut self) -> Result<()> {
        let key = self.take_buffer();
        if key.is_empty() {
            return Err(Error::BlankKey {
                offset: self.offset,
            });
        }
        self.key = key;
        Ok(())
    }

    fn end_value(&mut self) -> Result<()> {
        let value = self.take_buffer();
        let key = std::mem::take(&mut self.key);
        let offset = self.offset;
        match self.current_section() {
            Some(section) => {
                section.entries.push(Entry::Item(Item { key, value }));
                Ok(())
            }
            None => Err(Error::ValueOutsideSection { key, offset }),
        }
    }

    fn end_comment(&mut self) {
        let comment = Comment {
            text: self.take_buffer(),
        };
        match self.current_section() {
            Some(section) => section.entries.push(Entry::Comment(comment)),
            None => self.tree.elements.push(Element::Comment(comment)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str, options: ParserOptions) -> Result<IniTree> {
        let mut parser = Parser::new(options);
        parser.feed(input)?;
        parser.finish()?;
        parser.into_tree()
    }

    fn wrapped() -> ParserOptions {
        ParserOptions::new().with_wrapped_value(true)
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("", ParserOptions::new()).unwrap().is_empty());
        assert!(parse("\n\r\n  \n", ParserOptions::new()).unwrap().is_empty());
        assert!(parse("\u{FEFF}", ParserOptions::new()).unwrap().is_empty());
    }

    #[test]
    fn test_basic_document() {
        let tree = parse(
            "; top\n[ main ]\n  name =  demo \nempty=\n;inner \n[other]\nk=v",
            ParserOptions::new(),
        )
        .unwrap();

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.elements[0].as_comment().unwrap().text, "top");
        let main = tree.elements[1].as_section().unwrap();
        assert_eq!(main.name, "main");
        assert_eq!(
            main.entries,
            vec![
                Entry::Item(Item::new("name", "demo")),
                Entry::Item(Item::new("empty", "")),
                Entry::Comment(Comment::new("inner")),
            ]
        );
        assert_eq!(tree.get("other", "k"), Some("v"));
    }

    #[test]
    fn test_carriage_returns_alone_end_lines() {
        let tree = parse("[s]\ra=1\r\nb=2\r", ParserOptions::new()).unwrap();
        assert_eq!(tree.get("s", "a"), Some("1"));
        assert_eq!(tree.get("s", "b"), Some("2"));
    }

    #[test]
    fn test_equals_in_value_kept() {
        let tree = parse("[s]\nurl = a=b=c\n", ParserOptions::new()).unwrap();
        assert_eq!(tree.get("s", "url"), Some("a=b=c"));
    }

    #[test]
    fn test_quote_is_literal_without_feature() {
        let tree = parse("[s]\nq = \"a\\tb\"\n", ParserOptions::new()).unwrap();
        assert_eq!(tree.get("s", "q"), Some("\"a\\tb\""));
    }

    #[test]
    fn test_wrapped_value_escapes() {
        let tree = parse(
            "[s]\nv = \"tab\\there\\n\\\"q\\\" \\\\ \\; \\u00e9\\u0041\"\n",
            wrapped(),
        )
        .unwrap();
        assert_eq!(tree.get("s", "v"), Some("tab\there\n\"q\" \\ ; \u{e9}A"));
    }

    #[test]
    fn test_wrapped_value_spans_lines() {
        let tree = parse("[s]\nv = \"one\ntwo\"\nw = 3\n", wrapped()).unwrap();
        assert_eq!(tree.get("s", "v"), Some("one\ntwo"));
        assert_eq!(tree.get("s", "w"), Some("3"));
    }

    #[test]
    fn test_unicode_escape_then_more_text() {
        let tree = parse("[s]\nv = \"\\u0041BC\"", wrapped()).unwrap();
        assert_eq!(tree.get("s", "v"), Some("ABC"));
    }

    #[test]
    fn test_unknown_escape() {
        let err = parse("[s]\nv = \"\\q\"", wrapped()).unwrap_err();
        assert_eq!(err, Error::UnknownEscape { ch: 'q', offset: 10 });
    }

    #[test]
    fn test_bad_hex_digit() {
        let err = parse("[s]\nv = \"\\u00g1\"", wrapped()).unwrap_err();
        assert!(matches!(err, Error::InvalidUnicodeEscape { ch: 'g', .. }));
    }

    #[test]
    fn test_surrogate_escape_rejected() {
        let err = parse("[s]\nv = \"\\uD800\"", wrapped()).unwrap_err();
        assert!(matches!(err, Error::InvalidCodePoint { code: 0xD800, .. }));
    }

    #[test]
    fn test_unterminated_quoted_value() {
        let err = parse("[s]\nv = \"open", wrapped()).unwrap_err();
        assert!(matches!(
            err,
            Error::Unterminated {
                state: "a quoted value",
                ..
            }
        ));
    }

    #[test]
    fn test_input_ends_inside_escape() {
        for input in ["[s]\nv = \"abc\\", "[s]\nv = \"\\u00"] {
            let err = parse(input, wrapped()).unwrap_err();
            assert_eq!(
                err,
                Error::Unterminated {
                    state: "an escape sequence",
                    offset: input.chars().count(),
                },
                "{:?}",
                input
            );
        }
    }

    #[test]
    fn test_section_errors() {
        let err = parse("[open\n", ParserOptions::new()).unwrap_err();
        assert_eq!(err, Error::UnterminatedSection { offset: 5 });

        let err = parse("[open", ParserOptions::new()).unwrap_err();
        assert!(matches!(err, Error::UnterminatedSection { .. }));

        let err = parse("[  ]\n", ParserOptions::new()).unwrap_err();
        assert_eq!(err, Error::BlankSectionName { offset: 3 });
    }

    #[test]
    fn test_blank_key() {
        let err = parse("[s]\n  = v\n", ParserOptions::new()).unwrap_err();
        assert_eq!(err, Error::BlankKey { offset: 6 });
    }

    #[test]
    fn test_malformed_line_offset() {
        let mut seen = Vec::new();
        let mut parser = Parser::new(ParserOptions::new())
            .with_warn_handler(|msg, offset| seen.push((msg.to_string(), offset)));
        parser.feed("[s]\nbad\nk=v\n").unwrap();
        parser.finish().unwrap();
        let tree = parser.into_tree().unwrap();

        assert_eq!(tree.get("s", "k"), Some("v"));
        assert_eq!(tree.section("s").unwrap().entries.len(), 1);
        assert_eq!(seen, vec![("line has no `=` separator".to_string(), 7)]);
    }

    #[test]
    fn test_key_without_separator_at_end_is_warned() {
        let mut count = 0;
        let mut parser = Parser::new(ParserOptions::new()).with_warn_handler(|_, _| count += 1);
        parser.feed("[s]\ndangling").unwrap();
        parser.finish().unwrap();
        assert!(parser.is_finished());
        drop(parser);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_strict_malformed_line() {
        let err = parse("[s]\nbad\n", ParserOptions::new().with_strict(true)).unwrap_err();
        assert_eq!(
            err,
            Error::MalformedLine {
                msg: "line has no `=` separator".to_string(),
                offset: 7
            }
        );
    }

    #[test]
    fn test_tree_before_finish() {
        let mut parser = Parser::new(ParserOptions::new());
        parser.feed("[s]\n").unwrap();
        assert_eq!(parser.tree().unwrap_err(), Error::NotFinished);
    }

    #[test]
    fn test_input_after_finish() {
        let mut parser = Parser::new(ParserOptions::new());
        parser.feed("[s]\na=1").unwrap();
        parser.finish().unwrap();
        assert_eq!(
            parser.feed("x").unwrap_err(),
            Error::AlreadyFinished { offset: 8 }
        );
        assert!(matches!(
            parser.finish().unwrap_err(),
            Error::AlreadyFinished { .. }
        ));
        assert_eq!(parser.tree().unwrap().get("s", "a"), Some("1"));
    }

    #[test]
    fn test_poisoned_after_error() {
        let mut parser = Parser::new(ParserOptions::new());
        assert!(parser.feed("a = 1\n").is_err());
        assert_eq!(parser.feed("[s]\n").unwrap_err(), Error::Poisoned);
        assert_eq!(parser.finish().unwrap_err(), Error::Poisoned);
        assert_eq!(parser.into_tree().unwrap_err(), Error::Poisoned);
    }

    #[test]
    fn test_bom_only_skipped_at_start() {
        let tree = parse("\u{FFFE}[s]\na=1\n", ParserOptions::new()).unwrap();
        assert_eq!(tree.get("s", "a"), Some("1"));

        let tree = parse("[s]\n\u{FEFF}a=1\n", ParserOptions::new()).unwrap();
        assert_eq!(tree.get("s", "\u{FEFF}a"), Some("1"));
    }
}
