//! The escape table shared by the parser and the encoder.
//!
//! Inside a quoted value a backslash is followed by one escape letter:
//!
//! ```text
//! \r  carriage return      \\  backslash
//! \n  line feed            \'  apostrophe
//! \t  tab                  \"  quote
//! \a  bell (U+0007)        \;  semicolon
//! \b  backspace (U+0008)   \#  hash
//! \0  null                 \:  colon
//! \uXXXX  character by code point, exactly four hex digits
//! ```

const TABLE: [(char, char); 12] = [
    ('r', '\r'),
    ('n', '\n'),
    ('t', '\t'),
    ('a', '\u{0007}'),
    ('b', '\u{0008}'),
    ('0', '\0'),
    ('\\', '\\'),
    ('\'', '\''),
    ('"', '"'),
    (';', ';'),
    ('#', '#'),
    (':', ':'),
];

/// Letter that introduces a `\uXXXX` escape.
pub const UNICODE_ESCAPE: char = 'u';

/// Maps an escape letter to the character it stands for.
///
/// # Examples
///
/// ```rust
/// use initree::escape;
///
/// assert_eq!(escape::unescape('n'), Some('\n'));
/// assert_eq!(escape::unescape('q'), None);
/// ```
#[must_use]
pub fn unescape(letter: char) -> Option<char> {
    TABLE
        .iter()
        .find(|(l, _)| *l == letter)
        .map(|(_, ch)| *ch)
}

/// Maps a character back to its escape letter, if it has one.
#[must_use]
pub fn escape_letter(ch: char) -> Option<char> {
    TABLE.iter().find(|(_, c)| *c == ch).map(|(l, _)| *l)
}

/// Writes `value` as a quoted value, escaping the quote, the backslash and
/// control characters. Control characters without an escape letter are
/// written as `\uXXXX`.
pub fn write_quoted(value: &str, out: &mut String) {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            c if c.is_control() => match escape_letter(c) {
                Some(letter) => {
                    out.push('\\');
                    out.push(letter);
                }
                None => out.push_str(&format!("\\u{:04X}", c as u32)),
            },
            c => out.push(c),
        }
    }
    out.push('"');
}
