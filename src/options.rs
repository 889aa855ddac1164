//! Configuration options for parsing and encoding.
//!
//! - [`ParserOptions`]: the toggles recognized by the [`Parser`](crate::Parser)
//! - [`Feature`]: the same toggles as an enumerable set
//! - [`EncodeOptions`]: output formatting for the [`Encoder`](crate::Encoder)
//! - [`LineEnding`]: line terminator written by the encoder
//!
//! ## Examples
//!
//! ```rust
//! use initree::{parse_with_options, Feature, ParserOptions};
//!
//! let options: ParserOptions = [Feature::Strict, Feature::WrappedValue].into_iter().collect();
//! assert!(options.strict && options.wrapped_value);
//!
//! let tree = parse_with_options("[s]\nk = \"a\\tb\"\n", options).unwrap();
//! assert_eq!(tree.get("s", "k"), Some("a\tb"));
//! ```

/// A single parser toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Malformed lines abort parsing instead of producing a warning.
    Strict,
    /// Values starting with `"` are quoted values with backslash escapes.
    WrappedValue,
}

/// Options recognized by the parser at construction.
///
/// Both toggles are off by default.
///
/// # Examples
///
/// ```rust
/// use initree::ParserOptions;
///
/// let options = ParserOptions::new().with_strict(true);
/// assert!(options.strict);
/// assert!(!options.wrapped_value);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParserOptions {
    pub strict: bool,
    pub wrapped_value: bool,
}

impl ParserOptions {
    /// Creates default options (lenient, no quoted values).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables strict mode.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Enables or disables quoted values.
    #[must_use]
    pub fn with_wrapped_value(mut self, wrapped_value: bool) -> Self {
        self.wrapped_value = wrapped_value;
        self
    }

    /// Returns `true` if `feature` is enabled.
    #[must_use]
    pub fn has(&self, feature: Feature) -> bool {
        match feature {
            Feature::Strict => self.strict,
            Feature::WrappedValue => self.wrapped_value,
        }
    }
}

impl FromIterator<Feature> for ParserOptions {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ParserOptions::default(), |options, feature| match feature {
                Feature::Strict => options.with_strict(true),
                Feature::WrappedValue => options.with_wrapped_value(true),
            })
    }
}

/// Line terminator written after every encoded element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    /// Returns the string representation of this line ending.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

/// Output options for the encoder.
///
/// With `wrap_values` off (the default) values are written literally and a
/// value containing a line break is rejected. With it on, such values (and
/// values starting with `"`) are written as quoted, escaped values that a
/// parser with [`Feature::WrappedValue`] reads back unchanged.
///
/// # Examples
///
/// ```rust
/// use initree::{EncodeOptions, LineEnding};
///
/// let options = EncodeOptions::new()
///     .with_wrap_values(true)
///     .with_line_ending(LineEnding::Crlf);
/// assert_eq!(options.line_ending.as_str(), "\r\n");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    pub wrap_values: bool,
    pub line_ending: LineEnding,
}

impl EncodeOptions {
    /// Creates default options (literal values, `\n` line endings).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables re-wrapping of values that need quoting.
    #[must_use]
    pub fn with_wrap_values(mut self, wrap_values: bool) -> Self {
        self.wrap_values = wrap_values;
        self
    }

    /// Sets the line ending.
    #[must_use]
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }
}
