//! Text codecs for typed access to item values.
//!
//! A [`Codec`] is a pair of plain functions turning a value into the string
//! stored in an [`Item`](crate::Item) and back. A [`CodecRegistry`] maps each
//! Rust type to its codec; the [`IniMapper`](crate::IniMapper) looks codecs up
//! there by the type being read or written.
//!
//! [`CodecRegistry::new`] comes with codecs for `String`, `bool`, `char`, every
//! primitive integer, `f32`, `f64`, `chrono::NaiveDate`,
//! `chrono::DateTime<FixedOffset>`, `chrono::DateTime<Utc>` (RFC 3339) and
//! `num_bigint::BigInt`.
//!
//! ## Examples
//!
//! ```rust
//! use initree::CodecRegistry;
//!
//! #[derive(Debug, PartialEq)]
//! struct Percent(u8);
//!
//! let mut codecs = CodecRegistry::new();
//! codecs.register::<Percent>(
//!     |p| format!("{}%", p.0),
//!     |s| {
//!         s.strip_suffix('%')
//!             .and_then(|n| n.parse().ok())
//!             .map(Percent)
//!             .ok_or_else(|| format!("`{}` is not a percentage", s))
//!     },
//! );
//!
//! assert_eq!(codecs.encode(&Percent(40)).unwrap(), "40%");
//! assert_eq!(codecs.get::<Percent>().unwrap().decode("5%"), Ok(Percent(5)));
//! ```

use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use num_bigint::BigInt;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

pub type EncodeFn<T> = fn(&T) -> String;
pub type DecodeFn<T> = fn(&str) -> std::result::Result<T, String>;

/// An encode/decode function pair for one type.
pub struct Codec<T> {
    pub encode: EncodeFn<T>,
    pub decode: DecodeFn<T>,
}

impl<T> Codec<T> {
    pub fn encode(&self, value: &T) -> String {
        (self.encode)(value)
    }

    pub fn decode(&self, text: &str) -> std::result::Result<T, String> {
        (self.decode)(text)
    }
}

impl<T> Clone for Codec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Codec<T> {}

/// Codecs keyed by the type they handle.
pub struct CodecRegistry {
    codecs: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

macro_rules! register_from_str {
    ($registry:ident, $($ty:ty),* $(,)?) => {
        $(
            $registry.register::<$ty>(
                |v| v.to_string(),
                |s| s.trim().parse::<$ty>().map_err(|e| e.to_string()),
            );
        )*
    };
}

impl CodecRegistry {
    /// Creates a registry with no codecs at all.
    #[must_use]
    pub fn empty() -> Self {
        CodecRegistry {
            codecs: HashMap::new(),
        }
    }

    /// Creates a registry holding the default codecs.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        register_from_str!(
            registry, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
            char, NaiveDate, BigInt,
        );
        registry.register::<String>(|v| v.clone(), |s| Ok(s.to_string()));
        registry.register::<bool>(
            |v| v.to_string(),
            |s| parse_bool(s).ok_or_else(|| format!("`{}` is not a boolean", s)),
        );
        registry.register::<DateTime<FixedOffset>>(
            |v| v.to_rfc3339(),
            |s| DateTime::parse_from_rfc3339(s.trim()).map_err(|e| e.to_string()),
        );
        registry.register::<DateTime<Utc>>(
            |v| v.to_rfc3339(),
            |s| {
                DateTime::parse_from_rfc3339(s.trim())
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| e.to_string())
            },
        );
        registry
    }

    /// Registers (or replaces) the codec for `T`.
    pub fn register<T: 'static>(&mut self, encode: EncodeFn<T>, decode: DecodeFn<T>) -> &mut Self {
        self.codecs
            .insert(TypeId::of::<T>(), Box::new(Codec { encode, decode }));
        self
    }

    /// Returns `true` if a codec for `T` is registered.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.codecs.contains_key(&TypeId::of::<T>())
    }

    /// Returns the codec for `T`.
    ///
    /// # Errors
    ///
    /// [`Error::NoCodec`] if none is registered.
    pub fn get<T: 'static>(&self) -> Result<&Codec<T>> {
        self.codecs
            .get(&TypeId::of::<T>())
            .and_then(|codec| codec.downcast_ref::<Codec<T>>())
            .ok_or(Error::NoCodec(type_name::<T>()))
    }

    /// Encodes `value` with the codec for `T`.
    pub fn encode<T: 'static>(&self, value: &T) -> Result<String> {
        Ok(self.get::<T>()?.encode(value))
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Accepts `true/false`, `yes/no`, `on/off` and `1/0`, ignoring case.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_codecs() {
        let codecs = CodecRegistry::new();
        assert_eq!(codecs.get::<i32>().unwrap().decode(" -12 "), Ok(-12));
        assert_eq!(codecs.encode(&3.5f64).unwrap(), "3.5");
        assert_eq!(codecs.get::<bool>().unwrap().decode("Yes"), Ok(true));
        assert_eq!(codecs.get::<bool>().unwrap().decode("off"), Ok(false));
        assert!(codecs.get::<bool>().unwrap().decode("maybe").is_err());
        assert_eq!(
            codecs.get::<String>().unwrap().decode("as is"),
            Ok("as is".to_string())
        );
        assert!(codecs.get::<u8>().unwrap().decode("300").is_err());
    }

    #[test]
    fn test_chrono_and_bigint() {
        let codecs = CodecRegistry::new();

        let date = codecs.get::<NaiveDate>().unwrap().decode("2024-01-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(codecs.encode(&date).unwrap(), "2024-01-15");

        let dt = codecs
            .get::<DateTime<FixedOffset>>()
            .unwrap()
            .decode("2024-01-15T10:30:00+02:00")
            .unwrap();
        assert_eq!(codecs.encode(&dt).unwrap(), "2024-01-15T10:30:00+02:00");

        let utc = codecs
            .get::<DateTime<Utc>>()
            .unwrap()
            .decode("2024-01-15T10:30:00+02:00")
            .unwrap();
        assert_eq!(codecs.encode(&utc).unwrap(), "2024-01-15T08:30:00+00:00");

        let big: BigInt = codecs
            .get::<BigInt>()
            .unwrap()
            .decode("123456789012345678901234567890")
            .unwrap();
        assert_eq!(
            codecs.encode(&(big * 2)).unwrap(),
            "246913578024691357802469135780"
        );
    }

    #[test]
    fn test_missing_codec() {
        struct Unknown;
        let codecs = CodecRegistry::empty();
        assert!(!codecs.contains::<String>());
        assert!(matches!(
            codecs.get::<Unknown>(),
            Err(Error::NoCodec(name)) if name.ends_with("Unknown")
        ));
    }

    #[test]
    fn test_register_replaces() {
        let mut codecs = CodecRegistry::new();
        codecs.register::<bool>(|v| u8::from(*v).to_string(), |s| Ok(s == "1"));
        assert_eq!(codecs.encode(&true).unwrap(), "1");
    }
}
