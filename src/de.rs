//! Deserializing Rust types from an INI tree.
//!
//! The tree is presented to Serde as a map of section name to section, and
//! each section as a map of key to value:
//!
//! ```rust
//! use initree::from_str;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Config {
//!     server: Server,
//! }
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Server {
//!     host: String,
//!     port: u16,
//!     tls: Option<bool>,
//! }
//!
//! let config: Config = from_str("[server]\nhost = example.org\nport = 443\n").unwrap();
//! assert_eq!(config.server.port, 443);
//! assert_eq!(config.server.tls, None);
//! ```
//!
//! ## Value conversions
//!
//! Item values are strings; they are converted on demand:
//!
//! - numbers and `char` are parsed from the trimmed text
//! - `bool` accepts `true/false`, `yes/no`, `on/off`, `1/0`
//! - `Option<T>` is `None` for an empty value (and for a missing key)
//! - unit enum variants are matched by name
//! - sequences and tuples split the value on `,`
//!
//! Sections with the same name are merged, and when a key repeats the last
//! value wins. Comments are ignored.

use crate::codec::parse_bool;
use crate::tree::IniTree;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::de::value::{BorrowedStrDeserializer, SeqDeserializer, StrDeserializer};
use serde::de::{self, IntoDeserializer};
use serde::forward_to_deserialize_any;
use std::fmt::Display;
use std::str::FromStr;

type Items<'de> = IndexMap<&'de str, &'de str>;

/// The INI deserializer.
///
/// Reads Rust values implementing `Deserialize` out of a finished
/// [`IniTree`]. Created via [`Deserializer::from_tree`].
pub struct Deserializer<'de> {
    tree: &'de IniTree,
}

impl<'de> Deserializer<'de> {
    pub fn from_tree(tree: &'de IniTree) -> Self {
        Deserializer { tree }
    }

    fn merged_sections(&self) -> IndexMap<&'de str, Items<'de>> {
        let mut merged: IndexMap<&'de str, Items<'de>> = IndexMap::new();
        for section in self.tree.sections() {
            let items = merged.entry(section.name.as_str()).or_default();
            for item in section.items() {
                items.insert(item.key.as_str(), item.value.as_str());
            }
        }
        merged
    }
}

impl<'de, 'a> de::Deserializer<'de> for &'a mut Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_map(SectionsAccess {
            iter: self.merged_sections().into_iter(),
            items: None,
        })
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

struct SectionsAccess<'de> {
    iter: indexmap::map::IntoIter<&'de str, Items<'de>>,
    items: Option<Items<'de>>,
}

impl<'de> de::MapAccess<'de> for SectionsAccess<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((name, items)) => {
                self.items = Some(items);
                seed.deserialize(BorrowedStrDeserializer::new(name)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.items.take() {
            Some(items) => seed.deserialize(SectionDeserializer { items }),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct SectionDeserializer<'de> {
    items: Items<'de>,
}

impl<'de> de::Deserializer<'de> for SectionDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_map(ItemsAccess {
            iter: self.items.into_iter(),
            value: None,
        })
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

struct ItemsAccess<'de> {
    iter: indexmap::map::IntoIter<&'de str, &'de str>,
    value: Option<&'de str>,
}

impl<'de> de::MapAccess<'de> for ItemsAccess<'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(BorrowedStrDeserializer::new(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(text) => seed.deserialize(ValueDeserializer { text }),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

/// Deserializes a single item value.
struct ValueDeserializer<'de> {
    text: &'de str,
}

impl<'de> ValueDeserializer<'de> {
    fn parse<T>(&self) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.text
            .trim()
            .parse()
            .map_err(|e| Error::custom(format!("invalid value `{}`: {}", self.text, e)))
    }

    fn visit_list<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let text = self.text.trim();
        let parts: Vec<&'de str> = if text.is_empty() {
            Vec::new()
        } else {
            text.split(',').map(str::trim).collect()
        };
        let mut seq =
            SeqDeserializer::<_, Error>::new(parts.into_iter().map(|text| ValueDeserializer { text }));
        let value = visitor.visit_seq(&mut seq)?;
        seq.end()?;
        Ok(value)
    }
}

impl<'de> IntoDeserializer<'de, Error> for ValueDeserializer<'de> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $visit:ident,)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                visitor.$visit(self.parse()?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for ValueDeserializer<'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_borrowed_str(self.text)
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match parse_bool(self.text) {
            Some(b) => visitor.visit_bool(b),
            None => Err(Error::custom(format!(
                "invalid value `{}`: expected a boolean",
                self.text
            ))),
        }
    }

    deserialize_parsed! {
        deserialize_i8 => visit_i8,
        deserialize_i16 => visit_i16,
        deserialize_i32 => visit_i32,
        deserialize_i64 => visit_i64,
        deserialize_i128 => visit_i128,
        deserialize_u8 => visit_u8,
        deserialize_u16 => visit_u16,
        deserialize_u32 => visit_u32,
        deserialize_u64 => visit_u64,
        deserialize_u128 => visit_u128,
        deserialize_f32 => visit_f32,
        deserialize_f64 => visit_f64,
        deserialize_char => visit_char,
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.text.trim().is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.text.trim().is_empty() {
            visitor.visit_unit()
        } else {
            Err(Error::custom(format!(
                "invalid value `{}`: expected an empty value",
                self.text
            )))
        }
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_unit(self, visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.visit_list(visitor)
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.visit_list(visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let variant: StrDeserializer<'de, Error> = self.text.trim().into_deserializer();
        visitor.visit_enum(variant)
    }

    fn deserialize_map<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::unsupported_type("maps cannot be nested inside a section"))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::unsupported_type(
            "structs cannot be nested inside a section",
        ))
    }

    forward_to_deserialize_any! {
        str string bytes byte_buf tuple_struct identifier ignored_any
    }
}
