//! Serializing Rust types into an INI tree.
//!
//! The top-level value must be a struct or map whose fields are themselves
//! structs or maps: each field becomes a section, each inner field an item.
//!
//! ```rust
//! use initree::to_string;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Config {
//!     server: Server,
//! }
//!
//! #[derive(Serialize)]
//! struct Server {
//!     host: String,
//!     ports: Vec<u16>,
//!     tls: Option<bool>,
//! }
//!
//! let config = Config {
//!     server: Server {
//!         host: "example.org".into(),
//!         ports: vec![80, 443],
//!         tls: None,
//!     },
//! };
//! assert_eq!(
//!     to_string(&config).unwrap(),
//!     "[server]\nhost = example.org\nports = 80, 443\n"
//! );
//! ```
//!
//! `None` fields are skipped, unit enum variants are written by name and
//! sequences are joined with `, `. Nested structs below the section level
//! are rejected with [`Error::UnsupportedType`].

use crate::tree::{IniTree, Item, Section};
use crate::{Error, Result};
use serde::ser::{self, Impossible, Serialize};

/// The INI serializer.
///
/// Builds an [`IniTree`] from any value implementing `Serialize`. Use
/// [`Serializer::into_inner`] to take the tree once serialization is done.
#[derive(Default)]
pub struct Serializer {
    tree: IniTree,
}

impl Serializer {
    pub fn new() -> Self {
        Serializer::default()
    }

    pub fn into_inner(self) -> IniTree {
        self.tree
    }
}

macro_rules! reject {
    ($what:expr; $($method:ident($($arg:ty),*);)*) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<Self::Ok> {
                Err(Error::unsupported_type($what))
            }
        )*
    };
}

macro_rules! reject_compound {
    ($what:expr) => {
        fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
            Err(Error::unsupported_type($what))
        }

        fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
            Err(Error::unsupported_type($what))
        }

        fn serialize_tuple_struct(
            self,
            _name: &'static str,
            _len: usize,
        ) -> Result<Self::SerializeTupleStruct> {
            Err(Error::unsupported_type($what))
        }

        fn serialize_tuple_variant(
            self,
            _name: &'static str,
            _index: u32,
            _variant: &'static str,
            _len: usize,
        ) -> Result<Self::SerializeTupleVariant> {
            Err(Error::unsupported_type($what))
        }

        fn serialize_struct_variant(
            self,
            _name: &'static str,
            _index: u32,
            _variant: &'static str,
            _len: usize,
        ) -> Result<Self::SerializeStructVariant> {
            Err(Error::unsupported_type($what))
        }

        fn serialize_newtype_variant<T>(
            self,
            _name: &'static str,
            _index: u32,
            _variant: &'static str,
            _value: &T,
        ) -> Result<Self::Ok>
        where
            T: ?Sized + Serialize,
        {
            Err(Error::unsupported_type($what))
        }
    };
}

const TOP_LEVEL: &str = "the top level must be a struct or map of sections";

impl<'a> ser::Serializer for &'a mut Serializer {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Impossible<(), Error>;
    type SerializeTuple = Impossible<(), Error>;
    type SerializeTupleStruct = Impossible<(), Error>;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = SectionsSerializer<'a>;
    type SerializeStruct = SectionsSerializer<'a>;
    type SerializeStructVariant = Impossible<(), Error>;

    reject! { TOP_LEVEL;
        serialize_bool(bool);
        serialize_i8(i8);
        serialize_i16(i16);
        serialize_i32(i32);
        serialize_i64(i64);
        serialize_i128(i128);
        serialize_u8(u8);
        serialize_u16(u16);
        serialize_u32(u32);
        serialize_u64(u64);
        serialize_u128(u128);
        serialize_f32(f32);
        serialize_f64(f64);
        serialize_char(char);
        serialize_str(&str);
        serialize_bytes(&[u8]);
        serialize_unit_variant(&'static str, u32, &'static str);
    }

    reject_compound!(TOP_LEVEL);

    fn serialize_none(self) -> Result<()> {
        Ok(())
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(SectionsSerializer {
            ser: self,
            name: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(SectionsSerializer {
            ser: self,
            name: None,
        })
    }
}

/// Appends one section per field or map entry.
pub struct SectionsSerializer<'a> {
    ser: &'a mut Serializer,
    name: Option<String>,
}

impl SectionsSerializer<'_> {
    fn push<T>(&mut self, name: &str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        if let Some(section) = value.serialize(SectionSerializer {
            name: name.to_string(),
        })? {
            self.ser.tree.push_section(section);
        }
        Ok(())
    }
}

impl ser::SerializeStruct for SectionsSerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(key, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeMap for SectionsSerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.name = Some(key_text(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let name = self
            .name
            .take()
            .ok_or_else(|| Error::custom("serialize_value called before serialize_key"))?;
        self.push(&name, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Turns one top-level field into a section, or `None` to skip it.
struct SectionSerializer {
    name: String,
}

impl SectionSerializer {
    fn rejection(&self) -> Error {
        Error::unsupported_type(&format!(
            "field `{}` must be a struct or map to become a section",
            self.name
        ))
    }
}

macro_rules! reject_scalar_section {
    ($($method:ident($($arg:ty),*);)*) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<Self::Ok> {
                Err(self.rejection())
            }
        )*
    };
}

impl ser::Serializer for SectionSerializer {
    type Ok = Option<Section>;
    type Error = Error;

    type SerializeSeq = Impossible<Option<Section>, Error>;
    type SerializeTuple = Impossible<Option<Section>, Error>;
    type SerializeTupleStruct = Impossible<Option<Section>, Error>;
    type SerializeTupleVariant = Impossible<Option<Section>, Error>;
    type SerializeMap = ItemsSerializer;
    type SerializeStruct = ItemsSerializer;
    type SerializeStructVariant = Impossible<Option<Section>, Error>;

    reject_scalar_section! {
        serialize_bool(bool);
        serialize_i8(i8);
        serialize_i16(i16);
        serialize_i32(i32);
        serialize_i64(i64);
        serialize_i128(i128);
        serialize_u8(u8);
        serialize_u16(u16);
        serialize_u32(u32);
        serialize_u64(u64);
        serialize_u128(u128);
        serialize_f32(f32);
        serialize_f64(f64);
        serialize_char(char);
        serialize_str(&str);
        serialize_bytes(&[u8]);
        serialize_unit_variant(&'static str, u32, &'static str);
    }

    reject_compound!("sections must be structs or maps");

    fn serialize_none(self) -> Result<Self::Ok> {
        Ok(None)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Self::Ok>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok> {
        Ok(None)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok> {
        Ok(None)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Self::Ok>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(ItemsSerializer::new(&self.name))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(ItemsSerializer::new(&self.name))
    }
}

/// Collects the items of one section.
struct ItemsSerializer {
    section: Section,
    key: Option<String>,
}

impl ItemsSerializer {
    fn new(name: &str) -> Self {
        ItemsSerializer {
            section: Section::new(name),
            key: None,
        }
    }

    fn push<T>(&mut self, key: &str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        if let Some(text) = value.serialize(ValueSerializer)? {
            self.section.push_item(Item::new(key, text));
        }
        Ok(())
    }
}

impl ser::SerializeStruct for ItemsSerializer {
    type Ok = Option<Section>;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(key, value)
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(Some(self.section))
    }
}

impl ser::SerializeMap for ItemsSerializer {
    type Ok = Option<Section>;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.key = Some(key_text(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called before serialize_key"))?;
        self.push(&key, value)
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(Some(self.section))
    }
}

fn key_text<T>(key: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    key.serialize(ValueSerializer)?
        .ok_or_else(|| Error::unsupported_type("map keys cannot be None"))
}

/// Renders a single value as item text; `None` means the item is skipped.
struct ValueSerializer;

macro_rules! serialize_display {
    ($($method:ident($ty:ty);)*) => {
        $(
            fn $method(self, v: $ty) -> Result<Self::Ok> {
                Ok(Some(v.to_string()))
            }
        )*
    };
}

const NESTED: &str = "maps and structs cannot be nested inside a section";

impl ser::Serializer for ValueSerializer {
    type Ok = Option<String>;
    type Error = Error;

    type SerializeSeq = ListSerializer;
    type SerializeTuple = ListSerializer;
    type SerializeTupleStruct = ListSerializer;
    type SerializeTupleVariant = Impossible<Option<String>, Error>;
    type SerializeMap = Impossible<Option<String>, Error>;
    type SerializeStruct = Impossible<Option<String>, Error>;
    type SerializeStructVariant = Impossible<Option<String>, Error>;

    serialize_display! {
        serialize_bool(bool);
        serialize_i8(i8);
        serialize_i16(i16);
        serialize_i32(i32);
        serialize_i64(i64);
        serialize_i128(i128);
        serialize_u8(u8);
        serialize_u16(u16);
        serialize_u32(u32);
        serialize_u64(u64);
        serialize_u128(u128);
        serialize_f32(f32);
        serialize_f64(f64);
        serialize_char(char);
        serialize_str(&str);
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<Self::Ok> {
        Err(Error::unsupported_type("byte arrays"))
    }

    fn serialize_none(self) -> Result<Self::Ok> {
        Ok(None)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Self::Ok>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok> {
        Ok(Some(String::new()))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok> {
        Ok(Some(String::new()))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok> {
        Ok(Some(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Self::Ok>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _value: &T,
    ) -> Result<Self::Ok>
    where
        T: ?Sized + Serialize,
    {
        Err(Error::unsupported_type(&format!(
            "enum variant `{}` with data",
            variant
        )))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(ListSerializer {
            parts: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        ser::Serializer::serialize_seq(self, Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        ser::Serializer::serialize_seq(self, Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::unsupported_type(&format!(
            "enum variant `{}` with data",
            variant
        )))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::unsupported_type(NESTED))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(Error::unsupported_type(NESTED))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::unsupported_type(NESTED))
    }
}

/// Joins sequence elements with `, `.
struct ListSerializer {
    parts: Vec<String>,
}

impl ListSerializer {
    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let text = value.serialize(ValueSerializer)?.unwrap_or_default();
        self.parts.push(text);
        Ok(())
    }
}

impl ser::SerializeSeq for ListSerializer {
    type Ok = Option<String>;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(Some(self.parts.join(", ")))
    }
}

impl ser::SerializeTuple for ListSerializer {
    type Ok = Option<String>;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(Some(self.parts.join(", ")))
    }
}

impl ser::SerializeTupleStruct for ListSerializer {
    type Ok = Option<String>;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(Some(self.parts.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde::Serialize;

    fn to_tree<T: Serialize>(value: &T) -> Result<IniTree> {
        let mut ser = Serializer::new();
        value.serialize(&mut ser)?;
        Ok(ser.into_inner())
    }

    #[derive(Serialize)]
    #[serde(rename_all = "lowercase")]
    enum Mode {
        Fast,
    }

    #[derive(Serialize)]
    struct Inner {
        mode: Mode,
        ratio: f64,
        tags: Vec<&'static str>,
        note: Option<String>,
        pair: (u8, char),
    }

    #[derive(Serialize)]
    struct Outer {
        first: Inner,
        skipped: Option<Inner>,
    }

    #[test]
    fn test_struct_sections() {
        let tree = to_tree(&Outer {
            first: Inner {
                mode: Mode::Fast,
                ratio: 0.5,
                tags: vec!["a", "b"],
                note: None,
                pair: (7, 'x'),
            },
            skipped: None,
        })
        .unwrap();

        assert_eq!(tree.len(), 1);
        let first = tree.section("first").unwrap();
        assert_eq!(first.get("mode"), Some("fast"));
        assert_eq!(first.get("ratio"), Some("0.5"));
        assert_eq!(first.get("tags"), Some("a, b"));
        assert_eq!(first.get("note"), None);
        assert_eq!(first.get("pair"), Some("7, x"));
    }

    #[test]
    fn test_map_sections() {
        let mut sections: IndexMap<&str, IndexMap<&str, i32>> = IndexMap::new();
        sections.insert("b", IndexMap::from([("x", 1)]));
        sections.insert("a", IndexMap::from([("y", 2)]));
        let tree = to_tree(&sections).unwrap();
        let names: Vec<_> = tree.sections().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(tree.get("a", "y"), Some("2"));
    }

    #[test]
    fn test_rejected_shapes() {
        assert!(matches!(
            to_tree(&42).unwrap_err(),
            Error::UnsupportedType(_)
        ));

        #[derive(Serialize)]
        struct Flat {
            name: &'static str,
        }
        let err = to_tree(&Flat { name: "x" }).unwrap_err();
        assert!(err.to_string().contains("field `name`"));

        #[derive(Serialize)]
        struct Deep {
            s: Outer2,
        }
        #[derive(Serialize)]
        struct Outer2 {
            nested: IndexMap<&'static str, i32>,
        }
        let err = to_tree(&Deep {
            s: Outer2 {
                nested: IndexMap::new(),
            },
        })
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
    }
}
