//! Typed access to a stored tree.
//!
//! [`IniMapper`] owns a tree loaded from an [`IniStore`] and reads or writes
//! individual items as typed values through a [`CodecRegistry`]. Items are
//! addressed explicitly by `(section, key)`. When the same key appears more
//! than once, in one section or across same-named sections, the last
//! occurrence wins.
//!
//! A [`Binding`] is a reusable handle for one `(section, key)` pair, with an
//! optional default that is written into the tree the first time the key is
//! found missing. The mapper remembers every binding and refuses to
//! [`store`](IniMapper::store) a tree in which a bound key has gone missing.
//!
//! ## Examples
//!
//! ```rust
//! use initree::{IniMapper, MemoryStore};
//!
//! let store = MemoryStore::new("[server]\nport = 8080\n");
//! let mut mapper = IniMapper::new(&store).unwrap();
//!
//! let port = mapper.bind::<u16>("server", "port").unwrap();
//! let debug = mapper
//!     .bind_path::<bool>("server:debug")
//!     .unwrap()
//!     .with_default(|| false);
//!
//! assert_eq!(port.get(&mut mapper).unwrap(), 8080);
//! assert!(!debug.get(&mut mapper).unwrap());
//!
//! port.set(&mut mapper, &9090).unwrap();
//! mapper.store().unwrap();
//! assert_eq!(store.contents(), "[server]\nport = 9090\ndebug = false\n");
//! ```

use crate::codec::CodecRegistry;
use crate::store::IniStore;
use crate::tree::{Element, Entry, IniTree, Item, Section};
use crate::{Error, Result};
use indexmap::{Equivalent, IndexMap, IndexSet};
use std::hash::{Hash, Hasher};

/// Owned `(section, key)` address of an item.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ItemKey {
    section: String,
    key: String,
}

impl ItemKey {
    fn new(section: &str, key: &str) -> Self {
        ItemKey {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

/// Borrowed lookup form of [`ItemKey`], hashed the same way.
struct ItemRef<'a>(&'a str, &'a str);

impl Hash for ItemRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
        self.1.hash(state);
    }
}

impl Equivalent<ItemKey> for ItemRef<'_> {
    fn equivalent(&self, key: &ItemKey) -> bool {
        self.0 == key.section && self.1 == key.key
    }
}

/// Typed view over a tree held in a store.
pub struct IniMapper<S> {
    store: S,
    tree: IniTree,
    codecs: CodecRegistry,
    index: IndexMap<ItemKey, (usize, usize)>,
    bound: IndexSet<ItemKey>,
}

impl<S: IniStore> IniMapper<S> {
    /// Loads the tree from `store`, using the default codecs.
    pub fn new(store: S) -> Result<Self> {
        Self::with_codecs(store, CodecRegistry::new())
    }

    pub fn with_codecs(store: S, codecs: CodecRegistry) -> Result<Self> {
        let tree = store.load()?;
        let mut mapper = IniMapper {
            store,
            tree,
            codecs,
            index: IndexMap::new(),
            bound: IndexSet::new(),
        };
        mapper.update_cache();
        Ok(mapper)
    }

    /// Reloads the tree from the store, discarding unsaved changes.
    pub fn load(&mut self) -> Result<()> {
        self.tree = self.store.load()?;
        self.update_cache();
        Ok(())
    }

    /// Rebuilds the item index. Must be called after editing the tree
    /// through [`tree_mut`](IniMapper::tree_mut).
    pub fn update_cache(&mut self) {
        self.index.clear();
        for (section_index, element) in self.tree.elements.iter().enumerate() {
            let Element::Section(section) = element else {
                continue;
            };
            for (entry_index, entry) in section.entries.iter().enumerate() {
                if let Entry::Item(item) = entry {
                    self.index.insert(
                        ItemKey::new(&section.name, &item.key),
                        (section_index, entry_index),
                    );
                }
            }
        }
    }

    pub fn tree(&self) -> &IniTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut IniTree {
        &mut self.tree
    }

    pub fn into_tree(self) -> IniTree {
        self.tree
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    pub fn codecs_mut(&mut self) -> &mut CodecRegistry {
        &mut self.codecs
    }

    /// Reads `[section] key` as a `T`; `Ok(None)` if the key is absent.
    ///
    /// # Errors
    ///
    /// [`Error::NoCodec`] when `T` has no codec, [`Error::Codec`] when the
    /// stored text does not decode.
    pub fn get<T: 'static>(&self, section: &str, key: &str) -> Result<Option<T>> {
        let codec = self.codecs.get::<T>()?;
        let Some(item) = self.item(section, key) else {
            return Ok(None);
        };
        codec
            .decode(&item.value)
            .map(Some)
            .map_err(|msg| Error::Codec {
                section: section.to_string(),
                key: key.to_string(),
                msg,
            })
    }

    /// Reads `[section] key`, writing `default()` into the tree first if the
    /// key is absent.
    pub fn get_or_insert_with<T, F>(&mut self, section: &str, key: &str, default: F) -> Result<T>
    where
        T: 'static,
        F: FnOnce() -> T,
    {
        if let Some(value) = self.get(section, key)? {
            return Ok(value);
        }
        let value = default();
        self.set(section, key, &value)?;
        Ok(value)
    }

    /// Writes `value` to `[section] key`.
    ///
    /// An existing item is updated in place. Otherwise the item is appended
    /// to the first section called `section`, or to a new section appended to
    /// the tree.
    pub fn set<T: 'static>(&mut self, section: &str, key: &str, value: &T) -> Result<()> {
        let text = self.codecs.encode(value)?;
        match self.item_mut(section, key) {
            Some(item) => item.value = text.trim().to_string(),
            None => self.insert(section, key, text)?,
        }
        Ok(())
    }

    /// Creates a binding for `[section] key` and remembers it for
    /// [`check_valid`](IniMapper::check_valid).
    ///
    /// # Errors
    ///
    /// [`Error::NoCodec`] when `T` has no codec.
    pub fn bind<T: 'static>(&mut self, section: &str, key: &str) -> Result<Binding<T>> {
        self.codecs.get::<T>()?;
        let (section, key) = (section.trim(), key.trim());
        self.bound.insert(ItemKey::new(section, key));
        Ok(Binding {
            section: section.to_string(),
            key: key.to_string(),
            default: None,
        })
    }

    /// Like [`bind`](IniMapper::bind), addressing the item as
    /// `"Section:key"`. The first `:` separates the two parts.
    pub fn bind_path<T: 'static>(&mut self, path: &str) -> Result<Binding<T>> {
        let (section, key) = path
            .split_once(':')
            .filter(|(section, key)| !section.trim().is_empty() && !key.trim().is_empty())
            .ok_or_else(|| Error::InvalidBindingPath(path.to_string()))?;
        self.bind(section, key)
    }

    /// Returns `true` if every bound key is present in the tree.
    pub fn check_valid(&self) -> bool {
        self.bound
            .iter()
            .all(|bound| self.item(&bound.section, &bound.key).is_some())
    }

    /// Writes the tree back to the store.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidBindings`] listing the bound keys missing from the
    /// tree, or any error from encoding and storing.
    pub fn store(&self) -> Result<()> {
        let missing: Vec<String> = self
            .bound
            .iter()
            .filter(|bound| self.item(&bound.section, &bound.key).is_none())
            .map(|bound| format!("[{}] {}", bound.section, bound.key))
            .collect();
        if !missing.is_empty() {
            return Err(Error::InvalidBindings(missing.join(", ")));
        }
        self.store.store(&self.tree)
    }

    fn locate(&self, section: &str, key: &str) -> Option<(usize, usize)> {
        self.index.get(&ItemRef(section.trim(), key.trim())).copied()
    }

    fn item(&self, section: &str, key: &str) -> Option<&Item> {
        let (section_index, entry_index) = self.locate(section, key)?;
        match self.tree.elements.get(section_index)? {
            Element::Section(s) if s.name == section.trim() => s
                .entries
                .get(entry_index)?
                .as_item()
                .filter(|item| item.key == key.trim()),
            _ => None,
        }
    }

    fn item_mut(&mut self, section: &str, key: &str) -> Option<&mut Item> {
        let (section_index, entry_index) = self.locate(section, key)?;
        match self.tree.elements.get_mut(section_index)? {
            Element::Section(s) if s.name == section.trim() => match s.entries.get_mut(entry_index)? {
                Entry::Item(item) if item.key == key.trim() => Some(item),
                _ => None,
            },
            _ => None,
        }
    }

    fn insert(&mut self, section: &str, key: &str, value: String) -> Result<()> {
        let (section, key) = (section.trim(), key.trim());
        if section.is_empty() || key.is_empty() {
            return Err(Error::unencodable(
                format!("[{}] {}", section, key),
                "section names and keys cannot be blank",
            ));
        }
        let section_index = match self
            .tree
            .elements
            .iter()
            .position(|element| matches!(element, Element::Section(s) if s.name == section))
        {
            Some(index) => index,
            None => {
                self.tree.push_section(Section::new(section));
                self.tree.elements.len() - 1
            }
        };
        if let Some(Element::Section(s)) = self.tree.elements.get_mut(section_index) {
            s.push_item(Item::new(key, value));
            self.index.insert(
                ItemKey::new(section, key),
                (section_index, s.entries.len() - 1),
            );
            tracing::debug!(section, key, "inserted missing INI item");
        }
        Ok(())
    }
}

/// A typed handle to one `(section, key)` pair.
pub struct Binding<T> {
    section: String,
    key: String,
    default: Option<Box<dyn Fn() -> T>>,
}

impl<T: 'static> Binding<T> {
    /// Sets the value used, and written to the tree, when the key is missing.
    #[must_use]
    pub fn with_default<F>(mut self, default: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        self.default = Some(Box::new(default));
        self
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the bound value.
    ///
    /// # Errors
    ///
    /// [`Error::MissingValue`] if the key is absent and there is no default,
    /// or any error from [`IniMapper::get`].
    pub fn get<S: IniStore>(&self, mapper: &mut IniMapper<S>) -> Result<T> {
        if let Some(value) = mapper.get(&self.section, &self.key)? {
            return Ok(value);
        }
        match &self.default {
            Some(default) => {
                let value = default();
                mapper.set(&self.section, &self.key, &value)?;
                Ok(value)
            }
            None => Err(Error::MissingValue {
                section: self.section.clone(),
                key: self.key.clone(),
            }),
        }
    }

    /// Writes the bound value.
    pub fn set<S: IniStore>(&self, mapper: &mut IniMapper<S>, value: &T) -> Result<()> {
        mapper.set(&self.section, &self.key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    const CONFIG: &str = "; app\n[db]\nhost = localhost\nport = 5432\n[db]\nport = 6543\n[log]\nlevel = x\n";

    #[test]
    fn test_get_last_occurrence_wins() {
        let store = MemoryStore::new(CONFIG);
        let mapper = IniMapper::new(&store).unwrap();
        assert_eq!(mapper.get::<u16>("db", "port").unwrap(), Some(6543));
        assert_eq!(
            mapper.get::<String>("db", "host").unwrap().as_deref(),
            Some("localhost")
        );
        assert_eq!(mapper.get::<u16>("db", "missing").unwrap(), None);
    }

    #[test]
    fn test_decode_error_names_item() {
        let store = MemoryStore::new(CONFIG);
        let mapper = IniMapper::new(&store).unwrap();
        let err = mapper.get::<u8>("log", "level").unwrap_err();
        assert!(matches!(err, Error::Codec { ref section, ref key, .. } if section == "log" && key == "level"));
    }

    #[test]
    fn test_set_updates_in_place() {
        let store = MemoryStore::new(CONFIG);
        let mut mapper = IniMapper::new(&store).unwrap();
        mapper.set("db", "port", &7000u16).unwrap();
        mapper.store().unwrap();
        assert_eq!(
            store.contents(),
            ";app\n[db]\nhost = localhost\nport = 5432\n[db]\nport = 7000\n[log]\nlevel = x\n"
        );
    }

    #[test]
    fn test_set_inserts_into_first_section_or_new_one() {
        let store = MemoryStore::new(CONFIG);
        let mut mapper = IniMapper::new(&store).unwrap();
        mapper.set("db", "user", &"admin".to_string()).unwrap();
        mapper.set("cache", "enabled", &true).unwrap();
        mapper.store().unwrap();
        assert_eq!(
            store.contents(),
            ";app\n[db]\nhost = localhost\nport = 5432\nuser = admin\n[db]\nport = 6543\n[log]\nlevel = x\n[cache]\nenabled = true\n"
        );
        assert_eq!(mapper.get::<bool>("cache", "enabled").unwrap(), Some(true));
    }

    #[test]
    fn test_set_trims_like_a_reparse() {
        let store = MemoryStore::new("[a]\nk = 1\n");
        let mut mapper = IniMapper::new(&store).unwrap();
        mapper.set("a", "k", &"  padded  ".to_string()).unwrap();
        mapper.set("a", "new", &" fresh ".to_string()).unwrap();
        assert_eq!(mapper.tree().get("a", "k"), Some("padded"));
        assert_eq!(mapper.tree().get("a", "new"), Some("fresh"));

        let text = crate::encode(mapper.tree()).unwrap();
        assert_eq!(&crate::parse_str(&text).unwrap(), mapper.tree());
    }

    #[test]
    fn test_get_or_insert_with() {
        let store = MemoryStore::new("[a]\n");
        let mut mapper = IniMapper::new(&store).unwrap();
        assert_eq!(mapper.get_or_insert_with("a", "n", || 3i64).unwrap(), 3);
        assert_eq!(mapper.get_or_insert_with("a", "n", || 4i64).unwrap(), 3);
        assert_eq!(mapper.tree().get("a", "n"), Some("3"));
    }

    #[test]
    fn test_binding_without_default() {
        let store = MemoryStore::new("[a]\n");
        let mut mapper = IniMapper::new(&store).unwrap();
        let missing = mapper.bind::<String>("a", "name").unwrap();
        assert!(matches!(
            missing.get(&mut mapper).unwrap_err(),
            Error::MissingValue { .. }
        ));
        assert!(!mapper.check_valid());
        assert!(matches!(mapper.store().unwrap_err(), Error::InvalidBindings(ref m) if m == "[a] name"));

        missing.set(&mut mapper, &"x".to_string()).unwrap();
        assert!(mapper.check_valid());
        mapper.store().unwrap();
    }

    #[test]
    fn test_stale_cache_detected() {
        let store = MemoryStore::new("[a]\nx = 1\ny = 2\n");
        let mut mapper = IniMapper::new(&store).unwrap();
        let a = mapper.tree_mut().section_mut("a").unwrap();
        a.entries.remove(0);
        assert_eq!(mapper.get::<i32>("a", "x").unwrap(), None);
        mapper.update_cache();
        assert_eq!(mapper.get::<i32>("a", "y").unwrap(), Some(2));
    }

    #[test]
    fn test_bind_path() {
        let store = MemoryStore::new("[a]\nk = v\n");
        let mut mapper = IniMapper::new(&store).unwrap();
        let binding = mapper.bind_path::<String>(" a : k ").unwrap();
        assert_eq!((binding.section(), binding.key()), ("a", "k"));
        assert_eq!(binding.get(&mut mapper).unwrap(), "v");

        for path in ["nokey", ":k", "a:", "  :  "] {
            assert!(matches!(
                mapper.bind_path::<String>(path),
                Err(Error::InvalidBindingPath(_))
            ));
        }
    }

    #[test]
    fn test_bind_requires_codec() {
        struct Opaque;
        let store = MemoryStore::new("");
        let mut mapper = IniMapper::new(&store).unwrap();
        assert!(matches!(
            mapper.bind::<Opaque>("a", "b"),
            Err(Error::NoCodec(_))
        ));
    }

    #[test]
    fn test_reload_discards_changes() {
        let store = MemoryStore::new("[a]\nk = 1\n");
        let mut mapper = IniMapper::new(&store).unwrap();
        mapper.set("a", "k", &2u8).unwrap();
        mapper.load().unwrap();
        assert_eq!(mapper.get::<u8>("a", "k").unwrap(), Some(1));
    }
}
