//! The INI abstract syntax tree.
//!
//! An [`IniTree`] is an ordered list of top-level [`Element`]s. Sections hold
//! an ordered list of [`Entry`]s. Three node kinds exist:
//!
//! - [`Section`]: a `[name]` header and everything until the next header
//! - [`Item`]: a `key = value` pair, only ever inside a section
//! - [`Comment`]: a `;text` line, at the top level or inside a section
//!
//! Order is preserved everywhere, and appending is the only insertion the
//! helpers perform, so a parsed and edited tree encodes back with comments and
//! untouched lines where they were.
//!
//! ## Examples
//!
//! ```rust
//! use initree::{parse_str, Entry};
//!
//! let mut tree = parse_str("; app config\n[server]\nhost = localhost\n").unwrap();
//!
//! let server = tree.section_mut("server").unwrap();
//! server.set("port", "8080");
//!
//! assert_eq!(tree.get("server", "port"), Some("8080"));
//! assert!(matches!(tree.section("server").unwrap().entries[1], Entry::Item(_)));
//! ```
//!
//! Section names need not be unique. Two `[A]` headers give two independent
//! sections; [`IniTree::sections_named`] walks all of them and
//! [`IniTree::get`] returns the last matching item across them.

use serde::{Deserialize, Serialize};

/// A parsed INI document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IniTree {
    pub elements: Vec<Element>,
}

/// A top-level node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Section(Section),
    Comment(Comment),
}

/// A node inside a section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entry {
    Item(Item),
    Comment(Comment),
}

/// A named group of items and comments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub entries: Vec<Entry>,
}

/// A single `key = value` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub key: String,
    pub value: String,
}

/// Free text introduced by `;`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
}

impl IniTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of top-level elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the tree has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterates over all sections in document order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.elements.iter().filter_map(Element::as_section)
    }

    /// Iterates mutably over all sections in document order.
    pub fn sections_mut(&mut self) -> impl Iterator<Item = &mut Section> {
        self.elements.iter_mut().filter_map(|element| match element {
            Element::Section(section) => Some(section),
            Element::Comment(_) => None,
        })
    }

    /// Iterates over every section called `name`, in document order.
    pub fn sections_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Section> {
        self.sections().filter(move |section| section.name == name)
    }

    /// Returns the first section called `name`.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections().find(|section| section.name == name)
    }

    /// Returns the first section called `name`, mutably.
    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections_mut().find(|section| section.name == name)
    }

    /// Returns the value of the last item `key` across all sections called
    /// `section`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use initree::parse_str;
    ///
    /// let tree = parse_str("[a]\nx = 1\n[a]\nx = 2\n").unwrap();
    /// assert_eq!(tree.get("a", "x"), Some("2"));
    /// assert_eq!(tree.get("a", "y"), None);
    /// ```
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections()
            .filter(|s| s.name == section)
            .filter_map(|s| s.get(key))
            .last()
    }

    /// Appends a section and returns a mutable reference to it.
    pub fn push_section(&mut self, section: Section) -> &mut Section {
        self.elements.push(Element::Section(section));
        match self.elements.last_mut() {
            Some(Element::Section(section)) => section,
            _ => unreachable!("a section was just pushed"),
        }
    }

    /// Appends a top-level comment.
    pub fn push_comment(&mut self, text: impl Into<String>) {
        self.elements.push(Element::Comment(Comment::new(text)));
    }
}

impl Element {
    /// Returns the section if this element is one.
    #[must_use]
    pub fn as_section(&self) -> Option<&Section> {
        match self {
            Element::Section(section) => Some(section),
            Element::Comment(_) => None,
        }
    }

    /// Returns the comment if this element is one.
    #[must_use]
    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Element::Comment(comment) => Some(comment),
            Element::Section(_) => None,
        }
    }
}

impl Entry {
    /// Returns the item if this entry is one.
    #[must_use]
    pub fn as_item(&self) -> Option<&Item> {
        match self {
            Entry::Item(item) => Some(item),
            Entry::Comment(_) => None,
        }
    }

    /// Returns the comment if this entry is one.
    #[must_use]
    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Entry::Comment(comment) => Some(comment),
            Entry::Item(_) => None,
        }
    }
}

impl Section {
    /// Creates an empty section. The name is trimmed.
    pub fn new(name: impl Into<String>) -> Self {
        Section {
            name: trimmed(name.into()),
            entries: Vec::new(),
        }
    }

    /// Iterates over the items of this section, skipping comments.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.entries.iter().filter_map(Entry::as_item)
    }

    /// Returns the last item with `key`.
    #[must_use]
    pub fn item(&self, key: &str) -> Option<&Item> {
        self.items().filter(|item| item.key == key).last()
    }

    /// Returns the last item with `key`, mutably.
    pub fn item_mut(&mut self, key: &str) -> Option<&mut Item> {
        self.entries
            .iter_mut()
            .filter_map(|entry| match entry {
                Entry::Item(item) if item.key == key => Some(item),
                _ => None,
            })
            .last()
    }

    /// Returns the value of the last item with `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.item(key).map(|item| item.value.as_str())
    }

    /// Updates the last item with `key`, or appends a new one.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = trimmed(value.into());
        match self.item_mut(key) {
            Some(item) => item.value = value,
            None => self.push_item(Item::new(key, value)),
        }
    }

    /// Appends an item.
    pub fn push_item(&mut self, item: Item) {
        self.entries.push(Entry::Item(item));
    }

    /// Appends a comment.
    pub fn push_comment(&mut self, text: impl Into<String>) {
        self.entries.push(Entry::Comment(Comment::new(text)));
    }
}

impl Item {
    /// Creates an item. Key and value are trimmed.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Item {
            key: trimmed(key.into()),
            value: trimmed(value.into()),
        }
    }
}

impl Comment {
    /// Creates a comment. The text is trimmed.
    pub fn new(text: impl Into<String>) -> Self {
        Comment {
            text: trimmed(text.into()),
        }
    }
}

fn trimmed(s: String) -> String {
    if s.len() == s.trim().len() {
        s
    } else {
        s.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> IniTree {
        let mut tree = IniTree::new();
        tree.push_comment(" header ");
        let a = tree.push_section(Section::new(" a "));
        a.push_item(Item::new("x", "1"));
        a.push_comment("note");
        a.push_item(Item::new("x", "2"));
        let b = tree.push_section(Section::new("b"));
        b.push_item(Item::new("y", "3"));
        tree.push_section(Section::new("a"))
            .push_item(Item::new("x", "4"));
        tree
    }

    #[test]
    fn test_constructors_trim() {
        let tree = sample();
        assert_eq!(tree.elements[0].as_comment().unwrap().text, "header");
        assert_eq!(tree.elements[1].as_section().unwrap().name, "a");
        assert_eq!(Item::new(" k ", " v "), Item::new("k", "v"));
    }

    #[test]
    fn test_lookup_order() {
        let tree = sample();
        assert_eq!(tree.sections().count(), 3);
        assert_eq!(tree.sections_named("a").count(), 2);
        assert_eq!(tree.section("a").unwrap().get("x"), Some("2"));
        assert_eq!(tree.get("a", "x"), Some("4"));
        assert_eq!(tree.get("b", "y"), Some("3"));
        assert_eq!(tree.get("c", "y"), None);
    }

    #[test]
    fn test_set_updates_or_appends() {
        let mut tree = sample();
        let a = tree.section_mut("a").unwrap();
        a.set("x", "9");
        a.set("z", " 10 ");
        let a = tree.section("a").unwrap();
        let values: Vec<_> = a.items().map(|i| (i.key.as_str(), i.value.as_str())).collect();
        assert_eq!(values, vec![("x", "1"), ("x", "9"), ("z", "10")]);
        assert!(a.entries[1].as_comment().is_some());
    }

    #[test]
    fn test_json_shape() {
        let mut tree = IniTree::new();
        tree.push_section(Section::new("s"))
            .push_item(Item::new("k", "v"));
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["elements"][0]["type"], "section");
        assert_eq!(json["elements"][0]["entries"][0]["type"], "item");
        assert_eq!(json["elements"][0]["entries"][0]["value"], "v");

        let back: IniTree = serde_json::from_value(json).unwrap();
        assert_eq!(back, tree);
    }
}
