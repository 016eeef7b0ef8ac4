//! In-memory markup tree.
//!
//! Only what L5X needs: elements with ordered attributes, text, CDATA and
//! comments. Whitespace-only text between elements is not kept.

use std::fmt::Display;

use logix_core::vocab::bool_str;

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set `key`, replacing an existing value in place.
    pub fn set_attr(&mut self, key: &str, value: impl Display) {
        let value = value.to_string();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Display) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_bool(self, key: &str, value: bool) -> Self {
        self.with_attr(key, bool_str(value))
    }

    /// Write `key` only when `value` is present and non-empty.
    pub fn with_opt<V: Display>(self, key: &str, value: Option<V>) -> Self {
        match value.map(|v| v.to_string()) {
            Some(v) if !v.is_empty() => self.with_attr(key, v),
            _ => self,
        }
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children.into_iter().map(Node::Element));
        self
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// `<name><![CDATA[text]]></name>`
    pub fn cdata(name: &str, text: &str) -> Self {
        let mut element = Element::new(name);
        element.children.push(Node::CData(text.to_string()));
        element
    }

    /// Direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First direct child element called `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// Child elements of the direct child called `list`, e.g. every `Tag` in `Tags`.
    pub fn list<'a>(&'a self, list: &str, item: &'a str) -> Vec<&'a Element> {
        self.child(list)
            .map(|l| l.children_named(item).collect())
            .unwrap_or_default()
    }

    /// First element called `name` anywhere below this one, depth first.
    pub fn descendant(&self, name: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text and CDATA content, trimmed.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for node in &self.children {
            if let Node::Text(t) | Node::CData(t) = node {
                text.push_str(t);
            }
        }
        text.trim().to_string()
    }

    /// Trimmed text of the direct child `name`; `None` when absent or empty.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(Element::text).filter(|t| !t.is_empty())
    }
}

/// A parsed or generated document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Comments that precede the root element.
    pub prolog: Vec<String>,
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self {
            prolog: Vec::new(),
            root,
        }
    }
}
