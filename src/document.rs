//! Source document model
//!
//! The flow document markup is held as an explicit tree of [`SourceNode`]s.
//! The parser produces it from markup text, and tests build it directly as
//! literal values:
//!
//! ```rust
//! use flowdoc_clipboard::document::{Element, SourceNode};
//!
//! let root = Element::new("Section")
//!     .with_child(Element::new("Paragraph").with_attribute("FontWeight", "Bold").with_text("Hi"));
//! let node = SourceNode::from(root);
//! assert_eq!(node.as_element().map(|e| e.children.len()), Some(1));
//! ```

/// Whitespace preservation mode (`xml:space`) in effect for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XmlSpace {
    /// Insignificant whitespace may be collapsed
    #[default]
    Default,
    /// All whitespace is content
    Preserve,
}

impl XmlSpace {
    /// Parse the value of an `xml:space` attribute
    pub fn from_attribute(value: &str) -> Option<Self> {
        match value.trim() {
            "preserve" => Some(XmlSpace::Preserve),
            "default" => Some(XmlSpace::Default),
            _ => None,
        }
    }
}

/// Node kinds the converter distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    CData,
    SignificantWhitespace,
    Whitespace,
}

/// A single `name="value"` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Read-only access to an element's attributes by name
pub trait AttributeLookup {
    fn attribute(&self, name: &str) -> Option<&str>;
}

/// Ordered attribute list with unique names
///
/// Encounter order is kept because style properties are emitted in the
/// order their source attributes appear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert an attribute, replacing the value of an existing one with the
    /// same name in place
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => existing.value = value,
            None => self.0.push(Attribute { name, value }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AttributeLookup for Attributes {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        attributes
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// An element of the flow document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Attributes,
    pub children: Vec<SourceNode>,
    /// Written as `<Name/>` in the source markup
    pub self_closing: bool,
    pub space: XmlSpace,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name, value);
        self
    }

    pub fn with_child(mut self, child: impl Into<SourceNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(SourceNode::Text(text.into()))
    }

    pub fn with_space(mut self, space: XmlSpace) -> Self {
        self.space = space;
        self
    }

    /// Mark the element as written in `<Name/>` form
    pub fn self_closing(mut self) -> Self {
        self.self_closing = true;
        self.children.clear();
        self
    }
}

/// A node of the source tree
#[derive(Debug, Clone, PartialEq)]
pub enum SourceNode {
    Element(Element),
    Text(String),
    CData(String),
    /// Whitespace-only text inside a preserving scope
    SignificantWhitespace(String),
    /// Whitespace-only text, emitted only when `space` is `Preserve`
    Whitespace { text: String, space: XmlSpace },
}

impl SourceNode {
    pub fn text(text: impl Into<String>) -> Self {
        SourceNode::Text(text.into())
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            SourceNode::Element(_) => NodeKind::Element,
            SourceNode::Text(_) => NodeKind::Text,
            SourceNode::CData(_) => NodeKind::CData,
            SourceNode::SignificantWhitespace(_) => NodeKind::SignificantWhitespace,
            SourceNode::Whitespace { .. } => NodeKind::Whitespace,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            SourceNode::Element(element) => Some(element),
            _ => None,
        }
    }
}

impl From<Element> for SourceNode {
    fn from(element: Element) -> Self {
        SourceNode::Element(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_keep_encounter_order() {
        let attrs: Attributes = [("Margin", "1"), ("FontSize", "12"), ("Background", "red")]
            .into_iter()
            .collect();
        let names: Vec<&str> = attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Margin", "FontSize", "Background"]);
    }

    #[test]
    fn test_attributes_insert_replaces_in_place() {
        let mut attrs = Attributes::new();
        attrs.insert("A", "1");
        attrs.insert("B", "2");
        attrs.insert("A", "3");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get("A"), Some("3"));
        assert_eq!(attrs.iter().next().map(|a| a.name.as_str()), Some("A"));
    }

    #[test]
    fn test_self_closing_drops_children() {
        let element = Element::new("LineBreak").with_text("x").self_closing();
        assert!(element.self_closing);
        assert!(element.children.is_empty());
    }

    #[test]
    fn test_xml_space_from_attribute() {
        assert_eq!(XmlSpace::from_attribute("preserve"), Some(XmlSpace::Preserve));
        assert_eq!(XmlSpace::from_attribute("default"), Some(XmlSpace::Default));
        assert_eq!(XmlSpace::from_attribute("keep"), None);
    }

    #[test]
    fn test_node_kind() {
        assert_eq!(SourceNode::text("a").kind(), NodeKind::Text);
        assert_eq!(SourceNode::CData("a".into()).kind(), NodeKind::CData);
        assert_eq!(
            SourceNode::Whitespace {
                text: " ".into(),
                space: XmlSpace::Default
            }
            .kind(),
            NodeKind::Whitespace
        );
    }
}
