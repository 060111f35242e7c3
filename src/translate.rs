//! Element name and attribute translation tables
//!
//! Both tables are fixed lookups keyed by the flow document vocabulary.
//!
//! # Element Names
//!
//! | Flow document                          | HTML    |
//! |----------------------------------------|---------|
//! | `InlineUIContainer`, `Span`, `Run`     | `span`  |
//! | `Bold` / `Italic`                      | `b` / `i` |
//! | `Paragraph`                            | `p`     |
//! | `BlockUIContainer`, `Section`          | `div`   |
//! | `Table`, `TableColumn`                 | `table`, `col` |
//! | `TableRowGroup`, `TableRow`, `TableCell` | `tbody`, `tr`, `td` |
//! | `List`                                 | `ul` or `ol` by `MarkerStyle` |
//! | `ListItem`                             | `li`    |
//! | `Hyperlink`                            | `a`     |
//!
//! # Attributes
//!
//! Formatting attributes become inline CSS properties, accumulated in
//! encounter order into a single `style` attribute. Link and table span
//! attributes map directly onto HTML attributes. Everything else is dropped.

use crate::document::{Attribute, AttributeLookup, Attributes};
use crate::values::{translate_color, translate_size};

/// Flow document elements that have an HTML counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowElement {
    InlineUIContainer,
    Span,
    Run,
    Bold,
    Italic,
    Paragraph,
    BlockUIContainer,
    Section,
    Table,
    TableColumn,
    TableRowGroup,
    TableRow,
    TableCell,
    List,
    ListItem,
    Hyperlink,
}

/// `MarkerStyle` values rendered as bullets rather than numbers
const UNORDERED_MARKER_STYLES: &[&str] = &["None", "Disc", "Circle", "Square", "Box"];

impl FlowElement {
    pub fn from_name(name: &str) -> Option<Self> {
        let element = match name {
            "InlineUIContainer" => FlowElement::InlineUIContainer,
            "Span" => FlowElement::Span,
            "Run" => FlowElement::Run,
            "Bold" => FlowElement::Bold,
            "Italic" => FlowElement::Italic,
            "Paragraph" => FlowElement::Paragraph,
            "BlockUIContainer" => FlowElement::BlockUIContainer,
            "Section" => FlowElement::Section,
            "Table" => FlowElement::Table,
            "TableColumn" => FlowElement::TableColumn,
            "TableRowGroup" => FlowElement::TableRowGroup,
            "TableRow" => FlowElement::TableRow,
            "TableCell" => FlowElement::TableCell,
            "List" => FlowElement::List,
            "ListItem" => FlowElement::ListItem,
            "Hyperlink" => FlowElement::Hyperlink,
            _ => return None,
        };
        Some(element)
    }

    /// HTML tag for this element
    ///
    /// Only `List` consults its attributes: a missing `MarkerStyle` or a
    /// bullet style gives `ul`, any numbering style gives `ol`.
    pub fn html_tag<A: AttributeLookup + ?Sized>(self, attributes: &A) -> &'static str {
        match self {
            FlowElement::InlineUIContainer | FlowElement::Span | FlowElement::Run => "span",
            FlowElement::Bold => "b",
            FlowElement::Italic => "i",
            FlowElement::Paragraph => "p",
            FlowElement::BlockUIContainer | FlowElement::Section => "div",
            FlowElement::Table => "table",
            FlowElement::TableColumn => "col",
            FlowElement::TableRowGroup => "tbody",
            FlowElement::TableRow => "tr",
            FlowElement::TableCell => "td",
            FlowElement::List => match attributes.attribute("MarkerStyle") {
                None => "ul",
                Some(style) if UNORDERED_MARKER_STYLES.contains(&style) => "ul",
                Some(_) => "ol",
            },
            FlowElement::ListItem => "li",
            FlowElement::Hyperlink => "a",
        }
    }
}

/// Translate a flow document element name to an HTML tag name
///
/// Returns `None` when the element has no HTML mapping.
///
/// # Examples
///
/// ```
/// use flowdoc_clipboard::document::Attributes;
/// use flowdoc_clipboard::translate::translate_element_name;
///
/// let none = Attributes::new();
/// assert_eq!(translate_element_name("Paragraph", &none), Some("p"));
/// assert_eq!(translate_element_name("List", &none), Some("ul"));
///
/// let decimal: Attributes = [("MarkerStyle", "Decimal")].into_iter().collect();
/// assert_eq!(translate_element_name("List", &decimal), Some("ol"));
///
/// assert_eq!(translate_element_name("Figure", &none), None);
/// ```
pub fn translate_element_name<A: AttributeLookup + ?Sized>(
    name: &str,
    attributes: &A,
) -> Option<&'static str> {
    FlowElement::from_name(name).map(|element| element.html_tag(attributes))
}

/// How an attribute value is rewritten before it lands in CSS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueConversion {
    /// Pass through unmodified
    Verbatim,
    /// ASCII and Unicode lowercase
    Lowercase,
    /// Wrap in single quotes
    Quoted,
    /// `#AARRGGBB` to `#RRGGBB`
    Color,
    /// Comma separated lengths with the given unit
    Size(&'static str),
    /// `Strikethrough` to `line-through`, anything else to `underline`
    TextDecoration,
}

impl ValueConversion {
    pub fn apply(self, value: &str) -> String {
        match self {
            ValueConversion::Verbatim => value.to_string(),
            ValueConversion::Lowercase => value.to_lowercase(),
            ValueConversion::Quoted => format!("'{}'", value),
            ValueConversion::Color => translate_color(value),
            ValueConversion::Size(unit) => translate_size(value, unit),
            ValueConversion::TextDecoration => {
                if value.to_lowercase() == "strikethrough" {
                    "line-through".to_string()
                } else {
                    "underline".to_string()
                }
            }
        }
    }
}

/// Where a flow document attribute goes in the HTML output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeRoute {
    /// Inline CSS property
    Style {
        property: &'static str,
        conversion: ValueConversion,
    },
    /// HTML attribute with the value copied unchanged
    Direct(&'static str),
}

impl AttributeRoute {
    /// Look up the route for an attribute name; `None` means the attribute
    /// is dropped
    pub fn for_attribute(name: &str) -> Option<Self> {
        use ValueConversion::*;

        let style = |property, conversion| AttributeRoute::Style {
            property,
            conversion,
        };

        let route = match name {
            // character formatting
            "Background" => style("background-color", Color),
            "FontFamily" => style("font-family", Quoted),
            "FontStyle" => style("font-style", Lowercase),
            "FontWeight" => style("font-weight", Lowercase),
            "FontSize" => style("font-size", Size("pt")),
            "Foreground" => style("color", Color),
            "TextDecorations" => style("text-decoration", TextDecoration),

            // paragraph and box formatting
            "Padding" => style("padding", Size("px")),
            "Margin" => style("margin", Size("px")),
            "BorderThickness" => style("border-width", Size("px")),
            "BorderBrush" => style("border-color", Color),
            "TextIndent" => style("text-indent", Verbatim),
            "TextAlignment" => style("text-align", Lowercase),
            "Width" => style("width", Verbatim),

            // hyperlink and table attributes
            "NavigateUri" => AttributeRoute::Direct("href"),
            "TargetName" => AttributeRoute::Direct("target"),
            "ColumnSpan" => AttributeRoute::Direct("colspan"),
            "RowSpan" => AttributeRoute::Direct("rowspan"),

            _ => return None,
        };

        Some(route)
    }
}

/// Ordered list of `property:value;` entries for one element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleAccumulator {
    entries: Vec<String>,
}

impl StyleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, property: &str, value: &str) {
        self.entries.push(format!("{}:{};", property, value));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Collapse into the value of a `style` attribute
    pub fn into_style(self) -> String {
        self.entries.concat()
    }
}

/// Result of translating one element's attributes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslatedAttributes {
    /// Directly mapped HTML attributes, in encounter order
    pub mapped: Vec<Attribute>,
    /// Accumulated inline style, empty when no style attribute is needed
    pub style: String,
}

impl TranslatedAttributes {
    /// Attributes in output order: mapped attributes, then `style` if any
    pub fn into_html_attributes(self) -> Vec<Attribute> {
        let mut attributes = self.mapped;
        if !self.style.is_empty() {
            attributes.push(Attribute::new("style", self.style));
        }
        attributes
    }
}

/// Translate flow document attributes into HTML attributes and inline style
///
/// # Examples
///
/// ```
/// use flowdoc_clipboard::document::Attributes;
/// use flowdoc_clipboard::translate::translate_attributes;
///
/// let attrs: Attributes = [
///     ("NavigateUri", "https://example.com"),
///     ("FontWeight", "Bold"),
///     ("Foreground", "#FF0000FF"),
///     ("Tag", "ignored"),
/// ]
/// .into_iter()
/// .collect();
///
/// let translated = translate_attributes(&attrs);
/// assert_eq!(translated.mapped[0].name, "href");
/// assert_eq!(translated.style, "font-weight:bold;color:#0000FF;");
/// ```
pub fn translate_attributes(attributes: &Attributes) -> TranslatedAttributes {
    let mut mapped = Vec::new();
    let mut styles = StyleAccumulator::new();

    for attr in attributes {
        match AttributeRoute::for_attribute(&attr.name) {
            Some(AttributeRoute::Style {
                property,
                conversion,
            }) => styles.push(property, &conversion.apply(&attr.value)),
            Some(AttributeRoute::Direct(html_name)) => {
                mapped.push(Attribute::new(html_name, attr.value.clone()))
            }
            None => {}
        }
    }

    TranslatedAttributes {
        mapped,
        style: styles.into_style(),
    }
}
