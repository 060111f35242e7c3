//! Flow document parser using quick-xml
//!
//! This module turns flow document markup into the [`SourceNode`] tree the
//! converter walks. The input is strict XML: mismatched or unclosed tags,
//! several root elements, and text outside the root are errors, because a
//! partially understood document must not produce a partial clipboard
//! payload.
//!
//! # Node Rules
//!
//! - `<X/>` becomes an element with `self_closing` set
//! - Adjacent text and entity references merge into one text node
//! - Predefined entities (`&amp;`, `&lt;`, ...) and numeric character
//!   references are resolved; any other entity is an error, and doctypes
//!   are skipped so no entity is ever defined
//! - Whitespace-only text inside an `xml:space="preserve"` scope becomes
//!   [`SourceNode::SignificantWhitespace`], elsewhere
//!   [`SourceNode::Whitespace`]
//! - `xml:space` is inherited by descendants
//! - Line breaks in text are normalized to `\n`
//! - Comments, processing instructions and declarations are ignored
//!
//! # Examples
//!
//! ```rust
//! use flowdoc_clipboard::document::SourceNode;
//! use flowdoc_clipboard::parser::parse_flow_document;
//!
//! let root = parse_flow_document(b"<Section><Paragraph>Fish &amp; chips</Paragraph></Section>").unwrap();
//! let section = root.as_element().unwrap();
//! let paragraph = section.children[0].as_element().unwrap();
//! assert_eq!(paragraph.children, vec![SourceNode::text("Fish & chips")]);
//!
//! assert!(parse_flow_document(b"<Section><Paragraph></Section>").is_err());
//! ```

use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::{debug, trace};

use crate::charset::decode_flow_document;
use crate::document::{Element, SourceNode, XmlSpace};
use crate::error::ConversionError;
use crate::security::{MAX_NESTING_DEPTH, SecurityValidator};

/// Parse flow document bytes into a tree
///
/// The encoding is detected as described in [`crate::charset`].
///
/// # Errors
///
/// - `InvalidInput` if the input is empty, has no root element, or nests
///   deeper than the default limit
/// - `EncodingError` if the bytes cannot be decoded
/// - `ParseError` if the markup is malformed
pub fn parse_flow_document(bytes: &[u8]) -> Result<SourceNode, ConversionError> {
    parse_flow_document_with_max_depth(bytes, MAX_NESTING_DEPTH)
}

/// Parse flow document bytes with a custom nesting limit
pub fn parse_flow_document_with_max_depth(
    bytes: &[u8],
    max_depth: usize,
) -> Result<SourceNode, ConversionError> {
    if bytes.is_empty() {
        return Err(ConversionError::InvalidInput(
            "flow document input is empty".to_string(),
        ));
    }

    let text = decode_flow_document(bytes)?;
    TreeBuilder::new(max_depth).build(&text)
}

/// Parse flow document markup that is already text
///
/// # Examples
///
/// ```rust
/// use flowdoc_clipboard::parser::parse_flow_document_str;
///
/// let root = parse_flow_document_str("<Section xml:space=\"preserve\"><Run> </Run></Section>").unwrap();
/// assert_eq!(root.as_element().map(|e| e.name.as_str()), Some("Section"));
/// ```
pub fn parse_flow_document_str(text: &str) -> Result<SourceNode, ConversionError> {
    parse_flow_document_str_with_max_depth(text, MAX_NESTING_DEPTH)
}

/// Parse flow document text with a custom nesting limit
///
/// Any `encoding` in the XML declaration is ignored, since the text is
/// already decoded.
pub fn parse_flow_document_str_with_max_depth(
    text: &str,
    max_depth: usize,
) -> Result<SourceNode, ConversionError> {
    if text.is_empty() {
        return Err(ConversionError::InvalidInput(
            "flow document input is empty".to_string(),
        ));
    }

    TreeBuilder::new(max_depth).build(text)
}

/// Builds the element tree from reader events
struct TreeBuilder {
    /// Elements whose end tag has not been seen yet
    stack: Vec<Element>,
    root: Option<Element>,
    /// Text accumulated since the last markup event
    text: String,
    text_has_reference: bool,
    validator: SecurityValidator,
}

impl TreeBuilder {
    fn new(max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            root: None,
            text: String::new(),
            text_has_reference: false,
            validator: SecurityValidator::with_max_depth(max_depth),
        }
    }

    fn build(mut self, input: &str) -> Result<SourceNode, ConversionError> {
        trace!(input_len = input.len(), "parsing flow document");

        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(false);

        loop {
            let event = reader
                .read_event()
                .map_err(|e| reader_error(e, reader.error_position()))?;

            match event {
                Event::Start(start) => {
                    self.flush_text()?;
                    let element = self.open_element(&start)?;
                    self.stack.push(element);
                }
                Event::Empty(start) => {
                    self.flush_text()?;
                    let element = self.open_element(&start)?.self_closing();
                    self.attach(element)?;
                }
                Event::End(end) => {
                    self.flush_text()?;
                    let qname = end.name();
                    let name = utf8(qname.as_ref(), "element name")?;
                    let element = self.stack.pop().ok_or_else(|| {
                        ConversionError::ParseError(format!("unexpected end tag </{}>", name))
                    })?;
                    if element.name != name {
                        return Err(ConversionError::ParseError(format!(
                            "end tag </{}> does not match <{}>",
                            name, element.name
                        )));
                    }
                    self.attach(element)?;
                }
                Event::Text(text) => {
                    let text = text
                        .decode()
                        .map_err(|e| ConversionError::ParseError(e.to_string()))?;
                    push_normalized_line_breaks(&mut self.text, &text);
                }
                Event::GeneralRef(reference) => {
                    let name = reference
                        .decode()
                        .map_err(|e| ConversionError::ParseError(e.to_string()))?;
                    self.text.push_str(&resolve_entity(&name)?);
                    self.text_has_reference = true;
                }
                Event::CData(cdata) => {
                    self.flush_text()?;
                    let text = utf8(cdata.as_ref(), "CDATA section")?;
                    self.push_node(SourceNode::CData(text.to_string()))?;
                }
                Event::Eof => break,
                // comments, processing instructions, declarations, doctypes
                _ => self.flush_text()?,
            }
        }

        self.flush_text()?;

        if let Some(open) = self.stack.last() {
            return Err(ConversionError::ParseError(format!(
                "unexpected end of input inside <{}>",
                open.name
            )));
        }

        let root = self.root.ok_or_else(|| {
            ConversionError::InvalidInput("flow document has no root element".to_string())
        })?;
        debug!(root = %root.name, children = root.children.len(), "parsed flow document");

        Ok(SourceNode::Element(root))
    }

    fn open_element(&self, start: &BytesStart<'_>) -> Result<Element, ConversionError> {
        let qname = start.name();
        let name = utf8(qname.as_ref(), "element name")?;

        if self.stack.is_empty() && self.root.is_some() {
            return Err(ConversionError::ParseError(format!(
                "second root element <{}>",
                name
            )));
        }
        self.validator.validate_depth(self.stack.len())?;

        let mut element = Element::new(name);
        element.space = self.stack.last().map(|parent| parent.space).unwrap_or_default();

        for attr in start.attributes() {
            let attr = attr.map_err(|e| {
                ConversionError::ParseError(format!("invalid attribute on <{}>: {}", name, e))
            })?;
            let key = utf8(attr.key.as_ref(), "attribute name")?;
            let value = attr.unescape_value().map_err(|e| {
                ConversionError::ParseError(format!("invalid value for {} on <{}>: {}", key, name, e))
            })?;

            if key == "xml:space" {
                element.space = XmlSpace::from_attribute(&value).ok_or_else(|| {
                    ConversionError::ParseError(format!("invalid xml:space value '{}'", value))
                })?;
            }

            element.attributes.insert(key, value.into_owned());
        }

        Ok(element)
    }

    /// Hand a finished element to its parent, or make it the root
    fn attach(&mut self, element: Element) -> Result<(), ConversionError> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(SourceNode::Element(element));
            return Ok(());
        }

        if self.root.is_some() {
            return Err(ConversionError::ParseError(format!(
                "second root element <{}>",
                element.name
            )));
        }

        self.root = Some(element);
        Ok(())
    }

    fn push_node(&mut self, node: SourceNode) -> Result<(), ConversionError> {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(node);
                Ok(())
            }
            None => Err(ConversionError::ParseError(
                "content outside the root element".to_string(),
            )),
        }
    }

    fn flush_text(&mut self) -> Result<(), ConversionError> {
        if self.text.is_empty() {
            return Ok(());
        }

        let text = std::mem::take(&mut self.text);
        let has_reference = std::mem::take(&mut self.text_has_reference);
        let whitespace_only = !has_reference && text.chars().all(is_xml_whitespace);

        let Some(parent) = self.stack.last_mut() else {
            if whitespace_only {
                return Ok(());
            }
            return Err(ConversionError::ParseError(format!(
                "text outside the root element: '{}'",
                text.trim()
            )));
        };

        let node = if !whitespace_only {
            SourceNode::Text(text)
        } else if parent.space == XmlSpace::Preserve {
            SourceNode::SignificantWhitespace(text)
        } else {
            SourceNode::Whitespace {
                text,
                space: parent.space,
            }
        };

        parent.children.push(node);
        Ok(())
    }
}

fn reader_error(error: quick_xml::Error, position: impl std::fmt::Display) -> ConversionError {
    ConversionError::ParseError(format!("{} at byte {}", error, position))
}

fn utf8<'a>(bytes: &'a [u8], what: &str) -> Result<&'a str, ConversionError> {
    std::str::from_utf8(bytes)
        .map_err(|e| ConversionError::ParseError(format!("invalid UTF-8 in {}: {}", what, e)))
}

fn is_xml_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

/// Append `text` with `\r\n` and lone `\r` replaced by `\n`
fn push_normalized_line_breaks(output: &mut String, text: &str) {
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            output.push('\n');
        } else {
            output.push(ch);
        }
    }
}

/// Resolve a predefined entity or a numeric character reference
fn resolve_entity(raw: &str) -> Result<String, ConversionError> {
    if let Some(resolved) = resolve_xml_entity(raw) {
        return Ok(resolved.into());
    }

    if let Some(rest) = raw.strip_prefix('#') {
        let code = if let Some(hex) = rest.strip_prefix('x').or_else(|| rest.strip_prefix('X')) {
            u32::from_str_radix(hex, 16).map_err(|_| {
                ConversionError::ParseError(format!("invalid character reference &#{};", rest))
            })?
        } else {
            rest.parse::<u32>().map_err(|_| {
                ConversionError::ParseError(format!("invalid character reference &#{};", rest))
            })?
        };

        let ch = char::from_u32(code).ok_or_else(|| {
            ConversionError::ParseError(format!("character reference to invalid code point {}", code))
        })?;
        return Ok(ch.to_string());
    }

    Err(ConversionError::ParseError(format!(
        "undefined entity &{};",
        raw
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NodeKind;
    use proptest::prelude::*;

    fn root_element(markup: &str) -> Element {
        match parse_flow_document_str(markup).unwrap() {
            SourceNode::Element(element) => element,
            other => panic!("root is not an element: {other:?}"),
        }
    }

    fn kinds(element: &Element) -> Vec<NodeKind> {
        element.children.iter().map(SourceNode::kind).collect()
    }

    #[test]
    fn test_parse_simple_document() {
        let root = root_element(
            r#"<Section xmlns="http://schemas.microsoft.com/winfx/2006/xaml/presentation"><Paragraph FontWeight="Bold">Hi</Paragraph></Section>"#,
        );
        assert_eq!(root.name, "Section");
        assert!(root.attributes.get("xmlns").is_some());

        let paragraph = root.children[0].as_element().unwrap();
        assert_eq!(paragraph.name, "Paragraph");
        assert_eq!(paragraph.attributes.get("FontWeight"), Some("Bold"));
        assert_eq!(paragraph.children, vec![SourceNode::text("Hi")]);
    }

    #[test]
    fn test_parse_self_closing() {
        let root = root_element("<Section><Paragraph>a<LineBreak/>b</Paragraph></Section>");
        let paragraph = root.children[0].as_element().unwrap();
        let line_break = paragraph.children[1].as_element().unwrap();
        assert!(line_break.self_closing);
        assert_eq!(kinds(paragraph), vec![NodeKind::Text, NodeKind::Element, NodeKind::Text]);
    }

    #[test]
    fn test_parse_self_closing_root() {
        let root = root_element("<Section/>");
        assert!(root.self_closing);
    }

    #[test]
    fn test_entities_merge_into_text() {
        let root = root_element("<Run>a &lt;b&gt; &#x263A;&#32;&quot;c&apos;</Run>");
        assert_eq!(root.children, vec![SourceNode::text("a <b> \u{263a} \"c'")]);
    }

    #[test]
    fn test_attribute_entities() {
        let root = root_element(r#"<Hyperlink NavigateUri="https://e.com/?a=1&amp;b=2"/>"#);
        assert_eq!(root.attributes.get("NavigateUri"), Some("https://e.com/?a=1&b=2"));
    }

    #[test]
    fn test_undefined_entity_is_error() {
        let err = parse_flow_document_str("<Run>&nbsp;</Run>").unwrap_err();
        assert_eq!(err.code(), 1);
        assert!(err.to_string().contains("nbsp"));
    }

    #[test]
    fn test_doctype_entities_are_not_expanded() {
        let markup = "<!DOCTYPE Run [<!ENTITY x \"boom\">]><Run>&x;</Run>";
        assert!(parse_flow_document_str(markup).is_err());
    }

    #[test]
    fn test_whitespace_classification() {
        let root = root_element(
            "<Section>\n  <Paragraph xml:space=\"preserve\"> <Run>  </Run></Paragraph>\n</Section>",
        );
        assert_eq!(
            kinds(&root),
            vec![NodeKind::Whitespace, NodeKind::Element, NodeKind::Whitespace]
        );

        let paragraph = root.children[1].as_element().unwrap();
        assert_eq!(paragraph.space, XmlSpace::Preserve);
        assert_eq!(
            paragraph.children[0],
            SourceNode::SignificantWhitespace(" ".to_string())
        );

        let run = paragraph.children[1].as_element().unwrap();
        assert_eq!(run.space, XmlSpace::Preserve);
        assert_eq!(kinds(run), vec![NodeKind::SignificantWhitespace]);
    }

    #[test]
    fn test_xml_space_default_resets_scope() {
        let root = root_element(
            "<Section xml:space=\"preserve\"><Paragraph xml:space=\"default\"> </Paragraph></Section>",
        );
        let paragraph = root.children[0].as_element().unwrap();
        assert_eq!(
            paragraph.children,
            vec![SourceNode::Whitespace {
                text: " ".to_string(),
                space: XmlSpace::Default
            }]
        );
    }

    #[test]
    fn test_invalid_xml_space() {
        assert!(parse_flow_document_str("<Section xml:space=\"keep\"/>").is_err());
    }

    #[test]
    fn test_whitespace_reference_is_text() {
        let root = root_element("<Run>&#32;</Run>");
        assert_eq!(root.children, vec![SourceNode::text(" ")]);
    }

    #[test]
    fn test_cdata_node() {
        let root = root_element("<Run><![CDATA[\t<b>&amp;]]></Run>");
        assert_eq!(root.children, vec![SourceNode::CData("\t<b>&amp;".to_string())]);
    }

    #[test]
    fn test_line_breaks_normalized() {
        let root = root_element("<Run>a\r\nb\rc</Run>");
        assert_eq!(root.children, vec![SourceNode::text("a\nb\nc")]);
    }

    #[test]
    fn test_comments_and_declarations_ignored() {
        let root = root_element(
            "<?xml version=\"1.0\"?>\r\n<!-- copied --><Section><?pi data?><Run>x<!-- c -->y</Run></Section>\r\n",
        );
        let run = root.children[0].as_element().unwrap();
        assert_eq!(run.children, vec![SourceNode::text("x"), SourceNode::text("y")]);
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = parse_flow_document_str("<Section><Paragraph></Section>").unwrap_err();
        assert_eq!(err.code(), 1);
    }

    #[test]
    fn test_unclosed_element() {
        let err = parse_flow_document_str("<Section><Paragraph>").unwrap_err();
        assert_eq!(err.code(), 1);
    }

    #[test]
    fn test_multiple_roots() {
        let err = parse_flow_document_str("<Section/><Section/>").unwrap_err();
        assert!(err.to_string().contains("second root"));

        let err = parse_flow_document_str("<Section></Section><Paragraph></Paragraph>").unwrap_err();
        assert_eq!(err.code(), 1);
    }

    #[test]
    fn test_text_outside_root() {
        assert!(parse_flow_document_str("stray<Section/>").is_err());
        assert!(parse_flow_document_str("<Section/>stray").is_err());
        assert!(parse_flow_document_str("  \n<Section/>\n").is_ok());
    }

    #[test]
    fn test_duplicate_attribute() {
        assert!(parse_flow_document_str(r#"<Run A="1" A="2"/>"#).is_err());
    }

    #[test]
    fn test_empty_and_rootless_input() {
        assert_eq!(parse_flow_document(b"").unwrap_err().code(), 5);
        assert_eq!(parse_flow_document_str("").unwrap_err().code(), 5);
        assert_eq!(parse_flow_document_str("  <!-- nothing -->  ").unwrap_err().code(), 5);
    }

    #[test]
    fn test_depth_limit() {
        let markup = format!("{}{}", "<Span>".repeat(5), "</Span>".repeat(5));
        assert!(parse_flow_document_with_max_depth(markup.as_bytes(), 4).is_ok());
        let err = parse_flow_document_with_max_depth(markup.as_bytes(), 3).unwrap_err();
        assert_eq!(err.code(), 5);
    }

    #[test]
    fn test_parse_utf16_input() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(
            "<?xml version=\"1.0\" encoding=\"utf-16\"?><Run>\u{4e2d}</Run>"
                .encode_utf16()
                .flat_map(|unit| unit.to_le_bytes()),
        );
        match parse_flow_document(&bytes).unwrap() {
            SourceNode::Element(run) => assert_eq!(run.children, vec![SourceNode::text("\u{4e2d}")]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_invalid_encoding() {
        assert_eq!(parse_flow_document(b"<Run>\xFF</Run>").unwrap_err().code(), 2);
    }

    #[test]
    fn test_resolve_entity() {
        assert_eq!(resolve_entity("amp").unwrap(), "&");
        assert_eq!(resolve_entity("#65").unwrap(), "A");
        assert_eq!(resolve_entity("#x41").unwrap(), "A");
        assert!(resolve_entity("#xD800").is_err());
        assert!(resolve_entity("#abc").is_err());
        assert!(resolve_entity("copy").is_err());
    }

    proptest! {
        // Malformed input must produce an error, never a panic
        #[test]
        fn prop_parser_never_panics(input in "[<>/a-zA-Z =\"'&;#!\\[\\]?-]{0,64}") {
            let _ = parse_flow_document_str(&input);
        }

        #[test]
        fn prop_text_round_trips_through_escaping(text in "[a-zA-Z0-9 <>&\"'\u{a0}\u{4e2d}]{1,32}") {
            let escaped = text
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;");
            let root = root_element(&format!("<Run>{escaped}</Run>"));
            let joined: String = root.children.iter().filter_map(|node| match node {
                SourceNode::Text(text) | SourceNode::Whitespace { text, .. } => Some(text.as_str()),
                _ => None,
            }).collect();
            prop_assert_eq!(joined, text);
        }
    }
}
