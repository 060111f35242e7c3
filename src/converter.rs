//! Flow document to HTML converter
//!
//! This module walks a [`SourceNode`] tree and writes the equivalent HTML,
//! wrapped in the minimal skeleton the HTML clipboard format expects:
//!
//! ```text
//! <html>
//! <body>
//! <!--StartFragment-->...translated subtree...<!--EndFragment-->
//! </body>
//! </html>
//! ```
//!
//! # Conversion Strategy
//!
//! The tree is traversed depth-first, left to right. For each node:
//!
//! - **Elements**: the name goes through the element translator and, when the
//!   source element has attributes, the attribute translator writes the
//!   mapped attributes and the inline `style`. Self-closing elements
//!   (`<LineBreak/>`) are skipped entirely.
//! - **Text, CDATA, significant whitespace**: leading spaces and tabs are
//!   rewritten to visible spaces, then the text is written escaped.
//! - **Insignificant whitespace**: written only inside an
//!   `xml:space="preserve"` scope.
//!
//! The outer container of the document (usually a `Section`) is not
//! translated; only its children land between the fragment markers. Set
//! [`ConversionOptions::include_root`] to translate it too.
//!
//! # Unmapped Elements
//!
//! Elements with no HTML counterpart are handled by
//! [`UnmappedElementPolicy`]. The default drops the element's own tags but
//! keeps converting its children, so inline content of unknown containers
//! survives.
//!
//! # Example
//!
//! ```rust
//! use flowdoc_clipboard::converter::HtmlConverter;
//! use flowdoc_clipboard::document::{Element, SourceNode};
//!
//! let root = SourceNode::from(
//!     Element::new("Section")
//!         .with_child(Element::new("Paragraph").with_attribute("FontWeight", "Bold").with_text("Hi")),
//! );
//!
//! let html = HtmlConverter::new().convert(&root).unwrap();
//! assert!(html.contains(r#"<!--StartFragment--><p style="font-weight:bold;">Hi</p><!--EndFragment-->"#));
//! ```

use crate::document::{Element, NodeKind, SourceNode, XmlSpace};
use crate::error::{ConversionError, ConversionWarning};
use crate::preamble::{END_FRAGMENT, START_FRAGMENT};
use crate::security::{MAX_NESTING_DEPTH, SecurityValidator};
use crate::translate::{translate_attributes, translate_element_name};
use crate::whitespace::{TAB_STOP, expand_leading_whitespace, visualize};
use crate::writer::HtmlWriter;
use tracing::{debug, trace};

/// What to do with an element that has no HTML mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmappedElementPolicy {
    /// Omit the element's tags, convert its children in place
    #[default]
    SkipAndRecurse,
    /// Omit the element and everything inside it
    DropSubtree,
    /// Abort the conversion with [`ConversionError::UnmappedElement`]
    Error,
}

/// Line terminator used for the skeleton and the clipboard header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// `\r\n`, as Windows clipboard producers write it
    #[default]
    CrLf,
    /// `\n`
    Lf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::CrLf => "\r\n",
            LineEnding::Lf => "\n",
        }
    }
}

/// Conversion options
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Handling of elements without an HTML mapping
    pub unmapped_elements: UnmappedElementPolicy,
    /// Line terminator of the `<html>`/`<body>` skeleton
    pub line_ending: LineEnding,
    /// Translate the outer container element as well as its children
    pub include_root: bool,
    /// Tab stop used when expanding leading tabs
    pub tab_stop: usize,
    /// Remove `href` values with scripting or local-resource schemes
    pub sanitize_urls: bool,
    /// Maximum element nesting depth
    pub max_depth: usize,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            unmapped_elements: UnmappedElementPolicy::SkipAndRecurse,
            line_ending: LineEnding::CrLf,
            include_root: false,
            tab_stop: TAB_STOP,
            sanitize_urls: true,
            max_depth: MAX_NESTING_DEPTH,
        }
    }
}

/// Callbacks invoked while converting
///
/// All methods default to doing nothing, so observers implement only what
/// they need.
pub trait ConversionObserver {
    /// An element was entered; `target` is `None` for unmapped elements
    fn on_element_start(&mut self, _source: &str, _target: Option<&str>, _has_attributes: bool) {}

    /// An element was left
    fn on_element_end(&mut self, _source: &str, _target: Option<&str>) {}

    /// Text was written, after leading whitespace normalization
    fn on_text(&mut self, _kind: NodeKind, _text: &str) {}

    /// A non-fatal condition occurred
    fn on_warning(&mut self, _warning: &ConversionWarning) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ConversionObserver for NoopObserver {}

/// Observer that keeps every warning
#[derive(Debug, Clone, Default)]
pub struct WarningCollector {
    warnings: Vec<ConversionWarning>,
}

impl WarningCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> &[ConversionWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<ConversionWarning> {
        self.warnings
    }
}

impl ConversionObserver for WarningCollector {
    fn on_warning(&mut self, warning: &ConversionWarning) {
        self.warnings.push(warning.clone());
    }
}

/// How an open element is finished once its children are written
#[derive(Debug, Clone, Copy)]
enum CloseAction {
    /// Write the end tag
    EndTag(&'static str),
    /// Report the end of an unmapped element, no tag to write
    Unmapped,
    /// Skipped document container
    Nothing,
}

/// An element whose children are being converted
#[derive(Debug)]
struct OpenElement<'a> {
    element: &'a Element,
    depth: usize,
    next_child: usize,
    close: CloseAction,
}

/// Flow document to HTML fragment converter
#[derive(Debug, Clone)]
pub struct HtmlConverter {
    options: ConversionOptions,
    security_validator: SecurityValidator,
}

impl HtmlConverter {
    /// Create a converter with default options
    pub fn new() -> Self {
        Self::with_options(ConversionOptions::default())
    }

    /// Create a converter with custom options
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flowdoc_clipboard::converter::{ConversionOptions, HtmlConverter, LineEnding, UnmappedElementPolicy};
    ///
    /// let converter = HtmlConverter::with_options(ConversionOptions {
    ///     unmapped_elements: UnmappedElementPolicy::Error,
    ///     line_ending: LineEnding::Lf,
    ///     ..Default::default()
    /// });
    /// assert_eq!(converter.options().line_ending, LineEnding::Lf);
    /// ```
    pub fn with_options(options: ConversionOptions) -> Self {
        let security_validator =
            SecurityValidator::with_max_depth(options.max_depth).sanitize_urls(options.sanitize_urls);
        Self {
            options,
            security_validator,
        }
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Convert a document tree to an HTML fragment with fragment markers
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `root` is not an element or nests too deeply
    /// - `UnmappedElement` under [`UnmappedElementPolicy::Error`]
    pub fn convert(&self, root: &SourceNode) -> Result<String, ConversionError> {
        self.convert_with_observer(root, &mut NoopObserver)
    }

    /// Convert a document tree, reporting progress to `observer`
    pub fn convert_with_observer(
        &self,
        root: &SourceNode,
        observer: &mut dyn ConversionObserver,
    ) -> Result<String, ConversionError> {
        let root = root.as_element().ok_or_else(|| {
            ConversionError::InvalidInput("document root must be an element".to_string())
        })?;

        let newline = self.options.line_ending.as_str();
        let mut writer = HtmlWriter::with_capacity(256);

        writer.raw("<html>");
        writer.raw(newline);
        writer.raw("<body>");
        writer.raw(newline);
        writer.comment(START_FRAGMENT);

        self.convert_tree(root, &mut writer, observer)?;

        writer.comment(END_FRAGMENT);
        writer.raw(newline);
        writer.raw("</body>");
        writer.raw(newline);
        writer.raw("</html>");
        writer.raw(newline);

        writer.finish()
    }

    /// Walk the tree depth-first with an explicit stack of open elements
    ///
    /// Each frame remembers the next child to visit, so nesting depth costs
    /// heap memory instead of call stack.
    fn convert_tree<'a>(
        &self,
        root: &'a Element,
        writer: &mut HtmlWriter,
        observer: &mut dyn ConversionObserver,
    ) -> Result<(), ConversionError> {
        let mut stack: Vec<OpenElement<'a>> = Vec::new();

        if self.options.include_root {
            if let Some(open) = self.enter_element(root, 0, writer, observer)? {
                stack.push(open);
            }
        } else {
            trace!(root = %root.name, "skipping document container");
            stack.push(OpenElement {
                element: root,
                depth: 0,
                next_child: 0,
                close: CloseAction::Nothing,
            });
        }

        while let Some(open) = stack.last_mut() {
            let element = open.element;
            let Some(child) = element.children.get(open.next_child) else {
                if let Some(open) = stack.pop() {
                    self.leave_element(open, writer, observer)?;
                }
                continue;
            };
            open.next_child += 1;
            let depth = open.depth + 1;

            match child {
                SourceNode::Element(element) => {
                    if let Some(open) = self.enter_element(element, depth, writer, observer)? {
                        stack.push(open);
                    }
                }
                SourceNode::Text(text)
                | SourceNode::CData(text)
                | SourceNode::SignificantWhitespace(text) => {
                    self.write_text(child.kind(), text, writer, observer);
                }
                SourceNode::Whitespace { text, space } => {
                    if *space == XmlSpace::Preserve {
                        self.write_text(NodeKind::Whitespace, text, writer, observer);
                    }
                }
            }
        }

        Ok(())
    }

    /// Write the start of `element`; returns the frame to push when its
    /// children must be visited
    fn enter_element<'a>(
        &self,
        element: &'a Element,
        depth: usize,
        writer: &mut HtmlWriter,
        observer: &mut dyn ConversionObserver,
    ) -> Result<Option<OpenElement<'a>>, ConversionError> {
        self.security_validator.validate_depth(depth)?;

        if element.self_closing {
            trace!(element = %element.name, "skipping empty element");
            return Ok(None);
        }

        let has_attributes = !element.attributes.is_empty();

        let Some(tag) = translate_element_name(&element.name, &element.attributes) else {
            return self.enter_unmapped(element, depth, observer);
        };

        trace!(element = %element.name, tag, has_attributes, "element start");
        observer.on_element_start(&element.name, Some(tag), has_attributes);

        writer.start_element(tag);
        if has_attributes {
            self.write_attributes(element, writer, observer)?;
        }

        Ok(Some(OpenElement {
            element,
            depth,
            next_child: 0,
            close: CloseAction::EndTag(tag),
        }))
    }

    fn enter_unmapped<'a>(
        &self,
        element: &'a Element,
        depth: usize,
        observer: &mut dyn ConversionObserver,
    ) -> Result<Option<OpenElement<'a>>, ConversionError> {
        let policy = self.options.unmapped_elements;
        if policy == UnmappedElementPolicy::Error {
            return Err(ConversionError::UnmappedElement(element.name.clone()));
        }

        debug!(element = %element.name, ?policy, "element has no HTML mapping");
        observer.on_warning(&ConversionWarning::UnmappedElement {
            name: element.name.clone(),
        });

        if policy == UnmappedElementPolicy::DropSubtree {
            return Ok(None);
        }

        observer.on_element_start(&element.name, None, !element.attributes.is_empty());
        Ok(Some(OpenElement {
            element,
            depth,
            next_child: 0,
            close: CloseAction::Unmapped,
        }))
    }

    fn leave_element(
        &self,
        open: OpenElement<'_>,
        writer: &mut HtmlWriter,
        observer: &mut dyn ConversionObserver,
    ) -> Result<(), ConversionError> {
        let name = &open.element.name;
        match open.close {
            CloseAction::EndTag(tag) => {
                writer.end_element()?;
                trace!(element = %name, tag, "element end");
                observer.on_element_end(name, Some(tag));
            }
            CloseAction::Unmapped => observer.on_element_end(name, None),
            CloseAction::Nothing => {}
        }
        Ok(())
    }

    fn write_attributes(
        &self,
        element: &Element,
        writer: &mut HtmlWriter,
        observer: &mut dyn ConversionObserver,
    ) -> Result<(), ConversionError> {
        let translated = translate_attributes(&element.attributes);

        for attr in translated.into_html_attributes() {
            if !self.security_validator.allows_attribute(&attr.name, &attr.value) {
                debug!(element = %element.name, attribute = %attr.name, value = %attr.value, "removed unsafe URL");
                observer.on_warning(&ConversionWarning::UnsafeUrlRemoved {
                    attribute: attr.name,
                    value: attr.value,
                });
                continue;
            }
            writer.attribute(&attr.name, &attr.value)?;
        }

        Ok(())
    }

    fn write_text(
        &self,
        kind: NodeKind,
        text: &str,
        writer: &mut HtmlWriter,
        observer: &mut dyn ConversionObserver,
    ) {
        let normalized = expand_leading_whitespace(text, self.options.tab_stop);
        trace!(?kind, text = %visualize(&normalized), "text");
        observer.on_text(kind, &normalized);
        writer.text(&normalized);
    }
}

impl Default for HtmlConverter {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a document tree to an HTML fragment using default options
///
/// # Examples
///
/// ```rust
/// use flowdoc_clipboard::converter::convert_markup_to_html_fragment;
/// use flowdoc_clipboard::parser::parse_flow_document_str;
///
/// let root = parse_flow_document_str("<Section><Paragraph>Hello</Paragraph></Section>").unwrap();
/// let html = convert_markup_to_html_fragment(&root).unwrap();
/// assert!(html.starts_with("<html>\r\n<body>\r\n"));
/// assert!(html.contains("<p>Hello</p>"));
/// ```
pub fn convert_markup_to_html_fragment(root: &SourceNode) -> Result<String, ConversionError> {
    HtmlConverter::new().convert(root)
}
