//! Parse, convert and wrap in one call
//!
//! [`ClipboardHtmlConverter`] chains the parser, the HTML converter and the
//! preamble builder, so callers holding flow document markup get a payload
//! ready for the `HTML Format` clipboard entry.
//!
//! ```rust
//! use flowdoc_clipboard::pipeline::ClipboardHtmlConverter;
//! use flowdoc_clipboard::preamble::parse_clipboard_payload;
//!
//! let converter = ClipboardHtmlConverter::new();
//! let payload = converter
//!     .convert_str(r#"<Section><Paragraph FontWeight="Bold">Hi</Paragraph></Section>"#)
//!     .unwrap();
//!
//! let parsed = parse_clipboard_payload(&payload).unwrap();
//! assert_eq!(parsed.fragment().unwrap(), r#"<p style="font-weight:bold;">Hi</p>"#);
//! ```

use crate::converter::{ConversionObserver, ConversionOptions, HtmlConverter, NoopObserver};
use crate::document::SourceNode;
use crate::error::ConversionError;
use crate::parser::{parse_flow_document_str_with_max_depth, parse_flow_document_with_max_depth};
use crate::preamble::{PayloadOptions, build_clipboard_payload_with};

/// Flow document markup to HTML clipboard payload converter
#[derive(Debug, Clone, Default)]
pub struct ClipboardHtmlConverter {
    converter: HtmlConverter,
    payload_options: PayloadOptions,
}

impl ClipboardHtmlConverter {
    /// Create a converter with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a converter with custom options
    pub fn with_options(conversion: ConversionOptions, payload_options: PayloadOptions) -> Self {
        Self {
            converter: HtmlConverter::with_options(conversion),
            payload_options,
        }
    }

    pub fn conversion_options(&self) -> &ConversionOptions {
        self.converter.options()
    }

    pub fn payload_options(&self) -> &PayloadOptions {
        &self.payload_options
    }

    /// Convert markup bytes to a clipboard payload
    ///
    /// # Errors
    ///
    /// Any error of the parser, the converter or the preamble builder.
    pub fn convert(&self, markup: &[u8]) -> Result<String, ConversionError> {
        self.convert_with_observer(markup, &mut NoopObserver)
    }

    /// Convert markup text to a clipboard payload
    pub fn convert_str(&self, markup: &str) -> Result<String, ConversionError> {
        self.convert_str_with_observer(markup, &mut NoopObserver)
    }

    /// Convert markup text to a clipboard payload, reporting to `observer`
    ///
    /// The text is taken as already decoded; an `encoding` in its XML
    /// declaration is ignored.
    pub fn convert_str_with_observer(
        &self,
        markup: &str,
        observer: &mut dyn ConversionObserver,
    ) -> Result<String, ConversionError> {
        let root = self.parse_str(markup)?;
        self.payload_for(&root, observer)
    }

    /// Convert markup bytes to a clipboard payload, reporting to `observer`
    pub fn convert_with_observer(
        &self,
        markup: &[u8],
        observer: &mut dyn ConversionObserver,
    ) -> Result<String, ConversionError> {
        let root = self.parse(markup)?;
        self.payload_for(&root, observer)
    }

    /// Convert markup bytes to the HTML fragment without the header
    pub fn fragment_with_observer(
        &self,
        markup: &[u8],
        observer: &mut dyn ConversionObserver,
    ) -> Result<String, ConversionError> {
        let root = self.parse(markup)?;
        self.converter.convert_with_observer(&root, observer)
    }

    /// Convert markup text to the HTML fragment without the header
    pub fn fragment_str(&self, markup: &str) -> Result<String, ConversionError> {
        let root = self.parse_str(markup)?;
        self.converter.convert(&root)
    }

    fn parse(&self, markup: &[u8]) -> Result<SourceNode, ConversionError> {
        parse_flow_document_with_max_depth(markup, self.converter.options().max_depth)
    }

    fn parse_str(&self, markup: &str) -> Result<SourceNode, ConversionError> {
        parse_flow_document_str_with_max_depth(markup, self.converter.options().max_depth)
    }

    fn payload_for(
        &self,
        root: &SourceNode,
        observer: &mut dyn ConversionObserver,
    ) -> Result<String, ConversionError> {
        let fragment = self.converter.convert_with_observer(root, observer)?;
        build_clipboard_payload_with(&fragment, &self.payload_options)
    }
}

/// Convert flow document markup to an HTML clipboard payload with defaults
pub fn convert_flow_document_to_clipboard_html(markup: &str) -> Result<String, ConversionError> {
    ClipboardHtmlConverter::new().convert_str(markup)
}
