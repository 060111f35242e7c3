//! Flow document to HTML clipboard format conversion
//!
//! This library turns flow document markup (the `Xaml` clipboard format
//! written by rich text editors) into the `HTML Format` clipboard payload
//! that browsers, mail clients and office suites paste from.
//!
//! # Architecture
//!
//! The library is structured into several modules:
//! - `charset`: encoding detection for raw markup bytes
//! - `parser`: flow document markup to a [`document::SourceNode`] tree via quick-xml
//! - `document`: the source tree model
//! - `whitespace`: leading whitespace normalization
//! - `values`: color and font size value conversion
//! - `translate`: element and attribute mapping to HTML
//! - `writer`: well-formed HTML output
//! - `converter`: HTML document generation from the source tree
//! - `preamble`: the clipboard header with byte offsets
//! - `pipeline`: parse, convert and wrap in one call
//! - `clipboard`: the clipboard rebuild flow over host-provided access
//! - `security`: nesting limits and link scheme filtering
//! - `ffi`: C-compatible interface for native clipboard hosts
//!
//! # Example
//!
//! ```rust
//! use flowdoc_clipboard::convert_flow_document_to_clipboard_html;
//!
//! let payload = convert_flow_document_to_clipboard_html(
//!     "<Section><Paragraph>Hello</Paragraph></Section>",
//! )
//! .unwrap();
//! assert!(payload.starts_with("Version:0.9\r\nStartHTML:0000000105\r\n"));
//! assert!(payload.contains("<!--StartFragment--><p>Hello</p><!--EndFragment-->"));
//! ```
//!
//! # Safety
//!
//! All FFI functions are marked `unsafe` and include safety documentation.
//! Memory allocated by Rust must be freed by Rust via the provided cleanup
//! functions.

// Module declarations
pub mod charset;
pub mod clipboard;
pub mod converter;
pub mod document;
pub mod error;
pub mod ffi;
pub mod parser;
pub mod pipeline;
pub mod preamble;
pub mod security;
pub mod translate;
pub mod values;
pub mod whitespace;
pub mod writer;

// Re-export main types for convenience
pub use clipboard::{ClipboardAccess, ClipboardFormat, ClipboardRebuilder, RebuildOutcome};
pub use converter::{ConversionOptions, HtmlConverter, convert_markup_to_html_fragment};
pub use document::{Element, SourceNode};
pub use error::{ConversionError, ConversionWarning};
pub use ffi::{ClipboardHtmlResult, FlowDocOptions};
pub use parser::parse_flow_document;
pub use pipeline::{ClipboardHtmlConverter, convert_flow_document_to_clipboard_html};
pub use preamble::{build_clipboard_payload, parse_clipboard_payload};
