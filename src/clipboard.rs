//! Clipboard rebuild flow
//!
//! The library does not talk to an operating system clipboard itself. Hosts
//! implement [`ClipboardAccess`] (and optionally [`RtfConverter`]) and hand
//! them to [`ClipboardRebuilder`], which decides what to convert:
//!
//! 1. RTF present and an RTF converter available: RTF to flow document to
//!    HTML
//! 2. otherwise flow document (`Xaml`) present: flow document to HTML
//! 3. otherwise the clipboard is left alone
//!
//! A rebuild replaces the clipboard contents with the new `HTML Format`
//! entry plus the existing `UnicodeText` and `Text` entries. Every other
//! format is dropped, so paste targets cannot prefer the original RTF over
//! the rebuilt HTML.
//!
//! ```rust
//! use flowdoc_clipboard::clipboard::{ClipboardFormat, ClipboardRebuilder, MemoryClipboard, RebuildOutcome};
//!
//! let mut clipboard = MemoryClipboard::new()
//!     .with_text(ClipboardFormat::Xaml, "<Section><Paragraph>Hi</Paragraph></Section>")
//!     .with_text(ClipboardFormat::UnicodeText, "Hi");
//!
//! let outcome = ClipboardRebuilder::new().rebuild(&mut clipboard).unwrap();
//! assert_eq!(outcome, RebuildOutcome::ConvertedXaml);
//! assert!(clipboard.text(ClipboardFormat::Html).unwrap().starts_with("Version:0.9"));
//! assert!(clipboard.text(ClipboardFormat::Xaml).is_none());
//! ```

use std::fmt;

use tracing::debug;

use crate::converter::{ConversionObserver, NoopObserver};
use crate::error::ConversionError;
use crate::pipeline::ClipboardHtmlConverter;

/// Text formats the rebuild flow reads or writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipboardFormat {
    Html,
    Rtf,
    Xaml,
    UnicodeText,
    Text,
    CommaSeparatedValue,
}

impl ClipboardFormat {
    pub const ALL: [ClipboardFormat; 6] = [
        ClipboardFormat::Html,
        ClipboardFormat::Rtf,
        ClipboardFormat::Xaml,
        ClipboardFormat::UnicodeText,
        ClipboardFormat::Text,
        ClipboardFormat::CommaSeparatedValue,
    ];

    /// Conventional registered name of the format on Windows
    pub fn name(self) -> &'static str {
        match self {
            ClipboardFormat::Html => "HTML Format",
            ClipboardFormat::Rtf => "Rich Text Format",
            ClipboardFormat::Xaml => "Xaml",
            ClipboardFormat::UnicodeText => "UnicodeText",
            ClipboardFormat::Text => "Text",
            ClipboardFormat::CommaSeparatedValue => "CSV",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.name() == name)
    }
}

impl fmt::Display for ClipboardFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Access to a clipboard holding text formats
///
/// Implementors own any thread affinity and retry-on-lock behaviour the
/// platform requires.
pub trait ClipboardAccess {
    /// Text stored under `format`, if any
    fn read_text(&self, format: ClipboardFormat) -> Option<String>;

    /// Replace the whole clipboard contents with `entries`
    fn write_formats(&mut self, entries: &[(ClipboardFormat, String)]) -> Result<(), ConversionError>;

    /// Formats currently on the clipboard
    fn formats(&self) -> Vec<ClipboardFormat>;
}

/// Converts RTF into flow document markup
pub trait RtfConverter {
    fn rtf_to_flow_document(&self, rtf: &str) -> Result<String, ConversionError>;
}

/// What a rebuild did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    ConvertedRtf,
    ConvertedXaml,
    /// Nothing convertible was found; `formats` lists what is there
    Unchanged { formats: Vec<ClipboardFormat> },
}

/// Rewrites clipboard contents into the HTML clipboard format
#[derive(Default)]
pub struct ClipboardRebuilder {
    converter: ClipboardHtmlConverter,
    rtf_converter: Option<Box<dyn RtfConverter>>,
}

impl ClipboardRebuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_converter(converter: ClipboardHtmlConverter) -> Self {
        Self {
            converter,
            rtf_converter: None,
        }
    }

    /// Enable the RTF path
    pub fn rtf_converter(mut self, rtf_converter: impl RtfConverter + 'static) -> Self {
        self.rtf_converter = Some(Box::new(rtf_converter));
        self
    }

    /// Rebuild the clipboard contents
    ///
    /// # Errors
    ///
    /// Conversion errors, and `Clipboard` errors reported by `clipboard`.
    /// The clipboard is not written when conversion fails.
    pub fn rebuild(&self, clipboard: &mut dyn ClipboardAccess) -> Result<RebuildOutcome, ConversionError> {
        self.rebuild_with_observer(clipboard, &mut NoopObserver)
    }

    /// Rebuild the clipboard contents, reporting conversion events
    pub fn rebuild_with_observer(
        &self,
        clipboard: &mut dyn ClipboardAccess,
        observer: &mut dyn ConversionObserver,
    ) -> Result<RebuildOutcome, ConversionError> {
        if let Some(rtf_converter) = &self.rtf_converter
            && let Some(rtf) = read_non_empty(clipboard, ClipboardFormat::Rtf)
        {
            let markup = rtf_converter.rtf_to_flow_document(&rtf)?;
            let payload = self.converter.convert_str_with_observer(&markup, observer)?;
            write_rebuilt(clipboard, payload)?;
            debug!("rebuilt clipboard from RTF");
            return Ok(RebuildOutcome::ConvertedRtf);
        }

        if let Some(markup) = read_non_empty(clipboard, ClipboardFormat::Xaml) {
            let payload = self.converter.convert_str_with_observer(&markup, observer)?;
            write_rebuilt(clipboard, payload)?;
            debug!("rebuilt clipboard from flow document");
            return Ok(RebuildOutcome::ConvertedXaml);
        }

        let formats = clipboard.formats();
        debug!(?formats, "nothing to convert on clipboard");
        Ok(RebuildOutcome::Unchanged { formats })
    }
}

fn read_non_empty(clipboard: &dyn ClipboardAccess, format: ClipboardFormat) -> Option<String> {
    clipboard.read_text(format).filter(|text| !text.is_empty())
}

fn write_rebuilt(clipboard: &mut dyn ClipboardAccess, payload: String) -> Result<(), ConversionError> {
    let mut entries = vec![(ClipboardFormat::Html, payload)];
    for format in [ClipboardFormat::UnicodeText, ClipboardFormat::Text] {
        if let Some(text) = clipboard.read_text(format) {
            entries.push((format, text));
        }
    }
    clipboard.write_formats(&entries)
}

/// In-process clipboard
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    entries: Vec<(ClipboardFormat, String)>,
    locked: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, format: ClipboardFormat, text: impl Into<String>) -> Self {
        self.set_text(format, text);
        self
    }

    pub fn set_text(&mut self, format: ClipboardFormat, text: impl Into<String>) {
        let text = text.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == format) {
            Some(entry) => entry.1 = text,
            None => self.entries.push((format, text)),
        }
    }

    pub fn text(&self, format: ClipboardFormat) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == format)
            .map(|(_, text)| text.as_str())
    }

    /// Make writes fail the way a clipboard held by another process does
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }
}

impl ClipboardAccess for MemoryClipboard {
    fn read_text(&self, format: ClipboardFormat) -> Option<String> {
        self.text(format).map(str::to_string)
    }

    fn write_formats(&mut self, entries: &[(ClipboardFormat, String)]) -> Result<(), ConversionError> {
        if self.locked {
            return Err(ConversionError::Clipboard(
                "clipboard is locked by another process".to_string(),
            ));
        }
        self.entries = entries.to_vec();
        Ok(())
    }

    fn formats(&self) -> Vec<ClipboardFormat> {
        self.entries.iter().map(|(format, _)| *format).collect()
    }
}
