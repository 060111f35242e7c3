//! HTML clipboard format header
//!
//! The HTML clipboard format prefixes the markup with a plain-text header of
//! byte offsets, so that paste targets can find the selected region without
//! parsing the document:
//!
//! ```text
//! Version:0.9
//! StartHTML:0000000105
//! EndHTML:0000000214
//! StartFragment:0000000141
//! EndFragment:0000000176
//! <html>
//! <body>
//! <!--StartFragment--><p style="font-weight:bold;">Hi</p><!--EndFragment-->
//! </body>
//! </html>
//! ```
//!
//! Every field is a ten digit, zero padded decimal number. `StartFragment`
//! points just past the `<!--StartFragment-->` comment and `EndFragment` at
//! the start of `<!--EndFragment-->`.
//!
//! # Offset Modes
//!
//! [`OffsetMode::Utf8Bytes`] (the default) counts UTF-8 bytes of the final
//! payload, so slicing the payload by the offsets yields exactly the
//! fragment. Each no-break space is two bytes in UTF-8, which is what makes
//! visible-space normalization matter here.
//!
//! [`OffsetMode::Legacy`] reproduces the arithmetic of older producers
//! verbatim: character indices plus one extra unit per no-break space, with
//! one unit subtracted from `EndFragment` and `EndHTML`. Use it only when a
//! consumer was tuned to those numbers.

use crate::converter::LineEnding;
use crate::error::ConversionError;
use crate::whitespace::VISIBLE_SPACE;
use tracing::debug;

/// Body of the comment opening the fragment
pub const START_FRAGMENT: &str = "StartFragment";

/// Body of the comment closing the fragment
pub const END_FRAGMENT: &str = "EndFragment";

/// Comment opening the fragment
pub const START_FRAGMENT_MARKER: &str = "<!--StartFragment-->";

/// Comment closing the fragment
pub const END_FRAGMENT_MARKER: &str = "<!--EndFragment-->";

/// Header format version written by this crate
pub const VERSION: &str = "0.9";

/// Largest value a ten digit field can hold
const MAX_OFFSET: usize = 9_999_999_999;

/// How header offsets are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetMode {
    /// Exact UTF-8 byte offsets into the payload
    #[default]
    Utf8Bytes,
    /// Offsets as computed by legacy producers, including their adjustment
    /// of one unit at the fragment end
    Legacy,
}

/// Options for building the clipboard payload
#[derive(Debug, Clone, Default)]
pub struct PayloadOptions {
    pub offset_mode: OffsetMode,
    /// Terminator of the header lines and of the payload
    pub line_ending: LineEnding,
}

/// Parsed or computed clipboard header fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardHeader {
    pub version: String,
    pub start_html: usize,
    pub end_html: usize,
    pub start_fragment: usize,
    pub end_fragment: usize,
}

impl Default for ClipboardHeader {
    fn default() -> Self {
        Self {
            version: VERSION.to_string(),
            start_html: 0,
            end_html: 0,
            start_fragment: 0,
            end_fragment: 0,
        }
    }
}

impl ClipboardHeader {
    /// Render the header lines
    ///
    /// # Errors
    ///
    /// `InvariantViolation` if an offset does not fit in ten digits.
    pub fn render(&self, line_ending: LineEnding) -> Result<String, ConversionError> {
        let newline = line_ending.as_str();
        let mut header = String::with_capacity(128);

        header.push_str("Version:");
        header.push_str(&self.version);
        header.push_str(newline);

        for (key, value) in self.fields() {
            if value > MAX_OFFSET {
                return Err(ConversionError::InvariantViolation(format!(
                    "{} offset {} does not fit in ten digits",
                    key, value
                )));
            }
            header.push_str(&format!("{}:{:010}{}", key, value, newline));
        }

        Ok(header)
    }

    /// Parse `Key:Value` header lines
    ///
    /// Unknown keys such as `SourceURL` are ignored.
    ///
    /// # Errors
    ///
    /// `ParseError` if a required field is missing or not a number.
    pub fn parse(text: &str) -> Result<Self, ConversionError> {
        let mut version = None;
        let mut start_html = None;
        let mut end_html = None;
        let mut start_fragment = None;
        let mut end_fragment = None;

        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            let slot = match key.trim() {
                "Version" => {
                    version = Some(value.to_string());
                    continue;
                }
                "StartHTML" => &mut start_html,
                "EndHTML" => &mut end_html,
                "StartFragment" => &mut start_fragment,
                "EndFragment" => &mut end_fragment,
                _ => continue,
            };
            let number = value.parse::<usize>().map_err(|_| {
                ConversionError::ParseError(format!("header field {} is not an offset: '{}'", key, value))
            })?;
            *slot = Some(number);
        }

        let required = |field: Option<usize>, key: &str| {
            field.ok_or_else(|| ConversionError::ParseError(format!("header field {} is missing", key)))
        };

        Ok(Self {
            version: version
                .ok_or_else(|| ConversionError::ParseError("header field Version is missing".to_string()))?,
            start_html: required(start_html, "StartHTML")?,
            end_html: required(end_html, "EndHTML")?,
            start_fragment: required(start_fragment, "StartFragment")?,
            end_fragment: required(end_fragment, "EndFragment")?,
        })
    }

    fn fields(&self) -> [(&'static str, usize); 4] {
        [
            ("StartHTML", self.start_html),
            ("EndHTML", self.end_html),
            ("StartFragment", self.start_fragment),
            ("EndFragment", self.end_fragment),
        ]
    }
}

/// Build the clipboard payload for an HTML fragment using default options
///
/// # Examples
///
/// ```
/// use flowdoc_clipboard::preamble::{build_clipboard_payload, parse_clipboard_payload};
///
/// let html = "<html>\r\n<body>\r\n<!--StartFragment--><b>x</b><!--EndFragment-->\r\n</body>\r\n</html>\r\n";
/// let payload = build_clipboard_payload(html).unwrap();
/// assert!(payload.starts_with("Version:0.9\r\nStartHTML:0000000105\r\n"));
///
/// let parsed = parse_clipboard_payload(&payload).unwrap();
/// assert_eq!(parsed.fragment().unwrap(), "<b>x</b>");
/// ```
pub fn build_clipboard_payload(fragment: &str) -> Result<String, ConversionError> {
    build_clipboard_payload_with(fragment, &PayloadOptions::default())
}

/// Build the clipboard payload for an HTML fragment
///
/// # Errors
///
/// `InvariantViolation` if either marker comment is missing, the end marker
/// precedes the start marker, or an offset exceeds ten digits.
pub fn build_clipboard_payload_with(
    fragment: &str,
    options: &PayloadOptions,
) -> Result<String, ConversionError> {
    let newline = options.line_ending.as_str();
    let header_len = ClipboardHeader::default().render(options.line_ending)?.len();
    let markers = locate_markers(fragment)?;

    let append_newline = match options.offset_mode {
        OffsetMode::Utf8Bytes => !fragment.ends_with('\n'),
        OffsetMode::Legacy => true,
    };

    let header = match options.offset_mode {
        OffsetMode::Utf8Bytes => {
            let payload_len = header_len + fragment.len() + if append_newline { newline.len() } else { 0 };
            ClipboardHeader {
                start_html: header_len,
                end_html: payload_len,
                start_fragment: header_len + markers.start + START_FRAGMENT_MARKER.len(),
                end_fragment: header_len + markers.end,
                ..ClipboardHeader::default()
            }
        }
        OffsetMode::Legacy => legacy_header(fragment, header_len, &markers)?,
    };

    debug!(
        mode = ?options.offset_mode,
        start_html = header.start_html,
        end_html = header.end_html,
        start_fragment = header.start_fragment,
        end_fragment = header.end_fragment,
        "computed clipboard offsets"
    );

    let mut payload = header.render(options.line_ending)?;
    payload.reserve(fragment.len() + newline.len());
    payload.push_str(fragment);
    if append_newline {
        payload.push_str(newline);
    }

    Ok(payload)
}

/// Byte positions of the two marker comments
struct MarkerPositions {
    start: usize,
    end: usize,
}

fn locate_markers(fragment: &str) -> Result<MarkerPositions, ConversionError> {
    let start = fragment.find(START_FRAGMENT_MARKER).ok_or_else(|| {
        ConversionError::InvariantViolation(format!("{} marker is missing", START_FRAGMENT))
    })?;
    let end = fragment.find(END_FRAGMENT_MARKER).ok_or_else(|| {
        ConversionError::InvariantViolation(format!("{} marker is missing", END_FRAGMENT))
    })?;

    if end < start + START_FRAGMENT_MARKER.len() {
        return Err(ConversionError::InvariantViolation(format!(
            "{} marker precedes {} marker",
            END_FRAGMENT, START_FRAGMENT
        )));
    }

    Ok(MarkerPositions { start, end })
}

/// Offsets the way legacy producers computed them
///
/// Positions are counted in UTF-16 code units and every no-break space adds
/// one extra unit. The running space count is decremented once before it is
/// applied to the fragment end.
fn legacy_header(
    fragment: &str,
    header_len: usize,
    markers: &MarkerPositions,
) -> Result<ClipboardHeader, ConversionError> {
    let units = |text: &str| text.encode_utf16().count() as i64;
    let visible_spaces = |text: &str| text.chars().filter(|ch| *ch == VISIBLE_SPACE).count() as i64;

    let header_len = header_len as i64;
    let start = units(&fragment[..markers.start]);
    let end = units(&fragment[..markers.end]);
    let marker_len = START_FRAGMENT_MARKER.len() as i64;

    let mut spaces = visible_spaces(&fragment[..markers.start]);
    let start_fragment = header_len + start + marker_len + spaces;

    spaces += visible_spaces(&fragment[markers.start + START_FRAGMENT_MARKER.len()..markers.end]);
    spaces -= 1;
    let end_fragment = header_len + end + spaces;
    let end_html = header_len + units(fragment) + spaces;

    let to_offset = |value: i64, key: &str| {
        usize::try_from(value).map_err(|_| {
            ConversionError::InvariantViolation(format!("{} offset {} is negative", key, value))
        })
    };

    Ok(ClipboardHeader {
        start_html: to_offset(header_len, "StartHTML")?,
        end_html: to_offset(end_html, "EndHTML")?,
        start_fragment: to_offset(start_fragment, "StartFragment")?,
        end_fragment: to_offset(end_fragment, "EndFragment")?,
        ..ClipboardHeader::default()
    })
}

/// A clipboard payload split into header and markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardHtml<'a> {
    pub header: ClipboardHeader,
    /// Header text exactly as it appears in the payload
    pub preamble: &'a str,
    /// Everything from the first `<` on
    pub html: &'a str,
    payload: &'a str,
}

impl<'a> ClipboardHtml<'a> {
    /// The payload slice between `StartFragment` and `EndFragment`
    ///
    /// # Errors
    ///
    /// `InvariantViolation` if the offsets fall outside the payload, are
    /// reversed, or split a UTF-8 sequence.
    pub fn fragment(&self) -> Result<&'a str, ConversionError> {
        self.slice(self.header.start_fragment, self.header.end_fragment)
    }

    /// The payload slice between `StartHTML` and `EndHTML`
    pub fn html_region(&self) -> Result<&'a str, ConversionError> {
        self.slice(self.header.start_html, self.header.end_html)
    }

    fn slice(&self, start: usize, end: usize) -> Result<&'a str, ConversionError> {
        self.payload.get(start..end).ok_or_else(|| {
            ConversionError::InvariantViolation(format!(
                "offsets {}..{} do not delimit a region of the {} byte payload",
                start,
                end,
                self.payload.len()
            ))
        })
    }
}

/// Split a clipboard payload into its header and markup
///
/// # Errors
///
/// `ParseError` if the payload does not start with a `Version:` header, has
/// no markup, or a header field is missing or malformed.
///
/// # Examples
///
/// ```
/// use flowdoc_clipboard::preamble::parse_clipboard_payload;
///
/// let payload = "Version:0.9\nStartHTML:0000000100\nEndHTML:0000000147\n\
///                StartFragment:0000000120\nEndFragment:0000000128\n\
///                <!--StartFragment--><b>x</b><!--EndFragment-->\n";
/// let parsed = parse_clipboard_payload(payload).unwrap();
/// assert_eq!(parsed.header.start_html, 100);
/// assert_eq!(parsed.fragment().unwrap(), "<b>x</b>");
/// ```
pub fn parse_clipboard_payload(payload: &str) -> Result<ClipboardHtml<'_>, ConversionError> {
    if !payload.starts_with("Version:") {
        return Err(ConversionError::ParseError(
            "payload does not start with a Version header".to_string(),
        ));
    }

    let markup_start = payload
        .find('<')
        .ok_or_else(|| ConversionError::ParseError("payload contains no markup".to_string()))?;
    let (preamble, html) = payload.split_at(markup_start);

    Ok(ClipboardHtml {
        header: ClipboardHeader::parse(preamble)?,
        preamble,
        html,
        payload,
    })
}
