//! Character encoding detection and decoding for flow document input
//!
//! Flow document markup arrives as bytes from the clipboard or a file. The
//! encoding is detected with a four-level cascade before parsing:
//!
//! 1. **Byte-order mark**: UTF-8, UTF-16LE or UTF-16BE
//! 2. **UTF-16 pattern**: `<?` encoded as 16-bit units without a BOM
//! 3. **XML declaration**: `encoding="..."` in `<?xml ... ?>`
//! 4. **Default to UTF-8**
//!
//! A declaration naming UTF-16 is ignored when levels 1 and 2 found nothing,
//! since the declaration itself was then readable as single bytes.
//!
//! # Examples
//!
//! ```rust
//! use flowdoc_clipboard::charset::{detect_encoding, EncodingSource};
//!
//! let detected = detect_encoding(b"\xEF\xBB\xBF<Section/>");
//! assert_eq!(detected.source, EncodingSource::ByteOrderMark);
//! assert_eq!(detected.encoding, encoding_rs::UTF_8);
//!
//! let detected = detect_encoding(b"<?xml version=\"1.0\" encoding=\"windows-1252\"?><Section/>");
//! assert_eq!(detected.source, EncodingSource::Declaration);
//! assert_eq!(detected.encoding.name(), "windows-1252");
//!
//! let detected = detect_encoding(b"<Section/>");
//! assert_eq!(detected.source, EncodingSource::Default);
//! ```

use crate::error::ConversionError;
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Maximum bytes scanned for an XML declaration
const DECLARATION_SCAN_LIMIT: usize = 1024;

/// Where the detected encoding came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingSource {
    ByteOrderMark,
    Utf16Pattern,
    Declaration,
    Default,
}

/// Result of encoding detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedEncoding {
    pub encoding: &'static Encoding,
    pub source: EncodingSource,
    /// Length of the byte-order mark to skip before decoding
    pub bom_len: usize,
}

impl DetectedEncoding {
    fn new(encoding: &'static Encoding, source: EncodingSource) -> Self {
        Self {
            encoding,
            source,
            bom_len: 0,
        }
    }
}

/// Detect the encoding of flow document bytes
///
/// Never fails; an unknown declared encoding is reported by
/// [`decode_flow_document`] instead, so detection stays usable for
/// diagnostics.
pub fn detect_encoding(bytes: &[u8]) -> DetectedEncoding {
    // Level 1: byte-order mark
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return DetectedEncoding {
            encoding,
            source: EncodingSource::ByteOrderMark,
            bom_len,
        };
    }

    // Level 2: `<?` as UTF-16 without a BOM
    if bytes.starts_with(&[0x3C, 0x00, 0x3F, 0x00]) {
        return DetectedEncoding::new(UTF_16LE, EncodingSource::Utf16Pattern);
    }
    if bytes.starts_with(&[0x00, 0x3C, 0x00, 0x3F]) {
        return DetectedEncoding::new(UTF_16BE, EncodingSource::Utf16Pattern);
    }

    // Level 3: XML declaration
    if let Some(label) = extract_encoding_from_declaration(bytes)
        && let Some(encoding) = Encoding::for_label(label.as_bytes())
        && encoding != UTF_16LE
        && encoding != UTF_16BE
    {
        return DetectedEncoding::new(encoding, EncodingSource::Declaration);
    }

    // Level 4: default
    DetectedEncoding::new(UTF_8, EncodingSource::Default)
}

/// Extract the `encoding` pseudo-attribute of a leading XML declaration
///
/// Only the first 1024 bytes are scanned.
///
/// # Examples
///
/// ```rust
/// use flowdoc_clipboard::charset::extract_encoding_from_declaration;
///
/// assert_eq!(
///     extract_encoding_from_declaration(b"<?xml version='1.0' encoding='ISO-8859-1'?><Section/>"),
///     Some("ISO-8859-1".to_string())
/// );
/// assert_eq!(extract_encoding_from_declaration(b"<?xml version=\"1.0\"?>"), None);
/// assert_eq!(extract_encoding_from_declaration(b"<Section encoding=\"x\"/>"), None);
/// ```
pub fn extract_encoding_from_declaration(bytes: &[u8]) -> Option<String> {
    let scan_limit = std::cmp::min(bytes.len(), DECLARATION_SCAN_LIMIT);
    let prefix = String::from_utf8_lossy(&bytes[..scan_limit]);

    static DECLARATION_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    let regex = DECLARATION_REGEX.get_or_init(|| {
        Regex::new(r#"^\s*<\?xml\s[^>]*?\bencoding\s*=\s*["']([A-Za-z][A-Za-z0-9._:-]*)["']"#).ok()
    });
    let regex = regex.as_ref()?;

    regex
        .captures(&prefix)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Normalize an encoding label to uppercase
pub fn normalize_charset(charset: &str) -> String {
    charset.to_uppercase()
}

/// Decode flow document bytes to UTF-8 text
///
/// Decoding is strict: malformed sequences are an error rather than being
/// replaced with U+FFFD.
///
/// # Errors
///
/// - `EncodingError` if the declared encoding is unknown or the bytes are
///   invalid for the detected encoding
pub fn decode_flow_document(bytes: &[u8]) -> Result<Cow<'_, str>, ConversionError> {
    if let Some(label) = extract_encoding_from_declaration(bytes)
        && Encoding::for_label(label.as_bytes()).is_none()
    {
        return Err(ConversionError::EncodingError(format!(
            "Unsupported encoding '{}' in XML declaration",
            normalize_charset(&label)
        )));
    }

    let detected = detect_encoding(bytes);
    let body = &bytes[detected.bom_len..];

    if detected.encoding == UTF_8 {
        return std::str::from_utf8(body).map(Cow::Borrowed).map_err(|e| {
            ConversionError::EncodingError(format!(
                "Invalid UTF-8 at byte position {}: {}",
                e.valid_up_to() + detected.bom_len,
                e
            ))
        });
    }

    detected
        .encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or_else(|| {
            ConversionError::EncodingError(format!(
                "Invalid byte sequence for encoding '{}'",
                detected.encoding.name()
            ))
        })
}
