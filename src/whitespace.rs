//! Leading whitespace normalization for text nodes
//!
//! Clipboard consumers collapse ordinary leading spaces and tabs, which loses
//! the indentation of pasted text. The leading run of spaces and tabs is
//! therefore rewritten as no-break spaces, with tabs expanded to the next
//! tab stop:
//!
//! ```rust
//! use flowdoc_clipboard::whitespace::{normalize_leading_whitespace, VISIBLE_SPACE};
//!
//! let out = normalize_leading_whitespace("\tX");
//! assert_eq!(out, format!("{}X", VISIBLE_SPACE.to_string().repeat(4)));
//!
//! // Text that does not start with whitespace is returned unchanged
//! assert_eq!(normalize_leading_whitespace("a\tb"), "a\tb");
//! ```

use tracing::trace;

/// Character substituted for leading spaces (U+00A0 NO-BREAK SPACE)
pub const VISIBLE_SPACE: char = '\u{00a0}';

/// Default tab stop width
pub const TAB_STOP: usize = 4;

/// Rewrite the leading run of spaces and tabs using the default tab stop
pub fn normalize_leading_whitespace(text: &str) -> String {
    expand_leading_whitespace(text, TAB_STOP)
}

/// Rewrite the leading run of spaces and tabs with a custom tab stop
///
/// Only literal `' '` and `'\t'` are rewritten. Scanning stops at the first
/// other character, including other whitespace such as newlines, and the
/// rest of the text is copied unchanged. A `tab_stop` of zero is treated
/// as one.
pub fn expand_leading_whitespace(text: &str, tab_stop: usize) -> String {
    if !text.starts_with(char::is_whitespace) {
        return text.to_string();
    }

    let tab_stop = tab_stop.max(1);
    let mut output = String::with_capacity(text.len() + 8);
    // Width of the rewritten prefix in characters
    let mut width = 0usize;
    let mut rest = text;

    for (index, ch) in text.char_indices() {
        match ch {
            ' ' => {
                output.push(VISIBLE_SPACE);
                width += 1;
            }
            '\t' => loop {
                output.push(VISIBLE_SPACE);
                width += 1;
                if width.is_multiple_of(tab_stop) {
                    break;
                }
            },
            _ => {
                rest = &text[index..];
                break;
            }
        }
        rest = &text[index + ch.len_utf8()..];
    }

    output.push_str(rest);

    if width > 0 {
        trace!(
            input = %visualize(text),
            output = %visualize(&output),
            "expanded leading whitespace"
        );
    }

    output
}

/// Render spaces, tabs and visible spaces distinguishably for diagnostics
pub fn visualize(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            ' ' => '.',
            '\t' => '→',
            VISIBLE_SPACE => '·',
            other => other,
        })
        .collect()
}
