//! Streaming HTML writer
//!
//! The converter drives the writer with start/attribute/text/end events, the
//! same shape as a pull reader produces. Attributes may only be written while
//! the start tag is still open, i.e. before any child content. Every element
//! gets an explicit end tag (`<p></p>`, never `<p />`) since the HTML
//! clipboard consumers do not all accept void syntax on normal elements.
//!
//! ```rust
//! use flowdoc_clipboard::writer::HtmlWriter;
//!
//! let mut writer = HtmlWriter::new();
//! writer.start_element("p");
//! writer.attribute("style", "font-weight:bold;").unwrap();
//! writer.text("a < b");
//! writer.end_element().unwrap();
//! assert_eq!(writer.finish().unwrap(), r#"<p style="font-weight:bold;">a &lt; b</p>"#);
//! ```

use crate::error::ConversionError;

/// Streaming writer producing balanced HTML
#[derive(Debug, Default)]
pub struct HtmlWriter {
    output: String,
    open: Vec<&'static str>,
    start_tag_open: bool,
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            output: String::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Number of elements currently open
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Open an element
    pub fn start_element(&mut self, tag: &'static str) {
        self.close_start_tag();
        self.output.push('<');
        self.output.push_str(tag);
        self.open.push(tag);
        self.start_tag_open = true;
    }

    /// Add an attribute to the element opened last
    ///
    /// # Errors
    ///
    /// `InvariantViolation` if content has already been written inside the
    /// element or no element is open.
    pub fn attribute(&mut self, name: &str, value: &str) -> Result<(), ConversionError> {
        if !self.start_tag_open {
            return Err(ConversionError::InvariantViolation(format!(
                "attribute '{}' written outside a start tag",
                name
            )));
        }
        self.output.push(' ');
        self.output.push_str(name);
        self.output.push_str("=\"");
        escape_into(&mut self.output, value, true);
        self.output.push('"');
        Ok(())
    }

    /// Write escaped text content
    pub fn text(&mut self, text: &str) {
        self.close_start_tag();
        escape_into(&mut self.output, text, false);
    }

    /// Write a comment; `--` inside the body is not escaped
    pub fn comment(&mut self, body: &str) {
        self.close_start_tag();
        self.output.push_str("<!--");
        self.output.push_str(body);
        self.output.push_str("-->");
    }

    /// Write markup verbatim
    pub fn raw(&mut self, markup: &str) {
        self.close_start_tag();
        self.output.push_str(markup);
    }

    /// Close the element opened last
    ///
    /// # Errors
    ///
    /// `InvariantViolation` when no element is open.
    pub fn end_element(&mut self) -> Result<(), ConversionError> {
        self.close_start_tag();
        let tag = self.open.pop().ok_or_else(|| {
            ConversionError::InvariantViolation("end tag without matching start tag".to_string())
        })?;
        self.output.push_str("</");
        self.output.push_str(tag);
        self.output.push('>');
        Ok(())
    }

    /// Return the written markup
    ///
    /// # Errors
    ///
    /// `InvariantViolation` while elements remain open.
    pub fn finish(mut self) -> Result<String, ConversionError> {
        if !self.open.is_empty() {
            return Err(ConversionError::InvariantViolation(format!(
                "{} element(s) left open: {}",
                self.open.len(),
                self.open.join(", ")
            )));
        }
        self.close_start_tag();
        Ok(self.output)
    }

    fn close_start_tag(&mut self) {
        if self.start_tag_open {
            self.output.push('>');
            self.start_tag_open = false;
        }
    }
}

/// Escape `&`, `<`, `>` and, inside attribute values, `"`
fn escape_into(output: &mut String, text: &str, attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' if attribute => output.push_str("&quot;"),
            _ => output.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_elements_close_in_reverse_order() {
        let mut writer = HtmlWriter::new();
        writer.start_element("table");
        writer.start_element("tbody");
        writer.start_element("tr");
        assert_eq!(writer.depth(), 3);
        writer.end_element().unwrap();
        writer.end_element().unwrap();
        writer.end_element().unwrap();
        assert_eq!(
            writer.finish().unwrap(),
            "<table><tbody><tr></tr></tbody></table>"
        );
    }

    #[test]
    fn test_empty_element_gets_full_end_tag() {
        let mut writer = HtmlWriter::new();
        writer.start_element("p");
        writer.end_element().unwrap();
        assert_eq!(writer.finish().unwrap(), "<p></p>");
    }

    #[test]
    fn test_attribute_escaping() {
        let mut writer = HtmlWriter::new();
        writer.start_element("a");
        writer
            .attribute("href", "https://example.com/?q=\"x\"&y=<1>")
            .unwrap();
        writer.end_element().unwrap();
        assert_eq!(
            writer.finish().unwrap(),
            "<a href=\"https://example.com/?q=&quot;x&quot;&amp;y=&lt;1&gt;\"></a>"
        );
    }

    #[test]
    fn test_text_keeps_quotes() {
        let mut writer = HtmlWriter::new();
        writer.text("\"quoted\" & <tagged>");
        assert_eq!(writer.finish().unwrap(), "\"quoted\" &amp; &lt;tagged&gt;");
    }

    #[test]
    fn test_attribute_after_content_is_rejected() {
        let mut writer = HtmlWriter::new();
        writer.start_element("p");
        writer.text("x");
        let err = writer.attribute("style", "color:red;").unwrap_err();
        assert_eq!(err.code(), 7);
    }

    #[test]
    fn test_attribute_without_element_is_rejected() {
        let mut writer = HtmlWriter::new();
        assert!(writer.attribute("style", "").is_err());
    }

    #[test]
    fn test_unbalanced_end_is_rejected() {
        let mut writer = HtmlWriter::new();
        assert!(writer.end_element().is_err());
    }

    #[test]
    fn test_finish_with_open_elements_fails() {
        let mut writer = HtmlWriter::new();
        writer.start_element("div");
        writer.start_element("span");
        let err = writer.finish().unwrap_err();
        assert!(err.to_string().contains("div, span"));
    }

    #[test]
    fn test_comment_and_raw() {
        let mut writer = HtmlWriter::with_capacity(64);
        writer.raw("<html>\r\n");
        writer.comment("StartFragment");
        writer.start_element("b");
        writer.end_element().unwrap();
        writer.comment("EndFragment");
        assert_eq!(
            writer.finish().unwrap(),
            "<html>\r\n<!--StartFragment--><b></b><!--EndFragment-->"
        );
    }

    #[test]
    fn test_visible_space_is_not_escaped() {
        let mut writer = HtmlWriter::new();
        writer.text("\u{a0}\u{a0}x");
        assert_eq!(writer.finish().unwrap(), "\u{a0}\u{a0}x");
    }
}
