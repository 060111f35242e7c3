//! Resource limits and link sanitization for untrusted flow documents
//!
//! Clipboard content comes from whatever application wrote it last, so the
//! converter treats it as untrusted:
//!
//! - **Nesting depth**: the parser and the converter keep open elements on
//!   heap stacks. Trees deeper than [`MAX_NESTING_DEPTH`] are rejected so a
//!   hostile document cannot grow them without bound.
//! - **Link targets**: `NavigateUri` becomes an HTML `href` that the paste
//!   target may follow. Scripting and local-resource schemes are removed.
//! - **Entities**: the parser resolves only the predefined XML entities and
//!   numeric character references. Doctype declarations are skipped, so no
//!   internal or external entity is ever expanded.

use crate::error::ConversionError;

/// Maximum element nesting depth accepted by default
pub const MAX_NESTING_DEPTH: usize = 1000;

/// URL schemes never written into an `href`
const DANGEROUS_URL_SCHEMES: &[&str] = &[
    "javascript:", // script execution
    "data:",       // inline documents
    "vbscript:",   // legacy IE scripting
    "file:",       // local file access
    "about:",      // browser internal pages
];

/// HTML attributes whose values are URLs
const URL_ATTRIBUTES: &[&str] = &["href"];

/// Security checks applied while converting
#[derive(Debug, Clone)]
pub struct SecurityValidator {
    max_depth: usize,
    sanitize_urls: bool,
}

impl SecurityValidator {
    /// Create a validator with the default depth limit and URL sanitization on
    pub fn new() -> Self {
        Self {
            max_depth: MAX_NESTING_DEPTH,
            sanitize_urls: true,
        }
    }

    /// Create a validator with a custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::new()
        }
    }

    /// Enable or disable removal of dangerous link targets
    pub fn sanitize_urls(mut self, enabled: bool) -> Self {
        self.sanitize_urls = enabled;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Check if a URL uses a dangerous scheme
    ///
    /// Leading whitespace and letter case are ignored, since browsers ignore
    /// both when resolving a scheme.
    ///
    /// # Examples
    ///
    /// ```
    /// use flowdoc_clipboard::security::SecurityValidator;
    ///
    /// let validator = SecurityValidator::new();
    /// assert!(validator.is_dangerous_url("javascript:alert(1)"));
    /// assert!(validator.is_dangerous_url("  DATA:text/html,x"));
    /// assert!(!validator.is_dangerous_url("https://example.com"));
    /// assert!(!validator.is_dangerous_url("#bookmark"));
    /// ```
    pub fn is_dangerous_url(&self, url: &str) -> bool {
        let url_lower = url.trim().to_lowercase();
        DANGEROUS_URL_SCHEMES
            .iter()
            .any(|scheme| url_lower.starts_with(scheme))
    }

    /// Decide whether an output attribute may be written
    ///
    /// Returns `false` only for URL attributes carrying a dangerous scheme,
    /// and only while sanitization is enabled.
    pub fn allows_attribute(&self, html_name: &str, value: &str) -> bool {
        !(self.sanitize_urls && URL_ATTRIBUTES.contains(&html_name) && self.is_dangerous_url(value))
    }

    /// Validate nesting depth
    ///
    /// # Examples
    ///
    /// ```
    /// use flowdoc_clipboard::security::SecurityValidator;
    ///
    /// let validator = SecurityValidator::with_max_depth(100);
    /// assert!(validator.validate_depth(100).is_ok());
    /// assert!(validator.validate_depth(101).is_err());
    /// ```
    pub fn validate_depth(&self, depth: usize) -> Result<(), ConversionError> {
        if depth > self.max_depth {
            Err(ConversionError::InvalidInput(format!(
                "Element nesting depth {} exceeds maximum allowed depth {}",
                depth, self.max_depth
            )))
        } else {
            Ok(())
        }
    }
}

impl Default for SecurityValidator {
    fn default() -> Self {
        Self::new()
    }
}
