//! Error and warning types for conversion operations

use std::fmt;

/// Errors that can occur while turning flow document markup into an HTML
/// clipboard payload
#[derive(Debug)]
pub enum ConversionError {
    /// Flow document markup is malformed
    ParseError(String),
    /// Character encoding error
    EncodingError(String),
    /// Invalid input data
    InvalidInput(String),
    /// Element has no HTML mapping and the policy says to fail
    UnmappedElement(String),
    /// Fragment markers or offsets are inconsistent
    InvariantViolation(String),
    /// Reported by a clipboard collaborator
    Clipboard(String),
    /// Internal error
    InternalError(String),
}

impl ConversionError {
    /// Get numeric error code for FFI
    pub fn code(&self) -> u32 {
        match self {
            ConversionError::ParseError(_) => 1,
            ConversionError::EncodingError(_) => 2,
            ConversionError::InvalidInput(_) => 5,
            ConversionError::UnmappedElement(_) => 6,
            ConversionError::InvariantViolation(_) => 7,
            ConversionError::Clipboard(_) => 8,
            ConversionError::InternalError(_) => 99,
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConversionError::EncodingError(msg) => write!(f, "Encoding error: {}", msg),
            ConversionError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ConversionError::UnmappedElement(name) => {
                write!(f, "Element '{}' has no HTML mapping", name)
            }
            ConversionError::InvariantViolation(msg) => write!(f, "Invariant violation: {}", msg),
            ConversionError::Clipboard(msg) => write!(f, "Clipboard error: {}", msg),
            ConversionError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ConversionError {}

/// Non-fatal conditions reported while converting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionWarning {
    /// Element had no HTML mapping and was skipped or dropped
    UnmappedElement { name: String },
    /// A link target used a blocked URL scheme and was not emitted
    UnsafeUrlRemoved { attribute: String, value: String },
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionWarning::UnmappedElement { name } => {
                write!(f, "unmapped element '{}'", name)
            }
            ConversionWarning::UnsafeUrlRemoved { attribute, value } => {
                write!(f, "removed unsafe {} value '{}'", attribute, value)
            }
        }
    }
}
