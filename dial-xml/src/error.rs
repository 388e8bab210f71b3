//! Error types for descriptor parsing

use thiserror::Error;

/// Errors that can occur while parsing DIAL descriptors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XmlError {
    /// The document is not well-formed XML
    #[error("Malformed XML: {0}")]
    Parse(String),

    /// The document parsed but lacks an element the caller needs
    #[error("Missing required element: {0}")]
    MissingElement(String),
}

/// Result type alias for descriptor operations
pub type Result<T> = std::result::Result<T, XmlError>;
