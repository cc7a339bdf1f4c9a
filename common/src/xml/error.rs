//! Errors raised while reading, including, and writing XML documents.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors produced by the XML adaptor layer.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The document is not well formed.
    #[error("{system_id}:{line}: malformed XML: {message}")]
    Parse {
        /// Source the document was read from.
        system_id: String,
        /// 1-based line of the failure.
        line: usize,
        /// Parser diagnostic.
        message: String,
    },

    /// The document contains no root element.
    #[error("{system_id}: document has no root element")]
    NoRoot {
        /// Source the document was read from.
        system_id: String,
    },

    /// Reading a document or an included resource failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A required attribute is absent.
    #[error("{system_id}:{line}: <{element}> requires attribute `{attribute}`")]
    MissingAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Source of the element.
        system_id: String,
        /// Line of the element.
        line: usize,
    },

    /// A required child element is absent.
    #[error("{system_id}:{line}: <{element}> requires a <{child}> child")]
    MissingElement {
        /// Parent element name.
        element: String,
        /// Missing child name.
        child: String,
        /// Source of the parent.
        system_id: String,
        /// Line of the parent.
        line: usize,
    },

    /// An attribute or child holds a value outside its allowed set.
    #[error("{system_id}:{line}: invalid value `{value}` for {what}")]
    InvalidValue {
        /// Description of the offending attribute or element.
        what: String,
        /// The rejected value.
        value: String,
        /// Source of the element.
        system_id: String,
        /// Line of the element.
        line: usize,
    },

    /// An `<xinclude>` directive could not be honoured.
    #[error("{system_id}:{line}: xinclude failed: {reason}")]
    Include {
        /// Source containing the directive.
        system_id: String,
        /// Line of the directive.
        line: usize,
        /// Description of the failure.
        reason: String,
    },

    /// Serialising a tree failed.
    #[error("failed to write XML: {message}")]
    Write {
        /// Writer diagnostic.
        message: String,
    },
}

/// Result alias for XML operations.
pub type Result<T> = std::result::Result<T, XmlError>;
