//! Errors raised while reading or parsing conditions.

use crate::xml::XmlError;
use thiserror::Error;

/// Errors raised while reading or parsing conditions.
#[derive(Debug, Error)]
pub enum RulesError {
    /// The underlying XML was malformed or lacked required parts.
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// A `<condition>` carried a `type` this engine does not know.
    #[error("{system_id}:{line}: unknown condition type `{kind}`")]
    UnknownType {
        /// The rejected type name.
        kind: String,
        /// Document the condition came from.
        system_id: String,
        /// Line of the `<condition>` element.
        line: usize,
    },

    /// An `@` expression could not be parsed.
    #[error("invalid condition expression `{expression}`: {reason}")]
    Expression {
        /// The full expression text.
        expression: String,
        /// What went wrong.
        reason: String,
    },
}

/// Convenience alias for rules results.
pub type Result<T> = std::result::Result<T, RulesError>;
