//! Error types for the installer compiler.
//!
//! Each variant names the file or pack at fault so `instill-compile` can print
//! a message the author can act on without re-running with logging enabled.

use camino::Utf8PathBuf;
use instill_common::rules::RulesError;
use instill_common::spanning::SpanningError;
use instill_common::xml::XmlError;
use thiserror::Error;

/// Errors that can occur while compiling an installer.
#[derive(Debug, Error)]
pub enum CompilerError {
    /// The installation description is malformed or incomplete.
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// The `<conditions>` section could not be read.
    #[error(transparent)]
    Rules(#[from] RulesError),

    /// Writing the volume set failed.
    #[error(transparent)]
    Spanning(#[from] SpanningError),

    /// Reading a source file or writing the artifact failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Path being read or written.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The zip writer rejected an entry.
    #[error("failed to write artifact {path}: {source}")]
    Archive {
        /// Artifact path.
        path: Utf8PathBuf,
        /// Underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// A JSON resource could not be written or a bundled one is malformed.
    #[error("JSON error in {resource}: {source}")]
    Json {
        /// Artifact entry or source file concerned.
        resource: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The compiler configuration file could not be loaded.
    #[error("invalid configuration {path}: {reason}")]
    Config {
        /// Configuration file path.
        path: Utf8PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// A `<file>`, `<singlefile>` or `<fileset>` names a path that does not exist.
    #[error("{system_id}:{line}: source {path} not found")]
    MissingSource {
        /// Resolved source path.
        path: Utf8PathBuf,
        /// Description file containing the element.
        system_id: String,
        /// Line of the element.
        line: usize,
    },

    /// An include or exclude pattern does not compile.
    #[error("invalid file pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// Offending pattern.
        pattern: String,
        /// Pattern diagnostic.
        reason: String,
    },

    /// A pack definition is contradictory.
    #[error("pack {pack}: {reason}")]
    InvalidPack {
        /// Pack name.
        pack: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two packs share a name.
    #[error("duplicate pack name {name}")]
    DuplicatePackName {
        /// The repeated name.
        name: String,
    },

    /// Two packs share an id.
    #[error("duplicate pack id {id}")]
    DuplicatePackId {
        /// The repeated id.
        id: String,
    },

    /// A `<depends>` names a pack that does not exist.
    #[error("pack {pack} depends on unknown pack {dependency}")]
    UnknownDependency {
        /// Dependent pack.
        pack: String,
        /// Missing dependency.
        dependency: String,
    },

    /// Pack dependencies form a cycle.
    #[error("pack dependency cycle: {}", cycle.join(" -> "))]
    DependencyCycle {
        /// Pack names along the cycle, first repeated at the end.
        cycle: Vec<String>,
    },
}

impl CompilerError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for compiler operations.
pub type Result<T> = std::result::Result<T, CompilerError>;
