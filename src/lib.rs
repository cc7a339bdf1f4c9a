//! Instill: an installer compiler and runtime.
//!
//! This facade re-exports the workspace crates so applications can depend
//! on a single package:
//!
//! - [`common`] - installation model, condition engine, variables,
//!   substitution, XML, volume spanning and localisation
//! - [`compiler`] - reads an `install.xml` description and writes the
//!   installer artifact
//! - [`installer`] - runs an artifact on the console or unattended, and
//!   removes what it installed
//!
//! # Examples
//!
//! ```no_run
//! use camino::Utf8PathBuf;
//! use instill::compiler::config::CompilerConfig;
//! use instill::compiler::pipeline::{CompileRequest, compile};
//!
//! let request = CompileRequest {
//!     descriptor: Utf8PathBuf::from("install.xml"),
//!     base_dir: Utf8PathBuf::from("."),
//!     output: Utf8PathBuf::from("install.zip"),
//!     config: CompilerConfig::default(),
//!     quiet: false,
//! };
//! compile(&request, &mut std::io::stderr())?;
//! # Ok::<(), instill::compiler::error::CompilerError>(())
//! ```

pub use instill_common as common;
pub use instill_compiler as compiler;
pub use instill_installer as installer;

/// Version of the instill packages.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
