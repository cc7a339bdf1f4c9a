//! Instill installer compiler.
//!
//! This crate turns an installation description (`install.xml`) and the files
//! it names into an installer artifact that `instill-installer` can run. It is
//! used by the `instill-compile` binary and can be driven programmatically
//! for build scripts or tests.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - `instill.toml` loading and packaging settings
//! - [`descriptor`] - Parsing of the installation description
//! - [`error`] - Error types naming the file or pack at fault
//! - [`packager`] - Artifact and volume writing
//! - [`pipeline`] - Read, validate and package orchestration
//! - [`validate`] - Pack and condition consistency checks

pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod packager;
pub mod pipeline;
pub mod validate;

pub use error::{CompilerError, Result};
pub use pipeline::{CompileReport, CompileRequest, compile};
