//! Instill installer runtime.
//!
//! This crate runs installer artifacts produced by `instill-compiler`: it
//! reads the bundled model, walks the panels on the console or from
//! recorded answers, unpacks the selected packs and writes the data the
//! `instill-uninstall` binary later consumes.
//!
//! # Modules
//!
//! - [`automated`] - Replay and recording of automation documents
//! - [`cli`] - Command-line argument definitions
//! - [`console`] - Console front end and properties-driven installs
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`error`] - Semantic error types
//! - [`executor`] - Command execution behind a mockable trait
//! - [`install_data`] - Variables, rules and pack selection for one run
//! - [`launch`] - Wiring from parsed arguments to a running installation
//! - [`lock`] - Single-instance lock file
//! - [`panels`] - Panel handlers for every supported panel class
//! - [`properties`] - Properties files and environment answers
//! - [`resources`] - Access to the installer artifact
//! - [`session`] - State carried through one installer run
//! - [`uninstall`] - Uninstall data and the uninstaller
//! - [`unpacker`] - Pack extraction, parsing and executables
//! - [`validators`] - Panel validators

pub mod automated;
pub mod cli;
pub mod console;
pub mod dirs;
pub mod error;
pub mod executor;
pub mod install_data;
pub mod launch;
pub mod lock;
pub mod panels;
pub mod properties;
pub mod resources;
pub mod session;
pub mod uninstall;
pub mod unpacker;
pub mod validators;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
