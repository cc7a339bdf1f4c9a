//! Resolving and guarding install targets.

use crate::error::{InstallerError, Result};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Resolves a substituted target against `install_path`.
///
/// Relative targets are taken relative to the installation directory. A
/// target containing `..` or resolving outside the installation directory
/// is rejected.
///
/// # Errors
///
/// Returns [`InstallerError::PathTraversal`] for targets that escape.
pub fn resolve_target(install_path: &Utf8Path, target: &str) -> Result<Utf8PathBuf> {
    let path = Utf8Path::new(target);
    let traversal = || InstallerError::PathTraversal {
        path: target.to_owned(),
    };
    if path
        .components()
        .any(|component| matches!(component, Utf8Component::ParentDir))
    {
        return Err(traversal());
    }
    let resolved = if path.is_absolute() {
        path.to_owned()
    } else {
        install_path.join(path)
    };
    if resolved.starts_with(install_path) {
        Ok(resolved)
    } else {
        Err(traversal())
    }
}
