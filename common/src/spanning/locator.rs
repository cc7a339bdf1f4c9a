//! Finding the next volume of a set when it is not beside the first.

use camino::{Utf8Path, Utf8PathBuf};

/// Supplies the location of a volume that is missing from where it was
/// expected, e.g. by asking the user to insert the next disc.
#[cfg_attr(test, mockall::automock)]
pub trait VolumeLocator {
    /// Returns a path to try for volume `index`, or `None` to give up.
    fn locate(&mut self, expected: &Utf8Path, index: usize) -> Option<Utf8PathBuf>;
}

/// Locator that never finds anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLocator;

impl VolumeLocator for NoLocator {
    fn locate(&mut self, _expected: &Utf8Path, _index: usize) -> Option<Utf8PathBuf> {
        None
    }
}
