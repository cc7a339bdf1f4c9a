//! Version string ordering used by `compareversions` conditions.

use std::cmp::Ordering;

/// Compares two version strings part by part.
///
/// Strings split on runs of characters other than ASCII letters, digits and
/// `_`. Numeric parts compare by value; any non-numeric part ranks above
/// every number. Parts with equal rank compare lexically, and a version that
/// is a strict prefix of another sorts first.
///
/// # Examples
///
/// ```
/// use instill_common::version::compare_versions;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
/// assert_eq!(compare_versions("2.0", "2.0.1"), Ordering::Less);
/// assert_eq!(compare_versions("1.0-rc", "1.0-1"), Ordering::Greater);
/// ```
#[must_use]
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let mut left_parts = parts(left);
    let mut right_parts = parts(right);
    loop {
        match (left_parts.next(), right_parts.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => {
                let ordering = rank(a).cmp(&rank(b)).then_with(|| a.cmp(b));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

fn parts(version: &str) -> impl Iterator<Item = &str> {
    version
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|part| !part.is_empty())
}

fn rank(part: &str) -> u64 {
    part.parse::<u32>().map_or(u64::MAX, u64::from)
}
