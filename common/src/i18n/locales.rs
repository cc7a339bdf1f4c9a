//! Locale enumeration, validation and three-letter code mapping.

use once_cell::sync::Lazy;

use fluent_templates::{Loader, loader::LanguageIdentifier};

use super::LOADER;

static ALL_LOCALES: Lazy<Vec<String>> = Lazy::new(|| {
    let mut locales: Vec<String> = LOADER.locales().map(|id| id.to_string()).collect();
    locales.sort_unstable();
    locales
});

const ISO3_CODES: [(&str, &str); 5] = [
    ("deu", "de"),
    ("eng", "en-GB"),
    ("fra", "fr"),
    ("fre", "fr"),
    ("ger", "de"),
];

/// Return a sorted slice of the available locales.
#[must_use]
pub fn available_locales() -> &'static [String] {
    ALL_LOCALES.as_slice()
}

/// Check whether a locale tag is supported by the embedded bundles.
#[must_use]
pub fn supports_locale(locale: &str) -> bool {
    match locale.parse::<LanguageIdentifier>() {
        Ok(identifier) => {
            let canonical = identifier.to_string();
            ALL_LOCALES
                .binary_search_by(|candidate| candidate.as_str().cmp(canonical.as_str()))
                .is_ok()
        }
        Err(_) => false,
    }
}

/// Maps a three-letter language code to a bundled locale tag.
///
/// ```
/// use instill_common::i18n::locale_for_iso3;
///
/// assert_eq!(locale_for_iso3("FRA"), Some("fr"));
/// assert_eq!(locale_for_iso3("jpn"), None);
/// ```
#[must_use]
pub fn locale_for_iso3(code: &str) -> Option<&'static str> {
    let code = code.trim().to_ascii_lowercase();
    ISO3_CODES
        .iter()
        .find(|(iso3, _)| *iso3 == code)
        .map(|(_, tag)| *tag)
}

/// Maps a bundled locale tag back to its preferred three-letter code.
#[must_use]
pub fn iso3_for_locale(locale: &str) -> Option<&'static str> {
    let language = locale.split(['-', '_']).next()?;
    ISO3_CODES
        .iter()
        .find(|(_, tag)| tag.split('-').next() == Some(language))
        .map(|(iso3, _)| *iso3)
}
