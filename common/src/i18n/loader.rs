//! The localiser that looks messages up in the embedded Fluent bundles.

use std::borrow::Cow;
use std::collections::HashMap;
use std::str::FromStr;

use fluent_templates::Loader;
use fluent_templates::fluent_bundle::FluentValue;
use log::warn;
use thiserror::Error;

use super::locales::{iso3_for_locale, locale_for_iso3, supports_locale};
use super::{FALLBACK_LANGUAGE, LOADER, LanguageIdentifier};

/// HashMap wrapper used when passing Fluent arguments to lookups.
pub type Arguments<'a> = HashMap<Cow<'static, str>, FluentValue<'a>>;

/// Error raised when localisation data cannot satisfy a caller request.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum I18nError {
    /// The requested message is missing for the resolved locale.
    #[error("message `{key}` missing for locale `{locale}`")]
    MissingMessage {
        /// Message identifier.
        key: String,
        /// Locale searched.
        locale: String,
    },
}

/// Resolves messages for one locale.
///
/// Unknown locales fall back to `en-GB`. Three-letter language codes as used
/// by installation descriptions (`eng`, `deu`, `fra`) are accepted as well.
#[derive(Clone, Debug)]
pub struct Localiser {
    language: LanguageIdentifier,
    locale: String,
    fallback_used: bool,
}

impl Localiser {
    /// Create a localiser for `locale`, falling back to [`super::FALLBACK_LOCALE`].
    ///
    /// ```
    /// use instill_common::i18n::Localiser;
    ///
    /// let german = Localiser::new(Some("deu"));
    /// assert_eq!(german.locale(), "de");
    /// assert!(!german.used_fallback());
    ///
    /// let fallback = Localiser::new(Some("zz"));
    /// assert_eq!(fallback.locale(), "en-GB");
    /// assert!(fallback.used_fallback());
    /// ```
    #[must_use]
    pub fn new(locale: Option<&str>) -> Self {
        let tag = locale.map(|value| locale_for_iso3(value).unwrap_or(value));
        match tag {
            Some(value) if supports_locale(value) => match LanguageIdentifier::from_str(value) {
                Ok(identifier) => Self {
                    locale: identifier.to_string(),
                    language: identifier,
                    fallback_used: false,
                },
                Err(_) => Self::fallback(),
            },
            _ => Self::fallback(),
        }
    }

    /// Return the resolved locale identifier.
    #[must_use]
    pub fn language(&self) -> &LanguageIdentifier {
        &self.language
    }

    /// Return the resolved locale as a string slice.
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Three-letter code of the resolved locale, as stored in `ISO3_LANG`.
    #[must_use]
    pub fn iso3(&self) -> &'static str {
        iso3_for_locale(self.locale()).unwrap_or("eng")
    }

    /// Whether the fallback locale was used.
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.fallback_used
    }

    /// Fetch the translated message for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::MissingMessage`] when no bundle defines `key`.
    pub fn message(&self, key: &str) -> Result<String, I18nError> {
        self.lookup(key, None)
    }

    /// Fetch the translated message with Fluent arguments.
    ///
    /// # Errors
    ///
    /// Returns [`I18nError::MissingMessage`] when no bundle defines `key`.
    pub fn message_with_args(&self, key: &str, args: &Arguments<'_>) -> Result<String, I18nError> {
        self.lookup(key, Some(args))
    }

    /// Like [`Self::message_with_args`], but yields `key` itself when the
    /// message is missing so console output never aborts on a gap in a bundle.
    #[must_use]
    pub fn text(&self, key: &str, args: &Arguments<'_>) -> String {
        self.lookup(key, Some(args)).unwrap_or_else(|error| {
            warn!(target: "i18n", "{error}");
            key.to_owned()
        })
    }

    fn lookup(&self, key: &str, args: Option<&Arguments<'_>>) -> Result<String, I18nError> {
        let maybe_value = match args {
            Some(arguments) => LOADER.try_lookup_with_args(&self.language, key, arguments),
            None => LOADER.try_lookup(&self.language, key),
        };

        maybe_value.ok_or_else(|| I18nError::MissingMessage {
            key: key.to_owned(),
            locale: self.language.to_string(),
        })
    }

    fn fallback() -> Self {
        Self {
            language: FALLBACK_LANGUAGE.clone(),
            locale: FALLBACK_LANGUAGE.to_string(),
            fallback_used: true,
        }
    }
}

impl Default for Localiser {
    fn default() -> Self {
        Self::fallback()
    }
}
