//! Localised text for installer prompts and condition explanations.
//!
//! Fluent resources under `locales/` are embedded at build time, so neither
//! the compiler nor the installer reads them from disk at runtime.
//! [`resolve_localiser`] picks the language from an explicit request, the
//! `INSTILL_LOCALE` environment variable, or the installation's own locale
//! list, before falling back to the bundled default.

use fluent_templates::static_loader;
use unic_langid::langid;

/// Re-export the Fluent value type for building message arguments.
pub use fluent_templates::fluent_bundle::FluentValue;
pub(crate) use fluent_templates::loader::LanguageIdentifier;

const FALLBACK_LITERAL: &str = "en-GB";

static_loader! {
    pub(crate) static LOADER = {
        locales: "../locales",
        fallback_language: "en-GB",
        // Console output is plain text; bidi isolation marks would leak into it.
        customise: |bundle| bundle.set_use_isolating(false),
    };
}

/// The locale every build falls back to.
pub const FALLBACK_LOCALE: &str = FALLBACK_LITERAL;
pub(crate) const FALLBACK_LANGUAGE: LanguageIdentifier = langid!("en-GB");

/// Environment variable consulted by [`resolve_localiser`].
pub const LOCALE_ENV: &str = "INSTILL_LOCALE";

mod loader;
mod locales;
mod selection;

pub use loader::{Arguments, I18nError, Localiser};
pub use locales::{available_locales, iso3_for_locale, locale_for_iso3, supports_locale};
pub use selection::{
    LocaleSelection, LocaleSource, normalise_locale, resolve_localiser, resolve_localiser_from_env,
};
