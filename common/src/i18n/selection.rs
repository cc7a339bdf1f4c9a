//! Choosing the locale for a run.

use std::fmt;

use log::{debug, warn};

use super::locales::locale_for_iso3;
use super::{LOCALE_ENV, Localiser, supports_locale};

/// Source for a resolved locale.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LocaleSource {
    /// Locale supplied explicitly, e.g. by `-language`.
    ExplicitArgument,
    /// Locale sourced from the `INSTILL_LOCALE` environment variable.
    EnvironmentVariable,
    /// First language pack declared by the installation.
    Installation,
    /// Bundled fallback locale.
    Fallback,
}

impl fmt::Display for LocaleSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExplicitArgument => formatter.write_str("explicit locale override"),
            Self::EnvironmentVariable => formatter.write_str(LOCALE_ENV),
            Self::Installation => formatter.write_str("installation language pack"),
            Self::Fallback => formatter.write_str("fallback locale"),
        }
    }
}

/// Outcome of locale resolution including the effective localiser and provenance.
#[derive(Clone, Debug)]
pub struct LocaleSelection {
    localiser: Localiser,
    source: LocaleSource,
    requested: Option<String>,
}

impl LocaleSelection {
    const fn new(localiser: Localiser, source: LocaleSource, requested: Option<String>) -> Self {
        Self {
            localiser,
            source,
            requested,
        }
    }

    /// Returns the effective locale source.
    #[must_use]
    pub const fn source(&self) -> LocaleSource {
        self.source
    }

    /// Returns the value requested by the winning source, if any.
    #[must_use]
    pub fn requested(&self) -> Option<&str> {
        self.requested.as_deref()
    }

    /// Returns the resolved locale tag.
    #[must_use]
    pub fn locale(&self) -> &str {
        self.localiser.locale()
    }

    /// Whether the fallback locale was used.
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.localiser.used_fallback()
    }

    /// Returns the resolved [`Localiser`].
    #[must_use]
    pub fn localiser(&self) -> &Localiser {
        &self.localiser
    }

    /// Consumes the selection, yielding the [`Localiser`].
    #[must_use]
    pub fn into_localiser(self) -> Localiser {
        self.localiser
    }

    /// Emit a debug log summarising the resolved locale.
    pub fn log_outcome(&self, target: &str) {
        debug!(
            target: target,
            "resolved {} to `{}`",
            self.source(),
            self.locale(),
        );
    }
}

fn try_resolve_candidate(source: LocaleSource, raw: Option<&str>) -> Option<LocaleSelection> {
    let candidate = normalise_locale(raw)?;
    let tag = locale_for_iso3(candidate).unwrap_or(candidate);

    if supports_locale(tag) {
        return Some(LocaleSelection::new(
            Localiser::new(Some(tag)),
            source,
            Some(candidate.to_owned()),
        ));
    }

    warn!(
        target: "i18n::selection",
        "skipping unsupported {source} `{candidate}`",
    );

    None
}

/// Resolve a locale from explicit, environment and installation candidates.
///
/// Candidates are considered in this order:
///
/// 1. The explicit locale supplied by the caller.
/// 2. The `INSTILL_LOCALE` environment variable.
/// 3. The installation's first declared language pack.
/// 4. The embedded fallback when no candidate is valid.
#[must_use]
pub fn resolve_localiser(
    explicit: Option<&str>,
    environment: Option<String>,
    installation: Option<&str>,
) -> LocaleSelection {
    let candidates = [
        (LocaleSource::ExplicitArgument, explicit),
        (LocaleSource::EnvironmentVariable, environment.as_deref()),
        (LocaleSource::Installation, installation),
    ];

    candidates
        .into_iter()
        .find_map(|(source, raw)| try_resolve_candidate(source, raw))
        .unwrap_or_else(|| LocaleSelection::new(Localiser::new(None), LocaleSource::Fallback, None))
}

/// [`resolve_localiser`] with the environment candidate read from
/// `INSTILL_LOCALE`.
#[must_use]
pub fn resolve_localiser_from_env(
    explicit: Option<&str>,
    installation: Option<&str>,
) -> LocaleSelection {
    resolve_localiser(explicit, std::env::var(LOCALE_ENV).ok(), installation)
}

/// Trim whitespace and discard empty locale candidates.
#[must_use]
pub fn normalise_locale(input: Option<&str>) -> Option<&str> {
    input.map(str::trim).filter(|value| !value.is_empty())
}
