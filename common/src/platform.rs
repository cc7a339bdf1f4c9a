//! Host platform detection and `<os>` constraints.

use crate::xml::XmlElement;
use serde::{Deserialize, Serialize};

/// Broad operating system family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    /// Microsoft Windows.
    Windows,
    /// Apple macOS (also counts as Unix).
    Mac,
    /// Any other Unix-like system.
    Unix,
    /// Anything unrecognised.
    Other,
}

/// Description of the machine an installer runs on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Platform {
    family: OsFamily,
    name: String,
    arch: String,
    version: String,
}

impl Platform {
    /// Builds a platform description explicitly.
    #[must_use]
    pub fn new(
        family: OsFamily,
        name: impl Into<String>,
        arch: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            family,
            name: name.into().to_ascii_lowercase(),
            arch: arch.into().to_ascii_lowercase(),
            version: version.into().to_ascii_lowercase(),
        }
    }

    /// Detects the running platform from compile-time target information.
    #[must_use]
    pub fn current() -> Self {
        let name = std::env::consts::OS;
        let family = if cfg!(windows) {
            OsFamily::Windows
        } else if name == "macos" {
            OsFamily::Mac
        } else if cfg!(unix) {
            OsFamily::Unix
        } else {
            OsFamily::Other
        };
        Self::new(family, name, std::env::consts::ARCH, "")
    }

    /// Family of the platform.
    #[must_use]
    pub const fn family(&self) -> OsFamily {
        self.family
    }

    /// Lower-case OS name, e.g. `linux`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-case architecture, e.g. `x86_64`.
    #[must_use]
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Lower-case OS version, empty when unknown.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether the platform belongs to the named family.
    ///
    /// `unix` includes macOS; `mac` and `osx` are synonyms. Unknown names
    /// never match.
    #[must_use]
    pub fn is_family(&self, family: &str) -> bool {
        match family.trim().to_ascii_lowercase().as_str() {
            "windows" => self.family == OsFamily::Windows,
            "mac" | "osx" => self.family == OsFamily::Mac,
            "unix" => matches!(self.family, OsFamily::Unix | OsFamily::Mac),
            _ => false,
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

/// One `<os family name version arch/>` restriction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OsConstraint {
    /// Family name: `windows`, `mac`/`osx` or `unix`.
    pub family: Option<String>,
    /// Exact OS name.
    pub name: Option<String>,
    /// Exact OS version.
    pub version: Option<String>,
    /// Exact architecture.
    pub arch: Option<String>,
}

impl OsConstraint {
    /// Constraint on a family only.
    #[must_use]
    pub fn family(family: impl Into<String>) -> Self {
        Self {
            family: Some(family.into()),
            ..Self::default()
        }
    }

    /// Reads every `<os>` child of `element`.
    #[must_use]
    pub fn from_children(element: &XmlElement) -> Vec<Self> {
        element
            .children_named("os")
            .map(|os| Self {
                family: non_blank(os.attribute("family")),
                name: non_blank(os.attribute("name")),
                version: non_blank(os.attribute("version")),
                arch: non_blank(os.attribute("arch")),
            })
            .collect()
    }

    /// Whether `platform` satisfies every field that is set.
    ///
    /// A constraint with no fields set matches nothing.
    #[must_use]
    pub fn matches(&self, platform: &Platform) -> bool {
        if self.family.is_none() && self.name.is_none() && self.version.is_none() && self.arch.is_none()
        {
            return false;
        }
        let equal = |expected: Option<&String>, actual: &str| {
            expected.is_none_or(|value| value.eq_ignore_ascii_case(actual))
        };
        equal(self.arch.as_ref(), platform.arch())
            && equal(self.version.as_ref(), platform.version())
            && equal(self.name.as_ref(), platform.name())
            && self
                .family
                .as_deref()
                .is_none_or(|family| platform.is_family(family))
    }
}

/// Whether a list of constraints admits `platform`.
///
/// An empty list admits every platform; otherwise one constraint must match.
#[must_use]
pub fn matches_any(constraints: &[OsConstraint], platform: &Platform) -> bool {
    constraints.is_empty() || constraints.iter().any(|os| os.matches(platform))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
