//! Directory scanning for `<fileset>` elements.
//!
//! Patterns follow Ant conventions expressed as glob patterns: `*` stays
//! within one path segment, `**` spans any number of segments, and a pattern
//! ending in `/` matches everything below that directory.

use crate::error::{CompilerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use glob::{MatchOptions, Pattern};
use instill_common::xml::XmlElement;

/// Patterns excluded unless `defaultexcludes="no"` is given.
pub const DEFAULT_EXCLUDES: [&str; 7] = [
    "**/*~",
    "**/#*#",
    "**/.#*",
    "**/.git/**",
    "**/.svn/**",
    "**/CVS/**",
    "**/.DS_Store",
];

/// A directory plus include and exclude patterns.
#[derive(Clone, Debug)]
pub struct FileSet {
    dir: Utf8PathBuf,
    includes: Vec<Pattern>,
    excludes: Vec<Pattern>,
    case_sensitive: bool,
}

impl FileSet {
    /// A set over `dir` with no patterns and default excludes applied.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the default excludes are valid patterns.
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Result<Self> {
        let mut set = Self {
            dir: dir.into(),
            includes: Vec::new(),
            excludes: Vec::new(),
            case_sensitive: true,
        };
        for pattern in DEFAULT_EXCLUDES {
            set = set.exclude(pattern)?;
        }
        Ok(set)
    }

    /// Reads `dir`, `includes`, `excludes`, `casesensitive`,
    /// `defaultexcludes` and nested `<include name>`/`<exclude name>` from a
    /// `<fileset>`.
    ///
    /// # Errors
    ///
    /// Returns an error when `dir` is missing or a pattern does not compile.
    pub fn from_xml(element: &XmlElement, base_dir: &Utf8Path) -> Result<Self> {
        let dir = base_dir.join(element.require_attribute("dir")?);
        let mut set = if element.bool_attribute("defaultexcludes", true) {
            Self::new(dir)?
        } else {
            Self {
                dir,
                includes: Vec::new(),
                excludes: Vec::new(),
                case_sensitive: true,
            }
        };
        set.case_sensitive = element.bool_attribute("casesensitive", true);

        for pattern in split_patterns(element.attribute("includes")) {
            set = set.include(pattern)?;
        }
        for pattern in split_patterns(element.attribute("excludes")) {
            set = set.exclude(pattern)?;
        }
        for include in element.children_named("include") {
            set = set.include(include.require_attribute("name")?)?;
        }
        for exclude in element.children_named("exclude") {
            set = set.exclude(exclude.require_attribute("name")?)?;
        }
        Ok(set)
    }

    /// Adds an include pattern.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::InvalidPattern`] when the pattern does not compile.
    pub fn include(mut self, pattern: &str) -> Result<Self> {
        self.includes.push(compile(pattern)?);
        Ok(self)
    }

    /// Adds an exclude pattern.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::InvalidPattern`] when the pattern does not compile.
    pub fn exclude(mut self, pattern: &str) -> Result<Self> {
        self.excludes.push(compile(pattern)?);
        Ok(self)
    }

    /// Root directory of the set.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Whether a `/`-separated path relative to the root is selected.
    ///
    /// With no include patterns every path is included.
    #[must_use]
    pub fn matches(&self, relative: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: self.case_sensitive,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        let included = self.includes.is_empty()
            || self
                .includes
                .iter()
                .any(|pattern| pattern.matches_with(relative, options));
        included
            && !self
                .excludes
                .iter()
                .any(|pattern| pattern.matches_with(relative, options))
    }

    /// Selected files, relative to the root, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::Io`] when a directory cannot be listed.
    pub fn scan(&self) -> Result<Vec<Utf8PathBuf>> {
        let mut found = Vec::new();
        self.walk(Utf8Path::new(""), &mut found)?;
        found.sort();
        Ok(found)
    }

    fn walk(&self, relative: &Utf8Path, found: &mut Vec<Utf8PathBuf>) -> Result<()> {
        let dir = self.dir.join(relative);
        let entries = std::fs::read_dir(&dir).map_err(|err| CompilerError::io(&dir, err))?;
        for entry in entries {
            let entry = entry.map_err(|err| CompilerError::io(&dir, err))?;
            let Ok(name) = entry.file_name().into_string() else {
                log::warn!("skipping non UTF-8 entry in {dir}");
                continue;
            };
            let child = relative.join(&name);
            let file_type = entry.file_type().map_err(|err| CompilerError::io(&dir, err))?;
            if file_type.is_dir() {
                self.walk(&child, found)?;
            } else if self.matches(child.as_str()) {
                found.push(child);
            }
        }
        Ok(())
    }
}

fn compile(pattern: &str) -> Result<Pattern> {
    let normalised = pattern.trim().replace('\\', "/");
    let expanded = if normalised.ends_with('/') {
        format!("{normalised}**")
    } else {
        normalised
    };
    Pattern::new(&expanded).map_err(|err| CompilerError::InvalidPattern {
        pattern: pattern.to_owned(),
        reason: err.to_string(),
    })
}

fn split_patterns(value: Option<&str>) -> impl Iterator<Item = &str> {
    value
        .unwrap_or_default()
        .split([',', ' '])
        .map(str::trim)
        .filter(|pattern| !pattern.is_empty())
}
