//! Installer variable store and dynamic variables.
//!
//! Variables are plain strings keyed by name. Dynamic variables are
//! templates re-evaluated on [`Variables::refresh`], optionally gated by a
//! condition and filtered through a regular expression.

use crate::rules::RulesEngine;
use crate::substitutor::{SubstitutionType, VariableSubstitutor};
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Errors raised while refreshing dynamic variables.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum VariableError {
    /// The filter pattern of a dynamic variable does not compile.
    #[error("dynamic variable {name}: invalid pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// Variable name.
        name: String,
        /// Offending pattern.
        pattern: String,
        /// Compiler diagnostic.
        reason: String,
    },

    /// The filter did not match and no default value is configured.
    #[error("dynamic variable {name}: value `{value}` does not match `{pattern}`")]
    NoMatch {
        /// Variable name.
        name: String,
        /// Value the filter was applied to.
        value: String,
        /// Filter pattern.
        pattern: String,
    },
}

/// Regular expression post-processing for a dynamic variable value.
///
/// `select` expands capture groups (`$1`, `${name}`) from the first match;
/// `replace` substitutes matches. When neither is set the value passes
/// through if the pattern matches.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegexFilter {
    /// Pattern applied to the substituted value.
    pub pattern: String,
    /// Template built from the captures of the first match.
    pub select: Option<String>,
    /// Replacement for matches of the pattern.
    pub replace: Option<String>,
    /// Value used when the pattern does not match.
    pub default_value: Option<String>,
    /// Replace every match instead of the first only.
    pub global: bool,
}

impl RegexFilter {
    fn apply(&self, name: &str, value: &str) -> Result<String, VariableError> {
        let regex = Regex::new(&self.pattern).map_err(|error| VariableError::InvalidPattern {
            name: name.to_owned(),
            pattern: self.pattern.clone(),
            reason: error.to_string(),
        })?;

        let no_match = || {
            self.default_value
                .clone()
                .ok_or_else(|| VariableError::NoMatch {
                    name: name.to_owned(),
                    value: value.to_owned(),
                    pattern: self.pattern.clone(),
                })
        };

        if let Some(select) = &self.select {
            return match regex.captures(value) {
                Some(captures) => {
                    let mut selected = String::new();
                    captures.expand(select, &mut selected);
                    Ok(selected)
                }
                None => no_match(),
            };
        }
        if !regex.is_match(value) {
            return no_match();
        }
        Ok(match &self.replace {
            Some(replacement) if self.global => {
                regex.replace_all(value, replacement.as_str()).into_owned()
            }
            Some(replacement) => regex.replace(value, replacement.as_str()).into_owned(),
            None => value.to_owned(),
        })
    }
}

/// A variable recomputed from a template whenever variables are refreshed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DynamicVariable {
    /// Variable name.
    pub name: String,
    /// Value template; references are substituted against the store.
    pub value: String,
    /// Condition that must hold for the variable to be updated.
    pub condition: Option<String>,
    /// Evaluate only on the first successful refresh.
    pub check_once: bool,
    /// Skip the variable instead of failing when the filter rejects it.
    pub ignore_failure: bool,
    /// Optional regular-expression post-processing.
    pub filter: Option<RegexFilter>,
}

impl DynamicVariable {
    /// Creates an unconditional dynamic variable.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    fn evaluate(&self, variables: &Variables) -> Result<String, VariableError> {
        let substituted = variables.replace(&self.value);
        match &self.filter {
            Some(filter) => filter.apply(&self.name, &substituted),
            None => Ok(substituted),
        }
    }
}

/// Mutable name-to-value store consulted by conditions and substitution.
///
/// # Examples
///
/// ```
/// use instill_common::variables::Variables;
///
/// let mut variables = Variables::new();
/// variables.set("DEBUG", "TRUE");
/// variables.set("PORT", "8080");
///
/// assert!(variables.get_bool("DEBUG", false));
/// assert_eq!(variables.get_int("PORT", -1), 8080);
/// assert_eq!(variables.get_int("MISSING", -1), -1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables {
    values: BTreeMap<String, String>,
    #[serde(skip)]
    dynamic: Vec<DynamicVariable>,
    #[serde(skip)]
    evaluated_once: BTreeSet<String>,
}

impl Variables {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Removes `name`, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    /// Returns the value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns the value of `name` or `default`.
    #[must_use]
    pub fn get_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get(name).unwrap_or(default)
    }

    /// Whether `name` is defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Interprets `name` as a case-insensitive `true`/`false`.
    #[must_use]
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        match self.get(name) {
            Some(value) if value.eq_ignore_ascii_case("true") => true,
            Some(value) if value.eq_ignore_ascii_case("false") => false,
            _ => default,
        }
    }

    /// Parses `name` as a 32-bit integer.
    #[must_use]
    pub fn get_int(&self, name: &str, default: i32) -> i32 {
        self.get(name)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Parses `name` as a 64-bit integer.
    #[must_use]
    pub fn get_long(&self, name: &str, default: i64) -> i64 {
        self.get(name)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Substitutes `$name` references in `text` with plain semantics.
    #[must_use]
    pub fn replace(&self, text: &str) -> String {
        VariableSubstitutor::new(self).substitute(text, SubstitutionType::Plain)
    }

    /// Iterates over variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of defined variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no variables are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Registers a dynamic variable for later refreshes.
    pub fn add_dynamic(&mut self, variable: DynamicVariable) {
        self.dynamic.push(variable);
    }

    /// Dynamic variables in registration order.
    #[must_use]
    pub fn dynamic(&self) -> &[DynamicVariable] {
        &self.dynamic
    }

    /// Re-evaluates dynamic variables whose condition holds.
    ///
    /// Variables are processed in registration order, so later templates see
    /// earlier results. Returns the number of variables updated.
    ///
    /// # Errors
    ///
    /// Returns the first [`VariableError`] from a variable that does not
    /// ignore failures. Variables processed before the failure keep their new
    /// values.
    pub fn refresh(&mut self, rules: &RulesEngine) -> Result<usize, VariableError> {
        let dynamic = std::mem::take(&mut self.dynamic);
        let outcome = self.refresh_each(&dynamic, rules);
        self.dynamic = dynamic;
        outcome
    }

    fn refresh_each(
        &mut self,
        dynamic: &[DynamicVariable],
        rules: &RulesEngine,
    ) -> Result<usize, VariableError> {
        let mut updated = 0;
        for variable in dynamic {
            if variable.check_once && self.evaluated_once.contains(&variable.name) {
                continue;
            }
            if let Some(condition) = &variable.condition {
                if !rules.is_true(condition, self) {
                    debug!("dynamic variable {} skipped: {condition} is false", variable.name);
                    continue;
                }
            }
            match variable.evaluate(self) {
                Ok(value) => {
                    debug!("dynamic variable {} = {value}", variable.name);
                    self.set(variable.name.clone(), value);
                    if variable.check_once {
                        self.evaluated_once.insert(variable.name.clone());
                    }
                    updated += 1;
                }
                Err(error) if variable.ignore_failure => {
                    warn!("{error}; ignored");
                }
                Err(error) => return Err(error),
            }
        }
        Ok(updated)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut variables = Self::new();
        variables.extend(iter);
        variables
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Variables {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.set(name, value);
        }
    }
}
