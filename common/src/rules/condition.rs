//! Condition variants and their evaluation.

use super::engine::RulesEngine;
use crate::platform::Platform;
use crate::substitutor::{SubstitutionType, VariableSubstitutor};
use crate::variables::Variables;
use crate::version::compare_versions;
use camino::Utf8Path;
use log::warn;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Prefix of the variables recording pack selection.
pub const PACK_SELECTED_PREFIX: &str = "instill.selected.";

/// What an `exists` or `empty` condition inspects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Subject {
    /// A variable name.
    Variable(String),
    /// A literal string, substituted before inspection.
    Text(String),
    /// A file path, substituted before inspection.
    File(String),
    /// A directory path, substituted before inspection.
    Dir(String),
}

/// Relational operator shared by numeric and version comparisons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    /// `eq`
    #[default]
    Equal,
    /// `noteq`
    NotEqual,
    /// `gt`
    Greater,
    /// `geq`
    GreaterEqual,
    /// `lt`
    Less,
    /// `leq`
    LessEqual,
}

impl ComparisonOperator {
    /// Whether `ordering` (left compared to right) satisfies the operator.
    #[must_use]
    pub const fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Equal => matches!(ordering, Ordering::Equal),
            Self::NotEqual => !matches!(ordering, Ordering::Equal),
            Self::Greater => matches!(ordering, Ordering::Greater),
            Self::GreaterEqual => !matches!(ordering, Ordering::Less),
            Self::Less => matches!(ordering, Ordering::Less),
            Self::LessEqual => !matches!(ordering, Ordering::Greater),
        }
    }

    /// Attribute spelling used in installation descriptions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "eq",
            Self::NotEqual => "noteq",
            Self::Greater => "gt",
            Self::GreaterEqual => "geq",
            Self::Less => "lt",
            Self::LessEqual => "leq",
        }
    }

    /// Mathematical symbol, used in dependency details.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Less => "<",
            Self::LessEqual => "<=",
        }
    }
}

impl FromStr for ComparisonOperator {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "eq" => Ok(Self::Equal),
            "noteq" => Ok(Self::NotEqual),
            "gt" => Ok(Self::Greater),
            "geq" => Ok(Self::GreaterEqual),
            "lt" => Ok(Self::Less),
            "leq" => Ok(Self::LessEqual),
            other => Err(other.to_owned()),
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform families exposed as built-in conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlatformCheck {
    /// Any Windows.
    Windows,
    /// Linux.
    Linux,
    /// macOS.
    Mac,
    /// Solaris or illumos.
    Solaris,
    /// AIX.
    Aix,
    /// Any Unix-like system, macOS included.
    Unix,
}

impl PlatformCheck {
    /// Every check, in registration order.
    pub const ALL: [Self; 6] = [
        Self::Windows,
        Self::Linux,
        Self::Mac,
        Self::Solaris,
        Self::Aix,
        Self::Unix,
    ];

    /// Lower-case name used in condition ids and XML.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Mac => "mac",
            Self::Solaris => "solaris",
            Self::Aix => "aix",
            Self::Unix => "unix",
        }
    }

    /// Id of the built-in condition, e.g. `instill.linuxinstall`.
    #[must_use]
    pub fn condition_id(self) -> String {
        format!("instill.{}install", self.as_str())
    }

    /// Whether `platform` passes the check.
    #[must_use]
    pub fn holds_for(self, platform: &Platform) -> bool {
        match self {
            Self::Windows => platform.is_family("windows"),
            Self::Mac => platform.is_family("mac"),
            Self::Unix => platform.is_family("unix"),
            Self::Linux => platform.name() == "linux",
            Self::Solaris => matches!(platform.name(), "solaris" | "illumos"),
            Self::Aix => platform.name() == "aix",
        }
    }
}

impl FromStr for PlatformCheck {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|check| check.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| value.to_owned())
    }
}

/// A boolean expression over installer variables and other conditions.
///
/// # Examples
///
/// ```
/// use instill_common::rules::{Condition, RulesEngine};
/// use instill_common::variables::Variables;
///
/// let rules = RulesEngine::new();
/// let mut variables = Variables::new();
/// variables.set("MODE", "server");
///
/// let condition = Condition::And(vec![
///     Condition::variable("MODE", "server"),
///     Condition::not(Condition::variable("MODE", "client")),
/// ]);
/// assert!(rules.is_condition_true(&condition, &variables));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    /// True when every operand is true; vacuously true when empty.
    And(Vec<Condition>),
    /// True when any operand is true; false when empty.
    Or(Vec<Condition>),
    /// Pairwise exclusive-or fold; false when empty.
    Xor(Vec<Condition>),
    /// Negation of a single operand.
    Not(Box<Condition>),
    /// Reference to a registered condition by id.
    Ref(String),
    /// True when variable `name` equals the substituted `value`.
    Variable {
        /// Variable name.
        name: String,
        /// Expected value.
        value: String,
    },
    /// True when the subject is defined or present on disk.
    Exists(Subject),
    /// True when the subject is unset, blank, or absent.
    Empty(Subject),
    /// Integer comparison between a variable and a value.
    CompareNumerics {
        /// Variable holding the left operand.
        name: String,
        /// Right operand, substituted before parsing.
        value: String,
        /// Relation that must hold.
        operator: ComparisonOperator,
    },
    /// Version comparison between two substituted strings.
    CompareVersions {
        /// Left operand.
        left: String,
        /// Right operand.
        right: String,
        /// Relation that must hold.
        operator: ComparisonOperator,
    },
    /// True when the pack with this id is selected.
    PackSelection(String),
    /// True when the host platform passes the check.
    Platform(PlatformCheck),
}

impl Condition {
    /// Convenience constructor for [`Condition::Variable`].
    #[must_use]
    pub fn variable(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Variable {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Convenience constructor for [`Condition::Ref`].
    #[must_use]
    pub fn reference(id: impl Into<String>) -> Self {
        Self::Ref(id.into())
    }

    /// Wraps `condition` in [`Condition::Not`].
    #[must_use]
    pub fn not(condition: Self) -> Self {
        Self::Not(Box::new(condition))
    }

    /// Type name used in the `type` attribute.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::And(_) => "and",
            Self::Or(_) => "or",
            Self::Xor(_) => "xor",
            Self::Not(_) => "not",
            Self::Ref(_) => "ref",
            Self::Variable { .. } => "variable",
            Self::Exists(_) => "exists",
            Self::Empty(_) => "empty",
            Self::CompareNumerics { .. } => "comparenumerics",
            Self::CompareVersions { .. } => "compareversions",
            Self::PackSelection(_) => "packselection",
            Self::Platform(_) => "platform",
        }
    }

    /// Ids of every condition referenced directly or through operands.
    #[must_use]
    pub fn references(&self) -> Vec<&str> {
        let mut found = Vec::new();
        self.collect_references(&mut found);
        found
    }

    fn collect_references<'a>(&'a self, found: &mut Vec<&'a str>) {
        match self {
            Self::And(operands) | Self::Or(operands) | Self::Xor(operands) => {
                for operand in operands {
                    operand.collect_references(found);
                }
            }
            Self::Not(operand) => operand.collect_references(found),
            Self::Ref(id) => found.push(id),
            _ => {}
        }
    }

    pub(crate) fn evaluate(&self, context: &mut Evaluation<'_>) -> bool {
        match self {
            Self::And(operands) => operands.iter().all(|operand| operand.evaluate(context)),
            Self::Or(operands) => operands.iter().any(|operand| operand.evaluate(context)),
            Self::Xor(operands) => {
                let mut values = operands.iter().map(|operand| operand.evaluate(context));
                match values.next() {
                    Some(first) => values.fold(first, |acc, value| acc != value),
                    None => false,
                }
            }
            Self::Not(operand) => !operand.evaluate(context),
            Self::Ref(id) => context.evaluate_reference(id),
            Self::Variable { name, value } => {
                let expected = context.substitute(value);
                context.variables.get(name) == Some(expected.as_str())
            }
            Self::Exists(subject) => context.exists(subject),
            Self::Empty(subject) => context.is_empty(subject),
            Self::CompareNumerics {
                name,
                value,
                operator,
            } => {
                let left = context.variables.get(name).and_then(parse_number);
                let right = parse_number(&context.substitute(value));
                match (left, right) {
                    (Some(left), Some(right)) => operator.accepts(left.cmp(&right)),
                    _ => false,
                }
            }
            Self::CompareVersions {
                left,
                right,
                operator,
            } => {
                let left = context.substitute(left);
                let right = context.substitute(right);
                operator.accepts(compare_versions(&left, &right))
            }
            Self::PackSelection(pack) => context
                .variables
                .get_bool(&format!("{PACK_SELECTED_PREFIX}{pack}"), false),
            Self::Platform(check) => check.holds_for(context.rules.platform()),
        }
    }
}

fn parse_number(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

/// State threaded through a single evaluation.
pub(crate) struct Evaluation<'a> {
    pub(crate) rules: &'a RulesEngine,
    pub(crate) variables: &'a Variables,
    active: Vec<String>,
}

impl<'a> Evaluation<'a> {
    pub(crate) const fn new(rules: &'a RulesEngine, variables: &'a Variables) -> Self {
        Self {
            rules,
            variables,
            active: Vec::new(),
        }
    }

    pub(crate) fn substitute(&self, text: &str) -> String {
        VariableSubstitutor::new(self.variables).substitute(text, SubstitutionType::Plain)
    }

    pub(crate) fn evaluate_reference(&mut self, id: &str) -> bool {
        if self.active.iter().any(|active| active == id) {
            warn!("condition {id} refers to itself; treating as false");
            return false;
        }
        let rules = self.rules;
        let Some(condition) = rules.get_condition(id) else {
            warn!("condition {id} is not defined; treating as false");
            return false;
        };
        self.active.push(id.to_owned());
        let result = condition.evaluate(self);
        self.active.pop();
        result
    }

    fn exists(&self, subject: &Subject) -> bool {
        match subject {
            Subject::Variable(name) => self.variables.contains(name),
            Subject::Text(text) => !self.substitute(text).is_empty(),
            Subject::File(path) | Subject::Dir(path) => {
                Utf8Path::new(&self.substitute(path)).exists()
            }
        }
    }

    fn is_empty(&self, subject: &Subject) -> bool {
        match subject {
            Subject::Variable(name) => self
                .variables
                .get(name)
                .is_none_or(|value| value.trim().is_empty()),
            Subject::Text(text) => self.substitute(text).trim().is_empty(),
            Subject::File(path) => std::fs::metadata(self.substitute(path))
                .map_or(true, |metadata| metadata.len() == 0),
            Subject::Dir(path) => std::fs::read_dir(self.substitute(path))
                .map_or(true, |mut entries| entries.next().is_none()),
        }
    }
}
