//! Variable substitution for strings and parsable files.
//!
//! References take the form `$name` or `${name}` (the sigil depends on the
//! [`SubstitutionType`]). Names start with a letter and continue with
//! letters, digits, `_`, `.` or `-`; the brace form accepts any character up
//! to the closing brace. `${ENV[NAME]}` reads the process environment.
//! References to unknown variables are copied through unchanged.

use crate::variables::Variables;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Peekable;
use std::str::{Chars, FromStr};

/// Escaping and delimiter style applied during substitution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubstitutionType {
    /// `$name`, values inserted verbatim.
    #[default]
    #[serde(rename = "plain")]
    Plain,
    /// `$name`, values escaped for Java-style `.properties` files.
    #[serde(rename = "javaprop")]
    JavaProperties,
    /// `$name`, backslashes doubled.
    #[serde(rename = "java")]
    Java,
    /// `$name`, values escaped as XML character data.
    #[serde(rename = "xml")]
    Xml,
    /// `%name`, carriage returns stripped from values.
    #[serde(rename = "shell")]
    Shell,
    /// `@name`, values inserted verbatim.
    #[serde(rename = "at")]
    At,
    /// `@name@`, values inserted verbatim.
    #[serde(rename = "ant")]
    Ant,
}

impl SubstitutionType {
    const fn delimiters(self) -> (char, Option<char>) {
        match self {
            Self::Shell => ('%', None),
            Self::At => ('@', None),
            Self::Ant => ('@', Some('@')),
            Self::Plain | Self::JavaProperties | Self::Java | Self::Xml => ('$', None),
        }
    }

    /// The name used in installation descriptions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::JavaProperties => "javaprop",
            Self::Java => "java",
            Self::Xml => "xml",
            Self::Shell => "shell",
            Self::At => "at",
            Self::Ant => "ant",
        }
    }
}

impl fmt::Display for SubstitutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unrecognised substitution type name.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown substitution type `{0}`")]
pub struct UnknownSubstitutionType(pub String);

impl FromStr for SubstitutionType {
    type Err = UnknownSubstitutionType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "plain" => Ok(Self::Plain),
            "javaprop" => Ok(Self::JavaProperties),
            "java" => Ok(Self::Java),
            "xml" => Ok(Self::Xml),
            "shell" => Ok(Self::Shell),
            "at" => Ok(Self::At),
            "ant" => Ok(Self::Ant),
            _ => Err(UnknownSubstitutionType(value.to_owned())),
        }
    }
}

/// Replaces variable references with values from a [`Variables`] store.
///
/// # Examples
///
/// ```
/// use instill_common::substitutor::{SubstitutionType, VariableSubstitutor};
/// use instill_common::variables::Variables;
///
/// let mut variables = Variables::new();
/// variables.set("INSTALL_PATH", "/opt/demo");
/// let substitutor = VariableSubstitutor::new(&variables);
///
/// assert_eq!(
///     substitutor.substitute("${INSTALL_PATH}/bin and $UNKNOWN", SubstitutionType::Plain),
///     "/opt/demo/bin and $UNKNOWN"
/// );
/// assert_eq!(
///     substitutor.substitute("cd %INSTALL_PATH", SubstitutionType::Shell),
///     "cd /opt/demo"
/// );
/// ```
#[derive(Clone, Copy, Debug)]
pub struct VariableSubstitutor<'a> {
    variables: &'a Variables,
    braces_required: bool,
}

impl<'a> VariableSubstitutor<'a> {
    /// Creates a substitutor reading from `variables`.
    #[must_use]
    pub const fn new(variables: &'a Variables) -> Self {
        Self {
            variables,
            braces_required: false,
        }
    }

    /// Only substitute the `${name}` form when `required` is true.
    #[must_use]
    pub const fn braces_required(mut self, required: bool) -> Self {
        self.braces_required = required;
        self
    }

    /// Substitutes every resolvable reference in `text`.
    #[must_use]
    pub fn substitute(&self, text: &str, kind: SubstitutionType) -> String {
        let (sigil, terminator) = kind.delimiters();
        let mut output = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();

        while let Some(current) = chars.next() {
            if current != sigil {
                output.push(current);
                continue;
            }

            let braces = chars.peek() == Some(&'{');
            if braces {
                chars.next();
            } else if self.braces_required || chars.peek().is_none() {
                output.push(sigil);
                continue;
            }

            let name = read_name(&mut chars, braces);
            let closer = if braces { Some('}') } else { terminator };
            let closed = match closer {
                Some(expected) => {
                    chars.peek() == Some(&expected) && (terminator.is_none() || !braces)
                }
                None => true,
            };

            match self.resolve(&name, braces).filter(|_| closed && !name.is_empty()) {
                Some(value) => {
                    output.push_str(&escape(&value, kind));
                    if closer.is_some() {
                        chars.next();
                    }
                }
                None => {
                    output.push(sigil);
                    if braces {
                        output.push('{');
                    }
                    output.push_str(&name);
                }
            }
        }
        output
    }

    fn resolve(&self, name: &str, braces: bool) -> Option<String> {
        if braces {
            if let Some(key) = name
                .strip_prefix("ENV[")
                .and_then(|rest| rest.strip_suffix(']'))
            {
                return Some(std::env::var(key).unwrap_or_default());
            }
        }
        self.variables.get(name).map(str::to_owned)
    }
}

fn read_name(chars: &mut Peekable<Chars<'_>>, braces: bool) -> String {
    let mut name = String::new();
    while let Some(&next) = chars.peek() {
        let accepted = if braces {
            next != '}'
        } else {
            next.is_ascii_alphabetic()
                || (!name.is_empty() && (next.is_ascii_digit() || matches!(next, '_' | '.' | '-')))
        };
        if !accepted {
            break;
        }
        name.push(next);
        chars.next();
    }
    name
}

fn escape(value: &str, kind: SubstitutionType) -> String {
    match kind {
        SubstitutionType::Plain | SubstitutionType::At | SubstitutionType::Ant => value.to_owned(),
        SubstitutionType::Shell => value.replace('\r', ""),
        SubstitutionType::Java => value.replace('\\', "\\\\"),
        SubstitutionType::JavaProperties => escape_properties(value),
        SubstitutionType::Xml => escape_xml(value),
    }
}

fn escape_properties(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut leading = true;
    for character in value.chars() {
        match character {
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            ' ' if leading => escaped.push_str("\\ "),
            '\\' | '"' | '\'' => {
                leading = false;
                escaped.push('\\');
                escaped.push(character);
            }
            other => {
                if other != ' ' {
                    leading = false;
                }
                escaped.push(other);
            }
        }
    }
    escaped
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}
