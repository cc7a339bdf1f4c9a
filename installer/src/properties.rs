//! Java-style `.properties` files.
//!
//! Console installs can be driven from a properties file, and a template of
//! every property the panels read can be generated. The syntax follows
//! `java.util.Properties`: `#` and `!` comments, `=`/`:`/whitespace
//! separators, backslash escapes including `\uXXXX`, and line continuations.
//! Files are read and written as UTF-8.

use camino::Utf8Path;
use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::error::{InstallerError, Result};

/// An ordered set of string properties.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses properties text.
    ///
    /// ```
    /// use instill_installer::properties::Properties;
    ///
    /// let props = Properties::parse("# target\nINSTALL_PATH = /opt/demo\nname:Demo \\\n  App\n");
    /// assert_eq!(props.get("INSTALL_PATH"), Some("/opt/demo"));
    /// assert_eq!(props.get("name"), Some("Demo App"));
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut entries = BTreeMap::new();
        let mut lines = text.lines();
        while let Some(first) = lines.next() {
            let trimmed = first.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }
            let mut logical = String::from(trimmed);
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some(next) => logical.push_str(next.trim_start()),
                    None => break,
                }
            }
            let (key, value) = split_entry(&logical);
            entries.insert(unescape(key), unescape(value));
        }
        Self { entries }
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Io`] when the file cannot be read.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| InstallerError::io(path, err))?;
        Ok(Self::parse(&text))
    }

    /// Properties taken from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::vars().collect()
    }

    /// The value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Sets `key` to `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Overwrites entries with those of `other`.
    pub fn merge(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the entries, preceded by `comment` lines when given.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write(&self, out: &mut dyn Write, comment: Option<&str>) -> io::Result<()> {
        if let Some(comment) = comment {
            for line in comment.lines() {
                writeln!(out, "# {line}")?;
            }
        }
        for (key, value) in &self.entries {
            writeln!(out, "{}={}", escape(key, true), escape(value, false))?;
        }
        Ok(())
    }

    /// Writes the entries to the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Io`] when the file cannot be written.
    pub fn store(&self, path: &Utf8Path, comment: Option<&str>) -> Result<()> {
        let mut buffer = Vec::new();
        self.write(&mut buffer, comment)
            .and_then(|()| std::fs::write(path, buffer))
            .map_err(|err| InstallerError::io(path, err))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Splits a logical line at the first unescaped separator.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || c.is_whitespace() {
            key_end = index;
            break;
        }
    }
    let (key, rest) = line.split_at(key_end);
    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix(['=', ':'])
        .map_or(rest, str::trim_start);
    (key, rest)
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (index, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{c}' => out.push_str("\\f"),
            ' ' if is_key || index == 0 => out.push_str("\\ "),
            '=' | ':' | '#' | '!' if is_key || index == 0 => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("key=value", "key", "value")]
    #[case("key = value", "key", "value")]
    #[case("key:value", "key", "value")]
    #[case("key value", "key", "value")]
    #[case("   indented=yes", "indented", "yes")]
    #[case("path=C:\\\\Program Files\\\\Demo", "path", "C:\\Program Files\\Demo")]
    #[case("with\\ space=1", "with space", "1")]
    #[case("eq\\=key=2", "eq=key", "2")]
    #[case("unicode=caf\\u00e9", "unicode", "café")]
    #[case("empty=", "empty", "")]
    #[case("bare", "bare", "")]
    fn parses_entries(#[case] text: &str, #[case] key: &str, #[case] value: &str) {
        let props = Properties::parse(text);
        assert_eq!(props.get(key), Some(value), "{props:?}");
    }

    #[test]
    fn skips_comments_and_joins_continuations() {
        let props = Properties::parse(
            "# comment\n! also comment\n\nlist=one, \\\n      two, \\\n      three\nlast=done\n",
        );
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("list"), Some("one, two, three"));
        assert_eq!(props.get("last"), Some("done"));
    }

    #[test]
    fn escaped_backslash_at_end_is_not_a_continuation() {
        let props = Properties::parse("dir=C:\\\\\nnext=1\n");
        assert_eq!(props.get("dir"), Some("C:\\"));
        assert_eq!(props.get("next"), Some("1"));
    }

    #[test]
    fn written_text_parses_back() {
        let props: Properties = [
            ("INSTALL_PATH", "/opt/demo app"),
            ("odd key=", " leading space"),
            ("multi", "line one\nline two"),
        ]
        .into_iter()
        .collect();

        let mut out = Vec::new();
        props.write(&mut out, Some("generated")).expect("write");
        let text = String::from_utf8(out).expect("utf-8");
        assert!(text.starts_with("# generated\n"));
        assert_eq!(Properties::parse(&text), props);
    }

    #[test]
    fn merge_overwrites_existing_entries() {
        let mut base: Properties = [("a", "1"), ("b", "2")].into_iter().collect();
        base.merge([("b", "20"), ("c", "30")].into_iter().collect());
        let merged: Vec<_> = base.iter().collect();
        assert_eq!(merged, [("a", "1"), ("b", "20"), ("c", "30")]);
    }

    #[test]
    fn environment_properties_include_set_variables() {
        temp_env::with_var("INSTILL_TEST_PROPERTY", Some("from-env"), || {
            let props = Properties::from_env();
            assert_eq!(props.get("INSTILL_TEST_PROPERTY"), Some("from-env"));
        });
    }
}
