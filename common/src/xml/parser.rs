//! Document reader built on `quick-xml` with XInclude expansion.
//!
//! `<xinclude href="..." parse="xml|text">` elements are replaced by the
//! referenced document once their end tag is seen. A referenced document
//! rooted at `<xfragment>` contributes its children rather than itself, and a
//! single optional `<xfallback>` child supplies content when the reference
//! cannot be read.

use super::element::XmlElement;
use super::error::{Result, XmlError};
use camino::{Utf8Path, Utf8PathBuf};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

const INCLUDE_ELEMENT: &str = "xinclude";
const FALLBACK_ELEMENT: &str = "xfallback";
const FRAGMENT_ELEMENT: &str = "xfragment";
const MAX_INCLUDE_DEPTH: usize = 16;

/// Parses an XML document held in memory.
///
/// `system_id` names the source in diagnostics and anchors relative
/// `xinclude` references.
///
/// # Errors
///
/// Returns [`XmlError::Parse`] for malformed input, [`XmlError::NoRoot`] for
/// an empty document, and [`XmlError::Include`] when an inclusion fails.
///
/// # Examples
///
/// ```
/// use instill_common::xml::parse_str;
///
/// let root = parse_str("<installation>\n  <info/>\n</installation>", "install.xml")?;
/// assert_eq!(root.name(), "installation");
/// assert_eq!(root.children()[0].line(), 2);
/// # Ok::<(), instill_common::xml::XmlError>(())
/// ```
pub fn parse_str(source: &str, system_id: &str) -> Result<XmlElement> {
    DocumentBuilder::new(source, system_id, 0).build()
}

/// Reads and parses the XML document at `path`.
///
/// # Errors
///
/// Returns [`XmlError::Io`] when the file cannot be read, otherwise the
/// errors documented on [`parse_str`].
pub fn parse_file(path: &Utf8Path) -> Result<XmlElement> {
    let source = std::fs::read_to_string(path).map_err(|source| XmlError::Io {
        path: path.to_owned(),
        source,
    })?;
    DocumentBuilder::new(&source, path.as_str(), 0).build()
}

/// Nodes produced when an element is closed.
enum Closed {
    Elements(Vec<XmlElement>),
    Text(String),
}

struct DocumentBuilder<'a> {
    source: &'a str,
    system_id: &'a str,
    depth: usize,
    counted_offset: usize,
    counted_line: usize,
}

impl<'a> DocumentBuilder<'a> {
    const fn new(source: &'a str, system_id: &'a str, depth: usize) -> Self {
        Self {
            source,
            system_id,
            depth,
            counted_offset: 0,
            counted_line: 1,
        }
    }

    fn build(mut self) -> Result<XmlElement> {
        let mut reader = Reader::from_str(self.source);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(error) => {
                    let offset = position(&reader);
                    return Err(self.parse_error(offset, error.to_string()));
                }
            };
            match event {
                Event::Start(start) => {
                    let element = self.open(&start, position(&reader))?;
                    stack.push(element);
                }
                Event::Empty(start) => {
                    let element = self.open(&start, position(&reader))?;
                    self.close(element, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let Some(element) = stack.pop() else {
                        return Err(self.parse_error(position(&reader), "unbalanced end tag"));
                    };
                    self.close(element, &mut stack, &mut root)?;
                }
                Event::Text(text) => {
                    let unescaped = text
                        .unescape()
                        .map_err(|error| self.parse_error(position(&reader), error.to_string()))?;
                    if let Some(current) = stack.last_mut() {
                        current.append_content(&unescaped);
                    }
                }
                Event::CData(data) => {
                    let raw = data.into_inner();
                    if let Some(current) = stack.last_mut() {
                        current.append_content(&String::from_utf8_lossy(&raw));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(self.parse_error(
                self.source.len(),
                format!("element <{}> is never closed", open.name()),
            ));
        }
        root.ok_or_else(|| XmlError::NoRoot {
            system_id: self.system_id.to_owned(),
        })
    }

    fn open(&mut self, start: &BytesStart<'_>, end_offset: usize) -> Result<XmlElement> {
        let tag_offset = self
            .source
            .get(..end_offset)
            .and_then(|prefix| prefix.rfind('<'))
            .unwrap_or(0);
        let line = self.line_at(tag_offset);
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut element = XmlElement::new(name).located(self.system_id, line);

        for attribute in start.attributes() {
            let attribute = attribute.map_err(|error| self.located_error(line, error.to_string()))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|error| self.located_error(line, error.to_string()))?;
            element.set_attribute(key, value.into_owned());
        }
        Ok(element)
    }

    fn close(
        &self,
        element: XmlElement,
        stack: &mut [XmlElement],
        root: &mut Option<XmlElement>,
    ) -> Result<()> {
        let closed = if element.name() == INCLUDE_ELEMENT {
            self.include(&element)?
        } else {
            Closed::Elements(vec![element])
        };

        match (stack.last_mut(), closed) {
            (Some(parent), Closed::Elements(elements)) => {
                for child in elements {
                    parent.add_child(child);
                }
            }
            (Some(parent), Closed::Text(text)) => parent.append_content(&text),
            (None, Closed::Elements(mut elements)) if elements.len() == 1 => {
                *root = elements.pop();
            }
            (None, _) => {
                return Err(XmlError::NoRoot {
                    system_id: self.system_id.to_owned(),
                });
            }
        }
        Ok(())
    }

    fn include(&self, directive: &XmlElement) -> Result<Closed> {
        let fallbacks: Vec<&XmlElement> = directive.children_named(FALLBACK_ELEMENT).collect();
        if fallbacks.len() != directive.children().len() || fallbacks.len() > 1 {
            return Err(self.include_error(
                directive,
                format!("{INCLUDE_ELEMENT} can optionally have a single {FALLBACK_ELEMENT} as a child"),
            ));
        }
        if self.depth >= MAX_INCLUDE_DEPTH {
            return Err(self.include_error(directive, "inclusions nested too deeply"));
        }

        let href = directive.attribute_or("href", "").trim();
        if href.is_empty() {
            let reason = if directive.has_attribute("xpointer") {
                "xpointer inclusion is not supported"
            } else {
                "xpointer must be specified if href is empty or missing"
            };
            return Err(self.include_error(directive, reason));
        }

        let parse = directive.attribute_or("parse", "xml");
        if parse != "xml" && parse != "text" {
            return Err(self.include_error(
                directive,
                format!("parse attribute must be \"xml\" or \"text\" but was {parse}"),
            ));
        }

        let path = self.resolve(href);
        match std::fs::read_to_string(&path) {
            Ok(text) if parse == "text" => Ok(Closed::Text(text)),
            Ok(text) => {
                let included = DocumentBuilder::new(&text, path.as_str(), self.depth + 1).build()?;
                Ok(splice(included))
            }
            Err(error) => match fallbacks.first() {
                Some(fallback) => self.fallback(fallback, parse),
                None => Err(self.include_error(
                    directive,
                    format!("could not load content from {path}: {error}"),
                )),
            },
        }
    }

    fn fallback(&self, fallback: &XmlElement, parse: &str) -> Result<Closed> {
        if fallback.has_children() {
            let mut children: Vec<XmlElement> = fallback.children().to_vec();
            return Ok(if children.len() == 1 && parse == "xml" {
                splice(children.remove(0))
            } else {
                Closed::Elements(children)
            });
        }
        let content = fallback.content().map(str::trim).unwrap_or_default();
        if parse == "text" {
            return Ok(Closed::Text(content.to_owned()));
        }
        if content.is_empty() {
            return Ok(Closed::Elements(Vec::new()));
        }
        let parsed = DocumentBuilder::new(content, self.system_id, self.depth + 1).build()?;
        Ok(splice(parsed))
    }

    fn resolve(&self, href: &str) -> Utf8PathBuf {
        let base = Utf8Path::new(self.system_id)
            .parent()
            .unwrap_or_else(|| Utf8Path::new(""));
        base.join(href)
    }

    fn line_at(&mut self, offset: usize) -> usize {
        if offset < self.counted_offset {
            self.counted_offset = 0;
            self.counted_line = 1;
        }
        let newlines = self
            .source
            .as_bytes()
            .get(self.counted_offset..offset)
            .map_or(0, |bytes| bytes.iter().filter(|byte| **byte == b'\n').count());
        self.counted_line += newlines;
        self.counted_offset = offset;
        self.counted_line
    }

    fn parse_error(&mut self, offset: usize, message: impl Into<String>) -> XmlError {
        let line = self.line_at(offset.min(self.source.len()));
        self.located_error(line, message)
    }

    fn located_error(&self, line: usize, message: impl Into<String>) -> XmlError {
        XmlError::Parse {
            system_id: self.system_id.to_owned(),
            line,
            message: message.into(),
        }
    }

    fn include_error(&self, directive: &XmlElement, reason: impl Into<String>) -> XmlError {
        XmlError::Include {
            system_id: self.system_id.to_owned(),
            line: directive.line(),
            reason: reason.into(),
        }
    }
}

fn splice(included: XmlElement) -> Closed {
    if included.name() == FRAGMENT_ELEMENT {
        Closed::Elements(included.children().to_vec())
    } else {
        Closed::Elements(vec![included])
    }
}

fn position<R>(reader: &Reader<R>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
