//! Mutable in-memory element tree with source locations.

use super::error::{Result, XmlError};

/// One element of a parsed document.
///
/// Attributes keep their document order so that a tree written back out reads
/// the same way it was authored.
///
/// # Examples
///
/// ```
/// use instill_common::xml::XmlElement;
///
/// let mut pack = XmlElement::new("pack");
/// pack.set_attribute("name", "core");
/// pack.add_child(XmlElement::with_content("description", "Core files"));
///
/// assert_eq!(pack.attribute("name"), Some("core"));
/// assert_eq!(pack.child_content("description"), Some("Core files"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
    content: Option<String>,
    line: usize,
    system_id: String,
}

impl XmlElement {
    /// Creates an element with no attributes, children, or content.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a leaf element holding `content`.
    #[must_use]
    pub fn with_content(name: impl Into<String>, content: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.content = Some(content.into());
        element
    }

    /// Records where the element was read from.
    #[must_use]
    pub fn located(mut self, system_id: impl Into<String>, line: usize) -> Self {
        self.system_id = system_id.into();
        self.line = line;
        self
    }

    /// Element name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 1-based source line, or 0 for elements built in memory.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Identifier of the source document (usually its path).
    #[must_use]
    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    /// Returns the attribute value, if present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the attribute value or `default` when absent.
    #[must_use]
    pub fn attribute_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.attribute(name).unwrap_or(default)
    }

    /// Parses a boolean attribute (`true`/`yes`/`on`), returning `default`
    /// when absent.
    #[must_use]
    pub fn bool_attribute(&self, name: &str, default: bool) -> bool {
        self.attribute(name).map_or(default, |value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "true" | "yes" | "on"
            )
        })
    }

    /// Returns the attribute value or a located error naming it.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::MissingAttribute`] when the attribute is absent.
    pub fn require_attribute(&self, name: &str) -> Result<&str> {
        self.attribute(name)
            .ok_or_else(|| XmlError::MissingAttribute {
                element: self.name.clone(),
                attribute: name.to_owned(),
                system_id: self.system_id.clone(),
                line: self.line,
            })
    }

    /// Whether the attribute is present.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Sets or replaces an attribute, keeping its original position.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Removes an attribute, returning its previous value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// Attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Text content, if any.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Replaces the text content.
    pub fn set_content(&mut self, content: Option<String>) {
        self.content = content;
    }

    pub(crate) fn append_content(&mut self, text: &str) {
        match &mut self.content {
            Some(existing) => existing.push_str(text),
            None => self.content = Some(text.to_owned()),
        }
    }

    /// Whether the element has child elements.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Child elements in document order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Children with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// First child with the given name.
    #[must_use]
    pub fn first_child_named(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Trimmed content of the first child with the given name.
    #[must_use]
    pub fn child_content(&self, name: &str) -> Option<&str> {
        self.first_child_named(name)
            .and_then(Self::content)
            .map(str::trim)
    }

    /// Returns the first child with the given name or a located error.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::MissingElement`] when no such child exists.
    pub fn require_child(&self, name: &str) -> Result<&Self> {
        self.first_child_named(name)
            .ok_or_else(|| XmlError::MissingElement {
                element: self.name.clone(),
                child: name.to_owned(),
                system_id: self.system_id.clone(),
                line: self.line,
            })
    }

    /// Builds an [`XmlError::InvalidValue`] located at this element.
    #[must_use]
    pub fn invalid_value(&self, what: impl Into<String>, value: impl Into<String>) -> XmlError {
        XmlError::InvalidValue {
            what: what.into(),
            value: value.into(),
            system_id: self.system_id.clone(),
            line: self.line,
        }
    }

    /// Appends a child element.
    pub fn add_child(&mut self, child: Self) {
        self.children.push(child);
    }

    /// Removes and returns the child at `index`.
    pub fn remove_child(&mut self, index: usize) -> Option<Self> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    /// Removes every child with the given name, returning how many went.
    pub fn remove_children_named(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|child| child.name != name);
        before - self.children.len()
    }
}
