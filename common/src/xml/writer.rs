//! Serialises element trees back to indented XML text.

use super::element::XmlElement;
use super::error::{Result, XmlError};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// Serialises `element` as a standalone UTF-8 document.
///
/// # Errors
///
/// Returns [`XmlError::Write`] if the writer rejects an event.
///
/// # Examples
///
/// ```
/// use instill_common::xml::{XmlElement, parse_str, to_xml_string};
///
/// let mut root = XmlElement::new("conditions");
/// root.add_child(XmlElement::with_content("name", "a < b"));
/// let text = to_xml_string(&root)?;
/// let reparsed = parse_str(&text, "memory")?;
/// assert_eq!(reparsed.child_content("name"), Some("a < b"));
/// # Ok::<(), instill_common::xml::XmlError>(())
/// ```
pub fn to_xml_string(element: &XmlElement) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_error)?;
    write_element(&mut writer, element)?;
    String::from_utf8(writer.into_inner()).map_err(write_error)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let start = BytesStart::new(element.name()).with_attributes(element.attributes());
    let content = element.content().filter(|text| !text.is_empty());

    if !element.has_children() && content.is_none() {
        return writer.write_event(Event::Empty(start)).map_err(write_error);
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    if let Some(text) = content {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(write_error)?;
    }
    for child in element.children() {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name())))
        .map_err(write_error)
}

fn write_error(error: impl std::fmt::Display) -> XmlError {
    XmlError::Write {
        message: error.to_string(),
    }
}
