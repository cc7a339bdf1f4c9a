//! `<panels>` parsing, including inline user-input fields.

use crate::error::Result;
use instill_common::model::{FieldKind, Panel, UserInputField};
use instill_common::platform::OsConstraint;
use instill_common::xml::XmlElement;

pub(super) fn read_panels(element: &XmlElement) -> Result<Vec<Panel>> {
    element.children_named("panel").map(read_panel).collect()
}

fn read_panel(node: &XmlElement) -> Result<Panel> {
    let mut panel = Panel::new(node.require_attribute("classname")?);
    panel.id = node.attribute("id").map(str::to_owned);
    panel.condition = node.attribute("condition").map(str::to_owned);
    panel.os = OsConstraint::from_children(node);
    panel.validator = node
        .first_child_named("validator")
        .map(|validator| validator.require_attribute("classname").map(str::to_owned))
        .transpose()?;
    panel.help = node.first_child_named("help").and_then(|help| {
        help.attribute("src")
            .or_else(|| help.content().map(str::trim))
            .map(str::to_owned)
    });

    if let Some(configuration) = node.first_child_named("configuration") {
        for param in configuration.children_named("param") {
            panel.configuration.insert(
                param.require_attribute("name")?.to_owned(),
                param.attribute_or("value", "").to_owned(),
            );
        }
    }

    for field in node.children_named("field") {
        panel.fields.push(read_field(field)?);
    }
    Ok(panel)
}

fn read_field(node: &XmlElement) -> Result<UserInputField> {
    let kind: FieldKind = node
        .attribute_or("type", "text")
        .parse()
        .map_err(|value: String| node.invalid_value("field type", value))?;
    let spec = node.first_child_named("spec");
    let choices: Vec<&XmlElement> = spec
        .map(|spec| spec.children_named("choice").collect())
        .unwrap_or_default();

    let default_value = match kind {
        FieldKind::Combo => choices
            .iter()
            .find(|choice| choice.bool_attribute("set", false))
            .or_else(|| choices.first())
            .and_then(|choice| choice.attribute("value"))
            .map(str::to_owned),
        _ => spec.and_then(|spec| spec.attribute("set")).map(str::to_owned),
    };

    Ok(UserInputField {
        variable: node.require_attribute("variable")?.to_owned(),
        kind,
        label: spec
            .and_then(|spec| spec.attribute("txt"))
            .unwrap_or_default()
            .to_owned(),
        default_value,
        choices: choices
            .iter()
            .map(|choice| choice.require_attribute("value").map(str::to_owned))
            .collect::<std::result::Result<_, _>>()?,
    })
}
