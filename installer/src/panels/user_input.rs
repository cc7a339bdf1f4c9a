//! Prompts for user-defined variables.

use super::PanelHandler;
use crate::console::{ConsoleIo, ask, choose, confirm, say};
use crate::error::{InstallerError, Result};
use crate::install_data::{InstallData, message_args};
use crate::properties::Properties;
use crate::session::Session;
use instill_common::i18n::FluentValue;
use instill_common::model::{FieldKind, Panel, UserInputField};
use instill_common::xml::XmlElement;
use log::debug;
use std::io::Write;

const USER_INPUT_ELEMENT: &str = "userInput";
const ENTRY_ELEMENT: &str = "entry";

/// Asks for the values of the panel's fields and stores them as variables.
#[derive(Clone, Copy, Debug, Default)]
pub struct UserInputPanel;

/// The value a field starts with: the variable when set, else the
/// substituted default.
fn initial_value(data: &InstallData, field: &UserInputField) -> String {
    if let Some(value) = data.variables.get(&field.variable) {
        return value.to_owned();
    }
    match (&field.default_value, field.kind) {
        (Some(default), _) => data.substitute(default),
        (None, FieldKind::Check) => "false".to_owned(),
        (None, FieldKind::Combo) => field.choices.first().cloned().unwrap_or_default(),
        (None, FieldKind::Text | FieldKind::Password) => String::new(),
    }
}

/// Stores `value` for `field`, rejecting values a combo does not offer.
fn assign(data: &mut InstallData, panel: &Panel, field: &UserInputField, value: &str) -> Result<()> {
    if field.kind == FieldKind::Combo && !field.choices.iter().any(|choice| choice == value) {
        return Err(InstallerError::ValidationFailed {
            panel: panel.panel_id(),
            message: data.message(
                "console-invalid-choice",
                &message_args([("value", FluentValue::from(value))]),
            ),
        });
    }
    debug!("{} = {}", field.variable, if field.kind == FieldKind::Password { "***" } else { value });
    data.variables.set(field.variable.clone(), value.to_owned());
    Ok(())
}

fn ask_field(
    data: &InstallData,
    field: &UserInputField,
    console: &mut dyn ConsoleIo,
) -> Result<String> {
    let label = data.translate(&field.label);
    let current = initial_value(data, field);
    match field.kind {
        FieldKind::Text | FieldKind::Password => {
            let shown = if field.kind == FieldKind::Password { "" } else { current.as_str() };
            let prompt = data.message(
                "console-input-prompt",
                &message_args([
                    ("label", FluentValue::from(label.as_str())),
                    ("default", FluentValue::from(shown)),
                ]),
            );
            ask(console, &prompt, &current)
        }
        FieldKind::Check => {
            let checked = current.eq_ignore_ascii_case("true");
            let prompt = data.message(
                "console-input-prompt",
                &message_args([
                    ("label", FluentValue::from(label.as_str())),
                    ("default", FluentValue::from(if checked { "y" } else { "n" })),
                ]),
            );
            let checked = confirm(console, data.localiser(), &prompt, checked)?;
            Ok(checked.to_string())
        }
        FieldKind::Combo => {
            say(console, &label)?;
            for (index, choice) in field.choices.iter().enumerate() {
                let line = data.message(
                    "console-input-choice",
                    &message_args([
                        ("index", FluentValue::from(index + 1)),
                        ("choice", FluentValue::from(data.translate(choice))),
                    ]),
                );
                say(console, &line)?;
            }
            let default = field
                .choices
                .iter()
                .position(|choice| *choice == current)
                .unwrap_or(0);
            let prompt = data.message(
                "console-input-choose",
                &message_args([("default", FluentValue::from(default + 1))]),
            );
            let picked = choose(console, data.localiser(), &prompt, field.choices.len(), default)?;
            Ok(field.choices.get(picked).cloned().unwrap_or_default())
        }
    }
}

impl PanelHandler for UserInputPanel {
    fn make_xml_data(&self, session: &Session<'_>, panel: &Panel, root: &mut XmlElement) {
        let mut input = XmlElement::new(USER_INPUT_ELEMENT);
        for field in &panel.fields {
            let mut entry = XmlElement::new(ENTRY_ELEMENT);
            entry.set_attribute("key", field.variable.clone());
            entry.set_attribute("value", initial_value(&session.data, field));
            input.add_child(entry);
        }
        root.add_child(input);
    }

    fn run_automated(
        &self,
        session: &mut Session<'_>,
        panel: &Panel,
        root: &XmlElement,
        _out: &mut dyn Write,
    ) -> Result<()> {
        let input = root.first_child_named(USER_INPUT_ELEMENT).ok_or_else(|| {
            InstallerError::MissingPanelData {
                panel: panel.panel_id(),
            }
        })?;
        for entry in input.children_named(ENTRY_ELEMENT) {
            let key = entry.require_attribute("key")?;
            let value = entry.attribute_or("value", "");
            match panel.fields.iter().find(|field| field.variable == key) {
                Some(field) => assign(&mut session.data, panel, field, value)?,
                None => {
                    debug!("{key} is not a field of {}", panel.panel_id());
                    session.data.variables.set(key.to_owned(), value.to_owned());
                }
            }
        }
        Ok(())
    }

    fn run_console(
        &self,
        session: &mut Session<'_>,
        panel: &Panel,
        console: &mut dyn ConsoleIo,
    ) -> Result<bool> {
        for field in &panel.fields {
            let value = ask_field(&session.data, field, console)?;
            assign(&mut session.data, panel, field, &value)?;
        }
        Ok(true)
    }

    fn generate_properties(
        &self,
        session: &Session<'_>,
        panel: &Panel,
        properties: &mut Properties,
    ) {
        for field in &panel.fields {
            properties.set(field.variable.clone(), initial_value(&session.data, field));
        }
    }

    fn run_from_properties(
        &self,
        session: &mut Session<'_>,
        panel: &Panel,
        properties: &Properties,
        _out: &mut dyn Write,
    ) -> Result<()> {
        for field in &panel.fields {
            let value = match properties.get(&field.variable) {
                Some(value) => value.to_owned(),
                None if field.default_value.is_some() || field.kind == FieldKind::Check => {
                    initial_value(&session.data, field)
                }
                None => {
                    return Err(InstallerError::MissingProperty {
                        key: field.variable.clone(),
                    });
                }
            };
            assign(&mut session.data, panel, field, &value)?;
        }
        Ok(())
    }
}
