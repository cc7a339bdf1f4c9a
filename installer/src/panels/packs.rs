//! Pack selection.

use super::PanelHandler;
use crate::console::{ConsoleIo, confirm, say};
use crate::error::{InstallerError, Result};
use crate::install_data::{message_args, selection_variable};
use crate::properties::Properties;
use crate::session::Session;
use instill_common::i18n::FluentValue;
use instill_common::model::{Pack, Panel};
use instill_common::xml::XmlElement;
use log::{debug, warn};
use std::io::Write;

/// Lets the user choose the optional packs.
#[derive(Clone, Copy, Debug, Default)]
pub struct PacksPanel;

/// A `<pack>` entry of automation data.
#[derive(Debug)]
struct PackChoice {
    index: Option<usize>,
    name: Option<String>,
    selected: bool,
}

impl PackChoice {
    fn read(element: &XmlElement) -> Self {
        let selected = element.attribute("selected").is_some_and(is_affirmative);
        Self {
            index: element.attribute("index").and_then(|index| index.parse().ok()),
            name: element.attribute("name").map(str::to_owned),
            selected,
        }
    }

    /// Entries naming a pack match by name; the others match by index.
    fn matches(&self, index: usize, pack: &Pack) -> bool {
        match &self.name {
            Some(name) if !name.is_empty() => *name == pack.name,
            _ => self.index == Some(index),
        }
    }
}

fn is_affirmative(value: &str) -> bool {
    ["true", "yes", "on", "1"]
        .iter()
        .any(|accepted| value.trim().eq_ignore_ascii_case(accepted))
}

fn visible(session: &Session<'_>) -> Vec<Pack> {
    session.data.visible_packs().cloned().collect()
}

/// Applies a requested selection state, keeping required packs selected
/// and refusing packs whose conditions do not hold.
fn request(session: &mut Session<'_>, pack: &Pack, selected: bool) {
    let data = &mut session.data;
    if pack.required {
        if !selected {
            warn!("pack {} is required and stays selected", pack.name);
        }
        return;
    }
    if selected && !data.can_install(pack) {
        warn!(
            "pack {} cannot be selected\n{}",
            pack.name,
            data.pack_details(pack)
        );
        data.select(pack.key(), false);
        return;
    }
    debug!("pack {} {}", pack.name, if selected { "selected" } else { "deselected" });
    data.select(pack.key(), selected);
}

impl PanelHandler for PacksPanel {
    fn make_xml_data(&self, session: &Session<'_>, _panel: &Panel, root: &mut XmlElement) {
        for (index, pack) in session.data.visible_packs().enumerate() {
            let mut element = XmlElement::new("pack");
            element.set_attribute("index", index.to_string());
            element.set_attribute("name", pack.name.clone());
            element.set_attribute("selected", session.data.is_selected(pack.key()).to_string());
            root.add_child(element);
        }
    }

    fn run_automated(
        &self,
        session: &mut Session<'_>,
        _panel: &Panel,
        root: &XmlElement,
        _out: &mut dyn Write,
    ) -> Result<()> {
        let choices: Vec<PackChoice> = root.children_named("pack").map(PackChoice::read).collect();
        for (index, pack) in visible(session).iter().enumerate() {
            if let Some(choice) = choices.iter().find(|choice| choice.matches(index, pack)) {
                request(session, pack, choice.selected);
            }
        }
        session.data.resolve_selection()
    }

    fn run_console(
        &self,
        session: &mut Session<'_>,
        _panel: &Panel,
        console: &mut dyn ConsoleIo,
    ) -> Result<bool> {
        loop {
            let header = session.data.message("console-packs-header", &message_args([]));
            say(console, &header)?;
            for pack in visible(session) {
                let name = FluentValue::from(pack.name.as_str());
                if pack.required {
                    let line = session
                        .data
                        .message("console-pack-required", &message_args([("pack", name)]));
                    say(console, &line)?;
                    session.data.select(pack.key(), true);
                    continue;
                }
                if !session.data.can_install(&pack) {
                    let line = session
                        .data
                        .message("console-pack-unavailable", &message_args([("pack", name)]));
                    say(console, &line)?;
                    say(console, &session.data.pack_details(&pack))?;
                    session.data.select(pack.key(), false);
                    continue;
                }
                if !pack.description.is_empty() {
                    say(console, &session.data.translate(&pack.description))?;
                }
                let current = session.data.is_selected(pack.key());
                let prompt = session.data.message(
                    "console-pack-prompt",
                    &message_args([
                        ("pack", name),
                        ("default", FluentValue::from(if current { "y" } else { "n" })),
                    ]),
                );
                let selected = confirm(console, session.data.localiser(), &prompt, current)?;
                session.data.select(pack.key(), selected);
            }
            match session.data.resolve_selection() {
                Ok(()) => return Ok(true),
                Err(err @ InstallerError::InvalidSelection { .. }) => {
                    say(console, &err.to_string())?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn generate_properties(
        &self,
        session: &Session<'_>,
        _panel: &Panel,
        properties: &mut Properties,
    ) {
        for pack in session.data.visible_packs().filter(|pack| !pack.required) {
            properties.set(
                selection_variable(pack.key()),
                session.data.is_selected(pack.key()).to_string(),
            );
        }
    }

    fn run_from_properties(
        &self,
        session: &mut Session<'_>,
        _panel: &Panel,
        properties: &Properties,
        _out: &mut dyn Write,
    ) -> Result<()> {
        for pack in visible(session) {
            if let Some(value) = properties.get(&selection_variable(pack.key())) {
                request(session, &pack, is_affirmative(value));
            }
        }
        session.data.resolve_selection()
    }
}
