//! Unattended installation driven by a recorded XML document.
//!
//! The document has one child element per shown panel, named after the
//! panel class. When a class appears more than once, a panel with an id
//! takes the element carrying the same `id` attribute and the others take
//! their elements in order. The root's `langpack` attribute names the
//! language the document was recorded in.

use crate::console::default_lock_dir;
use crate::error::{InstallerError, Result};
use crate::lock::require_lock;
use crate::panels::{check_panels, handler_for, is_shown};
use crate::session::Session;
use crate::validators::{short_name, validate};
use camino::{Utf8Path, Utf8PathBuf};
use instill_common::model::Panel;
use instill_common::xml::{XmlElement, parse_file, to_xml_string};
use log::{error, info};
use std::collections::HashMap;
use std::io::Write;

/// Printed before the first panel runs.
pub const AUTOMATED_START: &str = "[ Starting automated installation ]";
/// Printed when every panel succeeded.
pub const AUTOMATED_DONE: &str = "[ Automated installation done ]";
/// Printed when a panel failed.
pub const AUTOMATED_FAILED: &str = "[ Automated installation FAILED! ]";
/// Root element of an automation document.
pub const AUTOMATION_ROOT: &str = "AutomatedInstallation";
/// Root attribute naming the recorded language.
pub const LANGPACK_ATTRIBUTE: &str = "langpack";

/// Parses the automation document at `path`.
///
/// # Errors
///
/// Returns [`InstallerError::Xml`] when the file is unreadable or malformed.
pub fn read_automation(path: &Utf8Path) -> Result<XmlElement> {
    Ok(parse_file(path)?)
}

/// The ISO3 language code the document was recorded in.
#[must_use]
pub fn automation_language(root: &XmlElement) -> Option<&str> {
    root.attribute(LANGPACK_ATTRIBUTE)
        .map(str::trim)
        .filter(|code| !code.is_empty())
}

/// Builds an automation document from the session's current state.
#[must_use]
pub fn make_automation(session: &Session<'_>) -> XmlElement {
    let mut root = XmlElement::new(AUTOMATION_ROOT);
    root.set_attribute(LANGPACK_ATTRIBUTE, session.data.localiser().iso3());
    for panel in &session.data.model.panels {
        let Some(handler) = handler_for(&panel.class_name) else {
            continue;
        };
        if !session.data.can_show(panel) {
            continue;
        }
        let mut element = XmlElement::new(panel.class_name.clone());
        if let Some(id) = &panel.id {
            element.set_attribute("id", id.clone());
        }
        handler.make_xml_data(session, panel, &mut element);
        root.add_child(element);
    }
    root
}

/// Writes [`make_automation`] to `path`.
///
/// # Errors
///
/// Returns [`InstallerError::Io`] when the file cannot be written.
pub fn record_installation(session: &Session<'_>, path: &Utf8Path) -> Result<()> {
    let xml = to_xml_string(&make_automation(session))?;
    std::fs::write(path, xml).map_err(|err| InstallerError::io(path, err))?;
    info!("automation data written to {path}");
    Ok(())
}

/// The element of `root` holding the data of `panel`, the `index`th shown
/// panel of its class.
fn find_section<'r>(root: &'r XmlElement, panel: &Panel, index: usize) -> Option<&'r XmlElement> {
    let class = short_name(&panel.class_name);
    let sections: Vec<&XmlElement> = root
        .children()
        .iter()
        .filter(|child| short_name(child.name()) == class)
        .collect();
    if let Some(id) = panel.id.as_deref() {
        if let Some(section) = sections.iter().find(|section| section.attribute("id") == Some(id)) {
            return Some(*section);
        }
    }
    sections.get(index).copied()
}

/// Replays an automation document over a [`Session`].
pub struct AutomatedInstaller<'s, 'a> {
    session: &'s mut Session<'a>,
    lock_dir: Utf8PathBuf,
}

impl<'s, 'a> AutomatedInstaller<'s, 'a> {
    /// Installer taking its lock in the system temporary directory.
    pub fn new(session: &'s mut Session<'a>) -> Self {
        Self {
            session,
            lock_dir: default_lock_dir(),
        }
    }

    /// Takes the installer lock in `dir` instead.
    #[must_use]
    pub fn with_lock_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.lock_dir = dir.into();
        self
    }

    /// Runs every shown panel with its section of `root`, writing banners
    /// and progress to `out`.
    ///
    /// # Errors
    ///
    /// Returns the first failure, after writing the failure banner. A held
    /// installer lock is [`InstallerError::Locked`].
    pub fn run(&mut self, root: &XmlElement, out: &mut dyn Write) -> Result<()> {
        write_line(out, AUTOMATED_START)?;
        let outcome = self.install(root, out);
        match &outcome {
            Ok(()) => write_line(out, AUTOMATED_DONE)?,
            Err(err) => {
                error!("automated installation failed: {err}");
                write_line(out, AUTOMATED_FAILED)?;
            }
        }
        outcome
    }

    fn install(&mut self, root: &XmlElement, out: &mut dyn Write) -> Result<()> {
        let _lock = require_lock(&self.lock_dir, &self.session.data.model.info.app_name)?;
        let panels = self.session.data.model.panels.clone();
        check_panels(&panels)?;

        let mut instances: HashMap<&str, usize> = HashMap::new();
        for panel in &panels {
            let handler =
                handler_for(&panel.class_name).ok_or_else(|| InstallerError::UnknownPanel {
                    class: panel.class_name.clone(),
                })?;
            if !is_shown(self.session, panel)? {
                continue;
            }
            let count = instances.entry(short_name(&panel.class_name)).or_insert(0);
            let index = *count;
            *count += 1;

            let section = find_section(root, panel, index).ok_or_else(|| {
                InstallerError::MissingPanelData {
                    panel: panel.panel_id(),
                }
            })?;
            info!("automated panel {}", panel.panel_id());
            handler.run_automated(self.session, panel, section, out)?;
            validate(&self.session.data, panel)?;
        }
        Ok(())
    }
}

fn write_line(out: &mut dyn Write, line: &str) -> Result<()> {
    writeln!(out, "{line}").map_err(InstallerError::Console)
}

#[cfg(test)]
#[path = "automated_tests.rs"]
mod tests;
