//! Chooses and validates the installation directory.

use super::PanelHandler;
use crate::console::{ConsoleIo, ask, say};
use crate::error::{InstallerError, Result};
use crate::install_data::{INSTALL_PATH, message_args};
use crate::properties::Properties;
use crate::session::Session;
use crate::validators::check_install_path;
use instill_common::i18n::FluentValue;
use instill_common::model::Panel;
use instill_common::xml::XmlElement;
use log::info;
use std::io::Write;

const INSTALL_PATH_ELEMENT: &str = "installpath";

/// Chooses the installation directory.
#[derive(Clone, Copy, Debug, Default)]
pub struct TargetPanel;

impl TargetPanel {
    fn apply(session: &mut Session<'_>, panel: &Panel, path: &str) -> Result<()> {
        let path = session.data.substitute(path.trim());
        session.data.set_install_path(path);
        check_install_path(&session.data).map_err(|message| InstallerError::ValidationFailed {
            panel: panel.panel_id(),
            message,
        })?;
        info!("installation directory {}", session.data.install_path());
        Ok(())
    }
}

impl PanelHandler for TargetPanel {
    fn make_xml_data(&self, session: &Session<'_>, _panel: &Panel, root: &mut XmlElement) {
        root.add_child(XmlElement::with_content(
            INSTALL_PATH_ELEMENT,
            session.data.install_path(),
        ));
    }

    fn run_automated(
        &self,
        session: &mut Session<'_>,
        panel: &Panel,
        root: &XmlElement,
        _out: &mut dyn Write,
    ) -> Result<()> {
        let path = root.child_content(INSTALL_PATH_ELEMENT).ok_or_else(|| {
            InstallerError::MissingPanelData {
                panel: panel.panel_id(),
            }
        })?;
        Self::apply(session, panel, path)
    }

    fn run_console(
        &self,
        session: &mut Session<'_>,
        panel: &Panel,
        console: &mut dyn ConsoleIo,
    ) -> Result<bool> {
        loop {
            let current = session.data.install_path().to_owned();
            let prompt = session.data.message(
                "console-target-prompt",
                &message_args([("path", FluentValue::from(current.as_str()))]),
            );
            let answer = ask(console, &prompt, &current)?;
            match Self::apply(session, panel, &answer) {
                Ok(()) => return Ok(true),
                Err(InstallerError::ValidationFailed { message, .. }) => {
                    say(console, &message)?;
                    session.data.set_install_path(current);
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
        properties.set(INSTALL_PATH, session.data.install_path());
    }

    fn run_from_properties(
        &self,
        session: &mut Session<'_>,
        panel: &Panel,
        properties: &Properties,
        _out: &mut dyn Write,
    ) -> Result<()> {
        let path = properties
            .get(INSTALL_PATH)
            .ok_or_else(|| InstallerError::MissingProperty {
                key: INSTALL_PATH.to_owned(),
            })?;
        Self::apply(session, panel, path)
    }
}
