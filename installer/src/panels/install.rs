//! Unpacks the selected packs.

use super::PanelHandler;
use crate::console::{ConsoleIo, ConsoleListener, say};
use crate::error::{InstallerError, Result};
use crate::install_data::message_args;
use crate::properties::Properties;
use crate::session::Session;
use crate::unpacker::{UnpackListener, WriterListener};
use instill_common::model::Panel;
use instill_common::xml::XmlElement;
use log::warn;
use std::io::Write;

/// Unpacks the selected packs.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstallPanel;

impl InstallPanel {
    fn install(session: &mut Session<'_>, listener: &mut dyn UnpackListener) -> Result<bool> {
        if session.is_installed() {
            warn!("packs are already installed");
            return Ok(false);
        }
        session.install(listener)?;
        Ok(true)
    }

    fn install_quietly(session: &mut Session<'_>, out: &mut dyn Write) -> Result<()> {
        let localiser = session.data.localiser().clone();
        let mut listener = WriterListener::new(out, &localiser);
        if Self::install(session, &mut listener)? {
            let finished = session.data.message("install-finished", &message_args([]));
            writeln!(out, "{finished}").map_err(InstallerError::Console)?;
        }
        Ok(())
    }
}

impl PanelHandler for InstallPanel {
    fn run_automated(
        &self,
        session: &mut Session<'_>,
        _panel: &Panel,
        _root: &XmlElement,
        out: &mut dyn Write,
    ) -> Result<()> {
        Self::install_quietly(session, out)
    }

    fn run_console(
        &self,
        session: &mut Session<'_>,
        _panel: &Panel,
        console: &mut dyn ConsoleIo,
    ) -> Result<bool> {
        let localiser = session.data.localiser().clone();
        let installed = {
            let mut listener = ConsoleListener::new(console, &localiser);
            Self::install(session, &mut listener)?
        };
        if installed {
            let finished = session.data.message("install-finished", &message_args([]));
            say(console, &finished)?;
        }
        Ok(true)
    }

    fn run_from_properties(
        &self,
        session: &mut Session<'_>,
        _panel: &Panel,
        _properties: &Properties,
        out: &mut dyn Write,
    ) -> Result<()> {
        Self::install_quietly(session, out)
    }
}
