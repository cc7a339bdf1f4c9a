//! Reports the outcome of the installation.

use super::PanelHandler;
use crate::console::{ConsoleIo, say};
use crate::error::{InstallerError, Result};
use crate::install_data::message_args;
use crate::properties::Properties;
use crate::session::Session;
use instill_common::i18n::FluentValue;
use instill_common::model::Panel;
use instill_common::xml::XmlElement;
use std::io::Write;

/// Reports where the application and its uninstaller were installed.
#[derive(Clone, Copy, Debug, Default)]
pub struct FinishPanel;

impl FinishPanel {
    /// The closing summary; empty when nothing was installed.
    #[must_use]
    pub fn lines(session: &Session<'_>) -> Vec<String> {
        if !session.is_installed() {
            return Vec::new();
        }
        let data = &session.data;
        let mut lines = vec![
            data.message("finish-success", &message_args([])),
            data.message(
                "finish-location",
                &message_args([("path", FluentValue::from(data.install_path()))]),
            ),
        ];
        if let Some(uninstaller) = session.uninstaller() {
            lines.push(data.message(
                "finish-uninstaller",
                &message_args([("path", FluentValue::from(uninstaller.as_str()))]),
            ));
        }
        lines
    }

    fn write(session: &Session<'_>, out: &mut dyn Write) -> Result<()> {
        for line in Self::lines(session) {
            writeln!(out, "{line}").map_err(InstallerError::Console)?;
        }
        Ok(())
    }
}

impl PanelHandler for FinishPanel {
    fn run_automated(
        &self,
        session: &mut Session<'_>,
        _panel: &Panel,
        _root: &XmlElement,
        out: &mut dyn Write,
    ) -> Result<()> {
        Self::write(session, out)
    }

    fn run_console(
        &self,
        session: &mut Session<'_>,
        _panel: &Panel,
        console: &mut dyn ConsoleIo,
    ) -> Result<bool> {
        for line in Self::lines(session) {
            say(console, &line)?;
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
        Self::write(session, out)
    }
}
