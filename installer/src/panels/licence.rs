//! Shows the licence and records whether it was accepted.

use super::PanelHandler;
use crate::console::{ConsoleIo, ask, say};
use crate::error::Result;
use crate::install_data::message_args;
use crate::session::Session;
use instill_common::i18n::FluentValue;
use instill_common::model::Panel;
use log::{info, warn};

/// Shows the bundled licence and asks for acceptance.
///
/// Automated and properties-driven installs imply acceptance.
#[derive(Clone, Copy, Debug, Default)]
pub struct LicencePanel;

impl PanelHandler for LicencePanel {
    fn run_console(
        &self,
        session: &mut Session<'_>,
        panel: &Panel,
        console: &mut dyn ConsoleIo,
    ) -> Result<bool> {
        if !session.data.model.has_licence {
            warn!("{} has no licence to show", panel.panel_id());
            return Ok(true);
        }
        let text = session.resources.licence()?;
        let prompt = session.data.message("console-licence-prompt", &message_args([]));
        loop {
            for line in text.lines() {
                say(console, line)?;
            }
            loop {
                match ask(console, &prompt, "")?.as_str() {
                    "1" => {
                        info!("licence accepted");
                        return Ok(true);
                    }
                    "2" => {
                        let rejected =
                            session.data.message("console-licence-rejected", &message_args([]));
                        say(console, &rejected)?;
                        return Ok(false);
                    }
                    "3" => break,
                    other => {
                        let invalid = session.data.message(
                            "console-invalid-choice",
                            &message_args([("value", FluentValue::from(other))]),
                        );
                        say(console, &invalid)?;
                    }
                }
            }
        }
    }
}
