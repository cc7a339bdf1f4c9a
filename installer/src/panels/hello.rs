//! Greets the user with the application details.

use super::PanelHandler;
use crate::console::{ConsoleIo, say};
use crate::error::Result;
use crate::install_data::message_args;
use crate::session::Session;
use instill_common::i18n::FluentValue;
use instill_common::model::Panel;

/// Greets the user with the application name, version and authors.
#[derive(Clone, Copy, Debug, Default)]
pub struct HelloPanel;

impl HelloPanel {
    /// The greeting, one entry per line.
    #[must_use]
    pub fn lines(session: &Session<'_>) -> Vec<String> {
        let data = &session.data;
        let info = &data.model.info;
        let mut lines = vec![data.message(
            "installer-welcome",
            &message_args([
                ("app", FluentValue::from(info.app_name.as_str())),
                ("version", FluentValue::from(info.app_version.as_str())),
            ]),
        )];
        if let Some(url) = &info.app_url {
            lines.push(data.message(
                "installer-homepage",
                &message_args([("url", FluentValue::from(url.as_str()))]),
            ));
        }
        if !info.authors.is_empty() {
            let authors = info
                .authors
                .iter()
                .map(|author| match &author.email {
                    Some(email) => format!("{} <{email}>", author.name),
                    None => author.name.clone(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(data.message(
                "installer-authors",
                &message_args([("authors", FluentValue::from(authors))]),
            ));
        }
        lines
    }
}

impl PanelHandler for HelloPanel {
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
}
