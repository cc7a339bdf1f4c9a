//! Panel behaviours for the console and automated front ends.
//!
//! Each panel class maps to a [`PanelHandler`]. Handlers are stateless:
//! everything a panel reads or changes lives in the [`Session`], and the
//! [`Panel`] from the installation model carries the per-instance settings.
//!
//! | Class | Aliases |
//! |-------|---------|
//! | `HelloPanel` | `CheckedHelloPanel`, `HTMLHelloPanel` |
//! | `LicencePanel` | `LicensePanel`, `HTMLLicencePanel`, `HTMLLicensePanel` |
//! | `TargetPanel` | `DefaultTargetPanel` |
//! | `PacksPanel` | `TreePacksPanel`, `ImgPacksPanel` |
//! | `UserInputPanel` | |
//! | `InstallPanel` | `SimpleInstallPanel` |
//! | `FinishPanel` | `SimpleFinishPanel` |

mod finish;
mod hello;
mod install;
mod licence;
mod packs;
mod target;
mod user_input;

pub use finish::FinishPanel;
pub use hello::HelloPanel;
pub use install::InstallPanel;
pub use licence::LicencePanel;
pub use packs::PacksPanel;
pub use target::TargetPanel;
pub use user_input::UserInputPanel;

use crate::console::ConsoleIo;
use crate::error::{InstallerError, Result};
use crate::properties::Properties;
use crate::session::Session;
use crate::validators::{short_name, validator_for};
use instill_common::model::Panel;
use instill_common::xml::XmlElement;
use log::debug;
use std::io::Write;

/// What a panel does in each front end.
///
/// Only [`PanelHandler::run_console`] is mandatory; panels without
/// automation or properties data keep the empty defaults.
pub trait PanelHandler: Sync {
    /// Records the panel's current data under `root` for replay.
    fn make_xml_data(&self, _session: &Session<'_>, _panel: &Panel, _root: &mut XmlElement) {}

    /// Applies recorded data.
    ///
    /// # Errors
    ///
    /// Fails when the data is unusable or the panel's work fails.
    fn run_automated(
        &self,
        _session: &mut Session<'_>,
        _panel: &Panel,
        _root: &XmlElement,
        _out: &mut dyn Write,
    ) -> Result<()> {
        Ok(())
    }

    /// Interacts with the user; `Ok(false)` means they chose to stop.
    ///
    /// # Errors
    ///
    /// Fails on console errors, end of input, or when the panel's work fails.
    fn run_console(
        &self,
        session: &mut Session<'_>,
        panel: &Panel,
        console: &mut dyn ConsoleIo,
    ) -> Result<bool>;

    /// Adds the properties this panel reads, with their current values.
    fn generate_properties(
        &self,
        _session: &Session<'_>,
        _panel: &Panel,
        _properties: &mut Properties,
    ) {
    }

    /// Applies answers from `properties`.
    ///
    /// # Errors
    ///
    /// Fails when a required property is missing or the panel's work fails.
    fn run_from_properties(
        &self,
        _session: &mut Session<'_>,
        _panel: &Panel,
        _properties: &Properties,
        _out: &mut dyn Write,
    ) -> Result<()> {
        Ok(())
    }
}

/// The handler for `class_name`, with or without a package prefix.
#[must_use]
pub fn handler_for(class_name: &str) -> Option<&'static dyn PanelHandler> {
    match short_name(class_name) {
        "HelloPanel" | "CheckedHelloPanel" | "HTMLHelloPanel" => Some(&HelloPanel),
        "LicencePanel" | "LicensePanel" | "HTMLLicencePanel" | "HTMLLicensePanel" => {
            Some(&LicencePanel)
        }
        "TargetPanel" | "DefaultTargetPanel" => Some(&TargetPanel),
        "PacksPanel" | "TreePacksPanel" | "ImgPacksPanel" => Some(&PacksPanel),
        "UserInputPanel" => Some(&UserInputPanel),
        "InstallPanel" | "SimpleInstallPanel" => Some(&InstallPanel),
        "FinishPanel" | "SimpleFinishPanel" => Some(&FinishPanel),
        _ => None,
    }
}

/// Checks that every panel class and validator is provided.
///
/// # Errors
///
/// Returns [`InstallerError::UnknownPanel`] or
/// [`InstallerError::UnknownValidator`] for the first unknown name.
pub fn check_panels(panels: &[Panel]) -> Result<()> {
    for panel in panels {
        if handler_for(&panel.class_name).is_none() {
            return Err(InstallerError::UnknownPanel {
                class: panel.class_name.clone(),
            });
        }
        if let Some(validator) = &panel.validator {
            if validator_for(validator).is_none() {
                return Err(InstallerError::UnknownValidator {
                    panel: panel.panel_id(),
                    validator: validator.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Refreshes dynamic variables, then decides whether `panel` is shown.
///
/// # Errors
///
/// Propagates dynamic variable failures.
pub fn is_shown(session: &mut Session<'_>, panel: &Panel) -> Result<bool> {
    session.data.refresh()?;
    let shown = session.data.can_show(panel);
    if !shown {
        debug!("panel {} is not shown", panel.panel_id());
    }
    Ok(shown)
}

#[cfg(test)]
#[path = "panels_tests.rs"]
mod tests;
