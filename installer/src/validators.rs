//! Panel validators.
//!
//! A panel may name a validator class; it runs after the panel has applied
//! its data, whatever the front end. Validator names are matched without
//! their package prefix.

use crate::error::{InstallerError, Result};
use crate::install_data::{InstallData, message_args};
use camino::Utf8Path;
use instill_common::i18n::FluentValue;
use instill_common::model::Panel;
use log::{debug, warn};

/// Checks the data entered on a panel.
pub trait PanelValidator: Sync {
    /// `Err` carries the message shown to the user.
    fn validate(&self, data: &InstallData, panel: &Panel) -> std::result::Result<(), String>;
}

/// Accepts an installation directory that is set and is not a file.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstallPathValidator;

impl PanelValidator for InstallPathValidator {
    fn validate(&self, data: &InstallData, _panel: &Panel) -> std::result::Result<(), String> {
        check_install_path(data)
    }
}

/// Accepts the panel when a configured condition holds.
///
/// The condition comes from the panel's `condition` configuration entry and
/// the message from its `message` entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConditionValidator;

impl PanelValidator for ConditionValidator {
    fn validate(&self, data: &InstallData, panel: &Panel) -> std::result::Result<(), String> {
        let Some(condition) = panel.configuration.get("condition") else {
            warn!("{} has no condition to validate", panel.panel_id());
            return Ok(());
        };
        if data.rules.is_true(condition, &data.variables) {
            return Ok(());
        }
        Err(panel.configuration.get("message").map_or_else(
            || {
                data.message(
                    "condition-validator-default",
                    &message_args([("condition", FluentValue::from(condition.as_str()))]),
                )
            },
            |message| data.translate(message),
        ))
    }
}

/// Checks the installation directory held in `data`.
///
/// # Errors
///
/// Returns the localised reason the path cannot be used.
pub fn check_install_path(data: &InstallData) -> std::result::Result<(), String> {
    let path = data.install_path().trim();
    if path.is_empty() {
        return Err(data.message("console-target-empty", &message_args([])));
    }
    let path = Utf8Path::new(path);
    if path.exists() && !path.is_dir() {
        return Err(data.message(
            "console-target-not-directory",
            &message_args([("path", FluentValue::from(path.as_str()))]),
        ));
    }
    Ok(())
}

/// The validator called `name`, with or without a package prefix.
#[must_use]
pub fn validator_for(name: &str) -> Option<&'static dyn PanelValidator> {
    match short_name(name) {
        "InstallPathValidator" | "TargetPanelValidator" => Some(&InstallPathValidator),
        "ConditionValidator" => Some(&ConditionValidator),
        _ => None,
    }
}

/// Runs the validator of `panel`, if it has one.
///
/// # Errors
///
/// Returns [`InstallerError::UnknownValidator`] for an unknown class and
/// [`InstallerError::ValidationFailed`] when the validator rejects the data.
pub fn validate(data: &InstallData, panel: &Panel) -> Result<()> {
    let Some(name) = panel.validator.as_deref() else {
        return Ok(());
    };
    let validator = validator_for(name).ok_or_else(|| InstallerError::UnknownValidator {
        panel: panel.panel_id(),
        validator: name.to_owned(),
    })?;
    debug!("validating {} with {name}", panel.panel_id());
    validator
        .validate(data, panel)
        .map_err(|message| InstallerError::ValidationFailed {
            panel: panel.panel_id(),
            message,
        })
}

/// `name` without its package prefix.
#[must_use]
pub fn short_name(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(_, short)| short)
}
