//! Runtime state shared by every panel.
//!
//! [`InstallData`] owns the installation model, the variable store, the
//! rules engine, the localiser and the bundled message overrides. Pack
//! selection lives in the variable store as `instill.selected.<key>` so that
//! conditions can test it.

use crate::dirs::BaseDirs;
use crate::error::{InstallerError, Result};
use crate::resources::ResourceManager;
use instill_common::i18n::{Arguments, FluentValue, Localiser};
use instill_common::model::{InstallationModel, Pack, Panel};
use instill_common::platform::{OsConstraint, matches_any};
use instill_common::rules::{PACK_SELECTED_PREFIX, RulesEngine};
use instill_common::substitutor::{SubstitutionType, VariableSubstitutor};
use instill_common::variables::Variables;
use log::{debug, info, warn};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// `APP_NAME` variable.
pub const APP_NAME: &str = "APP_NAME";
/// `APP_VER` variable.
pub const APP_VER: &str = "APP_VER";
/// `APP_URL` variable.
pub const APP_URL: &str = "APP_URL";
/// `INSTALL_PATH` variable.
pub const INSTALL_PATH: &str = "INSTALL_PATH";
/// `USER_HOME` variable.
pub const USER_HOME: &str = "USER_HOME";
/// `FILE_SEPARATOR` variable.
pub const FILE_SEPARATOR: &str = "FILE_SEPARATOR";
/// `ISO3_LANG` variable.
pub const ISO3_LANG: &str = "ISO3_LANG";
/// Variable naming an extra file that receives the list of installed paths.
pub const INSTALL_LOG_PATH: &str = "INSTALL_LOG_PATH";

/// Name of the selection variable for the pack with `key`.
#[must_use]
pub fn selection_variable(key: &str) -> String {
    format!("{PACK_SELECTED_PREFIX}{key}")
}

/// Message arguments from name and value pairs.
#[must_use]
pub fn message_args<'a, const N: usize>(pairs: [(&'static str, FluentValue<'a>); N]) -> Arguments<'a> {
    pairs
        .into_iter()
        .map(|(name, value)| (Cow::Borrowed(name), value))
        .collect()
}

/// Variables, rules and selection for one installer run.
#[derive(Clone, Debug)]
pub struct InstallData {
    /// The installation being performed.
    pub model: InstallationModel,
    /// Variable store consulted by conditions and substitution.
    pub variables: Variables,
    /// Conditions and guards.
    pub rules: RulesEngine,
    localiser: Localiser,
    langpack: BTreeMap<String, String>,
}

impl InstallData {
    /// Builds the runtime state for `model`, setting the standard variables
    /// and the default pack selection.
    #[must_use]
    pub fn new(
        model: InstallationModel,
        mut rules: RulesEngine,
        localiser: Localiser,
        dirs: &dyn BaseDirs,
    ) -> Self {
        rules.register_packs(model.packs.iter().map(Pack::key));
        let mut variables = Variables::new();
        for (name, value) in &model.variables {
            variables.set(name.clone(), value.clone());
        }
        for dynamic in &model.dynamic_variables {
            variables.add_dynamic(dynamic.clone());
        }

        let info = &model.info;
        variables.set(APP_NAME, info.app_name.clone());
        variables.set(APP_VER, info.app_version.clone());
        if let Some(url) = &info.app_url {
            variables.set(APP_URL, url.clone());
        }
        let home = dirs
            .home_dir()
            .map(|home| home.to_string_lossy().into_owned())
            .unwrap_or_default();
        variables.set(USER_HOME, home.clone());
        variables.set(FILE_SEPARATOR, std::path::MAIN_SEPARATOR_STR);
        variables.set(ISO3_LANG, localiser.iso3());

        let mut data = Self {
            model,
            variables,
            rules,
            localiser,
            langpack: BTreeMap::new(),
        };
        let default_path = data.default_install_path(&home);
        data.set_install_path(default_path);
        data.select_defaults();
        data
    }

    /// Builds the runtime state for `model` with the conditions and message
    /// overrides bundled in `resources`.
    ///
    /// # Errors
    ///
    /// Propagates missing or malformed resources.
    pub fn load(
        resources: &mut ResourceManager,
        model: InstallationModel,
        localiser: Localiser,
        dirs: &dyn BaseDirs,
    ) -> Result<Self> {
        let mut rules = RulesEngine::new();
        rules.analyze_xml(&resources.conditions()?)?;
        let langpack = resources.langpack(localiser.iso3())?;
        let mut data = Self::new(model, rules, localiser, dirs);
        data.langpack = langpack;
        info!(
            "loaded {} {} ({} packs, {} panels)",
            data.model.info.app_name,
            data.model.info.app_version,
            data.model.packs.len(),
            data.model.panels.len()
        );
        Ok(data)
    }

    fn default_install_path(&self, home: &str) -> String {
        match &self.model.default_install_path {
            Some(path) => self.substitute(path),
            None if home.is_empty() => self.model.info.app_name.clone(),
            None => format!(
                "{home}{}{}",
                std::path::MAIN_SEPARATOR,
                self.model.info.app_name
            ),
        }
    }

    fn select_defaults(&mut self) {
        let defaults: Vec<(String, bool)> = self
            .model
            .packs
            .iter()
            .map(|pack| {
                let selected = (pack.required || pack.preselected) && self.matches_os(&pack.os);
                (pack.key().to_owned(), selected)
            })
            .collect();
        for (key, selected) in defaults {
            self.select(&key, selected);
        }
    }

    /// The localiser for console messages.
    #[must_use]
    pub fn localiser(&self) -> &Localiser {
        &self.localiser
    }

    /// Localised message `key`.
    #[must_use]
    pub fn message(&self, key: &str, args: &Arguments<'_>) -> String {
        self.localiser.text(key, args)
    }

    /// `text` replaced by its bundled override when one exists, then
    /// substituted.
    #[must_use]
    pub fn translate(&self, text: &str) -> String {
        let text = self.langpack.get(text).map_or(text, String::as_str);
        self.substitute(text)
    }

    /// Replaces the bundled message overrides.
    pub fn set_langpack(&mut self, langpack: BTreeMap<String, String>) {
        self.langpack = langpack;
    }

    /// `text` with `$VARIABLE` references replaced.
    #[must_use]
    pub fn substitute(&self, text: &str) -> String {
        VariableSubstitutor::new(&self.variables).substitute(text, SubstitutionType::Plain)
    }

    /// The current installation directory.
    #[must_use]
    pub fn install_path(&self) -> &str {
        self.variables.get_or(INSTALL_PATH, "")
    }

    /// Sets the installation directory.
    pub fn set_install_path(&mut self, path: impl Into<String>) {
        let path = path.into();
        debug!("{INSTALL_PATH} = {path}");
        self.variables.set(INSTALL_PATH, path);
    }

    /// Whether `os` admits the running platform.
    #[must_use]
    pub fn matches_os(&self, os: &[OsConstraint]) -> bool {
        matches_any(os, self.rules.platform())
    }

    /// Whether an element guarded by `condition` and `os` applies.
    #[must_use]
    pub fn is_active(&self, condition: Option<&str>, os: &[OsConstraint]) -> bool {
        self.matches_os(os)
            && condition.is_none_or(|condition| self.rules.is_true(condition, &self.variables))
    }

    /// Whether `panel` should be shown: its OS constraints match, and its
    /// own condition or else its registered guard holds.
    #[must_use]
    pub fn can_show(&self, panel: &Panel) -> bool {
        if !self.matches_os(&panel.os) {
            return false;
        }
        match &panel.condition {
            Some(condition) => self.rules.is_true(condition, &self.variables),
            None => self.rules.can_show_panel(&panel.panel_id(), &self.variables),
        }
    }

    /// Whether `pack` can be installed in the current state.
    ///
    /// A pack whose registered guard is optional stays installable while
    /// that guard is false.
    #[must_use]
    pub fn can_install(&self, pack: &Pack) -> bool {
        self.is_active(pack.condition.as_deref(), &pack.os)
            && (self.rules.can_install_pack(Some(pack.key()), &self.variables)
                || self.rules.can_install_pack_optional(pack.key()))
    }

    /// Explains why `pack` cannot be installed.
    #[must_use]
    pub fn pack_details(&self, pack: &Pack) -> String {
        pack.condition.as_deref().map_or_else(String::new, |condition| {
            self.rules
                .dependency_details(condition, &self.variables, &self.localiser)
        })
    }

    /// Whether the pack with `key` is selected.
    #[must_use]
    pub fn is_selected(&self, key: &str) -> bool {
        self.variables.get_bool(&selection_variable(key), false)
    }

    /// Selects or deselects the pack with `key`.
    pub fn select(&mut self, key: &str, selected: bool) {
        self.variables
            .set(selection_variable(key), if selected { "true" } else { "false" });
    }

    /// Packs offered to the user: not hidden and available on this platform.
    pub fn visible_packs(&self) -> impl Iterator<Item = &Pack> {
        self.model
            .packs
            .iter()
            .filter(|pack| !pack.hidden && self.matches_os(&pack.os))
    }

    /// Selected packs in installation order, with their model index.
    pub fn selected_packs(&self) -> impl Iterator<Item = (usize, &Pack)> {
        self.model
            .packs
            .iter()
            .enumerate()
            .filter(|(_, pack)| self.is_selected(pack.key()))
    }

    /// Makes the selection consistent: required packs are selected, the
    /// dependencies of selected packs are selected, and packs that cannot be
    /// installed are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidSelection`] when two selected packs
    /// share an exclude group.
    pub fn resolve_selection(&mut self) -> Result<()> {
        let mut selected: BTreeSet<String> = BTreeSet::new();
        let mut pending: Vec<String> = self
            .model
            .packs
            .iter()
            .filter(|pack| self.matches_os(&pack.os))
            .filter(|pack| pack.required || self.is_selected(pack.key()))
            .map(|pack| pack.key().to_owned())
            .collect();
        while let Some(key) = pending.pop() {
            if !selected.insert(key.clone()) {
                continue;
            }
            if let Some(pack) = self.model.pack(&key) {
                for dependency in &pack.depends {
                    if let Some(dependency) = self.model.pack(dependency) {
                        debug!("{} pulls in {}", pack.name, dependency.name);
                        pending.push(dependency.key().to_owned());
                    }
                }
            }
        }

        let keys: Vec<String> = self.model.packs.iter().map(|p| p.key().to_owned()).collect();
        for key in &keys {
            self.select(key, selected.contains(key));
        }
        for pack in self.model.packs.clone() {
            if self.is_selected(pack.key()) && !self.can_install(&pack) {
                warn!(
                    "pack {} cannot be installed and is deselected\n{}",
                    pack.name,
                    self.pack_details(&pack)
                );
                self.select(pack.key(), false);
            }
        }

        let mut groups: BTreeMap<&str, &str> = BTreeMap::new();
        for (_, pack) in self.selected_packs() {
            if let Some(group) = pack.exclude_group.as_deref() {
                if let Some(other) = groups.insert(group, &pack.name) {
                    return Err(InstallerError::InvalidSelection {
                        reason: format!(
                            "{other} and {} are in exclude group {group}",
                            pack.name
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Re-evaluates dynamic variables.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Variable`] when a dynamic variable fails.
    pub fn refresh(&mut self) -> Result<()> {
        let updated = self.variables.refresh(&self.rules)?;
        if updated > 0 {
            debug!("refreshed {updated} dynamic variable(s)");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "install_data_tests.rs"]
mod tests;
