//! Unit tests for standard variables and pack selection.

use super::*;
use crate::dirs::MockBaseDirs;
use instill_common::model::Info;
use instill_common::platform::{OsFamily, Platform};
use instill_common::rules::Condition;
use rstest::{fixture, rstest};
use std::path::PathBuf;

fn pack(name: &str) -> Pack {
    Pack {
        name: name.to_owned(),
        preselected: true,
        uninstall: true,
        ..Pack::default()
    }
}

fn home_dirs() -> MockBaseDirs {
    let mut dirs = MockBaseDirs::new();
    dirs.expect_home_dir()
        .returning(|| Some(PathBuf::from("/home/ada")));
    dirs
}

#[fixture]
fn model() -> InstallationModel {
    let mut docs = pack("docs");
    docs.preselected = false;
    let mut core = pack("core");
    core.required = true;
    let mut plugins = pack("plugins");
    plugins.preselected = false;
    plugins.depends = vec!["core".to_owned(), "docs".to_owned()];
    InstallationModel {
        info: Info {
            app_name: "Demo".to_owned(),
            app_version: "1.0".to_owned(),
            app_url: Some("https://demo.example".to_owned()),
            ..Info::default()
        },
        variables: [("EDITION".to_owned(), "pro".to_owned())].into(),
        packs: vec![core, docs, plugins],
        ..InstallationModel::default()
    }
}

fn data_for(model: InstallationModel) -> InstallData {
    InstallData::new(model, RulesEngine::new(), Localiser::new(None), &home_dirs())
}

#[rstest]
fn standard_variables_are_set(model: InstallationModel) {
    let data = data_for(model);
    assert_eq!(data.variables.get(APP_NAME), Some("Demo"));
    assert_eq!(data.variables.get(APP_VER), Some("1.0"));
    assert_eq!(data.variables.get(APP_URL), Some("https://demo.example"));
    assert_eq!(data.variables.get(USER_HOME), Some("/home/ada"));
    assert_eq!(data.variables.get(ISO3_LANG), Some("eng"));
    assert_eq!(data.variables.get("EDITION"), Some("pro"));
    assert_eq!(
        data.install_path(),
        format!("/home/ada{}Demo", std::path::MAIN_SEPARATOR)
    );
}

#[rstest]
fn default_install_path_is_substituted(mut model: InstallationModel) {
    model.default_install_path = Some("/opt/${APP_NAME}-$EDITION".to_owned());
    let data = data_for(model);
    assert_eq!(data.install_path(), "/opt/Demo-pro");
}

#[rstest]
fn missing_home_falls_back_to_the_app_name(model: InstallationModel) {
    let mut dirs = MockBaseDirs::new();
    dirs.expect_home_dir().returning(|| None);
    let data = InstallData::new(model, RulesEngine::new(), Localiser::new(None), &dirs);
    assert_eq!(data.install_path(), "Demo");
}

#[rstest]
fn default_selection_follows_preselection(model: InstallationModel) {
    let data = data_for(model);
    assert!(data.is_selected("core"));
    assert!(!data.is_selected("docs"));
    assert!(data.rules.is_true("instill.selected.core", &data.variables));
    assert!(!data.rules.is_true("instill.selected.docs", &data.variables));
}

#[rstest]
fn resolution_adds_dependencies_and_required_packs(model: InstallationModel) {
    let mut data = data_for(model);
    data.select("core", false);
    data.select("plugins", true);
    data.resolve_selection().expect("consistent");
    let selected: Vec<&str> = data.selected_packs().map(|(_, p)| p.name.as_str()).collect();
    assert_eq!(selected, ["core", "docs", "plugins"]);
}

#[rstest]
fn exclude_groups_admit_one_pack(mut model: InstallationModel) {
    for name in ["docs", "plugins"] {
        let pack = model.packs.iter_mut().find(|p| p.name == name).expect("pack");
        pack.exclude_group = Some("flavour".to_owned());
        pack.depends.clear();
    }
    let mut data = data_for(model);
    data.select("docs", true);
    data.select("plugins", true);
    let err = data.resolve_selection().expect_err("conflict");
    assert!(matches!(err, InstallerError::InvalidSelection { ref reason } if reason.contains("flavour")));
}

#[rstest]
fn packs_failing_their_condition_are_deselected(mut model: InstallationModel) {
    model.packs[1].condition = Some("wants.docs".to_owned());
    let mut rules = RulesEngine::new();
    rules.add_condition("wants.docs", Condition::variable("DOCS", "yes"));
    let mut data = InstallData::new(model, rules, Localiser::new(None), &home_dirs());
    data.select("docs", true);
    data.resolve_selection().expect("consistent");
    assert!(!data.is_selected("docs"));

    data.variables.set("DOCS", "yes");
    data.select("docs", true);
    data.resolve_selection().expect("consistent");
    assert!(data.is_selected("docs"));
}

#[rstest]
fn optional_pack_guards_leave_packs_selectable(model: InstallationModel) {
    let mut rules = RulesEngine::new();
    rules.add_condition("never", Condition::Or(Vec::new()));
    rules.set_pack_condition("docs", "never", true);
    rules.set_pack_condition("plugins", "never", false);
    let mut data = InstallData::new(model, rules, Localiser::new(None), &home_dirs());

    assert!(data.can_install(&data.model.packs[1]));
    assert!(!data.can_install(&data.model.packs[2]));

    data.select("docs", true);
    data.resolve_selection().expect("consistent");
    assert!(data.is_selected("docs"));
}

#[rstest]
fn os_constraints_hide_packs_and_panels(mut model: InstallationModel) {
    let other = if Platform::current().family() == OsFamily::Windows {
        "unix"
    } else {
        "windows"
    };
    model.packs[1].os = vec![OsConstraint::family(other)];
    let mut panel = Panel::new("HelloPanel");
    panel.os = vec![OsConstraint::family(other)];
    let data = data_for(model);
    let visible: Vec<&str> = data.visible_packs().map(|p| p.name.as_str()).collect();
    assert_eq!(visible, ["core", "plugins"]);
    assert!(!data.can_show(&panel));
    assert!(data.can_show(&Panel::new("HelloPanel")));
}

#[rstest]
fn panel_conditions_use_variables(model: InstallationModel) {
    let mut rules = RulesEngine::new();
    rules.add_condition("expert", Condition::variable("MODE", "expert"));
    let mut data = InstallData::new(model, rules, Localiser::new(None), &home_dirs());
    let mut panel = Panel::new("UserInputPanel");
    panel.condition = Some("expert".to_owned());
    assert!(!data.can_show(&panel));
    data.variables.set("MODE", "expert");
    assert!(data.can_show(&panel));
}

#[rstest]
fn translations_prefer_bundled_overrides(model: InstallationModel) {
    let mut data = data_for(model);
    data.set_langpack([("pack.core".to_owned(), "Core of $APP_NAME".to_owned())].into());
    assert_eq!(data.translate("pack.core"), "Core of Demo");
    assert_eq!(data.translate("$APP_VER"), "1.0");
}
