//! Unit tests for the panel handlers.

use super::*;
use crate::test_utils::{ArtifactBuilder, InstallerFixture, ScriptedConsole, demo_model};
use instill_common::model::{FieldKind, InstallationModel, UserInputField};
use instill_common::xml::parse_str;
use rstest::rstest;

fn fixture_with(model: InstallationModel) -> InstallerFixture {
    InstallerFixture::new(
        &ArtifactBuilder::new(model)
            .file(0, "bin/demo.sh", "#!/bin/sh\n")
            .file(1, "docs/manual.txt", "Read me first."),
    )
}

fn section(xml: &str) -> XmlElement {
    parse_str(xml, "section").expect("well-formed section")
}

fn flavour_panel() -> Panel {
    let mut panel = Panel::new("UserInputPanel");
    panel.fields = vec![
        UserInputField {
            variable: "FLAVOUR".to_owned(),
            kind: FieldKind::Combo,
            label: "Flavour".to_owned(),
            choices: vec!["vanilla".to_owned(), "chocolate".to_owned()],
            ..UserInputField::default()
        },
        UserInputField {
            variable: "SPRINKLES".to_owned(),
            kind: FieldKind::Check,
            label: "Sprinkles".to_owned(),
            ..UserInputField::default()
        },
        UserInputField {
            variable: "NAME".to_owned(),
            kind: FieldKind::Text,
            label: "Name on the cone".to_owned(),
            default_value: Some("$APP_NAME fan".to_owned()),
            ..UserInputField::default()
        },
    ];
    panel
}

#[rstest]
#[case::plain("HelloPanel")]
#[case::qualified("org.example.panels.HelloPanel")]
#[case::alias("HTMLLicensePanel")]
#[case::tree("TreePacksPanel")]
#[case::simple_finish("SimpleFinishPanel")]
fn known_panel_classes_have_handlers(#[case] class: &str) {
    assert!(handler_for(class).is_some());
}

#[test]
fn unknown_panel_classes_are_rejected_up_front() {
    let panels = vec![Panel::new("HelloPanel"), Panel::new("ShortcutPanel")];
    let err = check_panels(&panels).expect_err("shortcut panel is not provided");
    assert!(matches!(err, InstallerError::UnknownPanel { class } if class == "ShortcutPanel"));
}

#[test]
fn unknown_validators_are_rejected_up_front() {
    let mut panel = Panel::new("TargetPanel");
    panel.validator = Some("DiskSpaceValidator".to_owned());
    let err = check_panels(&[panel]).expect_err("validator is not provided");
    assert!(matches!(
        err,
        InstallerError::UnknownValidator { validator, .. } if validator == "DiskSpaceValidator"
    ));
}

#[test]
fn panels_follow_their_conditions() {
    let mut model = demo_model(&["HelloPanel"]);
    model.panels[0].condition = Some("wants.greeting".to_owned());
    let installer = InstallerFixture::new(&ArtifactBuilder::new(model).conditions(
        r#"<conditions><condition type="variable" id="wants.greeting"><name>GREET</name><value>yes</value></condition></conditions>"#,
    ));
    let mut session = installer.session();
    let panel = session.data.model.panels[0].clone();

    assert!(!is_shown(&mut session, &panel).expect("refresh"));
    session.data.variables.set("GREET", "yes");
    assert!(is_shown(&mut session, &panel).expect("refresh"));
}

#[test]
fn hello_names_the_application_and_its_authors() {
    let installer = fixture_with(demo_model(&["HelloPanel"]));
    let session = installer.session();

    assert_eq!(
        HelloPanel::lines(&session),
        vec![
            "Welcome to the installation of Demo 1.0!".to_owned(),
            "The homepage is at: https://demo.example.org".to_owned(),
            "Written by: Ada <ada@example.org>".to_owned(),
        ]
    );
}

#[test]
fn a_missing_licence_is_skipped_on_the_console() {
    let installer = fixture_with(demo_model(&["LicencePanel"]));
    let mut session = installer.session();
    let panel = Panel::new("LicencePanel");
    let mut console = ScriptedConsole::new(Vec::<String>::new());

    let accepted = LicencePanel
        .run_console(&mut session, &panel, &mut console)
        .expect("nothing to show");

    assert!(accepted);
    assert!(console.transcript().is_empty());
}

#[test]
fn target_applies_the_recorded_path_with_substitution() {
    let installer = fixture_with(demo_model(&["TargetPanel"]));
    let mut session = installer.session();
    let panel = Panel::new("TargetPanel");
    let root = section(&format!(
        "<TargetPanel><installpath>{}/$APP_NAME</installpath></TargetPanel>",
        installer.root
    ));

    TargetPanel
        .run_automated(&mut session, &panel, &root, &mut Vec::new())
        .expect("path applied");

    assert_eq!(session.data.install_path(), format!("{}/Demo", installer.root));
}

#[test]
fn target_refuses_a_file_as_installation_directory() {
    let installer = fixture_with(demo_model(&["TargetPanel"]));
    let file = installer.root.join("occupied");
    std::fs::write(&file, "not a directory").expect("file written");
    let mut session = installer.session();
    let panel = Panel::new("TargetPanel");
    let root = section(&format!("<TargetPanel><installpath>{file}</installpath></TargetPanel>"));

    let err = TargetPanel
        .run_automated(&mut session, &panel, &root, &mut Vec::new())
        .expect_err("a file is not a directory");

    assert!(matches!(err, InstallerError::ValidationFailed { message, .. }
        if message == format!("{file} exists and is not a directory.")));
}

#[test]
fn target_needs_its_recorded_path() {
    let installer = fixture_with(demo_model(&["TargetPanel"]));
    let mut session = installer.session();
    let panel = Panel::new("TargetPanel");

    let err = TargetPanel
        .run_automated(&mut session, &panel, &section("<TargetPanel/>"), &mut Vec::new())
        .expect_err("no installpath");

    assert!(matches!(err, InstallerError::MissingPanelData { .. }));
}

#[test]
fn target_console_asks_again_after_a_bad_path() {
    let installer = fixture_with(demo_model(&["TargetPanel"]));
    let file = installer.root.join("occupied");
    std::fs::write(&file, "").expect("file written");
    let chosen = installer.root.join("chosen");
    let mut session = installer.session();
    let panel = Panel::new("TargetPanel");
    let mut console = ScriptedConsole::new([file.as_str(), chosen.as_str()]);

    TargetPanel
        .run_console(&mut session, &panel, &mut console)
        .expect("second path accepted");

    assert_eq!(session.data.install_path(), chosen.as_str());
    assert!(console.transcript().contains("exists and is not a directory."));
    assert!(console
        .transcript()
        .contains(&format!("Select the installation path [{}]", installer.target)));
}

#[rstest]
#[case::by_name(r#"<PacksPanel><pack index="9" name="Docs" selected="true"/></PacksPanel>"#)]
#[case::by_index(r#"<PacksPanel><pack index="1" selected="yes"/></PacksPanel>"#)]
fn packs_apply_recorded_selections(#[case] xml: &str) {
    let installer = fixture_with(demo_model(&["PacksPanel"]));
    let mut session = installer.session();
    let panel = Panel::new("PacksPanel");

    PacksPanel
        .run_automated(&mut session, &panel, &section(xml), &mut Vec::new())
        .expect("selection applied");

    assert!(session.data.is_selected("Docs"));
}

#[test]
fn required_packs_stay_selected() {
    let installer = fixture_with(demo_model(&["PacksPanel"]));
    let mut session = installer.session();
    let panel = Panel::new("PacksPanel");
    let root = section(r#"<PacksPanel><pack index="0" name="Core" selected="false"/></PacksPanel>"#);

    PacksPanel
        .run_automated(&mut session, &panel, &root, &mut Vec::new())
        .expect("selection applied");

    assert!(session.data.is_selected("Core"));
}

#[test]
fn packs_record_every_visible_pack() {
    let installer = fixture_with(demo_model(&["PacksPanel"]));
    let session = installer.session();
    let mut root = XmlElement::new("PacksPanel");

    PacksPanel.make_xml_data(&session, &Panel::new("PacksPanel"), &mut root);

    let recorded: Vec<(String, String)> = root
        .children_named("pack")
        .map(|pack| {
            (
                pack.attribute_or("name", "").to_owned(),
                pack.attribute_or("selected", "").to_owned(),
            )
        })
        .collect();
    assert_eq!(
        recorded,
        vec![
            ("Core".to_owned(), "true".to_owned()),
            ("Docs".to_owned(), "false".to_owned()),
        ]
    );
}

#[test]
fn pack_properties_cover_optional_packs_only() {
    let installer = fixture_with(demo_model(&["PacksPanel"]));
    let session = installer.session();
    let mut properties = Properties::new();

    PacksPanel.generate_properties(&session, &Panel::new("PacksPanel"), &mut properties);

    assert_eq!(properties.get("instill.selected.Docs"), Some("false"));
    assert!(!properties.contains("instill.selected.Core"));
}

#[test]
fn user_input_starts_from_defaults() {
    let installer = fixture_with(demo_model(&["UserInputPanel"]));
    let session = installer.session();
    let mut properties = Properties::new();

    UserInputPanel.generate_properties(&session, &flavour_panel(), &mut properties);

    assert_eq!(properties.get("FLAVOUR"), Some("vanilla"));
    assert_eq!(properties.get("SPRINKLES"), Some("false"));
    assert_eq!(properties.get("NAME"), Some("Demo fan"));
}

#[test]
fn user_input_applies_recorded_entries() {
    let installer = fixture_with(demo_model(&["UserInputPanel"]));
    let mut session = installer.session();
    let root = section(
        r#"<UserInputPanel><userInput>
            <entry key="FLAVOUR" value="chocolate"/>
            <entry key="SPRINKLES" value="true"/>
            <entry key="EXTRA" value="kept"/>
        </userInput></UserInputPanel>"#,
    );

    UserInputPanel
        .run_automated(&mut session, &flavour_panel(), &root, &mut Vec::new())
        .expect("entries applied");

    let variables = &session.data.variables;
    assert_eq!(variables.get("FLAVOUR"), Some("chocolate"));
    assert_eq!(variables.get("SPRINKLES"), Some("true"));
    assert_eq!(variables.get("EXTRA"), Some("kept"));
}

#[test]
fn user_input_rejects_choices_a_combo_does_not_offer() {
    let installer = fixture_with(demo_model(&["UserInputPanel"]));
    let mut session = installer.session();
    let root = section(
        r#"<UserInputPanel><userInput><entry key="FLAVOUR" value="mint"/></userInput></UserInputPanel>"#,
    );

    let err = UserInputPanel
        .run_automated(&mut session, &flavour_panel(), &root, &mut Vec::new())
        .expect_err("mint is not offered");

    assert!(matches!(err, InstallerError::ValidationFailed { message, .. }
        if message == "Invalid choice: mint"));
}

#[test]
fn user_input_asks_each_field_on_the_console() {
    let installer = fixture_with(demo_model(&["UserInputPanel"]));
    let mut session = installer.session();
    let mut console = ScriptedConsole::new(["2", "y", ""]);

    UserInputPanel
        .run_console(&mut session, &flavour_panel(), &mut console)
        .expect("fields answered");

    let variables = &session.data.variables;
    assert_eq!(variables.get("FLAVOUR"), Some("chocolate"));
    assert_eq!(variables.get("SPRINKLES"), Some("true"));
    assert_eq!(variables.get("NAME"), Some("Demo fan"));
    assert!(console.transcript().contains("2) chocolate"));
}

#[test]
fn user_input_properties_need_fields_without_defaults() {
    let installer = fixture_with(demo_model(&["UserInputPanel"]));
    let mut session = installer.session();
    let properties: Properties = [("SPRINKLES", "true")].into_iter().collect();

    let err = UserInputPanel
        .run_from_properties(&mut session, &flavour_panel(), &properties, &mut Vec::new())
        .expect_err("FLAVOUR has no default");

    assert!(matches!(err, InstallerError::MissingProperty { key } if key == "FLAVOUR"));
}

#[test]
fn install_and_finish_report_the_outcome() {
    let installer = fixture_with(demo_model(&["InstallPanel", "FinishPanel"]));
    let mut session = installer.session();
    assert!(FinishPanel::lines(&session).is_empty());
    let mut out = Vec::new();

    InstallPanel
        .run_automated(&mut session, &Panel::new("InstallPanel"), &XmlElement::new("InstallPanel"), &mut out)
        .expect("installed");
    InstallPanel
        .run_automated(&mut session, &Panel::new("InstallPanel"), &XmlElement::new("InstallPanel"), &mut out)
        .expect("second run is a no-op");

    let out = String::from_utf8(out).expect("utf-8");
    assert_eq!(out.matches("Unpacking finished.").count(), 1);
    let lines = FinishPanel::lines(&session);
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[2],
        format!(
            "An uninstaller was created in {}",
            installer.target.join("uninstaller/uninstall.zip")
        )
    );
}
