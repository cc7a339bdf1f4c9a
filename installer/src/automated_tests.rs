//! Tests for replaying and recording automation documents.

use super::*;
use crate::lock::{InstallerLock, LockStatus};
use crate::test_utils::{ArtifactBuilder, InstallerFixture, demo_model};
use instill_common::model::{FieldKind, UserInputField};
use instill_common::xml::parse_str;
use rstest::{fixture, rstest};

const PANELS: [&str; 5] = [
    "HelloPanel",
    "TargetPanel",
    "PacksPanel",
    "InstallPanel",
    "FinishPanel",
];

#[fixture]
fn installer() -> InstallerFixture {
    InstallerFixture::new(
        &ArtifactBuilder::new(demo_model(&PANELS))
            .file(0, "bin/demo.sh", "#!/bin/sh\necho demo\n")
            .file(1, "docs/manual.txt", "Read me first."),
    )
}

fn document(xml: &str) -> XmlElement {
    parse_str(xml, "auto-install.xml").expect("well-formed document")
}

fn replay(installer: &InstallerFixture, root: &XmlElement) -> (Result<()>, String) {
    let mut session = installer.session();
    let mut out = Vec::new();
    let outcome = AutomatedInstaller::new(&mut session)
        .with_lock_dir(installer.root.clone())
        .run(root, &mut out);
    (outcome, String::from_utf8(out).expect("utf-8 output"))
}

fn input_panel(id: &str, variable: &str) -> Panel {
    let mut panel = Panel::new("UserInputPanel");
    panel.id = Some(id.to_owned());
    panel.fields.push(UserInputField {
        variable: variable.to_owned(),
        kind: FieldKind::Text,
        label: variable.to_owned(),
        default_value: Some(String::new()),
        ..UserInputField::default()
    });
    panel
}

#[rstest]
#[case::present(r#"<AutomatedInstallation langpack=" fra "/>"#, Some("fra"))]
#[case::blank(r#"<AutomatedInstallation langpack=""/>"#, None)]
#[case::absent("<AutomatedInstallation/>", None)]
fn the_recorded_language_is_read_from_the_root(#[case] xml: &str, #[case] expected: Option<&str>) {
    assert_eq!(automation_language(&document(xml)), expected);
}

#[rstest]
fn a_document_replays_every_panel(installer: InstallerFixture) {
    let root = document(&format!(
        r#"<AutomatedInstallation langpack="eng">
            <HelloPanel/>
            <TargetPanel><installpath>{}</installpath></TargetPanel>
            <PacksPanel><pack index="1" name="Docs" selected="true"/></PacksPanel>
            <InstallPanel/>
            <FinishPanel/>
        </AutomatedInstallation>"#,
        installer.target
    ));

    let (outcome, out) = replay(&installer, &root);

    outcome.expect("installation succeeds");
    assert!(out.starts_with(AUTOMATED_START));
    assert!(out.contains("Installing pack Docs (2/2)"));
    assert!(out.contains("Installation was successful."));
    assert!(out.trim_end().ends_with(AUTOMATED_DONE));
    assert!(installer.target.join("docs/manual.txt").is_file());
}

#[rstest]
fn package_prefixes_do_not_matter(installer: InstallerFixture) {
    let root = document(&format!(
        r#"<AutomatedInstallation>
            <org.example.HelloPanel/>
            <org.example.TargetPanel><installpath>{}</installpath></org.example.TargetPanel>
            <PacksPanel/>
            <InstallPanel/>
            <FinishPanel/>
        </AutomatedInstallation>"#,
        installer.target
    ));

    let (outcome, _) = replay(&installer, &root);

    outcome.expect("installation succeeds");
    assert!(installer.target.join("bin/demo.sh").is_file());
}

#[rstest]
fn a_missing_section_fails_the_installation(installer: InstallerFixture) {
    let root = document("<AutomatedInstallation><HelloPanel/></AutomatedInstallation>");

    let (outcome, out) = replay(&installer, &root);

    let err = outcome.expect_err("no TargetPanel section");
    assert!(matches!(err, InstallerError::MissingPanelData { panel } if panel == "UNKNOWN (TargetPanel)"));
    assert!(out.trim_end().ends_with(AUTOMATED_FAILED));
    assert!(!installer.target.exists());
}

#[rstest]
fn a_held_lock_stops_an_automated_installation(installer: InstallerFixture) {
    let _held = match InstallerLock::acquire(&installer.root, "Demo") {
        LockStatus::Acquired(lock) => lock,
        other => panic!("expected to take the lock, got {other:?}"),
    };
    let root = document("<AutomatedInstallation/>");

    let (outcome, out) = replay(&installer, &root);

    assert!(matches!(outcome, Err(InstallerError::Locked { .. })));
    assert!(out.contains(AUTOMATED_FAILED));
}

#[test]
fn repeated_panels_take_sections_by_id_then_by_order() {
    let mut model = demo_model(&[]);
    model.panels = vec![input_panel("second", "B"), input_panel("first", "A")];
    let installer = InstallerFixture::new(&ArtifactBuilder::new(model));
    let root = document(
        r#"<AutomatedInstallation>
            <UserInputPanel id="first"><userInput><entry key="A" value="from first"/></userInput></UserInputPanel>
            <UserInputPanel id="second"><userInput><entry key="B" value="from second"/></userInput></UserInputPanel>
        </AutomatedInstallation>"#,
    );
    let mut session = installer.session();

    AutomatedInstaller::new(&mut session)
        .with_lock_dir(installer.root.clone())
        .run(&root, &mut Vec::new())
        .expect("sections found");

    assert_eq!(session.data.variables.get("A"), Some("from first"));
    assert_eq!(session.data.variables.get("B"), Some("from second"));
}

#[test]
fn sections_without_ids_are_taken_in_order() {
    let mut first = input_panel("unused", "A");
    first.id = None;
    let mut second = input_panel("unused", "B");
    second.id = None;
    let root = document(
        r#"<AutomatedInstallation>
            <UserInputPanel><userInput><entry key="A" value="one"/></userInput></UserInputPanel>
            <UserInputPanel><userInput><entry key="B" value="two"/></userInput></UserInputPanel>
        </AutomatedInstallation>"#,
    );

    let first_section = find_section(&root, &first, 0).expect("first section");
    let second_section = find_section(&root, &second, 1).expect("second section");

    assert_ne!(first_section, second_section);
    assert!(find_section(&root, &second, 2).is_none());
}

#[rstest]
fn recording_skips_hidden_panels_and_keeps_ids(installer: InstallerFixture) {
    let mut session = installer.session();
    session.data.model.panels[0].condition = Some("never.defined".to_owned());
    session.data.model.panels[1].id = Some("where".to_owned());

    let root = make_automation(&session);

    assert_eq!(root.name(), AUTOMATION_ROOT);
    assert_eq!(root.attribute(LANGPACK_ATTRIBUTE), Some("eng"));
    let names: Vec<&str> = root.children().iter().map(XmlElement::name).collect();
    assert_eq!(
        names,
        vec!["TargetPanel", "PacksPanel", "InstallPanel", "FinishPanel"]
    );
    let target = root.first_child_named("TargetPanel").expect("target section");
    assert_eq!(target.attribute("id"), Some("where"));
    assert_eq!(target.child_content("installpath"), Some(installer.target.as_str()));
}

#[rstest]
fn a_recording_replays_to_the_same_installation(installer: InstallerFixture) {
    let record = installer.root.join("auto-install.xml");
    let mut session = installer.session();
    session.data.select("Docs", true);
    record_installation(&session, &record).expect("recorded");
    drop(session);

    let root = read_automation(&record).expect("readable");
    let (outcome, _) = replay(&installer, &root);

    outcome.expect("installation succeeds");
    assert!(installer.target.join("docs/manual.txt").is_file());
}

#[test]
fn a_malformed_document_is_an_xml_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("broken.xml")).expect("utf-8 path");
    std::fs::write(&path, "<AutomatedInstallation><TargetPanel>").expect("written");

    let err = read_automation(&path).expect_err("unclosed elements");
    assert!(matches!(err, InstallerError::Xml(_)));
}
