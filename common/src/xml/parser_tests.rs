//! Unit tests for the XML reader and XInclude expansion.

use super::*;
use crate::xml::to_xml_string;
use rstest::{fixture, rstest};
use tempfile::TempDir;

#[fixture]
fn include_dir() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

fn utf8(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("temp path is UTF-8")
}

#[test]
fn records_line_numbers_for_nested_elements() {
    let source = "<installation>\n  <info>\n    <appname>Demo</appname>\n  </info>\n\n  <packs/>\n</installation>\n";
    let root = parse_str(source, "install.xml").expect("parse");

    assert_eq!(root.line(), 1);
    let info = root.first_child_named("info").expect("info");
    assert_eq!(info.line(), 2);
    assert_eq!(info.child_content("appname"), Some("Demo"));
    assert_eq!(root.first_child_named("packs").expect("packs").line(), 6);
    assert_eq!(info.system_id(), "install.xml");
}

#[test]
fn unescapes_attributes_and_text() {
    let root = parse_str(
        r#"<variable name="greeting" value="a &amp; b">x &lt; y</variable>"#,
        "memory",
    )
    .expect("parse");
    assert_eq!(root.attribute("value"), Some("a & b"));
    assert_eq!(root.content(), Some("x < y"));
}

#[test]
fn keeps_cdata_verbatim() {
    let root = parse_str("<licence><![CDATA[<b>bold</b>]]></licence>", "memory").expect("parse");
    assert_eq!(root.content(), Some("<b>bold</b>"));
}

#[rstest]
#[case("<a><b></a>")]
#[case("<a>")]
#[case("")]
fn rejects_malformed_documents(#[case] source: &str) {
    assert!(parse_str(source, "broken.xml").is_err());
}

#[test]
fn parse_error_names_source_and_line() {
    let err = parse_str("<a>\n<b>\n</c>\n</a>", "broken.xml").expect_err("mismatched tags");
    let message = err.to_string();
    assert!(message.starts_with("broken.xml:"), "{message}");
}

#[rstest]
fn includes_external_fragment(include_dir: TempDir) {
    let dir = utf8(&include_dir);
    std::fs::write(
        dir.join("packs.xml"),
        "<xfragment><pack name=\"a\"/><pack name=\"b\"/></xfragment>",
    )
    .expect("write fragment");
    let main = dir.join("install.xml");
    std::fs::write(
        &main,
        "<installation><packs><xinclude href=\"packs.xml\"/></packs></installation>",
    )
    .expect("write main");

    let root = parse_file(&main).expect("parse with include");
    let packs = root.first_child_named("packs").expect("packs");
    let names: Vec<&str> = packs
        .children_named("pack")
        .filter_map(|pack| pack.attribute("name"))
        .collect();
    assert_eq!(names, ["a", "b"]);
    assert!(packs.first_child_named("xinclude").is_none());
}

#[rstest]
fn includes_text_as_content(include_dir: TempDir) {
    let dir = utf8(&include_dir);
    std::fs::write(dir.join("licence.txt"), "Permission granted").expect("write text");
    let main = dir.join("install.xml");
    std::fs::write(
        &main,
        "<licence><xinclude href=\"licence.txt\" parse=\"text\"/></licence>",
    )
    .expect("write main");

    let root = parse_file(&main).expect("parse");
    assert_eq!(root.content(), Some("Permission granted"));
}

#[test]
fn falls_back_when_reference_is_missing() {
    let root = parse_str(
        "<packs><xinclude href=\"missing.xml\"><xfallback><pack name=\"spare\"/></xfallback></xinclude></packs>",
        "memory/install.xml",
    )
    .expect("fallback used");
    assert_eq!(
        root.first_child_named("pack").and_then(|p| p.attribute("name")),
        Some("spare")
    );
}

#[test]
fn empty_fallback_contributes_nothing() {
    let root = parse_str(
        "<packs><xinclude href=\"missing.xml\"><xfallback/></xinclude></packs>",
        "memory/install.xml",
    )
    .expect("fallback used");
    assert!(!root.has_children());
}

#[rstest]
#[case("<a><xinclude/></a>", "xpointer must be specified")]
#[case("<a><xinclude href=\"x\" parse=\"binary\"/></a>", "parse attribute")]
#[case("<a><xinclude href=\"x\"><other/></xinclude></a>", "single xfallback")]
#[case("<a><xinclude href=\"does-not-exist.xml\"/></a>", "could not load")]
fn reports_invalid_inclusions(#[case] source: &str, #[case] expected: &str) {
    let err = parse_str(source, "memory/install.xml").expect_err("include should fail");
    assert!(matches!(err, XmlError::Include { .. }));
    assert!(err.to_string().contains(expected), "{err}");
}

#[test]
fn written_tree_parses_back_to_equivalent_structure() {
    let source = r#"<conditions><condition id="c1" type="variable"><name>os</name><value>linux &amp; bsd</value></condition></conditions>"#;
    let original = parse_str(source, "memory").expect("parse");
    let written = to_xml_string(&original).expect("write");
    let reparsed = parse_str(&written, "memory").expect("reparse");

    let condition = reparsed.first_child_named("condition").expect("condition");
    assert_eq!(condition.attribute("id"), Some("c1"));
    assert_eq!(condition.child_content("value"), Some("linux & bsd"));
}
