//! Quality gates for localisation resources.
//!
//! Every secondary locale must define the same messages as `en-GB` and use
//! the same placeables in each, so a translation can never drop an argument
//! the code supplies.

use instill_common::i18n::{Arguments, FluentValue, Localiser, available_locales};
use regex::Regex;
use rstest::{fixture, rstest};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

type Bundle = BTreeMap<String, BTreeSet<String>>;

fn locales_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../locales")
}

/// Message ids mapped to the placeables they use.
fn parse_ftl(locale: &str) -> Bundle {
    let path = locales_root().join(locale).join("instill.ftl");
    let content = fs::read_to_string(&path).expect("ftl file should be readable");
    let message = Regex::new(r"^([A-Za-z0-9_-]+)\s*=\s*(.*)$").expect("valid message regex");
    let placeable = Regex::new(r"\{\s*\$([A-Za-z0-9_]+)").expect("valid placeable regex");

    content
        .lines()
        .filter_map(|line| message.captures(line))
        .map(|captures| {
            let placeables = placeable
                .captures_iter(&captures[2])
                .map(|found| found[1].to_owned())
                .collect();
            (captures[1].to_owned(), placeables)
        })
        .collect()
}

#[fixture]
fn reference() -> Bundle {
    parse_ftl("en-GB")
}

#[rstest]
#[case("de")]
#[case("fr")]
fn secondary_locales_match_the_reference(reference: Bundle, #[case] locale: &str) {
    let bundle = parse_ftl(locale);
    let reference_ids: BTreeSet<_> = reference.keys().collect();
    let locale_ids: BTreeSet<_> = bundle.keys().collect();
    assert_eq!(reference_ids, locale_ids, "message ids diverged in {locale}");

    for (id, placeables) in &reference {
        assert_eq!(
            Some(placeables),
            bundle.get(id),
            "placeables diverged for `{id}` in {locale}"
        );
    }
}

#[test]
fn every_bundle_is_embedded() {
    let on_disk: BTreeSet<String> = fs::read_dir(locales_root())
        .expect("locales directory should exist")
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    let embedded: BTreeSet<String> = available_locales().iter().cloned().collect();
    assert_eq!(on_disk, embedded);
}

#[rstest]
#[case("en-GB", "Welcome")]
#[case("de", "Willkommen")]
#[case("fr", "Bienvenue")]
fn welcome_message_renders_in_each_locale(#[case] locale: &str, #[case] greeting: &str) {
    let localiser = Localiser::new(Some(locale));
    let mut args = Arguments::new();
    args.insert(Cow::Borrowed("app"), FluentValue::from("Demo"));
    args.insert(Cow::Borrowed("version"), FluentValue::from("1.0"));

    let text = localiser
        .message_with_args("installer-welcome", &args)
        .expect("welcome message should exist");
    assert!(text.starts_with(greeting), "{text}");
    assert!(text.contains("Demo 1.0"), "{text}");
}
