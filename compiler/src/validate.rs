//! Consistency checks run between parsing and packaging.
//!
//! Structural problems (duplicate packs, unknown or cyclic dependencies) stop
//! the build. Condition references that resolve to nothing are reported as
//! warnings, because the installer treats them as false rather than failing.

use crate::descriptor::Descriptor;
use crate::error::{CompilerError, Result};
use instill_common::model::InstallationModel;
use instill_common::rules::RulesEngine;
use log::warn;
use std::collections::{BTreeMap, BTreeSet};

/// Advisory findings of a successful validation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Validation {
    /// Human-readable warnings, one per problem.
    pub warnings: Vec<String>,
}

/// Checks `descriptor` and registers its pack ids with the rules engine.
///
/// # Errors
///
/// Returns the first structural problem found.
pub fn validate(descriptor: &mut Descriptor) -> Result<Validation> {
    check_unique_packs(&descriptor.model)?;
    check_dependencies(&descriptor.model)?;

    let pack_ids: Vec<String> = descriptor
        .model
        .packs
        .iter()
        .filter_map(|pack| pack.id.clone())
        .collect();
    descriptor.rules.register_packs(pack_ids.iter().map(String::as_str));

    let warnings = unresolved_conditions(&descriptor.model, &descriptor.rules);
    for warning in &warnings {
        warn!("{warning}");
    }
    Ok(Validation { warnings })
}

fn check_unique_packs(model: &InstallationModel) -> Result<()> {
    let mut names = BTreeSet::new();
    let mut ids = BTreeSet::new();
    for pack in &model.packs {
        if !names.insert(pack.name.as_str()) {
            return Err(CompilerError::DuplicatePackName {
                name: pack.name.clone(),
            });
        }
        if let Some(id) = &pack.id {
            if !ids.insert(id.as_str()) {
                return Err(CompilerError::DuplicatePackId { id: id.clone() });
            }
        }
    }
    Ok(())
}

fn check_dependencies(model: &InstallationModel) -> Result<()> {
    let graph: BTreeMap<&str, Vec<&str>> = model
        .packs
        .iter()
        .map(|pack| {
            (
                pack.name.as_str(),
                pack.depends.iter().map(String::as_str).collect(),
            )
        })
        .collect();

    for (pack, dependencies) in &graph {
        if let Some(missing) = dependencies.iter().find(|dep| !graph.contains_key(*dep)) {
            return Err(CompilerError::UnknownDependency {
                pack: (*pack).to_owned(),
                dependency: (*missing).to_owned(),
            });
        }
    }

    let mut finished = BTreeSet::new();
    for &start in graph.keys() {
        let mut path = Vec::new();
        if let Some(cycle) = find_cycle(&graph, start, &mut path, &mut finished) {
            return Err(CompilerError::DependencyCycle { cycle });
        }
    }
    Ok(())
}

fn find_cycle<'a>(
    graph: &BTreeMap<&'a str, Vec<&'a str>>,
    pack: &'a str,
    path: &mut Vec<&'a str>,
    finished: &mut BTreeSet<&'a str>,
) -> Option<Vec<String>> {
    if finished.contains(pack) {
        return None;
    }
    if let Some(position) = path.iter().position(|seen| *seen == pack) {
        let mut cycle: Vec<String> = path
            .get(position..)
            .unwrap_or_default()
            .iter()
            .map(|name| (*name).to_owned())
            .collect();
        cycle.push(pack.to_owned());
        return Some(cycle);
    }
    path.push(pack);
    for &dependency in graph.get(pack).map(Vec::as_slice).unwrap_or_default() {
        if let Some(cycle) = find_cycle(graph, dependency, path, finished) {
            return Some(cycle);
        }
    }
    path.pop();
    finished.insert(pack);
    None
}

fn unresolved_conditions(model: &InstallationModel, rules: &RulesEngine) -> Vec<String> {
    let mut uses: Vec<(String, &str)> = Vec::new();
    if let Some(condition) = &model.info.uninstaller_condition {
        uses.push((String::from("uninstaller"), condition));
    }
    for variable in &model.dynamic_variables {
        if let Some(condition) = &variable.condition {
            uses.push((format!("dynamic variable {}", variable.name), condition));
        }
    }
    for panel in &model.panels {
        if let Some(condition) = &panel.condition {
            uses.push((format!("panel {}", panel.panel_id()), condition));
        }
    }
    for pack in &model.packs {
        if let Some(condition) = &pack.condition {
            uses.push((format!("pack {}", pack.name), condition));
        }
        let guarded = pack
            .files
            .iter()
            .map(|file| (&file.target, &file.condition))
            .chain(pack.parsables.iter().map(|file| (&file.target, &file.condition)))
            .chain(pack.executables.iter().map(|file| (&file.target, &file.condition)));
        for (target, condition) in guarded {
            if let Some(condition) = condition {
                uses.push((format!("{target} in pack {}", pack.name), condition));
            }
        }
    }

    let mut warnings: Vec<String> = uses
        .into_iter()
        .flat_map(|(user, expression)| {
            rules
                .unresolved_in(expression)
                .into_iter()
                .map(move |id| format!("{user} refers to undefined condition {id}"))
        })
        .collect();
    warnings.extend(
        rules
            .unresolved_references()
            .into_iter()
            .map(|id| format!("condition {id} is referenced but not defined")),
    );
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use instill_common::model::{Pack, PackFile, Panel};
    use instill_common::rules::Condition;
    use rstest::rstest;

    fn pack(name: &str, depends: &[&str]) -> Pack {
        Pack {
            name: name.to_owned(),
            depends: depends.iter().map(|dep| (*dep).to_owned()).collect(),
            ..Pack::default()
        }
    }

    fn descriptor(packs: Vec<Pack>) -> Descriptor {
        Descriptor {
            model: InstallationModel {
                packs,
                ..InstallationModel::default()
            },
            rules: RulesEngine::new(),
            resources: Vec::new(),
            base_dir: Utf8PathBuf::from("."),
        }
    }

    #[rstest]
    fn accepts_a_consistent_description() {
        let mut descriptor = descriptor(vec![pack("Core", &[]), pack("Docs", &["Core"])]);
        let validation = validate(&mut descriptor).expect("valid");
        assert!(validation.warnings.is_empty());
    }

    #[rstest]
    fn rejects_duplicate_names_and_ids() {
        let mut duplicate_name = descriptor(vec![pack("Core", &[]), pack("Core", &[])]);
        assert!(matches!(
            validate(&mut duplicate_name),
            Err(CompilerError::DuplicatePackName { name }) if name == "Core"
        ));

        let mut first = pack("A", &[]);
        first.id = Some(String::from("same"));
        let mut second = pack("B", &[]);
        second.id = Some(String::from("same"));
        let mut duplicate_id = descriptor(vec![first, second]);
        assert!(matches!(
            validate(&mut duplicate_id),
            Err(CompilerError::DuplicatePackId { id }) if id == "same"
        ));
    }

    #[rstest]
    fn rejects_unknown_dependencies() {
        let mut descriptor = descriptor(vec![pack("Docs", &["Core"])]);
        let err = validate(&mut descriptor).expect_err("unknown dependency");
        assert_eq!(err.to_string(), "pack Docs depends on unknown pack Core");
    }

    #[rstest]
    #[case(vec![pack("A", &["A"])], "A -> A")]
    #[case(vec![pack("A", &["B"]), pack("B", &["C"]), pack("C", &["A"])], "A -> B -> C -> A")]
    #[case(vec![pack("Root", &[]), pack("X", &["Root", "Y"]), pack("Y", &["X"])], "X -> Y -> X")]
    fn rejects_dependency_cycles(#[case] packs: Vec<Pack>, #[case] expected: &str) {
        let mut descriptor = descriptor(packs);
        let err = validate(&mut descriptor).expect_err("cycle");
        assert_eq!(err.to_string(), format!("pack dependency cycle: {expected}"));
    }

    #[rstest]
    fn warns_about_unresolved_conditions() {
        let mut core = pack("Core", &[]);
        core.id = Some(String::from("core"));
        core.condition = Some(String::from("instill.selected.core+missing.one"));
        core.files.push(PackFile {
            target: String::from("$INSTALL_PATH/a"),
            condition: Some(String::from("instill.unixinstall")),
            ..PackFile::default()
        });
        let mut descriptor = descriptor(vec![core]);
        let mut panel = Panel::new("TargetPanel");
        panel.condition = Some(String::from("!missing.two"));
        descriptor.model.panels.push(panel);
        descriptor
            .rules
            .add_condition("declared", Condition::reference("missing.three"));

        let validation = validate(&mut descriptor).expect("warnings only");
        assert_eq!(
            validation.warnings,
            [
                "panel UNKNOWN (TargetPanel) refers to undefined condition missing.two",
                "pack Core refers to undefined condition missing.one",
                "condition missing.three is referenced but not defined",
            ]
        );
    }
}
