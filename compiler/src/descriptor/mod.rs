//! Reads an installation description (`install.xml`) into an
//! [`InstallationModel`] plus the condition registry and the resources to
//! bundle.
//!
//! Source paths are resolved against the base directory and checked for
//! existence here, so packaging only has to copy bytes.

mod fileset;
mod packs;
mod panels;

pub use fileset::FileSet;

use crate::error::Result;
use camino::{Utf8Path, Utf8PathBuf};
use instill_common::i18n::iso3_for_locale;
use instill_common::model::{Author, Info, InstallationModel};
use instill_common::rules::RulesEngine;
use instill_common::variables::{DynamicVariable, RegexFilter};
use instill_common::xml::{self, XmlElement};
use log::{debug, warn};

/// Variable whose value becomes the default install path.
pub const DEFAULT_INSTALL_PATH_VARIABLE: &str = "DEFAULT_INSTALL_PATH";
/// Resource ids accepted for the licence text.
pub const LICENCE_RESOURCE_IDS: [&str; 2] = ["LicencePanel.licence", "LicensePanel.license"];
/// Prefix of resource ids holding per-language message overrides.
pub const LANGPACK_RESOURCE_PREFIX: &str = "langpack.";

/// A `<res id src/>` entry with its source resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
    /// Resource id.
    pub id: String,
    /// Absolute or base-relative source path.
    pub path: Utf8PathBuf,
}

/// Everything read from an installation description.
#[derive(Debug)]
pub struct Descriptor {
    /// The model serialised into the artifact.
    pub model: InstallationModel,
    /// Conditions declared in `<conditions>`.
    pub rules: RulesEngine,
    /// Resources to bundle.
    pub resources: Vec<Resource>,
    /// Directory that relative source paths are resolved against.
    pub base_dir: Utf8PathBuf,
}

impl Descriptor {
    /// The licence resource, if one was declared.
    #[must_use]
    pub fn licence(&self) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|resource| LICENCE_RESOURCE_IDS.contains(&resource.id.as_str()))
    }
}

/// Reads and parses the description at `path`.
///
/// `fallback_locale` is used when the description has no `<locale>` section.
///
/// # Errors
///
/// Returns the first XML, condition or missing-source error encountered.
pub fn read_descriptor(
    path: &Utf8Path,
    base_dir: &Utf8Path,
    fallback_locale: Option<&str>,
) -> Result<Descriptor> {
    let root = xml::parse_file(path)?;
    parse_descriptor(&root, base_dir, fallback_locale)
}

/// Parses an already loaded `<installation>` element.
///
/// # Errors
///
/// See [`read_descriptor`].
pub fn parse_descriptor(
    root: &XmlElement,
    base_dir: &Utf8Path,
    fallback_locale: Option<&str>,
) -> Result<Descriptor> {
    let mut model = InstallationModel {
        info: read_info(root.require_child("info")?)?,
        ..InstallationModel::default()
    };

    if let Some(variables) = root.first_child_named("variables") {
        for variable in variables.children_named("variable") {
            let name = variable.require_attribute("name")?;
            let value = variable.require_attribute("value")?;
            if model.variables.insert(name.to_owned(), value.to_owned()).is_some() {
                warn!("{}:{}: variable {name} redefined", variable.system_id(), variable.line());
            }
        }
    }
    model.default_install_path = model.variables.get(DEFAULT_INSTALL_PATH_VARIABLE).cloned();

    if let Some(dynamic) = root.first_child_named("dynamicvariables") {
        model.dynamic_variables = read_dynamic_variables(dynamic)?;
    }

    model.locales = read_locales(root, fallback_locale);

    let mut rules = RulesEngine::new();
    if let Some(conditions) = root.first_child_named("conditions") {
        rules.analyze_xml(conditions)?;
    }

    let resources = match root.first_child_named("resources") {
        Some(element) => read_resources(element, base_dir)?,
        None => Vec::new(),
    };

    if let Some(panels) = root.first_child_named("panels") {
        model.panels = panels::read_panels(panels)?;
    }
    model.packs = packs::read_packs(root.require_child("packs")?, base_dir)?;

    model.has_licence = resources
        .iter()
        .any(|resource| LICENCE_RESOURCE_IDS.contains(&resource.id.as_str()));
    debug!("read {} packs and {} panels", model.packs.len(), model.panels.len());
    Ok(Descriptor {
        model,
        rules,
        resources,
        base_dir: base_dir.to_owned(),
    })
}

fn read_info(info: &XmlElement) -> Result<Info> {
    let mut result = Info {
        app_name: info.require_child("appname")?.content().unwrap_or_default().trim().to_owned(),
        app_version: info
            .require_child("appversion")?
            .content()
            .unwrap_or_default()
            .trim()
            .to_owned(),
        app_url: info.child_content("url").map(str::to_owned),
        ..Info::default()
    };

    if let Some(authors) = info.first_child_named("authors") {
        for author in authors.children_named("author") {
            result.authors.push(Author {
                name: author.require_attribute("name")?.to_owned(),
                email: author.attribute("email").map(str::to_owned),
            });
        }
    }

    if let Some(uninstaller) = info.first_child_named("uninstaller") {
        if let Some(name) = uninstaller.attribute("name").filter(|name| !name.trim().is_empty()) {
            result.uninstaller_name = name.trim().to_owned();
        }
        result.uninstaller_condition = uninstaller.attribute("condition").map(str::to_owned);
        result.write_uninstaller = uninstaller.bool_attribute("write", true);
    }

    result.requires_privileges = info.first_child_named("run-privileged").is_some();
    result.write_install_record = info
        .child_content("writeinstallationinformation")
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "yes" | "true"));
    Ok(result)
}

fn read_dynamic_variables(element: &XmlElement) -> Result<Vec<DynamicVariable>> {
    let mut variables: Vec<DynamicVariable> = Vec::new();
    for node in element.children_named("variable") {
        let name = node.require_attribute("name")?;
        let value = match node.attribute("value") {
            Some(value) => value.to_owned(),
            None => node
                .first_child_named("value")
                .and_then(XmlElement::content)
                .map(str::to_owned)
                .ok_or_else(|| node.invalid_value("dynamic variable value", name))?,
        };
        let filter = node
            .first_child_named("regex")
            .map(|regex| -> Result<RegexFilter> {
                Ok(RegexFilter {
                    pattern: regex.require_attribute("regexp")?.to_owned(),
                    select: regex.attribute("select").map(str::to_owned),
                    replace: regex.attribute("replace").map(str::to_owned),
                    default_value: regex.attribute("defaultvalue").map(str::to_owned),
                    global: regex.bool_attribute("global", false),
                })
            })
            .transpose()?;
        let variable = DynamicVariable {
            name: name.to_owned(),
            value,
            condition: node.attribute("condition").map(str::to_owned),
            check_once: node.bool_attribute("checkonce", false),
            ignore_failure: node.bool_attribute("ignorefailure", false),
            filter,
        };

        let before = variables.len();
        variables.retain(|existing| {
            existing.name != variable.name || existing.condition != variable.condition
        });
        if variables.len() != before {
            warn!(
                "{}:{}: dynamic variable {name} will be overwritten",
                node.system_id(),
                node.line()
            );
        }
        variables.push(variable);
    }
    Ok(variables)
}

fn read_locales(root: &XmlElement, fallback_locale: Option<&str>) -> Vec<String> {
    let declared: Vec<String> = root
        .first_child_named("locale")
        .map(|locale| {
            locale
                .children_named("langpack")
                .filter_map(|langpack| langpack.attribute("iso3"))
                .map(|iso3| iso3.trim().to_ascii_lowercase())
                .collect()
        })
        .unwrap_or_default();
    if !declared.is_empty() {
        return declared;
    }
    let fallback = fallback_locale
        .and_then(iso3_for_locale)
        .unwrap_or("eng");
    vec![fallback.to_owned()]
}

fn read_resources(element: &XmlElement, base_dir: &Utf8Path) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();
    for res in element.children_named("res") {
        let id = res.require_attribute("id")?;
        let path = packs::resolve_source(res, res.require_attribute("src")?, base_dir)?;
        resources.push(Resource {
            id: id.to_owned(),
            path,
        });
    }
    Ok(resources)
}

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;
