//! `<packs>` parsing: files, filesets, parsables, executables and
//! dependencies.

use super::fileset::FileSet;
use crate::error::{CompilerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use instill_common::model::{
    ExecutableFile, ExecutionStage, FailurePolicy, OverridePolicy, Pack, PackFile, ParsableFile,
};
use instill_common::platform::OsConstraint;
use instill_common::substitutor::SubstitutionType;
use instill_common::xml::XmlElement;
use log::{debug, warn};

pub(super) fn read_packs(element: &XmlElement, base_dir: &Utf8Path) -> Result<Vec<Pack>> {
    let mut packs = Vec::new();
    for node in element.children_named("pack") {
        packs.push(read_pack(node, base_dir)?);
    }
    if packs.is_empty() {
        return Err(element.invalid_value("<packs>", "no <pack> elements").into());
    }
    Ok(packs)
}

fn read_pack(node: &XmlElement, base_dir: &Utf8Path) -> Result<Pack> {
    let name = node.require_attribute("name")?.to_owned();
    let exclude_group = node.attribute("excludeGroup").map(str::to_owned);
    let required = node.bool_attribute("required", false);
    if required && exclude_group.is_some() {
        return Err(CompilerError::InvalidPack {
            pack: name,
            reason: String::from("a pack in an exclude group cannot be required"),
        });
    }

    let mut pack = Pack {
        id: node.attribute("id").map(str::to_owned),
        description: node.child_content("description").unwrap_or_default().to_owned(),
        condition: node.attribute("condition").map(str::to_owned),
        required,
        preselected: node.bool_attribute("preselected", exclude_group.is_none()),
        loose: node.bool_attribute("loose", false),
        uninstall: node.bool_attribute("uninstall", true),
        hidden: node.bool_attribute("hidden", false),
        depends: node
            .children_named("depends")
            .map(|depends| depends.require_attribute("packname").map(str::to_owned))
            .collect::<std::result::Result<_, _>>()?,
        os: OsConstraint::from_children(node),
        parent: node.attribute("parent").map(str::to_owned),
        install_groups: node
            .attribute("installGroups")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|group| !group.is_empty())
            .map(str::to_owned)
            .collect(),
        exclude_group,
        name,
        ..Pack::default()
    };

    for child in node.children() {
        match child.name() {
            "file" => read_file(child, base_dir, &mut pack.files)?,
            "singlefile" => read_single_file(child, base_dir, &mut pack.files)?,
            "fileset" => read_fileset(child, base_dir, &mut pack.files)?,
            "parsable" => read_parsable(child, base_dir, &mut pack.parsables)?,
            "executable" => pack.executables.push(read_executable(child)?),
            _ => {}
        }
    }

    for executable in &pack.executables {
        let mut marked = false;
        for file in pack.files.iter_mut().filter(|file| file.target == executable.target) {
            file.executable = true;
            marked = true;
        }
        if !marked {
            debug!("executable {} is not a file of pack {}", executable.target, pack.name);
        }
    }
    pack.size = pack.files.iter().map(|file| file.size).sum();
    Ok(pack)
}

/// Resolves `src` against `base_dir` and checks that it exists.
pub(super) fn resolve_source(
    element: &XmlElement,
    src: &str,
    base_dir: &Utf8Path,
) -> Result<Utf8PathBuf> {
    let path = base_dir.join(src);
    if path.exists() {
        Ok(path)
    } else {
        Err(CompilerError::MissingSource {
            path,
            system_id: element.system_id().to_owned(),
            line: element.line(),
        })
    }
}

struct FileAttributes {
    os: Vec<OsConstraint>,
    condition: Option<String>,
    override_policy: OverridePolicy,
}

impl FileAttributes {
    fn read(element: &XmlElement) -> Result<Self> {
        let raw = element.attribute_or("override", "update");
        let override_policy = raw
            .parse()
            .map_err(|value: String| element.invalid_value("override", value))?;
        Ok(Self {
            os: OsConstraint::from_children(element),
            condition: element.attribute("condition").map(str::to_owned),
            override_policy,
        })
    }

    fn pack_file(&self, base_dir: &Utf8Path, source: &Utf8Path, target: String) -> Result<PackFile> {
        let metadata = std::fs::metadata(source).map_err(|err| CompilerError::io(source, err))?;
        let relative = source.strip_prefix(base_dir).unwrap_or(source);
        Ok(PackFile {
            source: relative.as_str().replace('\\', "/"),
            target,
            os: self.os.clone(),
            condition: self.condition.clone(),
            override_policy: self.override_policy,
            size: metadata.len(),
            ..PackFile::default()
        })
    }
}

fn join_target(dir: &str, name: &str) -> String {
    format!("{}/{name}", dir.trim_end_matches(['/', '\\']))
}

fn read_file(element: &XmlElement, base_dir: &Utf8Path, files: &mut Vec<PackFile>) -> Result<()> {
    let src = element.require_attribute("src")?;
    let target_dir = element.require_attribute("targetdir")?;
    let source = resolve_source(element, src, base_dir)?;
    let attributes = FileAttributes::read(element)?;
    if element.bool_attribute("unpack", false) {
        warn!(
            "{}:{}: unpack is not supported; {src} is installed as is",
            element.system_id(),
            element.line()
        );
    }

    let name = source.file_name().unwrap_or(src);
    if source.is_dir() {
        let target_root = join_target(target_dir, name);
        let set = FileSet::new(source.clone())?;
        for relative in set.scan()? {
            let target = join_target(&target_root, relative.as_str());
            files.push(attributes.pack_file(base_dir, &source.join(&relative), target)?);
        }
    } else {
        files.push(attributes.pack_file(base_dir, &source, join_target(target_dir, name))?);
    }
    Ok(())
}

fn read_single_file(
    element: &XmlElement,
    base_dir: &Utf8Path,
    files: &mut Vec<PackFile>,
) -> Result<()> {
    let source = resolve_source(element, element.require_attribute("src")?, base_dir)?;
    let target = element.require_attribute("target")?.to_owned();
    if source.is_dir() {
        return Err(element.invalid_value("<singlefile> src", source.as_str()).into());
    }
    let attributes = FileAttributes::read(element)?;
    files.push(attributes.pack_file(base_dir, &source, target)?);
    Ok(())
}

fn read_fileset(element: &XmlElement, base_dir: &Utf8Path, files: &mut Vec<PackFile>) -> Result<()> {
    let set = FileSet::from_xml(element, base_dir)?;
    if !set.dir().is_dir() {
        return Err(CompilerError::MissingSource {
            path: set.dir().to_owned(),
            system_id: element.system_id().to_owned(),
            line: element.line(),
        });
    }
    let target_dir = element.require_attribute("targetdir")?;
    let attributes = FileAttributes::read(element)?;
    let selected = set.scan()?;
    if selected.is_empty() {
        warn!(
            "{}:{}: fileset {} selects no files",
            element.system_id(),
            element.line(),
            set.dir()
        );
    }
    for relative in selected {
        let target = join_target(target_dir, relative.as_str());
        files.push(attributes.pack_file(base_dir, &set.dir().join(&relative), target)?);
    }
    Ok(())
}

fn read_parsable(
    element: &XmlElement,
    base_dir: &Utf8Path,
    parsables: &mut Vec<ParsableFile>,
) -> Result<()> {
    let kind: SubstitutionType = element
        .attribute_or("type", "plain")
        .parse()
        .map_err(|_| element.invalid_value("parsable type", element.attribute_or("type", "")))?;
    let os = OsConstraint::from_children(element);
    let condition = element.attribute("condition").map(str::to_owned);
    let mut push = |target: String| {
        parsables.push(ParsableFile {
            target,
            kind,
            os: os.clone(),
            condition: condition.clone(),
        });
    };

    if let Some(target) = element.attribute("targetfile") {
        push(target.to_owned());
    }
    for fileset in element.children_named("fileset") {
        let set = FileSet::from_xml(fileset, base_dir)?;
        let target_dir = fileset.require_attribute("targetdir")?;
        for relative in set.scan()? {
            push(join_target(target_dir, relative.as_str()));
        }
    }
    Ok(())
}

fn read_executable(element: &XmlElement) -> Result<ExecutableFile> {
    let stage: ExecutionStage = element
        .attribute_or("stage", "never")
        .parse()
        .map_err(|value: String| element.invalid_value("executable stage", value))?;
    let failure = match element.attribute_or("failure", "abort").trim() {
        "ask" => FailurePolicy::Abort,
        other => other
            .parse()
            .map_err(|value: String| element.invalid_value("executable failure", value))?,
    };
    let arguments = element
        .first_child_named("args")
        .map(|args| {
            args.children_named("arg")
                .map(|arg| arg.require_attribute("value").map(str::to_owned))
                .collect::<std::result::Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();

    Ok(ExecutableFile {
        target: element.require_attribute("targetfile")?.to_owned(),
        stage,
        arguments,
        failure,
        keep: element.bool_attribute("keep", false),
        condition: element.attribute("condition").map(str::to_owned),
        os: OsConstraint::from_children(element),
    })
}
