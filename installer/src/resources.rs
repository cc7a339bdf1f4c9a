//! Access to the resources bundled in an installer artifact.

use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use instill_common::model::{
    CONDITIONS_RESOURCE, INSTALLATION_RESOURCE, InstallationModel, LICENCE_RESOURCE,
    PACKS_RESOURCE, PacksInfo, VOLUMES_RESOURCE, custom_resource, langpack_resource,
};
use instill_common::spanning::VolumesInfo;
use instill_common::xml::{XmlElement, parse_str};
use log::debug;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use zip::ZipArchive;
use zip::result::ZipError;

/// Reads entries from the installer artifact.
#[derive(Debug)]
pub struct ResourceManager {
    archive: ZipArchive<File>,
    path: Utf8PathBuf,
}

impl ResourceManager {
    /// Opens the artifact at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Io`] when the file cannot be opened and
    /// [`InstallerError::Archive`] when it is not a zip.
    pub fn open(path: impl Into<Utf8PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::open(&path).map_err(|err| InstallerError::io(&path, err))?;
        let archive = ZipArchive::new(file).map_err(|err| InstallerError::archive(&path, err))?;
        debug!("opened installer {path} ({} entries)", archive.len());
        Ok(Self { archive, path })
    }

    /// Path of the artifact.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Directory holding the artifact, where volumes and loose packs live by
    /// default.
    #[must_use]
    pub fn directory(&self) -> Utf8PathBuf {
        self.path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .map_or_else(|| Utf8PathBuf::from("."), Utf8Path::to_owned)
    }

    /// Whether the artifact has an entry called `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    /// Streams the entry `name`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::MissingResource`] when there is no such entry.
    pub fn stream(&mut self, name: &str) -> Result<impl Read + '_> {
        match self.archive.by_name(name) {
            Ok(entry) => Ok(entry),
            Err(ZipError::FileNotFound) => Err(InstallerError::MissingResource {
                name: name.to_owned(),
            }),
            Err(err) => Err(InstallerError::archive(&self.path, err)),
        }
    }

    /// Reads the whole entry `name`.
    ///
    /// # Errors
    ///
    /// See [`Self::stream`]; read failures map to [`InstallerError::Io`].
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let path = self.path.clone();
        let mut bytes = Vec::new();
        self.stream(name)?
            .read_to_end(&mut bytes)
            .map_err(|err| InstallerError::io(path, err))?;
        Ok(bytes)
    }

    /// Reads the entry `name` as UTF-8 text.
    ///
    /// # Errors
    ///
    /// See [`Self::read`]; invalid UTF-8 is reported as an I/O error.
    pub fn read_string(&mut self, name: &str) -> Result<String> {
        let bytes = self.read(name)?;
        String::from_utf8(bytes).map_err(|err| {
            InstallerError::io(
                &self.path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, err),
            )
        })
    }

    /// Deserialises the JSON entry `name`.
    ///
    /// # Errors
    ///
    /// See [`Self::read`]; malformed JSON is [`InstallerError::Json`].
    pub fn read_json<T: DeserializeOwned>(&mut self, name: &str) -> Result<T> {
        let bytes = self.read(name)?;
        serde_json::from_slice(&bytes).map_err(|source| InstallerError::Json {
            resource: name.to_owned(),
            source,
        })
    }

    /// The serialised installation model.
    ///
    /// # Errors
    ///
    /// See [`Self::read_json`].
    pub fn model(&mut self) -> Result<InstallationModel> {
        self.read_json(INSTALLATION_RESOURCE)
    }

    /// The `<conditions>` element, empty when the artifact has none.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Xml`] when the element is malformed.
    pub fn conditions(&mut self) -> Result<XmlElement> {
        if !self.contains(CONDITIONS_RESOURCE) {
            return Ok(XmlElement::new("conditions"));
        }
        let text = self.read_string(CONDITIONS_RESOURCE)?;
        Ok(parse_str(&text, CONDITIONS_RESOURCE)?)
    }

    /// Layout of the pack data.
    ///
    /// # Errors
    ///
    /// See [`Self::read_json`].
    pub fn packs_info(&mut self) -> Result<PacksInfo> {
        self.read_json(PACKS_RESOURCE)
    }

    /// The volume set description, for multi-volume installers.
    ///
    /// # Errors
    ///
    /// See [`Self::read_json`].
    pub fn volumes_info(&mut self) -> Result<VolumesInfo> {
        self.read_json(VOLUMES_RESOURCE)
    }

    /// The licence text.
    ///
    /// # Errors
    ///
    /// See [`Self::read_string`].
    pub fn licence(&mut self) -> Result<String> {
        self.read_string(LICENCE_RESOURCE)
    }

    /// A custom `<res>` resource.
    ///
    /// # Errors
    ///
    /// See [`Self::read`].
    pub fn custom(&mut self, id: &str) -> Result<Vec<u8>> {
        self.read(&custom_resource(id))
    }

    /// Message overrides for `iso3`, empty when none are bundled.
    ///
    /// # Errors
    ///
    /// See [`Self::read_json`].
    pub fn langpack(&mut self, iso3: &str) -> Result<BTreeMap<String, String>> {
        let name = langpack_resource(iso3);
        if !self.contains(&name) {
            return Ok(BTreeMap::new());
        }
        self.read_json(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    struct Artifact {
        _dir: TempDir,
        path: Utf8PathBuf,
    }

    #[fixture]
    fn artifact() -> Artifact {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("install.zip")).expect("utf-8");
        let mut zip = zip::ZipWriter::new(File::create(&path).expect("create"));
        for (name, content) in [
            (INSTALLATION_RESOURCE, r#"{"info": {"app_name": "Demo"}}"#),
            (LICENCE_RESOURCE, "Use freely."),
            ("resources/langpacks/fra.json", r#"{"pack.core": "Noyau"}"#),
            ("resources/custom/splash", "splash"),
        ] {
            zip.start_file(name, SimpleFileOptions::default()).expect("start");
            zip.write_all(content.as_bytes()).expect("write");
        }
        zip.finish().expect("finish");
        Artifact { _dir: dir, path }
    }

    #[rstest]
    fn reads_bundled_resources(artifact: Artifact) {
        let mut resources = ResourceManager::open(&artifact.path).expect("open");
        assert_eq!(resources.model().expect("model").info.app_name, "Demo");
        assert_eq!(resources.licence().expect("licence"), "Use freely.");
        assert_eq!(resources.custom("splash").expect("custom"), b"splash");
        assert_eq!(
            resources.langpack("fra").expect("langpack").get("pack.core").map(String::as_str),
            Some("Noyau")
        );
        assert!(resources.langpack("deu").expect("no langpack").is_empty());
        assert!(resources.conditions().expect("conditions").children().is_empty());
        assert_eq!(resources.directory(), artifact.path.parent().expect("parent"));
    }

    #[rstest]
    fn missing_entries_are_named(artifact: Artifact) {
        let mut resources = ResourceManager::open(&artifact.path).expect("open");
        let err = resources.packs_info().expect_err("no packs.info");
        assert!(matches!(err, InstallerError::MissingResource { ref name } if name == PACKS_RESOURCE));
    }

    #[rstest]
    fn non_zip_files_are_rejected(artifact: Artifact) {
        let bogus = artifact.path.with_file_name("bogus.zip");
        std::fs::write(&bogus, "not a zip").expect("write");
        assert!(matches!(
            ResourceManager::open(&bogus),
            Err(InstallerError::Archive { .. })
        ));
    }
}
