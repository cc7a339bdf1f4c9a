//! Installation model shared by the compiler and the installer.
//!
//! The compiler builds an [`InstallationModel`] from `install.xml` and stores
//! it as JSON inside the installer artifact; the installer reads it back.

use crate::platform::OsConstraint;
use crate::substitutor::SubstitutionType;
use crate::variables::DynamicVariable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Artifact entry holding the serialised [`InstallationModel`].
pub const INSTALLATION_RESOURCE: &str = "resources/installation.json";
/// Artifact entry holding the `<conditions>` element.
pub const CONDITIONS_RESOURCE: &str = "resources/conditions.xml";
/// Artifact entry holding the [`PacksInfo`].
pub const PACKS_RESOURCE: &str = "resources/packs.info";
/// Artifact entry holding [`crate::spanning::VolumesInfo`].
pub const VOLUMES_RESOURCE: &str = "resources/volumes.info";
/// Artifact entry holding the licence text.
pub const LICENCE_RESOURCE: &str = "resources/licence.txt";
/// Directory of per-language message overrides, `<iso3>.json`.
pub const LANGPACK_DIR: &str = "resources/langpacks";

/// Artifact entry of a custom `<res>` resource.
#[must_use]
pub fn custom_resource(id: &str) -> String {
    format!("resources/custom/{id}")
}

/// Artifact entry of the message overrides for language `iso3`.
#[must_use]
pub fn langpack_resource(iso3: &str) -> String {
    format!("{LANGPACK_DIR}/{iso3}.json")
}

/// Artifact entry holding the data of pack `index` in single-file mode.
#[must_use]
pub fn pack_resource(index: usize) -> String {
    format!("resources/packs/pack-{index}")
}

/// Application metadata from `<info>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Info {
    /// Application name, exposed as `APP_NAME`.
    pub app_name: String,
    /// Application version, exposed as `APP_VER`.
    pub app_version: String,
    /// Home page, exposed as `APP_URL`.
    pub app_url: Option<String>,
    /// Author names and e-mail addresses.
    pub authors: Vec<Author>,
    /// Directory name of the uninstaller under the install path.
    pub uninstaller_name: String,
    /// Whether uninstall data is written at all.
    pub write_uninstaller: bool,
    /// Condition deciding whether uninstall data is written.
    pub uninstaller_condition: Option<String>,
    /// Whether the installer expects administrator rights.
    pub requires_privileges: bool,
    /// Whether an install record is written next to the uninstall data.
    pub write_install_record: bool,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            app_name: String::new(),
            app_version: String::new(),
            app_url: None,
            authors: Vec::new(),
            uninstaller_name: String::from(DEFAULT_UNINSTALLER_NAME),
            write_uninstaller: true,
            uninstaller_condition: None,
            requires_privileges: false,
            write_install_record: false,
        }
    }
}

/// Default directory name of the uninstaller.
pub const DEFAULT_UNINSTALLER_NAME: &str = "uninstaller";

/// One `<author>` entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Author {
    /// Display name.
    pub name: String,
    /// Contact address.
    pub email: Option<String>,
}

/// What to do when a target file already exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverridePolicy {
    /// Always overwrite.
    #[default]
    True,
    /// Never overwrite.
    False,
    /// Overwrite when the source is newer.
    Update,
    /// Ask, defaulting to overwrite.
    AskTrue,
    /// Ask, defaulting to keep.
    AskFalse,
}

impl OverridePolicy {
    /// Attribute spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::Update => "update",
            Self::AskTrue => "asktrue",
            Self::AskFalse => "askfalse",
        }
    }
}

impl FromStr for OverridePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Self::True),
            "false" => Ok(Self::False),
            "update" => Ok(Self::Update),
            "asktrue" => Ok(Self::AskTrue),
            "askfalse" => Ok(Self::AskFalse),
            other => Err(other.to_owned()),
        }
    }
}

/// When an executable runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStage {
    /// Right after its pack is installed.
    PostInstall,
    /// When the application is uninstalled.
    Uninstall,
    /// Never; the file is only marked executable.
    #[default]
    Never,
}

impl FromStr for ExecutionStage {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postinstall" => Ok(Self::PostInstall),
            "uninstall" => Ok(Self::Uninstall),
            "never" | "" => Ok(Self::Never),
            other => Err(other.to_owned()),
        }
    }
}

/// How a failing executable affects the installation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the installation.
    #[default]
    Abort,
    /// Log a warning and continue.
    Warn,
    /// Continue silently.
    Ignore,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "warn" => Ok(Self::Warn),
            "ignore" => Ok(Self::Ignore),
            other => Err(other.to_owned()),
        }
    }
}

/// A file installed by a pack.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackFile {
    /// Path relative to the compiler's base directory.
    pub source: String,
    /// Target path, usually starting with `$INSTALL_PATH`.
    pub target: String,
    /// Platforms the file is installed on.
    pub os: Vec<OsConstraint>,
    /// Condition guarding the file.
    pub condition: Option<String>,
    /// Policy for pre-existing targets.
    pub override_policy: OverridePolicy,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Hex-encoded SHA-256 of the content.
    pub sha256: String,
    /// Offset of the content within its pack's uncompressed data.
    pub position: u64,
    /// Whether the installed file gets execute permission.
    pub executable: bool,
}

/// A file whose variable references are substituted after installation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParsableFile {
    /// Installed path.
    pub target: String,
    /// Reference syntax used in the file.
    pub kind: SubstitutionType,
    /// Platforms the substitution applies on.
    pub os: Vec<OsConstraint>,
    /// Condition guarding the substitution.
    pub condition: Option<String>,
}

/// An installed file to execute.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutableFile {
    /// Installed path.
    pub target: String,
    /// When it runs.
    pub stage: ExecutionStage,
    /// Arguments, substituted before running.
    pub arguments: Vec<String>,
    /// Reaction to a non-zero exit.
    pub failure: FailurePolicy,
    /// Keep the file after running instead of deleting it.
    pub keep: bool,
    /// Condition guarding execution.
    pub condition: Option<String>,
    /// Platforms it runs on.
    pub os: Vec<OsConstraint>,
}

/// An installable unit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Pack {
    /// Display name, unique within the installation.
    pub name: String,
    /// Stable id used by conditions and automation.
    pub id: Option<String>,
    /// Free text shown to the user.
    pub description: String,
    /// Condition guarding the pack.
    pub condition: Option<String>,
    /// Cannot be deselected.
    pub required: bool,
    /// Selected by default.
    pub preselected: bool,
    /// Files ship next to the installer instead of inside it.
    pub loose: bool,
    /// Files are removed by the uninstaller.
    pub uninstall: bool,
    /// Not shown in pack selection.
    pub hidden: bool,
    /// Names of packs this one needs.
    pub depends: Vec<String>,
    /// Platforms the pack exists on.
    pub os: Vec<OsConstraint>,
    /// Total uncompressed size of the files.
    pub size: u64,
    /// Parent pack name, for tree display.
    pub parent: Option<String>,
    /// Packs sharing an exclude group are mutually exclusive.
    pub exclude_group: Option<String>,
    /// Install groups the pack belongs to.
    pub install_groups: Vec<String>,
    /// Installed files.
    pub files: Vec<PackFile>,
    /// Files substituted after installation.
    pub parsables: Vec<ParsableFile>,
    /// Files executed during installation or uninstallation.
    pub executables: Vec<ExecutableFile>,
}

impl Pack {
    /// The id when set, otherwise the name.
    #[must_use]
    pub fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

/// Kind of a user-input field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free text.
    #[default]
    Text,
    /// Hidden text.
    Password,
    /// One of a list of choices.
    Combo,
    /// A boolean.
    Check,
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "password" => Ok(Self::Password),
            "combo" | "radio" => Ok(Self::Combo),
            "check" => Ok(Self::Check),
            other => Err(other.to_owned()),
        }
    }
}

/// A field on a user-input panel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserInputField {
    /// Variable receiving the value.
    pub variable: String,
    /// Field kind.
    pub kind: FieldKind,
    /// Prompt text.
    pub label: String,
    /// Initial value, substituted before display.
    pub default_value: Option<String>,
    /// Allowed values for combo fields.
    pub choices: Vec<String>,
}

/// One panel of the installer's flow.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Panel {
    /// Panel class, e.g. `TargetPanel`.
    pub class_name: String,
    /// Explicit id; see [`Panel::panel_id`].
    pub id: Option<String>,
    /// Condition guarding the panel.
    pub condition: Option<String>,
    /// Platforms the panel is shown on.
    pub os: Vec<OsConstraint>,
    /// Validator class name, kept for automation data.
    pub validator: Option<String>,
    /// Free-form configuration.
    pub configuration: BTreeMap<String, String>,
    /// Help text.
    pub help: Option<String>,
    /// Fields of a user-input panel.
    pub fields: Vec<UserInputField>,
}

impl Panel {
    /// Panel for `class_name` with no further settings.
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    /// The explicit id, or `UNKNOWN (<class>)`.
    #[must_use]
    pub fn panel_id(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("UNKNOWN ({})", self.class_name))
    }
}

/// Everything the installer needs apart from file data.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallationModel {
    /// Application metadata.
    pub info: Info,
    /// Static variables.
    pub variables: BTreeMap<String, String>,
    /// Dynamic variables refreshed before each panel.
    pub dynamic_variables: Vec<DynamicVariable>,
    /// Packs in installation order.
    pub packs: Vec<Pack>,
    /// Panels in display order.
    pub panels: Vec<Panel>,
    /// ISO3 codes of the available languages, preferred first.
    pub locales: Vec<String>,
    /// Whether a licence resource is bundled.
    pub has_licence: bool,
    /// Default install path; may contain variables.
    pub default_install_path: Option<String>,
    /// Whether pack data lives in external volumes.
    pub multi_volume: bool,
}

impl InstallationModel {
    /// Finds a pack by id or name.
    #[must_use]
    pub fn pack(&self, key: &str) -> Option<&Pack> {
        self.packs
            .iter()
            .find(|pack| pack.id.as_deref() == Some(key) || pack.name == key)
    }
}

/// Pack data layout stored in `resources/packs.info`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PacksInfo {
    /// One entry per pack, in model order.
    pub packs: Vec<PackData>,
}

/// Where one pack's data lives.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackData {
    /// Pack name.
    pub name: String,
    /// Compression of the single-file pack entry.
    pub compression: Compression,
    /// Offset of the pack's first file in the spanning stream.
    pub stream_offset: u64,
    /// Total bytes of the pack in the stream.
    pub stream_len: u64,
}

/// Compression applied to pack data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Stored uncompressed.
    None,
    /// Deflate inside the zip entry.
    #[default]
    Deflate,
    /// Gzip stream.
    Gzip,
    /// Zstandard stream.
    Zstd,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Deflate => "deflate",
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
        })
    }
}
