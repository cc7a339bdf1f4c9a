//! Building blocks shared by the instill compiler and installer.
//!
//! The crate holds the pieces both sides agree on: the XML adaptor used to
//! read installation descriptions, the variable store and substitutor, the
//! condition engine, version and platform checks, multi-volume payload
//! streams, the serialised installation model, and localised messages.

pub mod i18n;
pub mod logging;
pub mod model;
pub mod platform;
pub mod rules;
pub mod spanning;
pub mod substitutor;
pub mod variables;
pub mod version;
pub mod xml;

pub use i18n::{LocaleSelection, Localiser, resolve_localiser};
pub use model::InstallationModel;
pub use platform::{OsConstraint, Platform};
pub use rules::{Condition, RulesEngine};
pub use substitutor::{SubstitutionType, VariableSubstitutor};
pub use variables::Variables;
pub use xml::XmlElement;
