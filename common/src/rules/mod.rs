//! Condition engine deciding which packs, panels and files are active.
//!
//! Conditions are registered by id, reference each other, and evaluate
//! against a live [`crate::variables::Variables`] store. Evaluation is
//! lenient: unknown ids and reference cycles are logged and count as false.

mod condition;
mod engine;
mod error;
mod expression;
mod xml;

pub use condition::{
    ComparisonOperator, Condition, PACK_SELECTED_PREFIX, PlatformCheck, Subject,
};
pub use engine::{
    CONDITION_ELEMENT, PACK_CONDITION_ELEMENT, PANEL_CONDITION_ELEMENT, RulesEngine,
};
pub use error::{Result, RulesError};
pub use expression::{FULL_EXPRESSION_PREFIX, parse_expression};
pub use xml::{condition_from_xml, condition_to_xml, read_condition};
