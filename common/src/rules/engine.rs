//! Registry of named conditions and the activation checks built on it.

use super::condition::{Condition, Evaluation, PACK_SELECTED_PREFIX, PlatformCheck, Subject};
use super::error::Result;
use super::expression::parse_expression;
use super::xml::{condition_to_xml, read_condition};
use crate::i18n::{Arguments, FluentValue, Localiser};
use crate::platform::Platform;
use crate::variables::Variables;
use crate::xml::XmlElement;
use log::{debug, error, warn};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

/// Element names understood by [`RulesEngine::analyze_xml`].
pub const CONDITION_ELEMENT: &str = "condition";
/// Links a panel id to the condition guarding it.
pub const PANEL_CONDITION_ELEMENT: &str = "panelcondition";
/// Links a pack id to the condition guarding it.
pub const PACK_CONDITION_ELEMENT: &str = "packcondition";

/// Named conditions plus the panel and pack guards that refer to them.
///
/// Built-in platform conditions such as `instill.linuxinstall` are present
/// from construction; [`RulesEngine::register_packs`] adds one
/// `instill.selected.<id>` condition per pack.
///
/// # Examples
///
/// ```
/// use instill_common::rules::{Condition, RulesEngine};
/// use instill_common::variables::Variables;
///
/// let mut rules = RulesEngine::new();
/// rules.add_condition("server", Condition::variable("MODE", "server"));
/// rules.add_condition("client", Condition::variable("MODE", "client"));
///
/// let mut variables = Variables::new();
/// variables.set("MODE", "server");
/// assert!(rules.is_true("server|client", &variables));
/// assert!(!rules.is_true("server+client", &variables));
/// assert!(rules.is_true("server\\client", &variables));
/// ```
#[derive(Clone, Debug)]
pub struct RulesEngine {
    conditions: BTreeMap<String, Condition>,
    builtin: BTreeSet<String>,
    panel_conditions: BTreeMap<String, String>,
    pack_conditions: BTreeMap<String, String>,
    optional_packs: BTreeSet<String>,
    platform: Platform,
}

impl RulesEngine {
    /// Creates an engine for the running platform.
    #[must_use]
    pub fn new() -> Self {
        Self::with_platform(Platform::current())
    }

    /// Creates an engine whose platform conditions test `platform`.
    #[must_use]
    pub fn with_platform(platform: Platform) -> Self {
        let mut engine = Self {
            conditions: BTreeMap::new(),
            builtin: BTreeSet::new(),
            panel_conditions: BTreeMap::new(),
            pack_conditions: BTreeMap::new(),
            optional_packs: BTreeSet::new(),
            platform,
        };
        for check in PlatformCheck::ALL {
            engine.add_builtin(check.condition_id(), Condition::Platform(check));
        }
        engine
    }

    /// Platform used by platform conditions.
    #[must_use]
    pub const fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Adds an `instill.selected.<id>` condition for each pack id.
    pub fn register_packs<'a>(&mut self, pack_ids: impl IntoIterator<Item = &'a str>) {
        for id in pack_ids {
            self.add_builtin(
                format!("{PACK_SELECTED_PREFIX}{id}"),
                Condition::PackSelection(id.to_owned()),
            );
        }
    }

    fn add_builtin(&mut self, id: String, condition: Condition) {
        self.builtin.insert(id.clone());
        self.conditions.insert(id, condition);
    }

    /// Registers `condition` under `id`.
    ///
    /// Returns `false`, logging at error level, when the id is taken; the
    /// existing condition is kept.
    pub fn add_condition(&mut self, id: impl Into<String>, condition: Condition) -> bool {
        let id = id.into();
        if self.conditions.contains_key(&id) {
            error!("condition {id} is already defined; ignoring the new definition");
            return false;
        }
        debug!("registered {} condition {id}", condition.type_name());
        self.conditions.insert(id, condition);
        true
    }

    /// The condition registered under exactly `id`.
    #[must_use]
    pub fn condition(&self, id: &str) -> Option<&Condition> {
        self.conditions.get(id)
    }

    /// Resolves `expression` as an id, then as a textual expression.
    ///
    /// Malformed expressions are logged and yield `None`.
    #[must_use]
    pub fn get_condition(&self, expression: &str) -> Option<Cow<'_, Condition>> {
        if let Some(condition) = self.conditions.get(expression) {
            return Some(Cow::Borrowed(condition));
        }
        match parse_expression(expression) {
            Ok(parsed) => parsed.map(Cow::Owned),
            Err(err) => {
                warn!("{err}");
                None
            }
        }
    }

    /// Evaluates the condition named or described by `expression`.
    ///
    /// Unresolvable ids and reference cycles are logged and count as false.
    #[must_use]
    pub fn is_true(&self, expression: &str, variables: &Variables) -> bool {
        Evaluation::new(self, variables).evaluate_reference(expression)
    }

    /// Evaluates an unregistered condition against this registry.
    #[must_use]
    pub fn is_condition_true(&self, condition: &Condition, variables: &Variables) -> bool {
        condition.evaluate(&mut Evaluation::new(self, variables))
    }

    /// Guards `panel_id` with the condition `condition_id`.
    pub fn set_panel_condition(
        &mut self,
        panel_id: impl Into<String>,
        condition_id: impl Into<String>,
    ) {
        self.panel_conditions
            .insert(panel_id.into(), condition_id.into());
    }

    /// Guards `pack_id` with `condition_id`; `optional` marks the pack as
    /// selectable even when the condition is false.
    pub fn set_pack_condition(
        &mut self,
        pack_id: impl Into<String>,
        condition_id: impl Into<String>,
        optional: bool,
    ) {
        let pack_id = pack_id.into();
        if optional {
            self.optional_packs.insert(pack_id.clone());
        } else {
            self.optional_packs.remove(&pack_id);
        }
        self.pack_conditions.insert(pack_id, condition_id.into());
    }

    /// Whether the panel may be shown; unguarded panels always may.
    #[must_use]
    pub fn can_show_panel(&self, panel_id: &str, variables: &Variables) -> bool {
        self.panel_conditions
            .get(panel_id)
            .is_none_or(|condition| self.is_true(condition, variables))
    }

    /// Whether the pack may be installed; packs without an id always may.
    #[must_use]
    pub fn can_install_pack(&self, pack_id: Option<&str>, variables: &Variables) -> bool {
        pack_id
            .and_then(|id| self.pack_conditions.get(id))
            .is_none_or(|condition| self.is_true(condition, variables))
    }

    /// Whether `pack_id` has an optional guard, which leaves the pack
    /// selectable even while its condition is false.
    #[must_use]
    pub fn can_install_pack_optional(&self, pack_id: &str) -> bool {
        self.optional_packs.contains(pack_id)
    }

    /// Every registered id, built-ins included, in sorted order.
    #[must_use]
    pub fn known_condition_ids(&self) -> Vec<&str> {
        self.conditions.keys().map(String::as_str).collect()
    }

    /// Reads `<condition>`, `<panelcondition>` and `<packcondition>` children
    /// of a `<conditions>` element.
    ///
    /// # Errors
    ///
    /// Fails on the first malformed element. Duplicate ids are logged and
    /// skipped rather than failing.
    pub fn analyze_xml(&mut self, conditions: &XmlElement) -> Result<()> {
        for child in conditions.children() {
            match child.name() {
                CONDITION_ELEMENT => {
                    let (id, condition) = read_condition(child)?;
                    self.add_condition(id, condition);
                }
                PANEL_CONDITION_ELEMENT => {
                    let panel = child.require_attribute("panelid")?.to_owned();
                    let condition = child.require_attribute("conditionid")?.to_owned();
                    self.set_panel_condition(panel, condition);
                }
                PACK_CONDITION_ELEMENT => {
                    let pack = child.require_attribute("packid")?.to_owned();
                    let condition = child.require_attribute("conditionid")?.to_owned();
                    let optional = child.bool_attribute("optional", false);
                    self.set_pack_condition(pack, condition, optional);
                }
                other => debug!("ignoring <{other}> inside <conditions>"),
            }
        }
        Ok(())
    }

    /// Serialises user conditions and guards into a `<conditions>` element
    /// that [`Self::analyze_xml`] reads back.
    #[must_use]
    pub fn write_xml(&self) -> XmlElement {
        let mut root = XmlElement::new("conditions");
        for (id, condition) in &self.conditions {
            if !self.builtin.contains(id) {
                root.add_child(condition_to_xml(Some(id), condition));
            }
        }
        for (panel, condition) in &self.panel_conditions {
            let mut element = XmlElement::new(PANEL_CONDITION_ELEMENT);
            element.set_attribute("panelid", panel);
            element.set_attribute("conditionid", condition);
            root.add_child(element);
        }
        for (pack, condition) in &self.pack_conditions {
            let mut element = XmlElement::new(PACK_CONDITION_ELEMENT);
            element.set_attribute("packid", pack);
            element.set_attribute("conditionid", condition);
            if self.optional_packs.contains(pack) {
                element.set_attribute("optional", "true");
            }
            root.add_child(element);
        }
        root
    }

    /// Ids referenced by conditions or guards that resolve to nothing.
    #[must_use]
    pub fn unresolved_references(&self) -> BTreeSet<String> {
        let guards = self
            .panel_conditions
            .values()
            .chain(self.pack_conditions.values())
            .map(|id| Condition::reference(id.as_str()));
        let conditions: Vec<Condition> = self.conditions.values().cloned().chain(guards).collect();
        self.missing_ids(&conditions)
    }

    /// Ids referenced by `expression`, directly or through registered
    /// conditions, that resolve to nothing.
    #[must_use]
    pub fn unresolved_in(&self, expression: &str) -> BTreeSet<String> {
        self.missing_ids(&[Condition::reference(expression)])
    }

    fn missing_ids(&self, conditions: &[Condition]) -> BTreeSet<String> {
        let mut missing = BTreeSet::new();
        let mut pending: Vec<Cow<'_, Condition>> = conditions.iter().map(Cow::Borrowed).collect();
        let mut seen = BTreeSet::new();
        while let Some(condition) = pending.pop() {
            for id in condition.references() {
                if !seen.insert(id.to_owned()) {
                    continue;
                }
                match self.get_condition(id) {
                    Some(found) => pending.push(found),
                    None => {
                        missing.insert(id.to_owned());
                    }
                }
            }
        }
        missing
    }

    /// Explains how `expression` evaluates, one line per node, indented by
    /// depth and marked `[x]` when true or `[ ]` when false.
    #[must_use]
    pub fn dependency_details(
        &self,
        expression: &str,
        variables: &Variables,
        localiser: &Localiser,
    ) -> String {
        let mut out = String::new();
        let mut explainer = Explainer {
            rules: self,
            variables,
            localiser,
            out: &mut out,
            active: Vec::new(),
        };
        explainer.reference(expression, 0);
        out
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}

struct Explainer<'a> {
    rules: &'a RulesEngine,
    variables: &'a Variables,
    localiser: &'a Localiser,
    out: &'a mut String,
    active: Vec<String>,
}

impl Explainer<'_> {
    fn line(&mut self, depth: usize, holds: bool, key: &str, args: &Arguments<'_>) {
        let mark = if holds { "[x]" } else { "[ ]" };
        let text = self.localiser.text(key, args);
        let _ = writeln!(self.out, "{:indent$}{mark} {text}", "", indent = depth * 2);
    }

    fn reference(&mut self, id: &str, depth: usize) {
        let args = arguments([("id", id.to_owned())]);
        let rules = self.rules;
        let Some(condition) = rules.get_condition(id) else {
            self.line(depth, false, "rules-details-undefined", &args);
            return;
        };
        if self.active.iter().any(|active| active == id) {
            self.line(depth, false, "rules-details-cycle", &args);
            return;
        }
        let holds = rules.is_true(id, self.variables);
        self.line(depth, holds, "rules-details-ref", &args);
        self.active.push(id.to_owned());
        self.condition(&condition, depth + 1);
        self.active.pop();
    }

    fn condition(&mut self, condition: &Condition, depth: usize) {
        if let Condition::Ref(id) = condition {
            self.reference(id, depth);
            return;
        }
        let holds = self.rules.is_condition_true(condition, self.variables);
        let (key, args) = describe(condition);
        self.line(depth, holds, key, &args);
        match condition {
            Condition::And(operands) | Condition::Or(operands) | Condition::Xor(operands) => {
                for operand in operands {
                    self.condition(operand, depth + 1);
                }
            }
            Condition::Not(operand) => self.condition(operand, depth + 1),
            _ => {}
        }
    }
}

fn arguments<const N: usize>(pairs: [(&'static str, String); N]) -> Arguments<'static> {
    pairs
        .into_iter()
        .map(|(name, value)| (Cow::Borrowed(name), FluentValue::from(value)))
        .collect()
}

fn subject_arguments(subject: &Subject) -> Arguments<'static> {
    let (kind, value) = match subject {
        Subject::Variable(name) => ("variable", name),
        Subject::Text(text) => ("string", text),
        Subject::File(path) => ("file", path),
        Subject::Dir(path) => ("dir", path),
    };
    arguments([("kind", kind.to_owned()), ("value", value.clone())])
}

fn describe(condition: &Condition) -> (&'static str, Arguments<'static>) {
    match condition {
        Condition::And(_) => ("rules-details-and", Arguments::new()),
        Condition::Or(_) => ("rules-details-or", Arguments::new()),
        Condition::Xor(_) => ("rules-details-xor", Arguments::new()),
        Condition::Not(_) => ("rules-details-not", Arguments::new()),
        Condition::Ref(id) => ("rules-details-ref", arguments([("id", id.clone())])),
        Condition::Variable { name, value } => (
            "rules-details-variable",
            arguments([("name", name.clone()), ("value", value.clone())]),
        ),
        Condition::Exists(subject) => ("rules-details-exists", subject_arguments(subject)),
        Condition::Empty(subject) => ("rules-details-empty", subject_arguments(subject)),
        Condition::CompareNumerics {
            name,
            value,
            operator,
        } => (
            "rules-details-compare-numerics",
            arguments([
                ("name", name.clone()),
                ("operator", operator.symbol().to_owned()),
                ("value", value.clone()),
            ]),
        ),
        Condition::CompareVersions {
            left,
            right,
            operator,
        } => (
            "rules-details-compare-versions",
            arguments([
                ("left", left.clone()),
                ("operator", operator.symbol().to_owned()),
                ("right", right.clone()),
            ]),
        ),
        Condition::PackSelection(pack) => {
            ("rules-details-pack-selected", arguments([("pack", pack.clone())]))
        }
        Condition::Platform(check) => (
            "rules-details-platform",
            arguments([("platform", check.as_str().to_owned())]),
        ),
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
