//! Reading and writing `<condition>` elements.
//!
//! ```xml
//! <condition type="and" id="server.on.linux">
//!   <condition type="ref" refid="is.server"/>
//!   <condition type="ref" refid="instill.linuxinstall"/>
//! </condition>
//! ```

use super::condition::{ComparisonOperator, Condition, PlatformCheck, Subject};
use super::engine::CONDITION_ELEMENT;
use super::error::{Result, RulesError};
use crate::xml::{XmlElement, XmlError};

/// Reads a top-level `<condition>` element into its id and condition.
///
/// # Errors
///
/// Returns an error when the `id` or `type` attribute is missing, the type
/// is unknown, or the element lacks the children its type requires.
pub fn read_condition(element: &XmlElement) -> Result<(String, Condition)> {
    let id = element.require_attribute("id")?.to_owned();
    Ok((id, condition_from_xml(element)?))
}

/// Reads the body of a `<condition>` element, ignoring any `id`.
///
/// # Errors
///
/// See [`read_condition`].
pub fn condition_from_xml(element: &XmlElement) -> Result<Condition> {
    let kind = element.require_attribute("type")?;
    let condition = match kind.to_ascii_lowercase().as_str() {
        "and" => Condition::And(operands(element)?),
        "or" => Condition::Or(operands(element)?),
        "xor" => Condition::Xor(operands(element)?),
        "not" => {
            let mut nested = operands(element)?;
            if nested.len() != 1 {
                return Err(
                    element
                        .invalid_value("number of nested conditions", nested.len().to_string())
                        .into(),
                );
            }
            Condition::not(nested.remove(0))
        }
        "ref" => Condition::reference(element.require_attribute("refid")?),
        "variable" => Condition::variable(required(element, "name")?, optional(element, "value")),
        "exists" => Condition::Exists(subject(element, &["variable", "file", "dir"])?),
        "empty" => Condition::Empty(subject(element, &["variable", "string", "file", "dir"])?),
        "comparenumerics" => Condition::CompareNumerics {
            name: required(element, "name")?,
            value: required(element, "value")?,
            operator: operator(element)?,
        },
        "compareversions" => Condition::CompareVersions {
            left: required(element, "arg1")?,
            right: required(element, "arg2")?,
            operator: operator(element)?,
        },
        "packselection" => Condition::PackSelection(required(element, "name")?),
        "platform" => {
            let check = required(element, "check")?;
            Condition::Platform(
                check
                    .parse::<PlatformCheck>()
                    .map_err(|value| element.invalid_value("platform check", value))?,
            )
        }
        other => {
            return Err(RulesError::UnknownType {
                kind: other.to_owned(),
                system_id: element.system_id().to_owned(),
                line: element.line(),
            });
        }
    };
    Ok(condition)
}

fn operands(element: &XmlElement) -> Result<Vec<Condition>> {
    element
        .children_named(CONDITION_ELEMENT)
        .map(condition_from_xml)
        .collect()
}

fn required(element: &XmlElement, child: &str) -> Result<String> {
    element
        .require_child(child)
        .map(|found| found.content().unwrap_or_default().trim().to_owned())
        .map_err(RulesError::from)
}

fn optional(element: &XmlElement, child: &str) -> String {
    element.child_content(child).unwrap_or_default().to_owned()
}

fn operator(element: &XmlElement) -> Result<ComparisonOperator> {
    match element.child_content("operator") {
        None => Ok(ComparisonOperator::default()),
        Some(text) => text
            .parse()
            .map_err(|value: String| element.invalid_value("operator", value).into()),
    }
}

fn subject(element: &XmlElement, accepted: &[&str]) -> Result<Subject> {
    let found = element
        .children()
        .iter()
        .find(|child| accepted.contains(&child.name()))
        .ok_or_else(|| XmlError::MissingElement {
            element: element.name().to_owned(),
            child: accepted.join("|"),
            system_id: element.system_id().to_owned(),
            line: element.line(),
        })?;
    let value = found.content().unwrap_or_default().trim().to_owned();
    Ok(match found.name() {
        "variable" => Subject::Variable(value),
        "string" => Subject::Text(value),
        "file" => Subject::File(value),
        _ => Subject::Dir(value),
    })
}

/// Serialises `condition` as a `<condition>` element, with `id` when given.
#[must_use]
pub fn condition_to_xml(id: Option<&str>, condition: &Condition) -> XmlElement {
    let mut element = XmlElement::new(CONDITION_ELEMENT);
    if let Some(id) = id {
        element.set_attribute("id", id);
    }
    element.set_attribute("type", condition.type_name());
    match condition {
        Condition::And(operands) | Condition::Or(operands) | Condition::Xor(operands) => {
            for operand in operands {
                element.add_child(condition_to_xml(None, operand));
            }
        }
        Condition::Not(operand) => element.add_child(condition_to_xml(None, operand)),
        Condition::Ref(target) => element.set_attribute("refid", target),
        Condition::Variable { name, value } => {
            element.add_child(XmlElement::with_content("name", name));
            element.add_child(XmlElement::with_content("value", value));
        }
        Condition::Exists(subject) | Condition::Empty(subject) => {
            let (name, value) = match subject {
                Subject::Variable(value) => ("variable", value),
                Subject::Text(value) => ("string", value),
                Subject::File(value) => ("file", value),
                Subject::Dir(value) => ("dir", value),
            };
            element.add_child(XmlElement::with_content(name, value));
        }
        Condition::CompareNumerics {
            name,
            value,
            operator,
        } => {
            element.add_child(XmlElement::with_content("name", name));
            element.add_child(XmlElement::with_content("value", value));
            element.add_child(XmlElement::with_content("operator", operator.as_str()));
        }
        Condition::CompareVersions {
            left,
            right,
            operator,
        } => {
            element.add_child(XmlElement::with_content("arg1", left));
            element.add_child(XmlElement::with_content("arg2", right));
            element.add_child(XmlElement::with_content("operator", operator.as_str()));
        }
        Condition::PackSelection(pack) => {
            element.add_child(XmlElement::with_content("name", pack));
        }
        Condition::Platform(check) => {
            element.add_child(XmlElement::with_content("check", check.as_str()));
        }
    }
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;
    use rstest::rstest;

    fn read(source: &str) -> Result<Condition> {
        let element = parse_str(source, "conditions.xml").expect("well-formed");
        condition_from_xml(&element)
    }

    #[rstest]
    #[case(
        r#"<condition type="variable"><name>MODE</name><value>server</value></condition>"#,
        Condition::variable("MODE", "server")
    )]
    #[case(
        r#"<condition type="not"><condition type="ref" refid="a"/></condition>"#,
        Condition::not(Condition::reference("a"))
    )]
    #[case(
        r#"<condition type="exists"><file>$INSTALL_PATH/app.cfg</file></condition>"#,
        Condition::Exists(Subject::File("$INSTALL_PATH/app.cfg".into()))
    )]
    #[case(
        r#"<condition type="compareversions"><arg1>$V</arg1><arg2>2.0</arg2></condition>"#,
        Condition::CompareVersions {
            left: "$V".into(),
            right: "2.0".into(),
            operator: ComparisonOperator::Equal,
        }
    )]
    #[case(
        r#"<condition type="comparenumerics"><name>N</name><value>3</value><operator>geq</operator></condition>"#,
        Condition::CompareNumerics {
            name: "N".into(),
            value: "3".into(),
            operator: ComparisonOperator::GreaterEqual,
        }
    )]
    #[case(
        r#"<condition type="platform"><check>unix</check></condition>"#,
        Condition::Platform(PlatformCheck::Unix)
    )]
    #[case(r#"<condition type="AND"/>"#, Condition::And(vec![]))]
    fn reads_conditions(#[case] source: &str, #[case] expected: Condition) {
        assert_eq!(read(source).expect("valid condition"), expected);
    }

    #[test]
    fn rejects_unknown_types_with_location() {
        let err = read("<condition\n type=\"java\"/>").expect_err("java is not supported");
        assert!(matches!(
            err,
            RulesError::UnknownType { ref kind, line: 1, .. } if kind == "java"
        ));
    }

    #[rstest]
    #[case(r#"<condition type="not"/>"#)]
    #[case(r#"<condition type="not"><condition type="ref" refid="a"/><condition type="ref" refid="b"/></condition>"#)]
    #[case(r#"<condition type="ref"/>"#)]
    #[case(r#"<condition type="variable"><value>x</value></condition>"#)]
    #[case(r#"<condition type="exists"/>"#)]
    #[case(r#"<condition type="comparenumerics"><name>N</name><value>1</value><operator>around</operator></condition>"#)]
    #[case(r#"<condition id="no-type"/>"#)]
    fn rejects_malformed_conditions(#[case] source: &str) {
        assert!(matches!(read(source), Err(RulesError::Xml(_))));
    }

    #[test]
    fn written_conditions_read_back() {
        let condition = Condition::Or(vec![
            Condition::Empty(Subject::Dir("/srv".into())),
            Condition::Xor(vec![
                Condition::PackSelection("docs".into()),
                Condition::not(Condition::reference("x")),
            ]),
        ]);
        let element = condition_to_xml(Some("complex"), &condition);
        let (id, back) = read_condition(&element).expect("round trip");
        assert_eq!(id, "complex");
        assert_eq!(back, condition);
    }
}
