//! Query filter construction.
//!
//! Filters reach the store as a [`FilterExpression`] tree. Leaves compare one
//! property using a type-specific operator and serialize as
//! `{"property": "Status", "status": {"equals": "Done"}}`; compound nodes
//! serialize as `{"and": [...]}` or `{"or": [...]}`.
//!
//! Three sources feed a query's filter:
//!
//! - shorthand flags (`--status`, `--priority`, `--assignee`) via
//!   [`build_shorthand_filters`],
//! - `--where` clauses such as `Points >= 3` via [`parse_where`] and
//!   [`build_where_filter`],
//! - a raw `--filter-json` document via [`FilterExpression::from_json`].
//!
//! [`merge_filters`] ANDs them together without ever producing a one-child
//! AND node.

use std::{cmp::Reverse, fmt, sync::OnceLock};

use log::debug;
use regex::Regex;
use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeStruct},
};
use serde_json::{Value as JsonValue, json};

use crate::{
    coerce::{PropertyMap, PropertyValue},
    error::{Error, Result},
    schema::{PropertyType, Schema},
    workspace::AliasResolver,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    DoesNotEqual,
    Contains,
    DoesNotContain,
    StartsWith,
    EndsWith,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    Before,
    After,
    OnOrBefore,
    OnOrAfter,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::DoesNotEqual => "does_not_equal",
            Operator::Contains => "contains",
            Operator::DoesNotContain => "does_not_contain",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::GreaterThan => "greater_than",
            Operator::GreaterThanOrEqualTo => "greater_than_or_equal_to",
            Operator::LessThan => "less_than",
            Operator::LessThanOrEqualTo => "less_than_or_equal_to",
            Operator::Before => "before",
            Operator::After => "after",
            Operator::OnOrBefore => "on_or_before",
            Operator::OnOrAfter => "on_or_after",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        let op = match name {
            "equals" => Operator::Equals,
            "does_not_equal" => Operator::DoesNotEqual,
            "contains" => Operator::Contains,
            "does_not_contain" => Operator::DoesNotContain,
            "starts_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            "greater_than" => Operator::GreaterThan,
            "greater_than_or_equal_to" => Operator::GreaterThanOrEqualTo,
            "less_than" => Operator::LessThan,
            "less_than_or_equal_to" => Operator::LessThanOrEqualTo,
            "before" => Operator::Before,
            "after" => Operator::After,
            "on_or_before" => Operator::OnOrBefore,
            "on_or_after" => Operator::OnOrAfter,
            _ => return None,
        };
        Some(op)
    }

    fn allowed_for(self, kind: &PropertyType) -> bool {
        use Operator::*;
        match kind {
            PropertyType::Title
            | PropertyType::RichText
            | PropertyType::Url
            | PropertyType::Email
            | PropertyType::PhoneNumber => matches!(
                self,
                Equals | DoesNotEqual | Contains | DoesNotContain | StartsWith | EndsWith
            ),
            PropertyType::Number => matches!(
                self,
                Equals
                    | DoesNotEqual
                    | GreaterThan
                    | GreaterThanOrEqualTo
                    | LessThan
                    | LessThanOrEqualTo
            ),
            PropertyType::Checkbox | PropertyType::Select | PropertyType::Status => {
                matches!(self, Equals | DoesNotEqual)
            }
            PropertyType::MultiSelect | PropertyType::People => {
                matches!(self, Contains | DoesNotContain)
            }
            PropertyType::Date => {
                matches!(self, Equals | Before | After | OnOrBefore | OnOrAfter)
            }
            PropertyType::Unsupported(_) => false,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single typed comparison against one property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFilter {
    pub property: String,
    pub kind: PropertyType,
    pub operator: Operator,
    pub value: JsonValue,
}

impl PropertyFilter {
    pub fn new(
        property: impl Into<String>,
        kind: PropertyType,
        operator: Operator,
        value: JsonValue,
    ) -> Self {
        Self {
            property: property.into(),
            kind,
            operator,
            value,
        }
    }

    fn matches(&self, properties: &PropertyMap) -> bool {
        use Operator::*;
        let Some(actual) = properties.get(&self.property) else {
            return matches!(self.operator, DoesNotEqual | DoesNotContain);
        };
        match actual {
            PropertyValue::Number(n) => {
                let Some(wanted) = self.value.as_f64() else {
                    return false;
                };
                match self.operator {
                    Equals => *n == wanted,
                    DoesNotEqual => *n != wanted,
                    GreaterThan => *n > wanted,
                    GreaterThanOrEqualTo => *n >= wanted,
                    LessThan => *n < wanted,
                    LessThanOrEqualTo => *n <= wanted,
                    _ => false,
                }
            }
            PropertyValue::Checkbox(b) => match (self.operator, self.value.as_bool()) {
                (Equals, Some(wanted)) => *b == wanted,
                (DoesNotEqual, Some(wanted)) => *b != wanted,
                _ => false,
            },
            PropertyValue::MultiSelect(_) | PropertyValue::People(_) => {
                let members = match actual {
                    PropertyValue::MultiSelect(options) => {
                        options.iter().map(|o| o.name.as_str()).collect::<Vec<_>>()
                    }
                    PropertyValue::People(users) => {
                        users.iter().map(|u| u.id.as_str()).collect::<Vec<_>>()
                    }
                    _ => Vec::new(),
                };
                let wanted = self.value.as_str().unwrap_or_default();
                let present = members.iter().any(|member| member.eq_ignore_ascii_case(wanted));
                match self.operator {
                    Contains => present,
                    DoesNotContain => !present,
                    _ => false,
                }
            }
            PropertyValue::Date(date) => {
                let Some(wanted) = self.value.as_str() else {
                    return false;
                };
                // ISO-8601 strings order lexicographically.
                let start = date.start.as_str();
                match self.operator {
                    Equals => start == wanted,
                    Before => start < wanted,
                    After => start > wanted,
                    OnOrBefore => start <= wanted,
                    OnOrAfter => start >= wanted,
                    _ => false,
                }
            }
            other => {
                let text = other.as_display();
                let wanted = self.value.as_str().unwrap_or_default();
                match self.operator {
                    Equals => text == wanted,
                    DoesNotEqual => text != wanted,
                    Contains => text.contains(wanted),
                    DoesNotContain => !text.contains(wanted),
                    StartsWith => text.starts_with(wanted),
                    EndsWith => text.ends_with(wanted),
                    _ => false,
                }
            }
        }
    }
}

impl Serialize for PropertyFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("property", &self.property)?;
        map.serialize_entry(
            self.kind.as_str(),
            &json!({ (self.operator.as_str()): self.value }),
        )?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    Property(PropertyFilter),
    And(Vec<FilterExpression>),
    Or(Vec<FilterExpression>),
}

impl FilterExpression {
    pub fn matches(&self, properties: &PropertyMap) -> bool {
        match self {
            FilterExpression::Property(leaf) => leaf.matches(properties),
            FilterExpression::And(children) => children.iter().all(|c| c.matches(properties)),
            FilterExpression::Or(children) => children.iter().any(|c| c.matches(properties)),
        }
    }

    /// Parses a user-supplied filter document, checking property names and
    /// operators against the schema.
    pub fn from_json(value: &JsonValue, schema: &Schema) -> Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(filter_json_error("a filter must be a JSON object"));
        };
        for (key, compound) in [("and", true), ("or", false)] {
            if let Some(children) = object.get(key) {
                let Some(children) = children.as_array() else {
                    return Err(filter_json_error(format!("'{key}' must hold an array")));
                };
                let mut parsed = children
                    .iter()
                    .map(|child| Self::from_json(child, schema))
                    .collect::<Result<Vec<_>>>()?;
                // A lone child is sent as itself, never wrapped.
                return match parsed.len() {
                    0 => Err(filter_json_error(format!(
                        "'{key}' needs at least one condition"
                    ))),
                    1 => Ok(parsed.remove(0)),
                    _ if compound => Ok(FilterExpression::And(parsed)),
                    _ => Ok(FilterExpression::Or(parsed)),
                };
            }
        }

        let Some(name) = object.get("property").and_then(JsonValue::as_str) else {
            return Err(filter_json_error(
                "expected 'and', 'or' or a 'property' condition",
            ));
        };
        let Some((property, kind)) = schema.find_fuzzy(name) else {
            return Err(unknown_property(name, schema));
        };
        let condition = object
            .get(kind.as_str())
            .and_then(JsonValue::as_object)
            .filter(|condition| condition.len() == 1)
            .and_then(|condition| condition.iter().next())
            .ok_or_else(|| {
                filter_json_error(format!(
                    "property '{property}' needs a single '{kind}' condition"
                ))
            })?;
        let (op_name, operand) = condition;
        let operator = Operator::parse(op_name)
            .filter(|op| op.allowed_for(kind))
            .ok_or_else(|| unsupported_operator(op_name, property, kind))?;
        Ok(FilterExpression::Property(PropertyFilter::new(
            property,
            kind.clone(),
            operator,
            operand.clone(),
        )))
    }
}

impl Serialize for FilterExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FilterExpression::Property(leaf) => leaf.serialize(serializer),
            FilterExpression::And(children) => {
                let mut node = serializer.serialize_struct("And", 1)?;
                node.serialize_field("and", children)?;
                node.end()
            }
            FilterExpression::Or(children) => {
                let mut node = serializer.serialize_struct("Or", 1)?;
                node.serialize_field("or", children)?;
                node.end()
            }
        }
    }
}

/// ANDs `base` with `extras`. A single predicate is returned as-is and no
/// predicates means no filter.
pub fn merge_filters(
    base: Option<FilterExpression>,
    extras: Vec<FilterExpression>,
) -> Option<FilterExpression> {
    let mut all = Vec::with_capacity(extras.len() + 1);
    all.extend(base);
    all.extend(extras);
    match all.len() {
        0 => None,
        1 => all.pop(),
        _ => Some(FilterExpression::And(all)),
    }
}

/// Property names the shorthand flags refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShorthandProperties {
    pub status: String,
    pub priority: String,
    pub assignee: String,
}

impl Default for ShorthandProperties {
    fn default() -> Self {
        Self {
            status: "Status".to_string(),
            priority: "Priority".to_string(),
            assignee: "Assignee".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShorthandValues {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
}

pub fn build_shorthand_filters(
    schema: &Schema,
    properties: &ShorthandProperties,
    values: &ShorthandValues,
    aliases: &dyn AliasResolver,
) -> Result<Vec<FilterExpression>> {
    let mut filters = Vec::new();
    for (flag, configured, value) in [
        ("status", &properties.status, &values.status),
        ("priority", &properties.priority, &values.priority),
    ] {
        let Some(value) = value else { continue };
        let (property, kind) = resolve_shorthand(schema, flag, configured)?;
        if !matches!(kind, PropertyType::Status | PropertyType::Select) {
            return Err(wrong_type(flag, property, kind, "status or select"));
        }
        filters.push(FilterExpression::Property(PropertyFilter::new(
            property,
            kind.clone(),
            Operator::Equals,
            JsonValue::String(value.clone()),
        )));
    }

    if let Some(token) = &values.assignee {
        let (property, kind) = resolve_shorthand(schema, "assignee", &properties.assignee)?;
        if *kind != PropertyType::People {
            return Err(wrong_type("assignee", property, kind, "people"));
        }
        let resolved = aliases.resolve(token.trim());
        if !is_user_id(&resolved) {
            return Err(Error::config_with_hint(
                format!("assignee '{token}' is not a user id"),
                "pass a user UUID or an alias defined under 'aliases' in the config file",
            ));
        }
        debug!("Assignee '{token}' resolved to {resolved}");
        filters.push(FilterExpression::Property(PropertyFilter::new(
            property,
            PropertyType::People,
            Operator::Contains,
            JsonValue::String(resolved),
        )));
    }
    Ok(filters)
}

fn resolve_shorthand<'a>(
    schema: &'a Schema,
    flag: &str,
    configured: &str,
) -> Result<(&'a str, &'a PropertyType)> {
    schema.find_fuzzy(configured).ok_or_else(|| {
        Error::config_with_hint(
            format!(
                "--{flag} uses property '{configured}', which does not exist in '{}'",
                schema.display_name()
            ),
            format!("set shorthand.{flag} in the config file to the property's name"),
        )
    })
}

fn wrong_type(flag: &str, property: &str, kind: &PropertyType, expected: &str) -> Error {
    Error::config_with_hint(
        format!("--{flag} needs a {expected} property, but '{property}' is {kind}"),
        format!("point shorthand.{flag} in the config file at a {expected} property"),
    )
}

/// 32 hex digits, optionally hyphenated 8-4-4-4-12.
pub fn is_user_id(candidate: &str) -> bool {
    static USER_ID: OnceLock<Regex> = OnceLock::new();
    USER_ID
        .get_or_init(|| {
            Regex::new(
                r"(?i)^(?:[0-9a-f]{32}|[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})$",
            )
            .expect("user id pattern is valid")
        })
        .is_match(candidate)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    pub property: String,
    pub comparison: Comparison,
    pub raw_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    StartsWith,
    EndsWith,
}

const WHERE_OPERATORS: [(&str, Comparison); 9] = [
    (" contains ", Comparison::Contains),
    (" starts_with ", Comparison::StartsWith),
    (" ends_with ", Comparison::EndsWith),
    ("!=", Comparison::NotEq),
    (">=", Comparison::Ge),
    ("<=", Comparison::Le),
    ("=", Comparison::Eq),
    (">", Comparison::Gt),
    ("<", Comparison::Lt),
];

/// Parses `Property <op> value`, where `<op>` is one of `=`, `!=`, `>`, `>=`,
/// `<`, `<=`, `contains`, `starts_with` or `ends_with`.
pub fn parse_where(expression: &str) -> Result<WhereClause> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Err(Error::config("empty --where expression"));
    }

    // Split on the operator that starts first; at equal offsets the longer
    // one wins, so `>=` beats `>`. Later operators belong to the value.
    let lowered = trimmed.to_ascii_lowercase();
    let earliest = WHERE_OPERATORS
        .iter()
        .filter_map(|(needle, comparison)| {
            lowered.find(needle).map(|idx| (idx, *needle, *comparison))
        })
        .min_by_key(|(idx, needle, _)| (*idx, Reverse(needle.len())));
    if let Some((idx, needle, comparison)) = earliest {
        let left = trimmed[..idx].trim();
        let right = trimmed[idx + needle.len()..].trim();
        return where_clause(trimmed, left, comparison, right);
    }

    Err(Error::config_with_hint(
        format!("failed to parse --where expression '{trimmed}'"),
        "use the form 'Property <op> value', e.g. 'Points >= 3'",
    ))
}

fn where_clause(
    expression: &str,
    property: &str,
    comparison: Comparison,
    raw_value: &str,
) -> Result<WhereClause> {
    if property.is_empty() {
        return Err(Error::config(format!(
            "--where expression '{expression}' does not name a property"
        )));
    }
    Ok(WhereClause {
        property: property.to_string(),
        comparison,
        raw_value: unquote(raw_value).to_string(),
    })
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Turns a parsed clause into a typed leaf for the property it names.
pub fn build_where_filter(schema: &Schema, clause: &WhereClause) -> Result<FilterExpression> {
    let Some((property, kind)) = schema.find_fuzzy(&clause.property) else {
        return Err(unknown_property(&clause.property, schema));
    };
    let operator = match (clause.comparison, kind) {
        (Comparison::Eq, _) => Operator::Equals,
        (Comparison::NotEq, _) => Operator::DoesNotEqual,
        (Comparison::Contains, _) => Operator::Contains,
        (Comparison::StartsWith, _) => Operator::StartsWith,
        (Comparison::EndsWith, _) => Operator::EndsWith,
        (Comparison::Gt, PropertyType::Date) => Operator::After,
        (Comparison::Ge, PropertyType::Date) => Operator::OnOrAfter,
        (Comparison::Lt, PropertyType::Date) => Operator::Before,
        (Comparison::Le, PropertyType::Date) => Operator::OnOrBefore,
        (Comparison::Gt, _) => Operator::GreaterThan,
        (Comparison::Ge, _) => Operator::GreaterThanOrEqualTo,
        (Comparison::Lt, _) => Operator::LessThan,
        (Comparison::Le, _) => Operator::LessThanOrEqualTo,
    };
    if !operator.allowed_for(kind) {
        return Err(unsupported_operator(operator.as_str(), property, kind));
    }

    let raw = clause.raw_value.as_str();
    let value = match kind {
        PropertyType::Number => {
            let parsed: f64 = raw.parse().map_err(|_| {
                Error::config(format!("'{raw}' is not a number (property '{property}')"))
            })?;
            json!(parsed)
        }
        PropertyType::Checkbox => match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => JsonValue::Bool(true),
            "false" | "no" | "0" => JsonValue::Bool(false),
            _ => {
                return Err(Error::config(format!(
                    "'{raw}' is not a boolean (property '{property}')"
                )));
            }
        },
        _ => JsonValue::String(raw.to_string()),
    };
    Ok(FilterExpression::Property(PropertyFilter::new(
        property,
        kind.clone(),
        operator,
        value,
    )))
}

fn unknown_property(name: &str, schema: &Schema) -> Error {
    Error::config_with_hint(
        format!(
            "property '{name}' does not exist in '{}'",
            schema.display_name()
        ),
        "run the schema command to list the available properties",
    )
}

fn unsupported_operator(operator: &str, property: &str, kind: &PropertyType) -> Error {
    Error::config(format!(
        "operator '{operator}' cannot be used with {kind} property '{property}'"
    ))
}

fn filter_json_error(message: impl fmt::Display) -> Error {
    Error::config_with_hint(
        format!("invalid --filter-json: {message}"),
        r#"example: {"property": "Status", "status": {"equals": "Done"}}"#,
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::coerce::coerce;

    const USER: &str = "6f1c2a3b-4d5e-4f60-8a7b-9c0d1e2f3a4b";

    struct Aliases(HashMap<String, String>);

    impl AliasResolver for Aliases {
        fn resolve(&self, token: &str) -> String {
            self.0.get(token).cloned().unwrap_or_else(|| token.to_string())
        }
    }

    fn aliases() -> Aliases {
        Aliases(HashMap::from([("me".to_string(), USER.to_string())]))
    }

    fn schema() -> Schema {
        Schema::new("tasks")
            .with_property("Name", PropertyType::Title)
            .with_property("Task Status", PropertyType::Status)
            .with_property("Priority", PropertyType::Select)
            .with_property("Owner", PropertyType::People)
            .with_property("Points", PropertyType::Number)
            .with_property("Due Date", PropertyType::Date)
            .with_property("Done", PropertyType::Checkbox)
    }

    fn shorthand() -> ShorthandProperties {
        ShorthandProperties {
            status: "task_status".into(),
            priority: "priority".into(),
            assignee: "owner".into(),
        }
    }

    fn leaf(name: &str) -> FilterExpression {
        FilterExpression::Property(PropertyFilter::new(
            name,
            PropertyType::Select,
            Operator::Equals,
            json!("x"),
        ))
    }

    #[test]
    fn merge_without_predicates_is_none() {
        assert_eq!(merge_filters(None, Vec::new()), None);
    }

    #[test]
    fn merge_single_predicate_is_unwrapped() {
        assert_eq!(merge_filters(None, vec![leaf("a")]), Some(leaf("a")));
        assert_eq!(merge_filters(Some(leaf("b")), Vec::new()), Some(leaf("b")));
    }

    #[test]
    fn merge_keeps_base_first() {
        let merged = merge_filters(Some(leaf("base")), vec![leaf("p1"), leaf("p2")]);
        assert_eq!(
            merged,
            Some(FilterExpression::And(vec![
                leaf("base"),
                leaf("p1"),
                leaf("p2")
            ]))
        );
    }

    #[test]
    fn shorthand_builds_typed_leaves() {
        let values = ShorthandValues {
            status: Some("In progress".into()),
            priority: Some("High".into()),
            assignee: Some("me".into()),
        };
        let filters = build_shorthand_filters(&schema(), &shorthand(), &values, &aliases()).unwrap();
        let rendered = serde_json::to_value(&filters).unwrap();
        assert_eq!(
            rendered,
            json!([
                {"property": "Task Status", "status": {"equals": "In progress"}},
                {"property": "Priority", "select": {"equals": "High"}},
                {"property": "Owner", "people": {"contains": USER}},
            ])
        );
    }

    #[test]
    fn shorthand_without_values_builds_nothing() {
        let filters = build_shorthand_filters(
            &Schema::new("empty"),
            &ShorthandProperties::default(),
            &ShorthandValues::default(),
            &aliases(),
        )
        .unwrap();
        assert!(filters.is_empty());
    }

    #[test]
    fn shorthand_reports_missing_property() {
        let values = ShorthandValues {
            status: Some("Done".into()),
            ..Default::default()
        };
        let err = build_shorthand_filters(
            &schema(),
            &ShorthandProperties::default(),
            &values,
            &aliases(),
        )
        .unwrap_err();
        assert!(err.is_user_error());
        assert!(err.to_string().contains("'Status'"));
    }

    #[test]
    fn shorthand_rejects_wrong_property_type() {
        let props = ShorthandProperties {
            priority: "Points".into(),
            ..shorthand()
        };
        let values = ShorthandValues {
            priority: Some("High".into()),
            ..Default::default()
        };
        let err = build_shorthand_filters(&schema(), &props, &values, &aliases()).unwrap_err();
        assert!(err.is_user_error());
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn assignee_must_resolve_to_a_user_id() {
        let values = ShorthandValues {
            assignee: Some("bob".into()),
            ..Default::default()
        };
        let err = build_shorthand_filters(&schema(), &shorthand(), &values, &aliases()).unwrap_err();
        assert!(err.is_user_error());
        assert!(err.hint().is_some());
    }

    #[test]
    fn user_id_shapes() {
        assert!(is_user_id(USER));
        assert!(is_user_id("6F1C2A3B4D5E4F608A7B9C0D1E2F3A4B"));
        assert!(!is_user_id("6f1c2a3b-4d5e-4f60-8a7b"));
        assert!(!is_user_id("6f1c2a3b4d5e4f608a7b9c0d1e2f3a4"));
        assert!(!is_user_id("zzzzzzzz-4d5e-4f60-8a7b-9c0d1e2f3a4b"));
    }

    #[test]
    fn parse_where_handles_symbolic_and_word_operators() {
        let clause = parse_where("Points >= 3").unwrap();
        assert_eq!(clause.property, "Points");
        assert_eq!(clause.comparison, Comparison::Ge);
        assert_eq!(clause.raw_value, "3");

        let clause = parse_where("Name CONTAINS 'launch plan'").unwrap();
        assert_eq!(clause.comparison, Comparison::Contains);
        assert_eq!(clause.raw_value, "launch plan");

        assert!(parse_where("   ").is_err());
        assert!(parse_where("Points").is_err());
        assert!(parse_where("= 3").is_err());
    }

    #[test]
    fn parse_where_splits_on_the_first_operator() {
        let clause = parse_where("Name = Fix contains bug").unwrap();
        assert_eq!(clause.property, "Name");
        assert_eq!(clause.comparison, Comparison::Eq);
        assert_eq!(clause.raw_value, "Fix contains bug");

        let clause = parse_where("Name = a>=b").unwrap();
        assert_eq!(clause.property, "Name");
        assert_eq!(clause.comparison, Comparison::Eq);
        assert_eq!(clause.raw_value, "a>=b");

        let clause = parse_where("Name contains x = y").unwrap();
        assert_eq!(clause.comparison, Comparison::Contains);
        assert_eq!(clause.raw_value, "x = y");

        let clause = parse_where("Points<=4").unwrap();
        assert_eq!(clause.comparison, Comparison::Le);
        assert_eq!(clause.raw_value, "4");

        let clause = parse_where("Name != a=b").unwrap();
        assert_eq!(clause.comparison, Comparison::NotEq);
        assert_eq!(clause.raw_value, "a=b");

        let filter = build_where_filter(&schema(), &parse_where("Name = Fix contains bug").unwrap())
            .unwrap();
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"property": "Name", "title": {"equals": "Fix contains bug"}})
        );
    }

    #[test]
    fn where_filters_use_type_specific_operators() {
        let due = build_where_filter(&schema(), &parse_where("due_date < 2024-06-01").unwrap())
            .unwrap();
        assert_eq!(
            serde_json::to_value(&due).unwrap(),
            json!({"property": "Due Date", "date": {"before": "2024-06-01"}})
        );

        let done = build_where_filter(&schema(), &parse_where("done = yes").unwrap()).unwrap();
        assert_eq!(
            serde_json::to_value(&done).unwrap(),
            json!({"property": "Done", "checkbox": {"equals": true}})
        );

        assert!(build_where_filter(&schema(), &parse_where("Points > lots").unwrap()).is_err());
        assert!(build_where_filter(&schema(), &parse_where("Priority > High").unwrap()).is_err());
        assert!(build_where_filter(&schema(), &parse_where("Nope = 1").unwrap()).is_err());
    }

    #[test]
    fn filter_json_single_child_groups_collapse_to_the_leaf() {
        let only = json!({"property": "Name", "title": {"contains": "x"}});
        for key in ["and", "or"] {
            let parsed =
                FilterExpression::from_json(&json!({ (key): [only.clone()] }), &schema()).unwrap();
            let merged = merge_filters(Some(parsed), Vec::new()).unwrap();
            assert_eq!(serde_json::to_value(&merged).unwrap(), only, "group '{key}'");
        }

        let err = FilterExpression::from_json(&json!({"or": []}), &schema()).unwrap_err();
        assert!(err.is_user_error());
        assert!(err.to_string().contains("'or' needs at least one condition"));
    }

    #[test]
    fn filter_json_round_trips_through_schema() {
        let raw = json!({"or": [
            {"property": "points", "number": {"greater_than": 2}},
            {"property": "Name", "title": {"contains": "ship"}}
        ]});
        let parsed = FilterExpression::from_json(&raw, &schema()).unwrap();
        let rendered = serde_json::to_value(&parsed).unwrap();
        assert_eq!(
            rendered,
            json!({"or": [
                {"property": "Points", "number": {"greater_than": 2}},
                {"property": "Name", "title": {"contains": "ship"}}
            ]})
        );

        let bad = json!({"property": "Points", "number": {"contains": 2}});
        assert!(FilterExpression::from_json(&json!({"and": []}), &schema()).is_err());
        assert!(FilterExpression::from_json(&bad, &schema()).is_err());
        assert!(FilterExpression::from_json(&json!([1]), &schema()).is_err());
    }

    #[test]
    fn expressions_evaluate_against_properties() {
        let mut props = PropertyMap::new();
        props.insert("Points".into(), coerce("5", &PropertyType::Number).unwrap());
        props.insert(
            "Owner".into(),
            coerce(USER, &PropertyType::People).unwrap(),
        );
        props.insert("Name".into(), coerce("Ship v2", &PropertyType::Title).unwrap());

        let filter = merge_filters(
            Some(build_where_filter(&schema(), &parse_where("Points >= 5").unwrap()).unwrap()),
            vec![
                build_where_filter(&schema(), &parse_where("Name starts_with Ship").unwrap())
                    .unwrap(),
                build_shorthand_filters(
                    &schema(),
                    &shorthand(),
                    &ShorthandValues {
                        assignee: Some("me".into()),
                        ..Default::default()
                    },
                    &aliases(),
                )
                .unwrap()
                .remove(0),
            ],
        )
        .unwrap();
        assert!(filter.matches(&props));

        let missing = build_where_filter(&schema(), &parse_where("Priority != Low").unwrap())
            .unwrap();
        assert!(missing.matches(&props));
        let absent = build_where_filter(&schema(), &parse_where("Priority = Low").unwrap())
            .unwrap();
        assert!(!absent.matches(&props));
    }
}
