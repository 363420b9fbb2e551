//! Conversion of raw CSV text into typed property payloads.
//!
//! [`coerce`] is pure: the same text and property type always give the same
//! result. `None` means "omit this property from the record", which is not the
//! same thing as an empty value.

use std::{collections::BTreeMap, fmt};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{mapping::ColumnMapping, schema::PropertyType};

/// Property name to payload, in name order.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    pub text: TextContent,
}

impl RichText {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            text: TextContent {
                content: content.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateValue {
    pub start: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
}

/// One payload shape per supported property type, serialized as
/// `{"<type>": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    Number(f64),
    Select(SelectOption),
    MultiSelect(Vec<SelectOption>),
    Status(SelectOption),
    Date(DateValue),
    Checkbox(bool),
    Url(String),
    Email(String),
    PhoneNumber(String),
    People(Vec<UserRef>),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyType {
        match self {
            PropertyValue::Title(_) => PropertyType::Title,
            PropertyValue::RichText(_) => PropertyType::RichText,
            PropertyValue::Number(_) => PropertyType::Number,
            PropertyValue::Select(_) => PropertyType::Select,
            PropertyValue::MultiSelect(_) => PropertyType::MultiSelect,
            PropertyValue::Status(_) => PropertyType::Status,
            PropertyValue::Date(_) => PropertyType::Date,
            PropertyValue::Checkbox(_) => PropertyType::Checkbox,
            PropertyValue::Url(_) => PropertyType::Url,
            PropertyValue::Email(_) => PropertyType::Email,
            PropertyValue::PhoneNumber(_) => PropertyType::PhoneNumber,
            PropertyValue::People(_) => PropertyType::People,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            PropertyValue::Title(spans) | PropertyValue::RichText(spans) => {
                spans.iter().map(|span| span.text.content.as_str()).join("")
            }
            PropertyValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    (*n as i64).to_string()
                } else {
                    n.to_string()
                }
            }
            PropertyValue::Select(option) | PropertyValue::Status(option) => option.name.clone(),
            PropertyValue::MultiSelect(options) => {
                options.iter().map(|option| option.name.as_str()).join("; ")
            }
            PropertyValue::Date(date) => date.start.clone(),
            PropertyValue::Checkbox(b) => b.to_string(),
            PropertyValue::Url(s) | PropertyValue::Email(s) | PropertyValue::PhoneNumber(s) => {
                s.clone()
            }
            PropertyValue::People(users) => users.iter().map(|user| user.id.as_str()).join("; "),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn coerce(raw: &str, property_type: &PropertyType) -> Option<PropertyValue> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    let coerced = match property_type {
        PropertyType::Title => PropertyValue::Title(vec![RichText::plain(value)]),
        PropertyType::RichText => PropertyValue::RichText(vec![RichText::plain(value)]),
        PropertyType::Number => {
            // JSON cannot carry NaN or infinities.
            let parsed: f64 = value.parse().ok().filter(|n: &f64| n.is_finite())?;
            PropertyValue::Number(parsed)
        }
        PropertyType::Select => PropertyValue::Select(SelectOption {
            name: value.to_string(),
        }),
        PropertyType::Status => PropertyValue::Status(SelectOption {
            name: value.to_string(),
        }),
        PropertyType::MultiSelect => {
            let options = split_list(value)
                .map(|name| SelectOption {
                    name: name.to_string(),
                })
                .collect::<Vec<_>>();
            if options.is_empty() {
                return None;
            }
            PropertyValue::MultiSelect(options)
        }
        PropertyType::Date => PropertyValue::Date(DateValue {
            start: value.to_string(),
        }),
        PropertyType::Checkbox => PropertyValue::Checkbox(matches!(
            value.to_ascii_lowercase().as_str(),
            "true" | "yes" | "1"
        )),
        PropertyType::Url => PropertyValue::Url(value.to_string()),
        PropertyType::Email => PropertyValue::Email(value.to_string()),
        PropertyType::PhoneNumber => PropertyValue::PhoneNumber(value.to_string()),
        PropertyType::People => {
            let users = split_list(value)
                .map(|id| UserRef { id: id.to_string() })
                .collect::<Vec<_>>();
            if users.is_empty() {
                return None;
            }
            PropertyValue::People(users)
        }
        PropertyType::Unsupported(_) => return None,
    };
    Some(coerced)
}

/// Coerces every mapped cell of `row`; cells past the end of the row count as empty.
pub fn coerce_row(row: &[String], mappings: &[ColumnMapping]) -> PropertyMap {
    mappings
        .iter()
        .filter_map(|mapping| {
            let raw = row.get(mapping.column_index).map(String::as_str).unwrap_or("");
            coerce(raw, &mapping.property_type).map(|value| (mapping.property.clone(), value))
        })
        .collect()
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn all_types() -> Vec<PropertyType> {
        vec![
            PropertyType::Title,
            PropertyType::RichText,
            PropertyType::Number,
            PropertyType::Select,
            PropertyType::MultiSelect,
            PropertyType::Status,
            PropertyType::Date,
            PropertyType::Checkbox,
            PropertyType::Url,
            PropertyType::Email,
            PropertyType::PhoneNumber,
            PropertyType::People,
            PropertyType::Unsupported("formula".into()),
        ]
    }

    #[test]
    fn blank_input_is_omitted_for_every_type() {
        for ty in all_types() {
            assert_eq!(coerce("", &ty), None, "{ty}");
            assert_eq!(coerce("   \t", &ty), None, "{ty}");
        }
    }

    #[test]
    fn text_types_wrap_trimmed_content() {
        assert_eq!(
            coerce("  Write report ", &PropertyType::Title),
            Some(PropertyValue::Title(vec![RichText::plain("Write report")]))
        );
        assert_eq!(
            coerce("notes", &PropertyType::RichText),
            Some(PropertyValue::RichText(vec![RichText::plain("notes")]))
        );
    }

    #[test]
    fn numbers_parse_or_are_omitted() {
        assert_eq!(
            coerce(" 42.5 ", &PropertyType::Number),
            Some(PropertyValue::Number(42.5))
        );
        assert_eq!(
            coerce("-3", &PropertyType::Number),
            Some(PropertyValue::Number(-3.0))
        );
        assert_eq!(coerce("12 apples", &PropertyType::Number), None);
        assert_eq!(coerce("NaN", &PropertyType::Number), None);
    }

    #[test]
    fn multi_select_drops_blank_segments() {
        assert_eq!(
            coerce("a; ;b;;", &PropertyType::MultiSelect),
            Some(PropertyValue::MultiSelect(vec![
                SelectOption { name: "a".into() },
                SelectOption { name: "b".into() },
            ]))
        );
        assert_eq!(coerce(";; ;", &PropertyType::MultiSelect), None);
    }

    #[test]
    fn checkbox_accepts_truthy_tokens_only() {
        let ty = PropertyType::Checkbox;
        assert_eq!(coerce("true", &ty), Some(PropertyValue::Checkbox(true)));
        assert_eq!(coerce("TRUE", &ty), Some(PropertyValue::Checkbox(true)));
        assert_eq!(coerce("Yes", &ty), Some(PropertyValue::Checkbox(true)));
        assert_eq!(coerce("1", &ty), Some(PropertyValue::Checkbox(true)));
        assert_eq!(coerce("no", &ty), Some(PropertyValue::Checkbox(false)));
        assert_eq!(coerce("maybe", &ty), Some(PropertyValue::Checkbox(false)));
    }

    #[test]
    fn dates_and_contact_fields_pass_through() {
        assert_eq!(
            coerce("next tuesday", &PropertyType::Date),
            Some(PropertyValue::Date(DateValue {
                start: "next tuesday".into()
            }))
        );
        assert_eq!(
            coerce(" https://example.com ", &PropertyType::Url),
            Some(PropertyValue::Url("https://example.com".into()))
        );
        assert_eq!(
            coerce("+1 555 0100", &PropertyType::PhoneNumber),
            Some(PropertyValue::PhoneNumber("+1 555 0100".into()))
        );
    }

    #[test]
    fn unsupported_types_are_dropped() {
        assert_eq!(
            coerce("anything", &PropertyType::Unsupported("relation".into())),
            None
        );
    }

    #[test]
    fn values_serialize_in_wire_shape() {
        let title = coerce("Launch", &PropertyType::Title).unwrap();
        assert_eq!(
            serde_json::to_value(&title).unwrap(),
            serde_json::json!({"title": [{"text": {"content": "Launch"}}]})
        );
        let select = coerce("High", &PropertyType::Select).unwrap();
        assert_eq!(
            serde_json::to_value(&select).unwrap(),
            serde_json::json!({"select": {"name": "High"}})
        );
        let date = coerce("2024-05-06", &PropertyType::Date).unwrap();
        assert_eq!(
            serde_json::to_value(&date).unwrap(),
            serde_json::json!({"date": {"start": "2024-05-06"}})
        );
    }

    #[test]
    fn coerce_row_skips_omitted_and_missing_cells() {
        let mappings = vec![
            ColumnMapping {
                column_index: 0,
                header: "Name".into(),
                property: "Name".into(),
                property_type: PropertyType::Title,
            },
            ColumnMapping {
                column_index: 1,
                header: "Points".into(),
                property: "Points".into(),
                property_type: PropertyType::Number,
            },
            ColumnMapping {
                column_index: 5,
                header: "Done".into(),
                property: "Done".into(),
                property_type: PropertyType::Checkbox,
            },
        ];
        let row = vec!["Ship it".to_string(), "n/a".to_string()];
        let props = coerce_row(&row, &mappings);
        assert_eq!(props.len(), 1);
        assert_eq!(props["Name"].as_display(), "Ship it");
    }

    proptest! {
        #[test]
        fn multi_select_never_yields_blank_options(raw in "[a-c ;]{0,16}") {
            match coerce(&raw, &PropertyType::MultiSelect) {
                Some(PropertyValue::MultiSelect(options)) => {
                    prop_assert!(!options.is_empty());
                    for option in options {
                        prop_assert!(!option.name.trim().is_empty());
                        prop_assert_eq!(option.name.trim(), option.name.as_str());
                    }
                }
                Some(other) => prop_assert!(false, "unexpected payload {:?}", other),
                None => prop_assert!(raw.split(';').all(|s| s.trim().is_empty())),
            }
        }

        #[test]
        fn checkbox_is_never_omitted_for_non_blank_input(raw in "[A-Za-z0-9]{1,8}") {
            prop_assert!(matches!(
                coerce(&raw, &PropertyType::Checkbox),
                Some(PropertyValue::Checkbox(_))
            ));
        }
    }
}
