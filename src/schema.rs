//! Typed database schemas and property-name resolution.
//!
//! A [`Schema`] is an immutable snapshot of the properties a database accepts
//! for its records. It is fetched once per command and never cached.
//!
//! Two resolution policies live here and are deliberately kept apart:
//!
//! - [`Schema::find_strict`] is used when mapping CSV headers: an exact match
//!   wins, then a case-insensitive one.
//! - [`Schema::find_fuzzy`] is used for shorthand and where-clause filters:
//!   case-insensitive, ignoring spaces and underscores, so `Due Date`,
//!   `due_date` and `duedate` all name the same property.
//!
//! Neither policy treats a missing property as an error; callers decide.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyType {
    Title,
    RichText,
    Number,
    Select,
    MultiSelect,
    Status,
    Date,
    Checkbox,
    Url,
    Email,
    PhoneNumber,
    People,
    /// Any type the engine does not translate (formula, relation, files, ...).
    Unsupported(String),
}

impl PropertyType {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyType::Title => "title",
            PropertyType::RichText => "rich_text",
            PropertyType::Number => "number",
            PropertyType::Select => "select",
            PropertyType::MultiSelect => "multi_select",
            PropertyType::Status => "status",
            PropertyType::Date => "date",
            PropertyType::Checkbox => "checkbox",
            PropertyType::Url => "url",
            PropertyType::Email => "email",
            PropertyType::PhoneNumber => "phone_number",
            PropertyType::People => "people",
            PropertyType::Unsupported(other) => other.as_str(),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, PropertyType::Unsupported(_))
    }
}

impl FromStr for PropertyType {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed = match value.trim().to_ascii_lowercase().as_str() {
            "title" => PropertyType::Title,
            "rich_text" => PropertyType::RichText,
            "number" => PropertyType::Number,
            "select" => PropertyType::Select,
            "multi_select" => PropertyType::MultiSelect,
            "status" => PropertyType::Status,
            "date" => PropertyType::Date,
            "checkbox" => PropertyType::Checkbox,
            "url" => PropertyType::Url,
            "email" => PropertyType::Email,
            "phone_number" => PropertyType::PhoneNumber,
            "people" => PropertyType::People,
            other => PropertyType::Unsupported(other.to_string()),
        };
        Ok(parsed)
    }
}

impl From<String> for PropertyType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(parsed) => parsed,
            Err(never) => match never {},
        }
    }
}

impl From<PropertyType> for String {
    fn from(value: PropertyType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    #[serde(rename = "type")]
    pub kind: PropertyType,
    /// Allowed option names for select-like properties; empty means any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl PropertyDescriptor {
    pub fn new(kind: PropertyType) -> Self {
        Self {
            kind,
            options: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDescriptor>,
}

impl Schema {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, kind: PropertyType) -> Self {
        self.properties
            .insert(name.into(), PropertyDescriptor::new(kind));
        self
    }

    pub fn with_options(mut self, name: &str, options: &[&str]) -> Self {
        if let Some(descriptor) = self.properties.get_mut(name) {
            descriptor.options = options.iter().map(|o| o.to_string()).collect();
        }
        self
    }

    pub fn property_type(&self, name: &str) -> Option<&PropertyType> {
        self.properties.get(name).map(|descriptor| &descriptor.kind)
    }

    /// Exact match first, then case-insensitive; first in name order wins ties.
    pub fn find_strict(&self, candidate: &str) -> Option<(&str, &PropertyType)> {
        if let Some((name, descriptor)) = self.properties.get_key_value(candidate) {
            return Some((name.as_str(), &descriptor.kind));
        }
        let lowered = candidate.to_lowercase();
        self.properties
            .iter()
            .find(|(name, _)| name.to_lowercase() == lowered)
            .map(|(name, descriptor)| (name.as_str(), &descriptor.kind))
    }

    /// Case-insensitive match with spaces and underscores ignored on both sides.
    pub fn find_fuzzy(&self, candidate: &str) -> Option<(&str, &PropertyType)> {
        let wanted = fuzzy_key(candidate);
        self.properties
            .iter()
            .find(|(name, _)| fuzzy_key(name) == wanted)
            .map(|(name, descriptor)| (name.as_str(), &descriptor.kind))
    }

    /// Name of the title property, if the schema declares one.
    pub fn title_property(&self) -> Option<&str> {
        self.properties
            .iter()
            .find(|(_, descriptor)| descriptor.kind == PropertyType::Title)
            .map(|(name, _)| name.as_str())
    }

    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

fn fuzzy_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}
