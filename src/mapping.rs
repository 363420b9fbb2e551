//! CSV header to schema property mapping.

use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use crate::{
    error::{Error, Result},
    schema::{PropertyType, Schema},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    pub column_index: usize,
    pub header: String,
    pub property: String,
    pub property_type: PropertyType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMappingReport {
    pub mappings: Vec<ColumnMapping>,
    pub warnings: Vec<String>,
}

impl ColumnMappingReport {
    pub fn require_title(&self, schema: &Schema) -> Result<()> {
        require_title(&self.mappings, schema)
    }
}

/// Every record needs exactly one title value, so an import without a title
/// mapping is rejected before anything is created.
pub fn require_title(mappings: &[ColumnMapping], schema: &Schema) -> Result<()> {
    if mappings
        .iter()
        .any(|mapping| mapping.property_type == PropertyType::Title)
    {
        return Ok(());
    }
    let hint = match schema.title_property() {
        Some(title) => format!("map a CSV column to it with --map '<header>={title}'"),
        None => "the target database does not declare a title property".to_string(),
    };
    Err(Error::config_with_hint(
        "no CSV column maps to the database's title property",
        hint,
    ))
}

/// Maps headers onto schema properties. Explicit overrides win, then a strict
/// name match; anything else is skipped with a warning. A property already
/// filled by an earlier column keeps that column. Blank headers are skipped
/// without a warning.
pub fn map_columns(
    headers: &[String],
    schema: &Schema,
    overrides: &HashMap<String, String>,
) -> ColumnMappingReport {
    let mut report = ColumnMappingReport::default();
    for (column_index, raw_header) in headers.iter().enumerate() {
        let header = raw_header.trim();
        if header.is_empty() {
            continue;
        }

        let resolved = match overrides.get(header) {
            Some(target) => match schema.find_strict(target) {
                Some(found) => Some(found),
                None => {
                    report.warnings.push(format!(
                        "column '{header}' is mapped to '{target}', which is not a property of this database; skipping"
                    ));
                    continue;
                }
            },
            None => schema.find_strict(header),
        };

        let earlier = resolved.and_then(|(property, _)| {
            report
                .mappings
                .iter()
                .find(|mapping| mapping.property == property)
        });
        if let (Some((property, _)), Some(earlier)) = (resolved, earlier) {
            let warning = format!(
                "column '{header}' also maps to '{property}', already filled from column '{}'; skipping",
                earlier.header
            );
            report.warnings.push(warning);
            continue;
        }

        match resolved {
            Some((property, property_type)) => {
                debug!("Column {column_index} '{header}' -> '{property}' ({property_type})");
                report.mappings.push(ColumnMapping {
                    column_index,
                    header: header.to_string(),
                    property: property.to_string(),
                    property_type: property_type.clone(),
                });
            }
            None => report.warnings.push(format!(
                "column '{header}' does not match any property; skipping"
            )),
        }
    }
    report
}

/// Parses `Header=Property` pairs as given on the command line.
pub fn parse_overrides(pairs: &[String]) -> Result<HashMap<String, String>> {
    let mut overrides = HashMap::with_capacity(pairs.len());
    for pair in pairs {
        let Some((header, property)) = pair.split_once('=') else {
            return Err(Error::config_with_hint(
                format!("invalid column mapping '{pair}'"),
                "use the form --map 'CSV Header=Property Name'",
            ));
        };
        let (header, property) = (header.trim(), property.trim());
        if header.is_empty() || property.is_empty() {
            return Err(Error::config_with_hint(
                format!("invalid column mapping '{pair}'"),
                "both the CSV header and the property name must be non-empty",
            ));
        }
        overrides.insert(header.to_string(), property.to_string());
    }
    Ok(overrides)
}
