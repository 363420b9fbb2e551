//! Rendering of command results as tables, JSON or YAML.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    cli::OutputFormat,
    coerce::PropertyMap,
    import::{ImportOutcome, ImportPreview, ImportSummary},
    schema::Schema,
    table,
    workspace::Record,
};

/// Serializes `value` for the structured formats; `None` for tables.
pub fn format_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<Option<String>> {
    let rendered = match format {
        OutputFormat::Table => return Ok(None),
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(value).context("Serializing JSON output")?;
            text.push('\n');
            text
        }
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Serializing YAML output")?,
    };
    Ok(Some(rendered))
}

pub fn schema_table(schema: &Schema) -> String {
    let headers = ["#", "name", "type", "importable"]
        .map(String::from)
        .to_vec();
    let rows = schema
        .properties
        .iter()
        .enumerate()
        .map(|(idx, (name, descriptor))| {
            vec![
                (idx + 1).to_string(),
                name.clone(),
                descriptor.kind.to_string(),
                if descriptor.kind.is_supported() {
                    "yes".to_string()
                } else {
                    "no".to_string()
                },
            ]
        })
        .collect::<Vec<_>>();
    table::render_table(&headers, &rows)
}

/// One row per record: its id, then every schema property in name order.
pub fn records_table(schema: &Schema, records: &[Record]) -> String {
    let mut headers = vec!["id".to_string()];
    headers.extend(schema.properties.keys().cloned());
    let rows = records
        .iter()
        .map(|record| {
            let mut row = vec![record.id.clone()];
            row.extend(property_cells(schema.properties.keys(), &record.properties));
            row
        })
        .collect::<Vec<_>>();
    table::render_table(&headers, &rows)
}

pub fn import_outcome_text(outcome: &ImportOutcome) -> String {
    match outcome {
        ImportOutcome::DryRun(preview) => preview_text(preview),
        ImportOutcome::Completed(summary) => summary_text(summary),
    }
}

fn preview_text(preview: &ImportPreview) -> String {
    let mut text = String::new();
    let target = match &preview.database_title {
        Some(title) => format!("{title} ({})", preview.database_id),
        None => preview.database_id.clone(),
    };
    text.push_str(&format!("Dry run: nothing was created.\nTarget: {target}\n"));
    text.push_str(&format!(
        "Rows to import: {} in batches of {}\n\n",
        preview.total_rows, preview.batch_size
    ));

    let mapping_headers = ["column", "property", "type"].map(String::from).to_vec();
    let mapping_rows = preview
        .mappings
        .iter()
        .map(|mapping| {
            vec![
                mapping.header.clone(),
                mapping.property.clone(),
                mapping.property_type.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    text.push_str(&table::render_table(&mapping_headers, &mapping_rows));

    if !preview.sample.is_empty() {
        let properties = preview
            .mappings
            .iter()
            .map(|mapping| mapping.property.clone())
            .collect::<Vec<_>>();
        let rows = preview
            .sample
            .iter()
            .map(|values| property_cells(properties.iter(), values))
            .collect::<Vec<_>>();
        text.push_str(&format!("\nFirst {} row(s):\n", rows.len()));
        text.push_str(&table::render_table(&properties, &rows));
    }
    text
}

fn summary_text(summary: &ImportSummary) -> String {
    let mut text = format!(
        "Created {} record(s) in {} batch(es)",
        summary.created, summary.batches
    );
    if summary.skipped > 0 {
        text.push_str(&format!(
            "; skipped {} row(s) without values",
            summary.skipped
        ));
    }
    text.push('\n');
    text
}

fn property_cells<'a>(
    names: impl Iterator<Item = &'a String>,
    values: &PropertyMap,
) -> Vec<String> {
    names
        .map(|name| {
            values
                .get(name)
                .map(|value| value.as_display())
                .unwrap_or_default()
        })
        .collect()
}
