use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use crate::{
    cli::ImportArgs,
    config::Config,
    error::Error,
    import::{ImportOptions, ImportOutcome, run_import},
    io_utils, mapping, output,
    workspace::{LocalWorkspace, SchemaSource},
};

#[derive(Debug, Serialize)]
struct ImportReport<'a> {
    #[serde(flatten)]
    outcome: &'a ImportOutcome,
    warnings: &'a [String],
}

pub fn execute(args: &ImportArgs, config: &Config, workspace_path: &Path) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let overrides = mapping::parse_overrides(&args.map)?;

    let mut workspace = LocalWorkspace::open(workspace_path)?;
    let schema = workspace
        .get_schema(&args.database)
        .map_err(|err| Error::upstream(format!("fetching schema for '{}'", args.database), err))?;
    info!(
        "Importing {:?} into '{}' ({} propert(ies))",
        args.input,
        schema.display_name(),
        schema.properties.len()
    );

    let mut reader = io_utils::open_csv_reader_from_path(&args.input, delimiter)?;
    let table = io_utils::read_csv_table(&mut reader, encoding)
        .with_context(|| format!("Reading CSV input {:?}", args.input))?;

    let report = mapping::map_columns(&table.headers, &schema, &overrides);
    for warning in &report.warnings {
        warn!("{warning}");
    }
    info!(
        "Mapped {} of {} column(s)",
        report.mappings.len(),
        table.headers.len()
    );

    let options = ImportOptions {
        database_id: schema.id.clone(),
        batch_size: args.batch_size.or(config.batch_size).unwrap_or(0),
        skip_rows: args.skip_rows,
        dry_run: args.dry_run,
    };
    let outcome = run_import(
        &table.rows,
        &report.mappings,
        &schema,
        &options,
        &mut workspace,
    )?;
    if let ImportOutcome::Completed(summary) = &outcome {
        info!(
            "Created {} record(s) in '{}'",
            summary.created,
            schema.display_name()
        );
    }

    let structured = output::format_structured(
        &ImportReport {
            outcome: &outcome,
            warnings: &report.warnings,
        },
        args.format,
    )?;
    match structured {
        Some(text) => print!("{text}"),
        None => print!("{}", output::import_outcome_text(&outcome)),
    }
    Ok(())
}
