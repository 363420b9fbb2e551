//! Batched record creation from mapped CSV rows.
//!
//! An import run moves through `Validating -> (DryRunPreview | Importing) ->
//! (Completed | Failed)`:
//!
//! - **Validating** rejects runs without a title mapping before anything is
//!   created.
//! - **DryRunPreview** describes what would be imported and has no side
//!   effects.
//! - **Importing** walks the rows in order, batch by batch, creating at most
//!   one record per row. The first creation failure ends the run; records
//!   created before it are kept and nothing is retried. Resuming is manual:
//!   re-run with `--skip-rows` past the failing row.

use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    coerce::{PropertyMap, coerce_row},
    error::{Error, Result},
    mapping::{ColumnMapping, require_title},
    schema::Schema,
    workspace::RecordCreator,
};

pub const DEFAULT_BATCH_SIZE: usize = 10;
/// Rows shown by a dry run.
pub const PREVIEW_ROWS: usize = 3;
/// The header line precedes every data row in the file.
pub const HEADER_ROWS: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub database_id: String,
    /// Values of zero or less select [`DEFAULT_BATCH_SIZE`].
    pub batch_size: i64,
    /// Data rows after the header to leave out.
    pub skip_rows: usize,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportPreview {
    pub database_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_title: Option<String>,
    pub total_rows: usize,
    pub batch_size: usize,
    pub mappings: Vec<ColumnMapping>,
    /// Coerced values of the first few rows; unmapped cells are not shown.
    pub sample: Vec<PropertyMap>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    /// Rows with no importable values.
    pub skipped: usize,
    pub batches: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ImportOutcome {
    DryRun(ImportPreview),
    Completed(ImportSummary),
}

pub fn effective_batch_size(requested: i64) -> usize {
    if requested < 0 {
        warn!("Batch size {requested} is not positive; using {DEFAULT_BATCH_SIZE}");
    }
    match usize::try_from(requested) {
        Ok(size) if size > 0 => size,
        _ => DEFAULT_BATCH_SIZE,
    }
}

/// 1-based line of a data row in the source file.
pub fn source_row_number(skip_rows: usize, position: usize) -> usize {
    HEADER_ROWS + skip_rows + position
}

pub fn run_import<C>(
    rows: &[Vec<String>],
    mappings: &[ColumnMapping],
    schema: &Schema,
    options: &ImportOptions,
    creator: &mut C,
) -> Result<ImportOutcome>
where
    C: RecordCreator + ?Sized,
{
    require_title(mappings, schema)?;
    let batch_size = effective_batch_size(options.batch_size);
    let pending = rows.get(options.skip_rows..).unwrap_or_default();

    if options.dry_run {
        let sample = pending
            .iter()
            .take(PREVIEW_ROWS)
            .map(|row| coerce_row(row, mappings))
            .collect();
        return Ok(ImportOutcome::DryRun(ImportPreview {
            database_id: options.database_id.clone(),
            database_title: schema.title.clone(),
            total_rows: pending.len(),
            batch_size,
            mappings: mappings.to_vec(),
            sample,
        }));
    }

    let total_batches = pending.len().div_ceil(batch_size);
    let mut summary = ImportSummary::default();
    for (batch_index, batch) in pending.chunks(batch_size).enumerate() {
        info!(
            "Importing batch {}/{} ({} row(s)) into '{}'",
            batch_index + 1,
            total_batches,
            batch.len(),
            options.database_id
        );
        for (offset, row) in batch.iter().enumerate() {
            let position = batch_index * batch_size + offset + 1;
            let row_number = source_row_number(options.skip_rows, position);
            let properties = coerce_row(row, mappings);
            if properties.is_empty() {
                debug!("Row {row_number} has no importable values; skipping");
                summary.skipped += 1;
                continue;
            }
            let id = creator
                .create_record(&options.database_id, &properties)
                .map_err(|cause| Error::RecordCreation {
                    row: row_number,
                    cause,
                })?;
            debug!("Row {row_number} created as {id}");
            summary.created += 1;
        }
        summary.batches += 1;
    }
    Ok(ImportOutcome::Completed(summary))
}
