use std::path::Path;

use anyhow::Result;
use log::{debug, info};
use serde_json::Value as JsonValue;

use crate::{
    cli::QueryArgs,
    config::Config,
    error::Error,
    filter::{
        FilterExpression, ShorthandValues, build_shorthand_filters, build_where_filter,
        merge_filters, parse_where,
    },
    output,
    paginate::{MAX_PAGE_SIZE, collect_all_pages},
    schema::Schema,
    workspace::{LocalWorkspace, RecordQuery, SchemaSource},
};

pub fn execute(args: &QueryArgs, config: &Config, workspace_path: &Path) -> Result<()> {
    let workspace = LocalWorkspace::open(workspace_path)?;
    let schema = workspace
        .get_schema(&args.database)
        .map_err(|err| Error::upstream(format!("fetching schema for '{}'", args.database), err))?;

    let filter = build_query_filter(args, &schema, config)?;
    if let Some(filter) = &filter {
        debug!("Query filter: {}", serde_json::to_string(filter)?);
    }

    let page_size = args.page_size.or(config.page_size).unwrap_or(MAX_PAGE_SIZE);
    let collected = collect_all_pages(args.cursor.clone(), page_size, args.limit, |cursor, size| {
        workspace.query_page(&schema.id, filter.as_ref(), cursor, size)
    })?;
    info!(
        "Fetched {} record(s) from '{}'",
        collected.results.len(),
        schema.display_name()
    );

    match output::format_structured(&collected, args.format)? {
        Some(text) => print!("{text}"),
        None => {
            print!("{}", output::records_table(&schema, &collected.results));
            if let Some(cursor) = &collected.next_cursor {
                info!("Stopped at --limit {}; continue with --cursor {cursor}", args.limit);
            }
        }
    }
    Ok(())
}

/// Combines `--filter-json`, shorthand flags and `--where` clauses, in that order.
pub fn build_query_filter(
    args: &QueryArgs,
    schema: &Schema,
    config: &Config,
) -> Result<Option<FilterExpression>, Error> {
    let base = match &args.filter_json {
        Some(raw) => {
            let value: JsonValue = serde_json::from_str(raw).map_err(|err| {
                Error::config_with_hint(
                    format!("--filter-json is not valid JSON: {err}"),
                    "quote the whole document for your shell",
                )
            })?;
            Some(FilterExpression::from_json(&value, schema)?)
        }
        None => None,
    };

    let values = ShorthandValues {
        status: args.status.clone(),
        priority: args.priority.clone(),
        assignee: args.assignee.clone(),
    };
    let mut extras =
        build_shorthand_filters(schema, &config.shorthand_properties(), &values, config)?;
    for condition in &args.conditions {
        extras.push(build_where_filter(schema, &parse_where(condition)?)?);
    }
    Ok(merge_filters(base, extras))
}
