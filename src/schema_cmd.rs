//! Property listing for a database.
//!
//! Renders each property's name and type, and whether imports can fill it.

use std::path::Path;

use anyhow::Result;
use log::info;

use crate::{
    cli::SchemaArgs,
    error::Error,
    output,
    workspace::{LocalWorkspace, SchemaSource},
};

pub fn execute(args: &SchemaArgs, workspace_path: &Path) -> Result<()> {
    let workspace = LocalWorkspace::open(workspace_path)?;
    let schema = workspace
        .get_schema(&args.database)
        .map_err(|err| Error::upstream(format!("fetching schema for '{}'", args.database), err))?;

    if let Some(text) = output::format_structured(&schema, args.format)? {
        print!("{text}");
        return Ok(());
    }
    if schema.properties.is_empty() {
        info!("Database '{}' does not define any properties", schema.display_name());
        return Ok(());
    }
    print!("{}", output::schema_table(&schema));
    info!(
        "Listed {} propert(ies) of '{}'",
        schema.properties.len(),
        schema.display_name()
    );
    Ok(())
}
