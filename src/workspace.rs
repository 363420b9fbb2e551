//! Collaborator interfaces the engine calls out to, and a file-backed store
//! that implements them.
//!
//! The engine never talks to a transport directly. Everything it needs from
//! the outside world goes through [`SchemaSource`], [`RecordCreator`],
//! [`RecordQuery`] and [`AliasResolver`]. [`LocalWorkspace`] keeps databases
//! and their records in a single JSON document, which is what the binary
//! operates on.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::{
    coerce::{PropertyMap, PropertyValue},
    filter::FilterExpression,
    paginate::{MAX_PAGE_SIZE, Page},
    schema::Schema,
};

pub trait SchemaSource {
    fn get_schema(&self, database_id: &str) -> Result<Schema>;
}

pub trait RecordCreator {
    /// Creates one record and returns its id.
    fn create_record(&mut self, database_id: &str, properties: &PropertyMap) -> Result<String>;
}

pub trait RecordQuery {
    fn query_page(
        &self,
        database_id: &str,
        filter: Option<&FilterExpression>,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<Page<Record>>;
}

/// Maps short user identifiers to user ids. Unknown tokens come back unchanged.
pub trait AliasResolver {
    fn resolve(&self, token: &str) -> String;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub properties: PropertyMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(flatten)]
    pub schema: Schema,
    #[serde(default)]
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceData {
    #[serde(default)]
    pub databases: Vec<Database>,
}

#[derive(Debug)]
pub struct LocalWorkspace {
    path: Option<PathBuf>,
    data: WorkspaceData,
}

impl LocalWorkspace {
    pub fn open(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Opening workspace file {path:?}"))?;
        let data = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing workspace file {path:?}"))?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            data,
        })
    }

    /// A workspace that is never written to disk.
    pub fn in_memory(data: WorkspaceData) -> Self {
        Self { path: None, data }
    }

    pub fn data(&self) -> &WorkspaceData {
        &self.data
    }

    /// Writes the document to a sibling temporary file and renames it over
    /// the workspace file, so readers see either the old or the new content.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut staged = NamedTempFile::new_in(dir)
            .with_context(|| format!("Creating temporary file in {dir:?}"))?;
        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &self.data)
                .context("Writing workspace JSON")?;
            writer.flush().context("Flushing workspace JSON")?;
        }
        staged
            .as_file()
            .sync_all()
            .context("Syncing workspace JSON")?;
        staged
            .persist(path)
            .with_context(|| format!("Replacing workspace file {path:?}"))?;
        Ok(())
    }

    fn database_index(&self, database_id: &str) -> Result<usize> {
        self.data
            .databases
            .iter()
            .position(|db| db.schema.id == database_id)
            .ok_or_else(|| anyhow!("database '{database_id}' not found"))
    }

    fn database(&self, database_id: &str) -> Result<&Database> {
        Ok(&self.data.databases[self.database_index(database_id)?])
    }
}

impl SchemaSource for LocalWorkspace {
    fn get_schema(&self, database_id: &str) -> Result<Schema> {
        Ok(self.database(database_id)?.schema.clone())
    }
}

impl RecordCreator for LocalWorkspace {
    /// Validates the payload against the schema, then persists immediately so
    /// earlier records survive a later failure in the same run. A record whose
    /// save fails is not kept in memory either.
    fn create_record(&mut self, database_id: &str, properties: &PropertyMap) -> Result<String> {
        let index = self.database_index(database_id)?;
        let database = &self.data.databases[index];
        if properties.is_empty() {
            bail!("a record needs at least one property");
        }
        for (name, value) in properties {
            let Some(descriptor) = database.schema.properties.get(name) else {
                bail!("property '{name}' does not exist");
            };
            if value.kind() != descriptor.kind {
                bail!(
                    "property '{name}' expects a {} value, got {}",
                    descriptor.kind,
                    value.kind()
                );
            }
            check_options(name, value, &descriptor.options)?;
        }

        let record = Record {
            id: Uuid::new_v4().to_string(),
            created_time: Utc::now(),
            properties: properties.clone(),
        };
        let id = record.id.clone();
        self.data.databases[index].records.push(record);
        if let Err(err) = self.save() {
            self.data.databases[index].records.pop();
            return Err(err);
        }
        debug!("Created record {id} in '{database_id}'");
        Ok(id)
    }
}

fn check_options(name: &str, value: &PropertyValue, allowed: &[String]) -> Result<()> {
    if allowed.is_empty() {
        return Ok(());
    }
    let chosen = match value {
        PropertyValue::Select(option) | PropertyValue::Status(option) => vec![option],
        PropertyValue::MultiSelect(options) => options.iter().collect(),
        _ => return Ok(()),
    };
    for option in chosen {
        if !allowed.iter().any(|a| a == &option.name) {
            bail!(
                "'{}' is not an option of property '{name}' (expected one of: {})",
                option.name,
                allowed.join(", ")
            );
        }
    }
    Ok(())
}

impl RecordQuery for LocalWorkspace {
    fn query_page(
        &self,
        database_id: &str,
        filter: Option<&FilterExpression>,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<Page<Record>> {
        let database = self.database(database_id)?;
        let offset = match cursor {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| anyhow!("invalid cursor '{raw}'"))?,
            None => 0,
        };
        let page_size = if page_size == 0 {
            MAX_PAGE_SIZE
        } else {
            page_size
        };
        let matching = database
            .records
            .iter()
            .filter(|record| filter.is_none_or(|f| f.matches(&record.properties)))
            .collect::<Vec<_>>();
        let end = offset.saturating_add(page_size).min(matching.len());
        let results = matching
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .map(|record| (*record).clone())
            .collect();
        let has_more = end < matching.len();
        Ok(Page {
            results,
            next_cursor: has_more.then(|| end.to_string()),
            has_more,
        })
    }
}
