use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Import and query typed records in a workspace", long_about = None)]
pub struct Cli {
    /// Workspace file holding databases and their records
    #[arg(short = 'w', long, global = true)]
    pub workspace: Option<PathBuf>,
    /// YAML config file (defaults to $WORKSPACE_CLI_CONFIG when set)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import CSV rows as records of a database
    Import(ImportArgs),
    /// List records of a database, optionally filtered
    Query(QueryArgs),
    /// Show the properties of a database
    Schema(SchemaArgs),
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Target database id
    #[arg(short = 'd', long = "database")]
    pub database: String,
    /// CSV file to import ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Explicit column mapping of the form `CSV Header=Property`
    #[arg(long = "map", action = clap::ArgAction::Append)]
    pub map: Vec<String>,
    /// Records per batch (values <= 0 use the default of 10)
    #[arg(long = "batch-size", allow_negative_numbers = true)]
    pub batch_size: Option<i64>,
    /// Data rows after the header to skip
    #[arg(long = "skip-rows", default_value_t = 0)]
    pub skip_rows: usize,
    /// Show what would be imported without creating records
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Output format for the import report
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Database id to query
    #[arg(short = 'd', long = "database")]
    pub database: String,
    /// Match records whose status property equals this value
    #[arg(long)]
    pub status: Option<String>,
    /// Match records whose priority property equals this value
    #[arg(long)]
    pub priority: Option<String>,
    /// Match records assigned to this user id or alias
    #[arg(long)]
    pub assignee: Option<String>,
    /// Property conditions such as `Points >= 3` or `Name contains launch`
    #[arg(long = "where", action = clap::ArgAction::Append)]
    pub conditions: Vec<String>,
    /// Filter document in the store's JSON filter format
    #[arg(long = "filter-json")]
    pub filter_json: Option<String>,
    /// Maximum number of records to return (0 means all)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
    /// Records requested per page (max 100)
    #[arg(long = "page-size")]
    pub page_size: Option<usize>,
    /// Continue from a cursor returned by a previous query
    #[arg(long)]
    pub cursor: Option<String>,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Database id to describe
    #[arg(short = 'd', long = "database")]
    pub database: String,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
