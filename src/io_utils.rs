//! CSV input: delimiter resolution, decoding, and reading whole files.
//!
//! - Delimiters default by extension (`.tsv` is tab, anything else comma)
//!   unless given explicitly.
//! - Input is decoded with `encoding_rs`, UTF-8 unless told otherwise, and a
//!   leading byte-order mark is dropped from the first header.
//! - `-` reads standard input.
//! - Rows may be shorter or longer than the header; missing cells read as
//!   empty downstream.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Header plus data rows of a CSV file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(open_csv_reader(reader, delimiter))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    // `Encoding::decode` sniffs and drops a leading byte-order mark.
    decode_record(reader.byte_headers()?, encoding)
}

/// Reads a whole CSV source into memory. Row numbers in errors are 1-based
/// file lines, counting the header as line 1.
pub fn read_csv_table<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<CsvTable>
where
    R: Read,
{
    let headers = reader_headers(reader, encoding)?;
    let mut rows = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 2))?;
        let decoded =
            decode_record(&record, encoding).with_context(|| format!("Decoding row {}", idx + 2))?;
        rows.push(decoded);
    }
    Ok(CsvTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use encoding_rs::WINDOWS_1252;

    use super::*;

    #[test]
    fn delimiter_defaults_follow_extension() {
        assert_eq!(resolve_input_delimiter(Path::new("a.tsv"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("a.TSV"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("a.csv"), None), b',');
        assert_eq!(resolve_input_delimiter(Path::new("a.tsv"), Some(b';')), b';');
    }

    #[test]
    fn read_csv_table_handles_bom_and_ragged_rows() {
        let data = "\u{feff}Name,Points\nAlpha,1\nBeta\nGamma,3,extra\n";
        let mut reader = open_csv_reader(data.as_bytes(), b',');
        let table = read_csv_table(&mut reader, UTF_8).unwrap();
        assert_eq!(table.headers, vec!["Name", "Points"]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[1], vec!["Beta"]);
        assert_eq!(table.rows[2].len(), 3);
    }

    #[test]
    fn read_csv_table_decodes_legacy_encodings() {
        let (encoded, _, _) = WINDOWS_1252.encode("Name\nCaf\u{e9}\n");
        let mut reader = open_csv_reader(encoded.as_ref(), b',');
        let table = read_csv_table(&mut reader, WINDOWS_1252).unwrap();
        assert_eq!(table.rows[0], vec!["Caf\u{e9}"]);
    }

    #[test]
    fn resolve_encoding_rejects_unknown_labels() {
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(resolve_encoding(Some(" latin1 ")).unwrap(), WINDOWS_1252);
        assert!(resolve_encoding(Some("klingon")).is_err());
    }
}
