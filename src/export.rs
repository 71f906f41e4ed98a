//! Writing results to disk: indented JSON and a fixed-column spreadsheet.

use crate::error::{IeeeError, Result};
use crate::record::Record;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Spreadsheet header, in column order
pub const SPREADSHEET_COLUMNS: [&str; 6] =
    ["YEAR", "TITLE", "AUTHORS", "JOURNAL", "ABSTRACT", "IEEE URL"];

/// `path` with its extension replaced (or added).
pub fn change_extension(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension.trim_start_matches('.'))
}

/// Write `value` as indented JSON, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;

    std::fs::write(path, buf).map_err(|e| write_error(path, e))?;
    info!(path = %path.display(), "Saved JSON");
    Ok(())
}

/// Write `records` as CSV with the [`SPREADSHEET_COLUMNS`] layout.
///
/// The URL column stays empty for records without a document id.
pub fn write_spreadsheet(path: &Path, records: &[Record]) -> Result<()> {
    ensure_parent(path)?;

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| write_error(path, e))?;

    wtr.write_record(SPREADSHEET_COLUMNS)
        .map_err(|e| write_error(path, e))?;

    for record in records {
        let year = record.year.to_string();
        let authors = record.authors_joined();
        let url = record.ieee_url().unwrap_or_default();
        wtr.write_record([
            year.as_str(),
            record.title.as_str(),
            authors.as_str(),
            record.journal.as_str(),
            record.abstract_text.as_str(),
            url.as_str(),
        ])
        .map_err(|e| write_error(path, e))?;
    }

    wtr.flush().map_err(|e| write_error(path, e))?;
    info!(path = %path.display(), rows = records.len(), "Saved spreadsheet");
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| write_error(parent, e))
        }
        _ => Ok(()),
    }
}

fn write_error(path: &Path, e: impl std::fmt::Display) -> IeeeError {
    IeeeError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_extension() {
        assert_eq!(change_extension(Path::new("search1"), ".json"), PathBuf::from("search1.json"));
        assert_eq!(change_extension(Path::new("out/s.json"), "csv"), PathBuf::from("out/s.csv"));
    }

    #[test]
    fn test_write_json_creates_parent_and_indents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/out.json");
        let records = vec![Record {
            title: "A".into(),
            year: 2001,
            ..Default::default()
        }];

        write_json(&path, &records).expect("write");
        let content = std::fs::read_to_string(&path).expect("read");
        assert!(content.starts_with("[\n {\n  \"title\": \"A\""));

        let back: Vec<Record> = serde_json::from_str(&content).expect("parse");
        assert_eq!(back, records);
    }

    #[test]
    fn test_write_spreadsheet_columns() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.csv");
        let records = vec![
            Record {
                title: "With id".into(),
                authors: vec!["A".into(), "B".into()],
                journal: "J".into(),
                abstract_text: "Abs".into(),
                year: 2010,
                document_id: Some("55".into()),
                ..Default::default()
            },
            Record {
                title: "No id".into(),
                year: 2011,
                document_id: Some(String::new()),
                ..Default::default()
            },
        ];

        write_spreadsheet(&path, &records).expect("write");
        let content = std::fs::read_to_string(&path).expect("read");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "YEAR,TITLE,AUTHORS,JOURNAL,ABSTRACT,IEEE URL");
        assert_eq!(lines[1], "2010,With id,A; B,J,Abs,https://ieeexplore.ieee.org/document/55");
        assert_eq!(lines[2], "2011,No id,,,,");
    }
}
