//! JSONL → CSV export.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, instrument};

use crate::crawl::read_json_objects;

/// Columns that lead the header when present, in this order.
pub const PREFERRED_COLUMNS: [&str; 11] = [
    "id",
    "url",
    "title",
    "content_type",
    "filename",
    "file_size",
    "paragraphs",
    "links",
    "media",
    "tables_count",
    "extracted_at",
];

/// Errors raised by [`CsvExporter`].
#[derive(Debug, Error)]
pub enum ExportError {
    /// The input log does not exist.
    #[error("input file not found: {path}")]
    NotFound {
        /// Input path.
        path: PathBuf,
    },

    /// The input log could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Input path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The input held no valid JSON objects.
    #[error("no valid records found in {path}")]
    Empty {
        /// Input path.
        path: PathBuf,
    },

    /// Writing the CSV failed.
    #[error("failed to write CSV {path}: {source}")]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },

    /// The output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub records: usize,
    pub columns: Vec<String>,
}

/// Converts a crawl log into a CSV file, one row per line.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    input: PathBuf,
    output: PathBuf,
    columns: Option<Vec<String>>,
}

impl CsvExporter {
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            columns: None,
        }
    }

    /// Restricts and orders the columns. An empty list means "all".
    #[must_use]
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = (!columns.is_empty()).then_some(columns);
        self
    }

    /// Writes the CSV, overwriting any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] for a missing/unreadable/empty input or a write failure.
    #[instrument(skip(self), fields(input = %self.input.display(), output = %self.output.display()))]
    pub fn export(&self) -> Result<ExportSummary, ExportError> {
        if !self.input.exists() {
            return Err(ExportError::NotFound {
                path: self.input.clone(),
            });
        }
        let records = read_json_objects(&self.input).map_err(|source| ExportError::Read {
            path: self.input.clone(),
            source,
        })?;
        if records.is_empty() {
            return Err(ExportError::Empty {
                path: self.input.clone(),
            });
        }

        let columns = self
            .columns
            .clone()
            .unwrap_or_else(|| column_order(&records));

        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ExportError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        write_csv(&self.output, &columns, &records).map_err(|source| ExportError::Write {
            path: self.output.clone(),
            source,
        })?;

        info!(records = records.len(), columns = columns.len(), "Exported CSV");
        Ok(ExportSummary {
            records: records.len(),
            columns,
        })
    }
}

fn write_csv(path: &Path, columns: &[String], records: &[Map<String, Value>]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(columns)?;
    for record in records {
        writer.write_record(columns.iter().map(|column| flatten_value(record.get(column))))?;
    }
    writer.flush()?;
    Ok(())
}

/// Preferred columns first, then other keys in first-seen order; only keys
/// present in at least one record.
#[must_use]
pub fn column_order(records: &[Map<String, Value>]) -> Vec<String> {
    let present = |key: &str| records.iter().any(|r| r.contains_key(key));
    let mut columns: Vec<String> = PREFERRED_COLUMNS
        .iter()
        .filter(|c| present(c))
        .map(|c| (*c).to_string())
        .collect();
    for record in records {
        for key in record.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Renders one JSON value as a CSV cell.
#[must_use]
pub fn flatten_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("; "),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_flatten_scalars() {
        assert_eq!(flatten_value(None), "");
        assert_eq!(flatten_value(Some(&Value::Null)), "");
        assert_eq!(flatten_value(Some(&json!(true))), "true");
        assert_eq!(flatten_value(Some(&json!(false))), "false");
        assert_eq!(flatten_value(Some(&json!(42))), "42");
        assert_eq!(flatten_value(Some(&json!("text"))), "text");
    }

    #[test]
    fn test_flatten_lists_and_objects() {
        assert_eq!(flatten_value(Some(&json!(["a", "b"]))), "a; b");
        assert_eq!(flatten_value(Some(&json!([]))), "");
        assert_eq!(
            flatten_value(Some(&json!([{"text": "é"}, 1]))),
            r#"[{"text":"é"},1]"#
        );
        assert_eq!(flatten_value(Some(&json!({"k": 1}))), r#"{"k":1}"#);
    }

    #[test]
    fn test_column_order_preferred_then_first_seen() {
        let records = vec![
            object(json!({"zeta": 1, "id": 1, "title": "t"})),
            object(json!({"id": 2, "alpha": 2, "filename": "f"})),
        ];
        assert_eq!(
            column_order(&records),
            vec!["id", "title", "filename", "zeta", "alpha"]
        );
    }
}
