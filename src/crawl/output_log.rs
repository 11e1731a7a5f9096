//! Append-only JSON Lines log of crawled records.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::warn;

use super::error::CrawlError;
use crate::record::ContentRecord;

/// One JSONL file plus the lock that serializes appends to it.
#[derive(Debug)]
pub struct OutputLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl OutputLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `record` as one line; non-ASCII is written unescaped.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::InvalidRecord`] for a record with no paragraphs,
    /// or [`CrawlError::Encode`] or [`CrawlError::Io`].
    pub async fn append(&self, record: &ContentRecord) -> Result<(), CrawlError> {
        if !record.is_valid() {
            return Err(CrawlError::InvalidRecord { id: record.id });
        }
        let mut line = serde_json::to_string(record).map_err(CrawlError::Encode)?;
        line.push('\n');

        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| CrawlError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| CrawlError::io(&self.path, e))?;
        file.flush().await.map_err(|e| CrawlError::io(&self.path, e))
    }

    /// Highest `id` in the log, `0` when the file is missing or unreadable.
    ///
    /// Malformed lines, including ones that are not UTF-8, are skipped.
    pub async fn last_id(&self) -> u64 {
        let Ok(file) = tokio::fs::File::open(&self.path).await else {
            return 0;
        };
        let mut lines = BufReader::new(file).split(b'\n');
        let mut last_id = 0;
        let mut index = 0usize;
        loop {
            match lines.next_segment().await {
                Ok(Some(line)) => {
                    index += 1;
                    if let Some(id) = parse_line(&line, index)
                        .and_then(|v| v.get("id").and_then(Value::as_u64))
                    {
                        last_id = last_id.max(id);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Error reading last ID from log");
                    break;
                }
            }
        }
        last_id
    }
}

/// Parses one raw log line. Blank lines yield `None` silently; invalid JSON
/// or invalid UTF-8 yields `None` with a warning.
fn parse_line(raw: &[u8], line: usize) -> Option<Value> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<Value>(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(line, error = %e, "Skipping malformed JSON line");
            None
        }
    }
}

/// Reads every JSON object from a JSONL file, skipping blank and malformed lines.
///
/// # Errors
///
/// Returns the IO error if the file cannot be opened or read.
pub fn read_json_objects(path: &Path) -> std::io::Result<Vec<Map<String, Value>>> {
    let file = std::fs::File::open(path)?;
    let mut objects = Vec::new();
    for (index, line) in std::io::BufReader::new(file).split(b'\n').enumerate() {
        match parse_line(&line?, index + 1) {
            Some(Value::Object(object)) => objects.push(object),
            Some(_) => warn!(line = index + 1, "Skipping non-object JSON line"),
            None => {}
        }
    }
    Ok(objects)
}
