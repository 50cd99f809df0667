use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing::info;

use crate::errors::SinkError;
use crate::session::RpoRecord;
use crate::session::RtoRecord;

/// A result type written as one line, tagged with [`Record::TYPE`].
pub trait Record: Serialize {
    const TYPE: &'static str;
}

impl Record for RtoRecord {
    const TYPE: &'static str = "rto_metrics";
}

impl Record for RpoRecord {
    const TYPE: &'static str = "rpo_metrics";
}

/// Appends records to `<dir>/<prefix>_<YYYYmmdd_HHMMSS>_<run_id>.jsonl`.
///
/// Each line is flushed when written; a crash loses at most the line being
/// written.
pub struct JsonlWriter {
    path: PathBuf,
}

impl JsonlWriter {
    pub fn create(
        dir: impl AsRef<Path>,
        prefix: &str,
        run_id: &str,
    ) -> Result<Self, SinkError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

        let file_name = format!(
            "{}_{}_{}.jsonl",
            prefix,
            Utc::now().format("%Y%m%d_%H%M%S"),
            run_id
        );
        let path = dir.join(file_name);

        info!("results are written to {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a record with a `"type"` field added.
    pub fn write<R: Record>(&self, record: &R) -> Result<(), SinkError> {
        let mut value =
            serde_json::to_value(record).map_err(|e| json_err(&self.path, e))?;

        if let Value::Object(m) = &mut value {
            m.insert("type".to_string(), Value::from(R::TYPE));
        }

        self.write_value(&value)
    }

    /// Write `{"type": "metadata", "timestamp": <now>, "data": <data>}`.
    pub fn write_metadata(&self, data: Value) -> Result<(), SinkError> {
        let value = serde_json::json!({
            "type": "metadata",
            "timestamp": Utc::now(),
            "data": data,
        });

        self.write_value(&value)
    }

    fn write_value(&self, value: &Value) -> Result<(), SinkError> {
        let line =
            serde_json::to_string(value).map_err(|e| json_err(&self.path, e))?;

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| io_err(&self.path, e))?;

        writeln!(f, "{}", line).map_err(|e| io_err(&self.path, e))?;
        f.flush().map_err(|e| io_err(&self.path, e))?;

        debug!("written to {}: {}", self.path.display(), line);
        Ok(())
    }
}

/// Reads back files written by [`JsonlWriter`].
pub struct JsonlReader;

impl JsonlReader {
    /// All objects in the file. Blank lines are skipped.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<Value>, SinkError> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| io_err(path, e))?;

        let mut values = vec![];
        for line in BufReader::new(f).lines() {
            let line = line.map_err(|e| io_err(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let v = serde_json::from_str(&line).map_err(|e| json_err(path, e))?;
            values.push(v);
        }

        Ok(values)
    }

    /// Objects whose `"type"` field equals `typ`.
    pub fn read_by_type(
        path: impl AsRef<Path>,
        typ: &str,
    ) -> Result<Vec<Value>, SinkError> {
        let all = Self::read_all(path)?;
        Ok(all.into_iter().filter(|v| v["type"] == typ).collect())
    }
}

fn io_err(path: &Path, source: std::io::Error) -> SinkError {
    SinkError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn json_err(path: &Path, source: serde_json::Error) -> SinkError {
    SinkError::Json {
        path: path.display().to_string(),
        source,
    }
}
