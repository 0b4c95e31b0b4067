use crate::errors::SchedlogError;
use crate::labels::LogRecord;
use crate::runtime::FileSystem;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Persists every emitted record as one JSON object per line.
#[derive(Clone)]
pub struct JsonlLogger {
    pub path: PathBuf,
    file_system: Arc<dyn FileSystem>,
}

impl JsonlLogger {
    pub fn new(path: impl AsRef<Path>, file_system: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file_system,
        }
    }

    pub fn append(&self, record: &LogRecord) -> Result<(), SchedlogError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                self.file_system.create_dir_all(parent)?;
            }
        }
        let line = serde_json::to_string(record).map_err(|e| SchedlogError::Io(e.to_string()))?;
        self.file_system.append_line(&self.path, &line)
    }
}

/// Reads a batch previously written by [`JsonlLogger`]. Blank lines are skipped.
pub fn read_jsonl_records(
    file_system: &dyn FileSystem,
    path: &Path,
) -> Result<Vec<LogRecord>, SchedlogError> {
    let text = file_system.read_to_string(path)?;
    parse_jsonl_records(&text)
}

pub fn parse_jsonl_records(text: &str) -> Result<Vec<LogRecord>, SchedlogError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<LogRecord>(line)
                .map_err(|e| SchedlogError::RecordParse(format!("line {}: {e}", idx + 1)))
        })
        .collect()
}
