//! Session journal for the host application.
//!
//! Sessions are appended to a JSONL (JSON Lines) file with file locking
//! to ensure safe concurrent access. The engine itself never reads files;
//! this is the host's side of the boundary.

use crate::{Result, SessionRecord};
use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Journal trait for persisting session records
pub trait SessionJournal {
    fn append(&mut self, record: &SessionRecord) -> Result<()>;
    fn read_all(&self) -> Result<Vec<SessionRecord>>;
}

/// JSONL-based journal with file locking
pub struct JsonlJournal {
    path: PathBuf,
}

impl JsonlJournal {
    /// Create a new JSONL journal for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl SessionJournal for JsonlJournal {
    fn append(&mut self, record: &SessionRecord) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended session at {} to journal", record.date);
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<SessionRecord>> {
        read_sessions(&self.path)
    }
}

/// Read all sessions from a journal file
///
/// Unparseable lines are skipped with a warning. Records sharing an id are
/// kept once (first occurrence wins); records without an id are all kept.
pub fn read_sessions(path: &Path) -> Result<Vec<SessionRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut sessions = Vec::new();
    let mut seen_ids = HashSet::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<SessionRecord>(&line) {
            Ok(record) => {
                if let Some(id) = record.id {
                    if !seen_ids.insert(id) {
                        tracing::warn!(
                            "Duplicate session {} at line {}; skipping",
                            id,
                            line_num + 1
                        );
                        continue;
                    }
                }
                sessions.push(record);
            }
            Err(e) => {
                tracing::warn!("Failed to parse session at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} sessions from journal", sessions.len());
    Ok(sessions)
}
