//! Reward state persistence with file locking.
//!
//! This module handles saving and loading the host's reward state with
//! proper file locking to prevent concurrent access issues.

use crate::{Error, Result, RewardState};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl RewardState {
    /// Load reward state from a file with shared locking
    ///
    /// Returns default state if file doesn't exist.
    /// If file is corrupted, logs a warning and returns default state; a
    /// later backfill or replay rebuilds what was lost.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No state file found, using default state");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open state file {:?}: {}. Using defaults.", path, e);
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock state file {:?}: {}. Using defaults.", path, e);
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read state file {:?}: {}. Using defaults.", path, e);
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<RewardState>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded reward state from {:?}", path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!("Failed to parse state file {:?}: {}. Using defaults.", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Save reward state to a file with exclusive locking
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::State(format!("state path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved reward state to {:?}", path);
        Ok(())
    }

    /// Load state, modify it, and save it back under an exclusive lock
    ///
    /// The lock lives in a sibling `.lock` file and is held across the whole
    /// load, `f`, save sequence, so concurrent updaters run one at a time.
    /// When `f` fails nothing is saved.
    pub fn update<T, F>(path: &Path, f: F) -> Result<(Self, T)>
    where
        F: FnOnce(&mut RewardState) -> Result<T>,
    {
        let lock_path = path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        lock.lock_exclusive()?;
        tracing::debug!("Acquired state lock {:?}", lock_path);

        let result = Self::load(path).and_then(|mut state| {
            let value = f(&mut state)?;
            state.save(path)?;
            Ok((state, value))
        });

        lock.unlock()?;
        result
    }

    /// Derived level; never stored
    pub fn level(&self) -> crate::LevelInfo {
        crate::compute_level(self.total_points)
    }
}
