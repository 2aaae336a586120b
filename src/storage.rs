//! Storage - Progress and history persistence
//!
//! Loads never fail: a missing or unreadable file means "no prior state".
//! Writes report errors so the session can log them and carry on.

use std::cell::{Cell, RefCell};
use std::fs::{rename, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{GameError, Result};
use crate::progress::{HistoryEntry, ProgressRecord};

pub const PROGRESS_FILE: &str = "equestrian_progress.json";
pub const HISTORY_FILE: &str = "equestrian_history.json";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Load/save contract for the progress record
pub trait ProgressStore {
    /// Stored progress, or the default record when there is none
    fn load_progress(&self) -> ProgressRecord;

    /// Replace the stored progress
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn save_progress(&self, record: &ProgressRecord) -> Result<()>;
}

/// Append-only race history
pub trait HistoryStore {
    /// Stored entries, oldest first; empty when missing or corrupt
    fn load_history(&self) -> Vec<HistoryEntry>;

    /// Append one entry, stamping it if needed and trimming to the cap
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be written back.
    fn append_history(&self, entry: HistoryEntry) -> Result<()>;
}

fn stamp(mut entry: HistoryEntry) -> HistoryEntry {
    if entry.timestamp.is_none() {
        entry.timestamp = Some(chrono::Local::now().format(TIMESTAMP_FORMAT).to_string());
    }
    entry
}

fn push_capped(history: &mut Vec<HistoryEntry>, entry: HistoryEntry, cap: usize) {
    history.push(stamp(entry));
    if history.len() > cap {
        let excess = history.len() - cap;
        history.drain(..excess);
    }
}

/// JSON files in a data directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    progress_path: PathBuf,
    history_path: PathBuf,
    history_cap: usize,
}

impl JsonFileStore {
    pub fn new(progress_path: PathBuf, history_path: PathBuf, history_cap: usize) -> Self {
        Self {
            progress_path,
            history_path,
            history_cap,
        }
    }

    /// Standard file names under `dir`
    pub fn in_dir(dir: &Path, history_cap: usize) -> Self {
        Self::new(dir.join(PROGRESS_FILE), dir.join(HISTORY_FILE), history_cap)
    }

    pub fn progress_path(&self) -> &Path {
        &self.progress_path
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("Could not read {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring malformed {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Write to a temp file, then rename over the target
    fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec_pretty(value)?;
        let temp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&data)?;
            file.flush()?;
        }
        rename(&temp_path, path)?;
        log::debug!("Saved {} bytes to {}", data.len(), path.display());
        Ok(())
    }
}

impl ProgressStore for JsonFileStore {
    fn load_progress(&self) -> ProgressRecord {
        Self::read_json(&self.progress_path).unwrap_or_default()
    }

    fn save_progress(&self, record: &ProgressRecord) -> Result<()> {
        Self::write_json(&self.progress_path, record)
    }
}

impl HistoryStore for JsonFileStore {
    fn load_history(&self) -> Vec<HistoryEntry> {
        Self::read_json(&self.history_path).unwrap_or_default()
    }

    fn append_history(&self, entry: HistoryEntry) -> Result<()> {
        let mut history = self.load_history();
        push_capped(&mut history, entry, self.history_cap);
        Self::write_json(&self.history_path, &history)
    }
}

/// In-process store; writes can be made to fail for exercising recovery paths
#[derive(Debug, Default)]
pub struct MemoryStore {
    progress: RefCell<Option<ProgressRecord>>,
    history: RefCell<Vec<HistoryEntry>>,
    history_cap: Option<usize>,
    fail_writes: Cell<bool>,
    saves: Cell<u32>,
}

impl MemoryStore {
    pub fn new(history_cap: usize) -> Self {
        Self {
            history_cap: Some(history_cap),
            ..Default::default()
        }
    }

    pub fn with_progress(self, record: ProgressRecord) -> Self {
        *self.progress.borrow_mut() = Some(record);
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Successful progress saves so far
    pub fn save_count(&self) -> u32 {
        self.saves.get()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.get() {
            return Err(GameError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "store is read-only",
            )));
        }
        Ok(())
    }
}

impl ProgressStore for MemoryStore {
    fn load_progress(&self) -> ProgressRecord {
        self.progress.borrow().clone().unwrap_or_default()
    }

    fn save_progress(&self, record: &ProgressRecord) -> Result<()> {
        self.check_writable()?;
        *self.progress.borrow_mut() = Some(record.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

impl HistoryStore for MemoryStore {
    fn load_history(&self) -> Vec<HistoryEntry> {
        self.history.borrow().clone()
    }

    fn append_history(&self, entry: HistoryEntry) -> Result<()> {
        self.check_writable()?;
        let cap = self.history_cap.unwrap_or(usize::MAX);
        push_capped(&mut self.history.borrow_mut(), entry, cap);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::Weather;
    use crate::horse::{Breed, Sex};

    fn entry(player: &str) -> HistoryEntry {
        HistoryEntry {
            timestamp: None,
            player: player.into(),
            points: 0,
            horse: "Luna".into(),
            sex: Sex::Mare,
            breed: Breed::Criollo,
            climate: Weather::Rainy,
            time: 64.2,
            won: false,
        }
    }

    #[test]
    fn missing_files_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path(), 500);
        assert_eq!(store.load_progress(), ProgressRecord::default());
        assert!(store.load_history().is_empty());
    }

    #[test]
    fn corrupt_progress_loads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path(), 500);
        std::fs::write(store.progress_path(), "{ not json").unwrap();
        std::fs::write(store.history_path(), "[1, 2").unwrap();
        assert_eq!(store.load_progress(), ProgressRecord::default());
        assert!(store.load_history().is_empty());
    }

    #[test]
    fn progress_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(&dir.path().join("nested"), 500);
        let record = ProgressRecord {
            last_player: Some("Ana".into()),
            points: 200,
            best_time: Some(58.3),
            ..Default::default()
        };
        store.save_progress(&record).unwrap();
        assert_eq!(store.load_progress(), record);
    }

    #[test]
    fn append_stamps_and_caps() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path(), 3);
        for i in 0..5 {
            store.append_history(entry(&format!("p{i}"))).unwrap();
        }
        let history = store.load_history();
        let players: Vec<&str> = history.iter().map(|e| e.player.as_str()).collect();
        assert_eq!(players, ["p2", "p3", "p4"]);
        assert!(history.iter().all(|e| e.timestamp.is_some()));
    }

    #[test]
    fn append_keeps_given_timestamp() {
        let store = MemoryStore::new(500);
        let mut stamped = entry("Ana");
        stamped.timestamp = Some("2024-01-02 03:04:05".into());
        store.append_history(stamped).unwrap();
        assert_eq!(
            store.load_history()[0].timestamp.as_deref(),
            Some("2024-01-02 03:04:05")
        );
    }

    #[test]
    fn memory_store_can_refuse_writes() {
        let store = MemoryStore::new(500);
        store.set_fail_writes(true);
        assert!(store.save_progress(&ProgressRecord::default()).is_err());
        assert!(store.append_history(entry("Ana")).is_err());
        assert_eq!(store.save_count(), 0);
    }
}
