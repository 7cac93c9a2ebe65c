//! Warden Storage Layer - File-Based Snapshots
//!
//! The treasury state lives in memory while a command runs and is written
//! back as a snapshot once the command's transaction commits:
//! - every snapshot is stored twice, pretty JSON for operators and bincode
//!   for loading
//! - writes go to a temporary file that is renamed into place, so a crash
//!   never leaves a half-written snapshot behind
//! - an append-only JSON-lines journal records what each command did

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// File-based storage rooted at one data directory
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    /// Open storage directory, creating it if needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data_dir = path.as_ref().to_path_buf();
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
        }
        Ok(Self { data_dir })
    }

    /// Save a snapshot (JSON for readability, Bincode for speed)
    pub fn save_snapshot<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let json = serde_json::to_vec_pretty(data)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let bin = bincode::serialize(data)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        // Bincode last: it is what `load_snapshot` prefers, so it must never
        // be newer than a JSON write that failed.
        write_atomic(&self.json_path(name), &json)?;
        write_atomic(&self.bin_path(name), &bin)?;
        debug!("saved snapshot {} ({} bytes bincode)", name, bin.len());
        Ok(())
    }

    /// Load a snapshot (tries Bincode first, falls back to JSON)
    pub fn load_snapshot<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let bin_path = self.bin_path(name);
        let json_path = self.json_path(name);

        if bin_path.exists() {
            let data = fs::read(&bin_path)?;
            match bincode::deserialize(&data) {
                Ok(value) => return Ok(value),
                Err(e) if json_path.exists() => {
                    warn!("bincode snapshot {} unreadable ({}), using JSON", name, e);
                }
                Err(e) => return Err(StorageError::SerializationError(e.to_string())),
            }
        }

        if json_path.exists() {
            let data = fs::read(&json_path)?;
            return serde_json::from_slice(&data)
                .map_err(|e| StorageError::SerializationError(e.to_string()));
        }

        Err(StorageError::SnapshotNotFound(name.to_string()))
    }

    pub fn has_snapshot(&self, name: &str) -> bool {
        self.bin_path(name).exists() || self.json_path(name).exists()
    }

    /// Append one record to the `name` journal
    pub fn append_record<T: Serialize>(&self, name: &str, record: &T) -> Result<()> {
        let mut line = serde_json::to_vec(record)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.journal_path(name))?;
        file.write_all(&line)?;
        file.sync_data()?;
        Ok(())
    }

    /// Read the `name` journal back, oldest first. A missing journal is empty.
    pub fn read_records<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        let path = self.journal_path(name);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(fs::File::open(path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(
                serde_json::from_str(&line)
                    .map_err(|e| StorageError::SerializationError(e.to_string()))?,
            );
        }
        Ok(records)
    }

    /// Get storage directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn json_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", name))
    }

    fn bin_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.bin", name))
    }

    fn journal_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.jsonl", name))
    }
}

/// Write `bytes` next to `path` and rename over it.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
