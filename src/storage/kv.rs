//! Key/value persistence with atomic writes.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Key holding the persisted device identifier.
pub const DEVICE_ID_KEY: &str = "F";
/// Key holding the serialized history snapshot.
pub const HISTORY_SNAPSHOT_KEY: &str = "historyPersistance";

/// A client-local key/value namespace scoped to one profile directory.
///
/// Values survive process restarts. Writes go through a temp file and a
/// rename, so a reader never observes a partially written value.
#[derive(Debug, Clone)]
pub struct KvStore {
    root: PathBuf,
}

impl KvStore {
    /// Open (creating if needed) a namespace rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root).context("Failed to create storage directory")?;
        }
        Ok(Self { root })
    }

    /// Open the platform-default namespace.
    ///
    /// - macOS: `~/Library/Application Support/workshop-search/`
    /// - Linux: `~/.local/share/workshop-search/`
    /// - Windows: `%LOCALAPPDATA%\workshop-search\`
    pub fn open_default() -> Result<Self> {
        let base = dirs::data_local_dir().context("Failed to get platform data directory")?;
        Self::open(base.join("workshop-search"))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.root.join(key);
        if !path.exists() {
            return Ok(None);
        }
        let value = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read stored value for key {key}"))?;
        Ok(Some(value))
    }

    /// Write `value` under `key` atomically (temp file + rename).
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        let path = self.root.join(key);
        let temp = self.root.join(format!("{key}.tmp"));
        fs::write(&temp, value)
            .with_context(|| format!("Failed to write temp file for key {key}"))?;
        fs::rename(&temp, &path)
            .with_context(|| format!("Failed to rename temp file for key {key}"))?;
        Ok(())
    }
}
