//! URL history log for Paddock
//!
//! One JSON document per site key, deduplicated by exact URL. Reads
//! are lenient (missing or corrupt files start fresh) and every append
//! rewrites the whole document so the on-disk representation is always
//! valid JSON. Writes are best-effort: concurrent writers to the same
//! key can lose an entry, which is accepted.

use paddock_core::{PaddockError, PaddockResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One logged visit. The legacy format also carried a timestamp; it is
/// accepted on read and preserved on rewrite, but new entries omit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub url: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// Per-site-key history log store.
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn log_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read the log for a site key. Missing or corrupt files are an
    /// empty log, never an error.
    pub fn entries(&self, key: &str) -> Vec<HistoryEntry> {
        Self::read_entries(&self.log_path(key), key)
    }

    fn read_entries(path: &Path, key: &str) -> Vec<HistoryEntry> {
        if !path.exists() {
            return Vec::new();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(err) => {
                    log::warn!("Invalid history log for {}, starting fresh: {}", key, err);
                    Vec::new()
                }
            },
            Err(err) => {
                log::warn!("Failed to read history log for {}: {}", key, err);
                Vec::new()
            }
        }
    }

    fn write_entries(&self, key: &str, entries: &[HistoryEntry]) -> PaddockResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let data = serde_json::to_string_pretty(entries).map_err(|err| {
            PaddockError::History(format!("Failed to serialize history for {}: {}", key, err))
        })?;
        std::fs::write(self.log_path(key), data)?;
        Ok(())
    }

    /// Append a visit, deduplicated by exact URL. Returns `true` when a
    /// new entry was appended. A repeat visit is a no-op for the log
    /// length but may backfill a missing title.
    pub fn log_visit(&self, key: &str, url: &str, title: Option<&str>) -> PaddockResult<bool> {
        let mut entries = self.entries(key);

        if let Some(existing) = entries.iter_mut().find(|entry| entry.url == url) {
            if existing.title.is_empty() {
                if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
                    existing.title = title.trim().to_string();
                    self.write_entries(key, &entries)?;
                }
            }
            return Ok(false);
        }

        entries.push(HistoryEntry {
            url: url.to_string(),
            title: title.map(|t| t.trim().to_string()).unwrap_or_default(),
            timestamp: None,
        });
        self.write_entries(key, &entries)?;
        log::debug!("Logged visit for {}: {}", key, url);
        Ok(true)
    }

    /// Update the stored title of an existing entry (title extraction
    /// is asynchronous and may land after the append).
    pub fn set_title(&self, key: &str, url: &str, title: &str) -> PaddockResult<()> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(());
        }
        let mut entries = self.entries(key);
        if let Some(existing) = entries.iter_mut().find(|entry| entry.url == url) {
            if existing.title != title {
                existing.title = title.to_string();
                self.write_entries(key, &entries)?;
            }
        }
        Ok(())
    }

    /// Remove a site's log file entirely (used when the owning site
    /// configuration is removed).
    pub fn remove_log(&self, key: &str) -> PaddockResult<()> {
        let path = self.log_path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
            log::info!("Removed history log for {}", key);
        }
        Ok(())
    }
}
