//! User-state store.
//!
//! [`Store`] is the client-side model of the hosted document database that
//! holds library entries, reading progress, preferences and history. Each
//! table is looked up by a natural key (user, user + manga, ...) with at most
//! one record per key, and all writes are upserts.
//!
//! The store lives in memory behind a `parking_lot::RwLock` and can be
//! snapshotted to a JSON file with [`Store::save`]. Operations are grouped by
//! table in the submodules:
//!
//! - [`library`] - shelving, favourites, per-status listings
//! - [`progress`] - per-chapter page position
//! - [`preferences`] - reader settings with defaults
//! - [`history`] - bounded search and recently-viewed lists
//!
//! ```rust
//! use yomu::store::Store;
//! use yomu::types::ReadingStatus;
//!
//! let store = Store::in_memory();
//! store.add_to_library("user-1", "solo-leveling", ReadingStatus::Reading);
//! store.toggle_favorite("user-1", "solo-leveling");
//!
//! let entry = store.library_entry("user-1", "solo-leveling").unwrap();
//! assert!(entry.is_favorite);
//! ```

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{
    LibraryEntry, Millis, ReadingProgress, RecentlyViewed, RecordId, SearchHistoryEntry,
    UserPreferences,
};

pub mod history;
pub mod library;
pub mod preferences;
pub mod progress;

/// Most search queries / viewed series kept per user.
pub const HISTORY_CAPACITY: usize = 20;

/// Most search queries / viewed series returned per user.
pub const HISTORY_PAGE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreferencesRecord {
    id: RecordId,
    user_id: String,
    #[serde(flatten)]
    preferences: UserPreferences,
}

/// Snapshot format, also the in-memory representation.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Tables {
    next_id: u64,
    library: Vec<LibraryEntry>,
    reading_progress: Vec<ReadingProgress>,
    user_preferences: Vec<PreferencesRecord>,
    search_history: Vec<SearchHistoryEntry>,
    recently_viewed: Vec<RecentlyViewed>,
}

impl Tables {
    fn allocate_id(&mut self) -> RecordId {
        self.next_id += 1;
        RecordId(self.next_id)
    }

    /// Re-derives `next_id` so ids stay unique after loading a snapshot that
    /// was edited by hand.
    fn repair_next_id(&mut self) {
        let max = self
            .library
            .iter()
            .map(|r| r.id)
            .chain(self.reading_progress.iter().map(|r| r.id))
            .chain(self.user_preferences.iter().map(|r| r.id))
            .chain(self.search_history.iter().map(|r| r.id))
            .chain(self.recently_viewed.iter().map(|r| r.id))
            .max()
            .map_or(0, |id| id.0);
        self.next_id = self.next_id.max(max);
    }
}

/// In-memory document store with optional JSON persistence.
#[derive(Debug)]
pub struct Store {
    path: Option<PathBuf>,
    tables: RwLock<Tables>,
}

impl Store {
    /// A store with no backing file. [`save`](Store::save) is a no-op.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Opens the snapshot at `path`. A missing file yields an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut tables = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Tables>(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no store snapshot yet");
                Tables::default()
            }
            Err(err) => return Err(err.into()),
        };
        tables.repair_next_id();

        Ok(Self {
            path: Some(path),
            tables: RwLock::new(tables),
        })
    }

    /// Backing snapshot path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes the snapshot atomically (temp file, then rename).
    pub async fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let data = {
            let tables = self.tables.read();
            serde_json::to_vec_pretty(&*tables)?
        };

        let parent = path
            .parent()
            .ok_or_else(|| Error::invalid_input(format!("{} has no parent", path.display())))?;
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut temp = path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);
        tokio::fs::write(&temp, &data).await?;
        tokio::fs::rename(&temp, path).await?;

        info!(path = %path.display(), bytes = data.len(), "store snapshot written");
        Ok(())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::in_memory()
    }
}

pub(crate) fn now_ms() -> Millis {
    chrono::Utc::now().timestamp_millis()
}

/// Most-recent-first by record id; ids are allocated monotonically.
fn newest_first<T, F>(mut rows: Vec<T>, id: F) -> Vec<T>
where
    F: Fn(&T) -> RecordId,
{
    rows.sort_by_key(|row| std::cmp::Reverse(id(row)));
    rows
}
