//! Song persistence - the upsert boundary of the import pipeline.
//!
//! The orchestrator only needs one operation: create-or-update a song,
//! reporting which branch occurred. Two adapters are provided:
//!
//! - [`MemoryStore`] - in-process map, used by tests and probing callers
//! - [`FileStore`] - one JSON document per song in a directory
//!
//! Implementations own their concurrency story; the import core itself
//! performs no locking.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::Song;

/// Directory where songs are stored (relative to current dir)
const DEFAULT_STORE_DIR: &str = ".songload/songs";

// =============================================================================
// Store trait
// =============================================================================

/// Create-or-update persistence for songs.
pub trait SongStore {
    /// Insert or replace the song keyed by its identity.
    ///
    /// Returns `true` when an existing record was updated, `false` when
    /// a new one was created.
    fn upsert(&self, song: &Song) -> StoreResult<bool>;
}

// =============================================================================
// Memory store
// =============================================================================

/// In-memory store keyed by song id.
///
/// The map sits behind a `Mutex` so the `&self` upsert contract stays
/// safe when several imports run concurrently.
#[derive(Debug, Default)]
pub struct MemoryStore {
    songs: Mutex<HashMap<Uuid, Song>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored songs.
    pub fn len(&self) -> usize {
        self.songs.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of a stored song.
    pub fn get(&self, id: &Uuid) -> Option<Song> {
        self.songs.lock().ok().and_then(|m| m.get(id).cloned())
    }
}

impl SongStore for MemoryStore {
    fn upsert(&self, song: &Song) -> StoreResult<bool> {
        let mut songs = self.songs.lock().map_err(|_| StoreError::Rejected {
            name: song.name.clone(),
            message: "store lock poisoned".into(),
        })?;
        Ok(songs.insert(song.id, song.clone()).is_some())
    }
}

// =============================================================================
// File store
// =============================================================================

/// A stored song with storage metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSong {
    /// The song itself.
    pub song: Song,
    /// When this document was last written (RFC 3339).
    pub saved_at: String,
}

/// Directory-backed store: one pretty-printed JSON document per song,
/// named by the song's id.
pub struct FileStore {
    store_dir: PathBuf,
}

impl FileStore {
    /// Store under the default directory.
    pub fn new() -> Self {
        Self::with_dir(DEFAULT_STORE_DIR)
    }

    /// Store under a custom directory.
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            store_dir: PathBuf::from(dir.as_ref()),
        }
    }

    fn song_path(&self, id: &Uuid) -> PathBuf {
        self.store_dir.join(format!("{}.json", id))
    }

    /// Load a stored song by id.
    pub fn get(&self, id: &Uuid) -> StoreResult<Option<StoredSong>> {
        let path = self.song_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// List all stored songs. Unreadable entries are skipped.
    pub fn list(&self) -> Vec<StoredSong> {
        let mut songs = Vec::new();
        let entries = match fs::read_dir(&self.store_dir) {
            Ok(e) => e,
            Err(_) => return songs,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Ok(content) = fs::read_to_string(&path) {
                    if let Ok(stored) = serde_json::from_str::<StoredSong>(&content) {
                        songs.push(stored);
                    }
                }
            }
        }

        songs.sort_by(|a, b| a.song.name.cmp(&b.song.name));
        songs
    }
}

impl SongStore for FileStore {
    fn upsert(&self, song: &Song) -> StoreResult<bool> {
        fs::create_dir_all(&self.store_dir)?;

        let path = self.song_path(&song.id);
        let updated = path.exists();

        let stored = StoredSong {
            song: song.clone(),
            saved_at: chrono::Utc::now().to_rfc3339(),
        };
        let content = serde_json::to_string_pretty(&stored)?;
        fs::write(&path, content)?;

        Ok(updated)
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store_upsert_branches() {
        let store = MemoryStore::new();
        let mut song = Song::new();
        song.name = "First".into();

        assert!(!store.upsert(&song).unwrap()); // created
        song.name = "Renamed".into();
        assert!(store.upsert(&song).unwrap()); // updated

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&song.id).unwrap().name, "Renamed");
    }

    #[test]
    fn test_file_store_upsert_branches() {
        let dir = tempdir().unwrap();
        let store = FileStore::with_dir(dir.path());
        let song = Song::new();

        assert!(!store.upsert(&song).unwrap());
        assert!(store.upsert(&song).unwrap());

        let stored = store.get(&song.id).unwrap().unwrap();
        assert_eq!(stored.song.id, song.id);
        assert!(!stored.saved_at.is_empty());
    }

    #[test]
    fn test_file_store_list_sorted() {
        let dir = tempdir().unwrap();
        let store = FileStore::with_dir(dir.path());

        for name in ["Zeal", "Alpha", "Middle"] {
            let mut song = Song::new();
            song.name = name.into();
            store.upsert(&song).unwrap();
        }

        let names: Vec<_> = store.list().into_iter().map(|s| s.song.name).collect();
        assert_eq!(names, ["Alpha", "Middle", "Zeal"]);
    }

    #[test]
    fn test_file_store_missing_dir_lists_empty() {
        let store = FileStore::with_dir("/nonexistent/songload-store");
        assert!(store.list().is_empty());
    }
}
