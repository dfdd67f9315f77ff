//! Import orchestration for the Praisenter 2 song format.
//!
//! Runs detection, then parsing, then upserts each converted song
//! independently, bucketing outcomes into created / updated / warnings
//! / errors:
//!
//! - a non-matching file is a silent no-op, not an error (callers may
//!   be probing several format providers)
//! - a structural parse failure aborts the whole operation as a single
//!   [`ImportError::InvalidFormat`]
//! - a persistence failure on one song is recorded against that song
//!   and the rest of the batch is still attempted
//!
//! Export to this format is unsupported in every form; each export
//! entry point rejects the call outright.

use std::io::Write;
use std::path::Path;

use tracing::info;
use uuid::Uuid;

use crate::detect::{self, Detection};
use crate::error::{ImportResult, StoreError};
use crate::models::{Song, SongReadResult};
use crate::store::SongStore;
use crate::{convert, error::ImportError};

// =============================================================================
// Outcome
// =============================================================================

/// A persistence failure for one song of a batch.
#[derive(Debug)]
pub struct ImportItemError {
    /// Identity of the song that failed.
    pub song_id: Uuid,
    /// Display name of the song that failed.
    pub song_name: String,
    /// The underlying store error.
    pub error: StoreError,
}

/// Grouped outcome of one import operation.
///
/// The four collections are never merged or deduplicated here: a caller
/// sees precisely which records were created, updated, skipped with a
/// warning, or failed with a cause.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    /// Songs newly created in the store.
    pub created: Vec<Song>,
    /// Songs that replaced an existing record.
    pub updated: Vec<Song>,
    /// Field-level warnings, copied from each successfully stored record.
    pub warnings: Vec<String>,
    /// Per-song persistence failures.
    pub errors: Vec<ImportItemError>,
}

impl ImportOutcome {
    /// True when nothing was imported and nothing failed.
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
            && self.updated.is_empty()
            && self.warnings.is_empty()
            && self.errors.is_empty()
    }
}

// =============================================================================
// Format provider
// =============================================================================

/// Import/export provider for the legacy Praisenter 2 song format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Praisenter2Format;

impl Praisenter2Format {
    /// Import all songs from a file into the store.
    pub fn import(&self, store: &dyn SongStore, path: &Path) -> ImportResult<ImportOutcome> {
        if detect::detect_path(path) == Detection::NotMatched {
            return Ok(ImportOutcome::default());
        }

        // Detection and parsing are independent passes; the parser
        // reopens the file rather than sharing a cursor with the probe.
        let results = convert::parse_path(path)?;
        info!(path = %path.display(), songs = results.len(), "parsed legacy song document");

        Ok(self.persist(store, results))
    }

    /// Import all songs from an in-memory document into the store.
    pub fn import_bytes(&self, store: &dyn SongStore, bytes: &[u8]) -> ImportResult<ImportOutcome> {
        if detect::detect_bytes(bytes) == Detection::NotMatched {
            return Ok(ImportOutcome::default());
        }

        let results = convert::parse_bytes(bytes)?;
        Ok(self.persist(store, results))
    }

    fn persist(&self, store: &dyn SongStore, results: Vec<SongReadResult>) -> ImportOutcome {
        let mut outcome = ImportOutcome::default();

        for SongReadResult { song, warnings } in results {
            match store.upsert(&song) {
                Ok(updated) => {
                    if updated {
                        outcome.updated.push(song);
                    } else {
                        outcome.created.push(song);
                    }
                    outcome.warnings.extend(warnings);
                }
                Err(error) => {
                    outcome.errors.push(ImportItemError {
                        song_id: song.id,
                        song_name: song.name,
                        error,
                    });
                }
            }
        }

        outcome
    }

    /// Export a song to a writer. Unsupported for this format.
    pub fn export_to_writer<W: Write>(&self, _stream: W, _song: &Song) -> ImportResult<()> {
        Err(ImportError::ExportUnsupported)
    }

    /// Export a song to a file. Unsupported for this format.
    pub fn export_to_path(&self, _path: &Path, _song: &Song) -> ImportResult<()> {
        Err(ImportError::ExportUnsupported)
    }

    /// Export a song into an archive directory. Unsupported for this format.
    pub fn export_to_archive(&self, _archive: &Path, _song: &Song) -> ImportResult<()> {
        Err(ImportError::ExportUnsupported)
    }
}

// =============================================================================
// Tests
// =============================================================================
