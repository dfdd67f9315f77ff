//! # Songload - legacy song XML import
//!
//! Songload converts Praisenter 2 song documents (`<Songs Version="2.0.0">`)
//! into the internal song model and merges them into a song store under
//! create/update/error semantics.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  XML File   │────▶│   Detect    │────▶│   Convert   │────▶│   Upsert    │
//! │  (legacy)   │     │ (signature) │     │ (state      │     │ (created/   │
//! └─────────────┘     └─────────────┘     │  machine)   │     │  updated)   │
//!                                         └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use songload::{MemoryStore, Praisenter2Format};
//!
//! let store = MemoryStore::new();
//! let outcome = Praisenter2Format.import(&store, "songs.xml".as_ref())?;
//! println!("created {}, updated {}", outcome.created.len(), outcome.updated.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain model (Song, Lyrics, Section)
//! - [`detect`] - Format signature detection
//! - [`convert`] - Element-event conversion state machine
//! - [`store`] - Persistence adapters
//! - [`import`] - Import orchestration and the (rejecting) export surface

// Core modules
pub mod error;
pub mod models;

// Detection
pub mod detect;

// Conversion
pub mod convert;

// Persistence
pub mod store;

// Orchestration
pub mod import;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ImportError, ParseError, StoreError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Lyrics, Section, SectionKind, Song, SongReadResult, UNTITLED};

// =============================================================================
// Re-exports - Detection
// =============================================================================

pub use detect::{detect_bytes, detect_path, detect_reader, Detection};

// =============================================================================
// Re-exports - Conversion
// =============================================================================

pub use convert::{parse_bytes, parse_path, parse_reader};

// =============================================================================
// Re-exports - Store
// =============================================================================

pub use store::{FileStore, MemoryStore, SongStore, StoredSong};

// =============================================================================
// Re-exports - Import
// =============================================================================

pub use import::{ImportItemError, ImportOutcome, Praisenter2Format};
