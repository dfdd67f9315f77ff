//! Domain models for the song import pipeline.
//!
//! This module contains the core data structures used throughout the
//! import path:
//!
//! - [`Song`] - Root aggregate: lyrics sets plus library metadata
//! - [`Lyrics`] - One language/version of a song's words
//! - [`Section`] - One verse/chorus/bridge block
//! - [`SectionKind`] - Canonical section classification
//! - [`SongReadResult`] - A converted song plus its field-level warnings

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name used when a song carries no usable title anywhere.
pub const UNTITLED: &str = "Untitled";

// =============================================================================
// Section Kind
// =============================================================================

/// Classification of a lyrics section.
///
/// The legacy format stores free-form keywords (`VERSE`, `CHORUS`, ...);
/// the internal model keeps a one-character canonical code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SectionKind {
    /// Verse (v)
    Verse,
    /// Pre-chorus (p)
    Prechorus,
    /// Chorus (c)
    Chorus,
    /// Bridge (b)
    Bridge,
    /// Tag (t)
    Tag,
    /// Ending (e) - the legacy VAMP and END keywords both land here
    Ending,
    /// Anything else (o)
    #[default]
    Other,
}

impl SectionKind {
    /// Map a legacy classification keyword to a kind.
    ///
    /// Matching is case-sensitive and exact; anything unrecognized
    /// (including an absent attribute) falls back to [`SectionKind::Other`].
    /// Unmapped input is never an error.
    pub fn from_legacy(keyword: &str) -> Self {
        match keyword {
            "VERSE" => Self::Verse,
            "PRECHORUS" => Self::Prechorus,
            "CHORUS" => Self::Chorus,
            "BRIDGE" => Self::Bridge,
            "TAG" => Self::Tag,
            "VAMP" => Self::Ending,
            "END" => Self::Ending,
            _ => Self::Other,
        }
    }

    /// The one-character canonical code.
    pub fn code(&self) -> char {
        match self {
            Self::Verse => 'v',
            Self::Prechorus => 'p',
            Self::Chorus => 'c',
            Self::Bridge => 'b',
            Self::Tag => 't',
            Self::Ending => 'e',
            Self::Other => 'o',
        }
    }
}

// =============================================================================
// Section
// =============================================================================

/// One verse/chorus/bridge block of a song's lyrics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    /// Composite name: kind code followed by the ordinal (`v1`, `c2`, ...).
    pub name: String,
    /// Body text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Section {
    /// Create a section with its composite name fixed from kind + ordinal.
    pub fn new(kind: SectionKind, number: i32) -> Self {
        Self {
            name: format!("{}{}", kind.code(), number),
            text: None,
        }
    }
}

// =============================================================================
// Lyrics
// =============================================================================

/// One complete set of sections + title for a song.
///
/// The legacy format has no concept of multiple lyric sets, so the
/// converter always produces exactly one per song and marks it primary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lyrics {
    /// Unique identifier.
    pub id: Uuid,
    /// Title of this lyric set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Ordered sections.
    pub sections: Vec<Section>,
}

impl Lyrics {
    /// Create an empty lyrics set with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            title: None,
            sections: Vec::new(),
        }
    }
}

impl Default for Lyrics {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Song
// =============================================================================

/// Root aggregate: a song with its lyric sets and library metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Song {
    /// Unique identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-text notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Lyric sets, in insertion order.
    pub lyrics: Vec<Lyrics>,
    /// Identity of the primary (default/display) lyrics.
    pub primary_lyrics: Uuid,
}

impl Song {
    /// Create an empty song holding a single lyrics set, already marked
    /// primary. A converted song always has at least one lyrics set and
    /// a primary reference pointing at one of them.
    pub fn new() -> Self {
        let lyrics = Lyrics::new();
        let primary_lyrics = lyrics.id;
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            notes: None,
            lyrics: vec![lyrics],
            primary_lyrics,
        }
    }

    /// The lyrics set referenced as primary, if present.
    pub fn primary_lyrics(&self) -> Option<&Lyrics> {
        self.lyrics.iter().find(|l| l.id == self.primary_lyrics)
    }

    /// Mutable access to the primary lyrics set.
    pub fn primary_lyrics_mut(&mut self) -> Option<&mut Lyrics> {
        let id = self.primary_lyrics;
        self.lyrics.iter_mut().find(|l| l.id == id)
    }

    /// Derive a display title: the primary lyrics' title if set, else
    /// the first lyrics carrying a title, else [`UNTITLED`].
    pub fn default_title(&self) -> String {
        if let Some(title) = self.primary_lyrics().and_then(|l| l.title.as_deref()) {
            return title.to_string();
        }
        self.lyrics
            .iter()
            .find_map(|l| l.title.as_deref())
            .unwrap_or(UNTITLED)
            .to_string()
    }
}

impl Default for Song {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Read Result
// =============================================================================

/// A converted song plus the non-fatal warnings collected while
/// converting it. Warnings stay attached to the record that produced
/// them; they are never folded into a batch-level failure.
#[derive(Debug, Clone)]
pub struct SongReadResult {
    /// The converted song.
    pub song: Song,
    /// Field-level warnings (defaults applied during conversion).
    pub warnings: Vec<String>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_kind_mapping_table() {
        assert_eq!(SectionKind::from_legacy("VERSE").code(), 'v');
        assert_eq!(SectionKind::from_legacy("PRECHORUS").code(), 'p');
        assert_eq!(SectionKind::from_legacy("CHORUS").code(), 'c');
        assert_eq!(SectionKind::from_legacy("BRIDGE").code(), 'b');
        assert_eq!(SectionKind::from_legacy("TAG").code(), 't');
        assert_eq!(SectionKind::from_legacy("VAMP").code(), 'e');
        assert_eq!(SectionKind::from_legacy("END").code(), 'e');
    }

    #[test]
    fn test_section_kind_fallback() {
        assert_eq!(SectionKind::from_legacy("INTRO").code(), 'o');
        assert_eq!(SectionKind::from_legacy("").code(), 'o');
        // case-sensitive: lowercase keywords are not recognized
        assert_eq!(SectionKind::from_legacy("verse").code(), 'o');
        assert_eq!(SectionKind::from_legacy("Chorus").code(), 'o');
    }

    #[test]
    fn test_section_composite_name() {
        assert_eq!(Section::new(SectionKind::Verse, 1).name, "v1");
        assert_eq!(Section::new(SectionKind::Chorus, 3).name, "c3");
        assert_eq!(Section::new(SectionKind::Other, 12).name, "o12");
    }

    #[test]
    fn test_new_song_invariant() {
        let song = Song::new();
        assert_eq!(song.lyrics.len(), 1);
        assert_eq!(song.primary_lyrics, song.lyrics[0].id);
        assert!(song.primary_lyrics().is_some());
    }

    #[test]
    fn test_default_title_prefers_primary() {
        let mut song = Song::new();
        song.primary_lyrics_mut().unwrap().title = Some("Be Thou My Vision".into());
        assert_eq!(song.default_title(), "Be Thou My Vision");
    }

    #[test]
    fn test_default_title_falls_back_to_first_titled() {
        let mut song = Song::new();
        let mut extra = Lyrics::new();
        extra.title = Some("Segundo".into());
        song.lyrics.push(extra);
        // primary has no title, the second set does
        assert_eq!(song.default_title(), "Segundo");
    }

    #[test]
    fn test_default_title_untitled() {
        let song = Song::new();
        assert_eq!(song.default_title(), UNTITLED);
    }

    #[test]
    fn test_song_serialization() {
        let mut song = Song::new();
        song.name = "Test Song".into();
        song.primary_lyrics_mut().unwrap().title = Some("Test Song".into());
        let json = serde_json::to_string(&song).unwrap();
        assert!(json.contains("Test Song"));
        let back: Song = serde_json::from_str(&json).unwrap();
        assert_eq!(back, song);
    }
}
