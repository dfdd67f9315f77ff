//! Conversion state machine for the Praisenter 2 song format.
//!
//! Consumes quick-xml events and incrementally rebuilds the nested
//! Song -> Lyrics -> Section model from the flat stream of start/text/end
//! events:
//!
//! ```text
//! <Songs>              container only
//!   <Song>             new Song + its single primary Lyrics
//!     <Part Type Index>  new Section, composite name fixed at open
//!       <Text>...        section body
//!     <Title>...         lyrics title (newlines collapsed)
//!     <Notes>...         song notes (newlines preserved)
//! ```
//!
//! The original callback-and-shared-fields shape is re-expressed as an
//! explicit parse state plus a stack of in-progress frames owned by the
//! machine, so no call-order invariant rests on convention.
//!
//! Failure policy: a malformed section index is non-fatal (default 1,
//! warning recorded on the song under construction); structurally
//! malformed XML aborts the whole parse with a
//! [`ParseError`](crate::error::ParseError) and no partial song list.
//!
//! As in [`crate::detect`], quick-xml resolves no external entities and
//! loads no DTDs, so parsing untrusted input is safe by construction.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use tracing::warn;

use crate::error::ParseResult;
use crate::models::{Section, SectionKind, Song, SongReadResult};

/// A CR/LF run, plus any whitespace it drags along, collapses to one
/// space in titles.
static LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n\s*").expect("hardcoded regex"));

// =============================================================================
// Parse state
// =============================================================================

/// Song-level leaf elements that carry character data. The part-level
/// leaf (`Text`) has its own state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeafField {
    Title,
    Notes,
}

/// Where the machine currently is in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Initial/terminal: before, between, or after `<Song>` elements.
    Outside,
    /// Inside `<Song>`, no leaf open.
    InSong,
    /// Inside a song-level leaf (`Title` or `Notes`).
    InSongField(LeafField),
    /// Inside `<Part>`, no leaf open.
    InPart,
    /// Inside `<Text>` within a part.
    InPartField,
}

/// The song being assembled, together with its warnings. The lyrics
/// set lives inside the song from the start (already marked primary);
/// the section under construction is a separate frame.
struct SongFrame {
    song: Song,
    warnings: Vec<String>,
}

// =============================================================================
// Entry points
// =============================================================================

/// Parse a legacy song file into read results.
pub fn parse_path(path: &Path) -> ParseResult<Vec<SongReadResult>> {
    let file = File::open(path)?;
    parse_reader(BufReader::new(file))
}

/// Parse an in-memory legacy song document.
pub fn parse_bytes(bytes: &[u8]) -> ParseResult<Vec<SongReadResult>> {
    parse_reader(bytes)
}

/// Parse a readable source into read results, one per `<Song>`.
///
/// Strictly sequential: events are consumed in document order and the
/// machine assumes in-order delivery from the tokenizer.
pub fn parse_reader<R: BufRead>(reader: R) -> ParseResult<Vec<SongReadResult>> {
    let mut xml = Reader::from_reader(reader);
    // Mismatched end tags are a structural fault, not something to skip.
    xml.config_mut().check_end_names = true;

    let mut buf = Vec::with_capacity(4096);
    let mut machine = Machine::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(ref e) => machine.open(e),
            Event::Empty(ref e) => machine.open_close(e),
            Event::Text(ref e) => machine.text(e),
            Event::CData(ref e) => machine.text(e),
            Event::End(ref e) => machine.close(e.local_name().as_ref()),
            _ => {}
        }
        buf.clear();
    }

    Ok(machine.finish())
}

// =============================================================================
// State machine
// =============================================================================

struct Machine {
    state: State,
    /// Song under construction, if any.
    frame: Option<SongFrame>,
    /// Section under construction, if any.
    section: Option<Section>,
    /// Character accumulation buffer, scoped to the innermost open leaf.
    /// Created lazily on first character data so a self-terminating leaf
    /// (no text event at all) leaves the field unset.
    data: Option<String>,
    results: Vec<SongReadResult>,
}

impl Machine {
    fn new() -> Self {
        Self {
            state: State::Outside,
            frame: None,
            section: None,
            data: None,
            results: Vec::new(),
        }
    }

    fn finish(self) -> Vec<SongReadResult> {
        self.results
    }

    /// Start-element transition. Tag names match case-insensitively.
    fn open(&mut self, e: &BytesStart) {
        let name = e.local_name();
        let name = name.as_ref();

        if name.eq_ignore_ascii_case(b"Song") && self.state == State::Outside {
            self.frame = Some(SongFrame {
                song: Song::new(),
                warnings: Vec::new(),
            });
            self.state = State::InSong;
        } else if name.eq_ignore_ascii_case(b"Part") && self.state == State::InSong {
            self.section = Some(self.open_section(e));
            self.state = State::InPart;
        } else if name.eq_ignore_ascii_case(b"Title") && self.state == State::InSong {
            self.state = State::InSongField(LeafField::Title);
        } else if name.eq_ignore_ascii_case(b"Notes") && self.state == State::InSong {
            self.state = State::InSongField(LeafField::Notes);
        } else if name.eq_ignore_ascii_case(b"Text") && self.state == State::InPart {
            self.state = State::InPartField;
        }
        // <Songs> and anything unrecognized: container/no-op. Unknown
        // elements do not disturb the active buffer.
    }

    /// Self-terminating element: open and close in one step. A
    /// `<Part/>` still appends its (empty) section; a self-terminating
    /// leaf fires no text event, so its field stays unset.
    fn open_close(&mut self, e: &BytesStart) {
        let name = e.local_name();
        let name = name.as_ref();

        if name.eq_ignore_ascii_case(b"Part") && self.state == State::InSong {
            let section = self.open_section(e);
            if let Some(lyrics) = self
                .frame
                .as_mut()
                .and_then(|f| f.song.primary_lyrics_mut())
            {
                lyrics.sections.push(section);
            }
        }
    }

    /// Allocate a section from `<Part>` attributes. The composite name
    /// is fixed here, independent of later content.
    fn open_section(&mut self, e: &BytesStart) -> Section {
        let mut kind = SectionKind::Other;
        let mut index_raw: Option<String> = None;

        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"Type" => kind = SectionKind::from_legacy(&String::from_utf8_lossy(&attr.value)),
                b"Index" => index_raw = Some(String::from_utf8_lossy(&attr.value).into_owned()),
                _ => {}
            }
        }

        let number = match index_raw.as_deref().map(str::parse::<i32>) {
            Some(Ok(n)) => n,
            _ => {
                let shown = index_raw.as_deref().unwrap_or("(missing)");
                warn!(index = shown, "failed to read section number, defaulting to 1");
                if let Some(frame) = self.frame.as_mut() {
                    frame
                        .warnings
                        .push(format!("Failed to read section number '{}', defaulted to 1", shown));
                }
                1
            }
        };

        Section::new(kind, number)
    }

    /// Character data: append to the buffer when a leaf is open. One
    /// logical value may arrive as several fragments; they are
    /// concatenated here and only interpreted at close.
    fn text(&mut self, raw: &[u8]) {
        match self.state {
            State::InSongField(_) | State::InPartField => {
                self.data
                    .get_or_insert_with(String::new)
                    .push_str(&String::from_utf8_lossy(raw));
            }
            // Whitespace between structural tags.
            _ => {}
        }
    }

    /// End-element transition.
    fn close(&mut self, name: &[u8]) {
        if name.eq_ignore_ascii_case(b"Song") && self.state == State::InSong {
            if let Some(SongFrame { mut song, warnings }) = self.frame.take() {
                song.name = song.default_title();
                self.results.push(SongReadResult { song, warnings });
            }
            self.state = State::Outside;
        } else if name.eq_ignore_ascii_case(b"Part") && self.state == State::InPart {
            if let Some(section) = self.section.take() {
                if let Some(lyrics) = self
                    .frame
                    .as_mut()
                    .and_then(|f| f.song.primary_lyrics_mut())
                {
                    lyrics.sections.push(section);
                }
            }
            self.state = State::InSong;
        } else if name.eq_ignore_ascii_case(b"Title")
            && self.state == State::InSongField(LeafField::Title)
        {
            if let Some(data) = self.data.take() {
                let title = LINE_BREAKS
                    .replace_all(unescape_field(&data).trim(), " ")
                    .into_owned();
                if let Some(lyrics) = self
                    .frame
                    .as_mut()
                    .and_then(|f| f.song.primary_lyrics_mut())
                {
                    lyrics.title = Some(title);
                }
            }
            self.state = State::InSong;
        } else if name.eq_ignore_ascii_case(b"Notes")
            && self.state == State::InSongField(LeafField::Notes)
        {
            if let Some(data) = self.data.take() {
                if let Some(frame) = self.frame.as_mut() {
                    // Multi-line notes are preserved verbatim apart from trimming.
                    frame.song.notes = Some(unescape_field(&data).trim().to_string());
                }
            }
            self.state = State::InSong;
        } else if name.eq_ignore_ascii_case(b"Text") && self.state == State::InPartField {
            if let Some(data) = self.data.take() {
                if let Some(section) = self.section.as_mut() {
                    section.text = Some(unescape_field(&data).trim().to_string());
                }
            }
            self.state = State::InPart;
        }
    }
}

/// Unescape XML entities in an accumulated field. Legacy files
/// occasionally carry stray ampersands; those are kept as-is rather
/// than failing the record.
fn unescape_field(raw: &str) -> String {
    match quick_xml::escape::unescape(raw) {
        Ok(s) => s.into_owned(),
        Err(_) => raw.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(doc: &str) -> SongReadResult {
        let mut results = parse_bytes(doc.as_bytes()).unwrap();
        assert_eq!(results.len(), 1);
        results.remove(0)
    }

    #[test]
    fn test_full_song() {
        let doc = r#"<Songs Version="2.0.0">
  <Song>
    <Part Type="VERSE" Index="1">
      <Text>Amazing grace, how sweet the sound</Text>
    </Part>
    <Part Type="CHORUS" Index="1">
      <Text>Praise God</Text>
    </Part>
    <Title>Amazing Grace</Title>
    <Notes>Public domain</Notes>
  </Song>
</Songs>"#;

        let result = parse_one(doc);
        assert!(result.warnings.is_empty());

        let song = result.song;
        assert_eq!(song.name, "Amazing Grace");
        assert_eq!(song.notes.as_deref(), Some("Public domain"));
        assert_eq!(song.lyrics.len(), 1);
        assert_eq!(song.primary_lyrics, song.lyrics[0].id);

        let lyrics = song.primary_lyrics().unwrap();
        assert_eq!(lyrics.title.as_deref(), Some("Amazing Grace"));
        assert_eq!(lyrics.sections.len(), 2);
        assert_eq!(lyrics.sections[0].name, "v1");
        assert_eq!(
            lyrics.sections[0].text.as_deref(),
            Some("Amazing grace, how sweet the sound")
        );
        assert_eq!(lyrics.sections[1].name, "c1");
    }

    #[test]
    fn test_multiple_songs() {
        let doc = r#"<Songs Version="2.0.0">
  <Song><Title>First</Title></Song>
  <Song><Title>Second</Title></Song>
  <Song><Title>Third</Title></Song>
</Songs>"#;
        let results = parse_bytes(doc.as_bytes()).unwrap();
        let names: Vec<_> = results.iter().map(|r| r.song.name.as_str()).collect();
        assert_eq!(names, ["First", "Second", "Third"]);
    }

    #[test]
    fn test_section_index_kept() {
        let doc = r#"<Songs Version="2.0.0"><Song>
  <Part Type="VERSE" Index="3"><Text>x</Text></Part>
</Song></Songs>"#;
        let result = parse_one(doc);
        assert_eq!(result.song.lyrics[0].sections[0].name, "v3");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_bad_index_defaults_with_warning() {
        let doc = r#"<Songs Version="2.0.0"><Song>
  <Part Type="VERSE" Index="abc"><Text>x</Text></Part>
</Song></Songs>"#;
        let result = parse_one(doc);
        assert_eq!(result.song.lyrics[0].sections[0].name, "v1");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("abc"));
    }

    #[test]
    fn test_missing_index_defaults_with_warning() {
        let doc = r#"<Songs Version="2.0.0"><Song>
  <Part Type="CHORUS"><Text>x</Text></Part>
</Song></Songs>"#;
        let result = parse_one(doc);
        assert_eq!(result.song.lyrics[0].sections[0].name, "c1");
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_unknown_type_maps_to_other() {
        let doc = r#"<Songs Version="2.0.0"><Song>
  <Part Type="INTERLUDE" Index="2"><Text>x</Text></Part>
</Song></Songs>"#;
        let result = parse_one(doc);
        assert_eq!(result.song.lyrics[0].sections[0].name, "o2");
        // unmapped type is permissive, never a warning
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_title_newlines_collapse() {
        let doc = "<Songs Version=\"2.0.0\"><Song><Title>Line one\nLine two</Title></Song></Songs>";
        let result = parse_one(doc);
        assert_eq!(result.song.name, "Line one Line two");
    }

    #[test]
    fn test_title_crlf_collapse() {
        let doc =
            "<Songs Version=\"2.0.0\"><Song><Title>Line one\r\n   Line two</Title></Song></Songs>";
        let result = parse_one(doc);
        assert_eq!(result.song.name, "Line one Line two");
    }

    #[test]
    fn test_notes_newlines_preserved() {
        let doc =
            "<Songs Version=\"2.0.0\"><Song><Notes>Line one\nLine two</Notes></Song></Songs>";
        let result = parse_one(doc);
        assert_eq!(result.song.notes.as_deref(), Some("Line one\nLine two"));
    }

    #[test]
    fn test_entities_unescaped() {
        let doc = r#"<Songs Version="2.0.0"><Song><Title>Rock &amp; Roll</Title></Song></Songs>"#;
        let result = parse_one(doc);
        assert_eq!(result.song.name, "Rock & Roll");
    }

    #[test]
    fn test_self_terminating_title_leaves_unset() {
        let doc = r#"<Songs Version="2.0.0"><Song><Title/></Song></Songs>"#;
        let result = parse_one(doc);
        assert_eq!(result.song.lyrics[0].title, None);
        assert_eq!(result.song.name, crate::models::UNTITLED);
    }

    #[test]
    fn test_empty_title_leaves_unset() {
        let doc = r#"<Songs Version="2.0.0"><Song><Title></Title></Song></Songs>"#;
        let result = parse_one(doc);
        assert_eq!(result.song.lyrics[0].title, None);
        assert_eq!(result.song.name, crate::models::UNTITLED);
    }

    #[test]
    fn test_self_terminating_part_appends_empty_section() {
        let doc = r#"<Songs Version="2.0.0"><Song><Part Type="VERSE" Index="2"/></Song></Songs>"#;
        let result = parse_one(doc);
        let sections = &result.song.lyrics[0].sections;
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "v2");
        assert_eq!(sections[0].text, None);
    }

    #[test]
    fn test_unknown_elements_ignored() {
        let doc = r#"<Songs Version="2.0.0"><Song>
  <Metadata><Author>Somebody</Author></Metadata>
  <Title>Kept</Title>
</Song></Songs>"#;
        let result = parse_one(doc);
        assert_eq!(result.song.name, "Kept");
    }

    #[test]
    fn test_tag_names_case_insensitive() {
        let doc = r#"<SONGS Version="2.0.0"><SONG><TITLE>Loud</TITLE></SONG></SONGS>"#;
        let result = parse_one(doc);
        assert_eq!(result.song.name, "Loud");
    }

    #[test]
    fn test_mismatched_tags_are_fatal() {
        let doc = r#"<Songs Version="2.0.0"><Song><Title>Broken</Notes></Song></Songs>"#;
        let err = parse_bytes(doc.as_bytes());
        assert!(err.is_err());
    }

    #[test]
    fn test_warnings_attach_to_their_song() {
        let doc = r#"<Songs Version="2.0.0">
  <Song><Part Type="VERSE" Index="bad"/><Title>One</Title></Song>
  <Song><Part Type="VERSE" Index="1"/><Title>Two</Title></Song>
</Songs>"#;
        let results = parse_bytes(doc.as_bytes()).unwrap();
        assert_eq!(results[0].warnings.len(), 1);
        assert!(results[1].warnings.is_empty());
    }

    #[test]
    fn test_cdata_body() {
        let doc = r#"<Songs Version="2.0.0"><Song>
  <Part Type="VERSE" Index="1"><Text><![CDATA[He > all]]></Text></Part>
</Song></Songs>"#;
        let result = parse_one(doc);
        assert_eq!(
            result.song.lyrics[0].sections[0].text.as_deref(),
            Some("He > all")
        );
    }
}
