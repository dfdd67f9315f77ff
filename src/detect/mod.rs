//! Signature detection for the Praisenter 2 song format.
//!
//! Peeks at a document to determine whether it is the legacy format:
//! the first element (after skipping any preamble) must be named
//! `Songs`, case-insensitively, carrying a `Version` attribute with the
//! exact value `2.0.0`. Detection never fails: non-XML or truncated
//! input simply does not match, the underlying cause discarded except
//! for a debug log line.
//!
//! quick-xml performs no DTD loading and no external-entity resolution,
//! so probing untrusted input cannot trigger entity-expansion or
//! exfiltration attacks.
//!
//! Detection and the subsequent full parse are independent passes over
//! the source: [`detect_path`] opens its own handle and never shares a
//! cursor with [`crate::convert`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

/// Exact version marker of the supported legacy schema.
const LEGACY_VERSION: &[u8] = b"2.0.0";

/// Outcome of a format probe.
///
/// An explicit variant rather than a `Result`: a non-matching file is
/// not a failure, and the probe never propagates the parse error it may
/// have hit along the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// The document is the legacy song format.
    Matched,
    /// The document is something else (including invalid XML).
    NotMatched,
}

impl Detection {
    /// True when the probe matched.
    pub fn is_match(&self) -> bool {
        matches!(self, Detection::Matched)
    }
}

/// Probe a file on disk.
pub fn detect_path(path: &Path) -> Detection {
    match File::open(path) {
        Ok(file) => detect_reader(BufReader::new(file)),
        Err(err) => {
            debug!(path = %path.display(), %err, "failed to open file for detection");
            Detection::NotMatched
        }
    }
}

/// Probe an in-memory document.
pub fn detect_bytes(bytes: &[u8]) -> Detection {
    detect_reader(bytes)
}

/// Probe a readable source.
///
/// Consumes events only as far as the first start element before
/// deciding; the rest of the document is never read.
pub fn detect_reader<R: BufRead>(reader: R) -> Detection {
    let mut xml = Reader::from_reader(reader);
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            // The root element decides, whether self-closing or not.
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => return root_matches(e),
            Ok(Event::Eof) => return Detection::NotMatched,
            // Preamble: XML declaration, comments, doctype, whitespace.
            Ok(_) => {}
            Err(err) => {
                debug!(%err, "failed to read the source as an XML document");
                return Detection::NotMatched;
            }
        }
        buf.clear();
    }
}

/// Element name `songs` (any casing) with attribute `Version="2.0.0"`.
/// The attribute name and value are case-sensitive.
fn root_matches(e: &BytesStart) -> Detection {
    if !e.local_name().as_ref().eq_ignore_ascii_case(b"songs") {
        return Detection::NotMatched;
    }
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"Version" && attr.value.as_ref() == LEGACY_VERSION {
            return Detection::Matched;
        }
    }
    Detection::NotMatched
}
