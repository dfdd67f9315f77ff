//! Error types for the song import pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`ParseError`] - Structural XML parse errors
//! - [`StoreError`] - Persistence layer errors
//! - [`ImportError`] - Top-level import orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Recoverable per-field defects (a malformed section index, for
//! example) are not errors: the converter applies a default and records
//! a warning string on the affected record instead.

use thiserror::Error;

// =============================================================================
// Parse Errors
// =============================================================================

/// Structural errors while parsing a legacy song document.
///
/// Any of these aborts the whole parse; no partial song list is
/// returned once one occurs.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read the source.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML (mismatched tags, truncated document, bad syntax).
    #[error("Malformed XML document: {0}")]
    Xml(#[from] quick_xml::Error),
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read or write the backing storage.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or deserialize a stored song.
    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The store refused the record.
    #[error("Store rejected song '{name}': {message}")]
    Rejected { name: String, message: String },
}

// =============================================================================
// Import Errors (top-level)
// =============================================================================

/// Top-level import orchestration errors.
///
/// This is the main error type returned by
/// [`crate::import::Praisenter2Format::import`]. A per-song persistence
/// failure is not one of these: it is captured in the outcome's error
/// bucket and the batch continues.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Failed to read the source file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The document matched the format signature but failed to parse.
    #[error("Invalid Praisenter 2 song document: {0}")]
    InvalidFormat(#[from] ParseError),

    /// Export to the legacy format is not supported, in any form.
    #[error("Export to the Praisenter 2 song format is not supported")]
    ExportUnsupported,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for parse operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ParseError -> ImportError
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated");
        let xml_err = quick_xml::Error::Io(std::sync::Arc::new(io));
        let parse_err: ParseError = xml_err.into();
        let import_err: ImportError = parse_err.into();
        assert!(import_err.to_string().contains("Invalid Praisenter 2"));

        // io::Error -> StoreError
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let store_err: StoreError = io_err.into();
        assert!(store_err.to_string().contains("gone"));
    }

    #[test]
    fn test_export_unsupported_message() {
        let err = ImportError::ExportUnsupported;
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_rejected_format() {
        let err = StoreError::Rejected {
            name: "Amazing Grace".into(),
            message: "duplicate key".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Amazing Grace"));
        assert!(msg.contains("duplicate key"));
    }
}
