//! Source-layer error types.

use std::io;

use thiserror::Error;
use utsushi_types::EditorError;

/// Failure to derive or splice a source edit, independent of any file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    /// The region a patch or edit addresses is absent or ambiguous.
    #[error("anchor {reason}: {anchor:?}")]
    AnchorMissing { anchor: String, reason: String },

    /// The text could not be scanned, before or after the edit.
    #[error("syntax invalid: {0}")]
    SyntaxInvalid(String),

    /// The proposed change itself is malformed.
    #[error("malformed patch: {0}")]
    Malformed(String),
}

impl DiffError {
    /// Create an AnchorMissing error.
    pub fn anchor(anchor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AnchorMissing {
            anchor: anchor.into(),
            reason: reason.into(),
        }
    }

    /// Create a SyntaxInvalid error.
    pub fn syntax(reason: impl Into<String>) -> Self {
        Self::SyntaxInvalid(reason.into())
    }

    /// Create a Malformed error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed(reason.into())
    }

    /// Attach the file path and lift into the engine taxonomy.
    pub fn at(self, path: &str) -> EditorError {
        match self {
            DiffError::AnchorMissing { anchor, reason } => {
                EditorError::anchor_missing(path, anchor, reason)
            }
            DiffError::SyntaxInvalid(reason) => EditorError::syntax(path, reason),
            DiffError::Malformed(reason) => {
                EditorError::invalid_action(format!("{path}: {reason}"))
            }
        }
    }
}

/// Source-file layer error.
#[derive(Debug, Error)]
pub enum SourceError {
    /// File does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// No file contains a node with this oid.
    #[error("no source node for oid {0}")]
    OidNotFound(String),

    /// Path escapes the project root.
    #[error("path escapes root: {0}")]
    PathEscapesRoot(String),

    /// Could not take the per-path write lock in time.
    #[error("write conflict on {0}")]
    WriteConflict(String),

    /// The backend refused the write.
    #[error("write rejected: {0}")]
    WriteRejected(String),

    /// Edit could not be derived for this file.
    #[error("{path}: {source}")]
    Diff {
        path: String,
        #[source]
        source: DiffError,
    },

    /// I/O error.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl SourceError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an OidNotFound error.
    pub fn oid_not_found(oid: impl Into<String>) -> Self {
        Self::OidNotFound(oid.into())
    }

    /// Create a Diff error.
    pub fn diff(path: impl Into<String>, source: DiffError) -> Self {
        Self::Diff {
            path: path.into(),
            source,
        }
    }

    /// Create an Io error.
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<SourceError> for EditorError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::OidNotFound(oid) => EditorError::ElementNotFound {
                target: format!("oid {oid}"),
            },
            SourceError::WriteConflict(path) => EditorError::WriteConflict { path },
            SourceError::Diff { path, source } => source.at(&path),
            SourceError::NotFound(path) => EditorError::source_io(path, "not found"),
            SourceError::PathEscapesRoot(path) => {
                EditorError::source_io(path, "path escapes root")
            }
            SourceError::WriteRejected(path) => EditorError::source_io(path, "write rejected"),
            SourceError::Io { path, source } => EditorError::source_io(path, source.to_string()),
        }
    }
}

/// Source-layer result type.
pub type SourceResult<T> = Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use utsushi_types::ErrorKind;

    #[test]
    fn test_diff_error_lifts_with_path() {
        let err = DiffError::anchor("<div>", "not found").at("app/page.tsx");
        assert_eq!(err.kind(), ErrorKind::DiffAnchorMissing);
        assert!(err.to_string().contains("app/page.tsx"));

        let err = DiffError::syntax("unclosed <div>").at("a.tsx");
        assert_eq!(err.kind(), ErrorKind::SyntaxInvalid);
    }

    #[test]
    fn test_source_error_conversion() {
        let err: EditorError = SourceError::WriteConflict("a.tsx".into()).into();
        assert_eq!(err.kind(), ErrorKind::WriteConflict);

        let err: EditorError = SourceError::oid_not_found("abc").into();
        assert_eq!(err.kind(), ErrorKind::ElementNotFound);

        let err: EditorError =
            SourceError::io("a.tsx", io::Error::other("disk on fire")).into();
        assert_eq!(err.kind(), ErrorKind::SourceIo);
        assert!(err.to_string().contains("disk on fire"));
    }
}
