//! Error taxonomy shared by every utsushi crate.
//!
//! Subsystem crates keep their own error enums for detail and convert into
//! [`EditorError`] at the runner boundary. [`ErrorKind`] is the coarse,
//! serializable classification callers branch on.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::element::ActionTarget;
use crate::ids::FrameId;

/// Coarse error classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "PascalCase")]
pub enum ErrorKind {
    ElementNotFound,
    CrossSurfaceTarget,
    InvalidGroupSelection,
    DiffAnchorMissing,
    SyntaxInvalid,
    SurfaceBusy,
    WriteConflict,
    SurfaceIo,
    SourceIo,
    RollbackFailed,
    InvalidAction,
}

impl ErrorKind {
    /// Recoverable without user involvement: retry, queue, or drop and re-select.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ErrorKind::SurfaceBusy | ErrorKind::ElementNotFound)
    }

    /// The requested edit cannot be applied safely; tell the user.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidGroupSelection
                | ErrorKind::DiffAnchorMissing
                | ErrorKind::SyntaxInvalid
                | ErrorKind::RollbackFailed
        )
    }
}

/// Errors surfaced by the action engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    /// Target could not be resolved on its surface.
    #[error("element not found: {target}")]
    ElementNotFound { target: String },

    /// A batch action addressed more than one render surface.
    #[error("action targets span surfaces: expected {expected}, found {found}")]
    CrossSurfaceTarget { expected: FrameId, found: FrameId },

    /// Selection cannot be grouped or ungrouped.
    #[error("invalid group selection: {0}")]
    InvalidGroupSelection(String),

    /// Diff anchor could not be located uniquely in current file content.
    #[error("diff anchor {reason} in {path}: {anchor:?}")]
    DiffAnchorMissing {
        path: String,
        anchor: String,
        reason: String,
    },

    /// Resulting source text failed to parse.
    #[error("edit would leave {path} unparseable: {reason}")]
    SyntaxInvalid { path: String, reason: String },

    /// Another action is in flight on this surface.
    #[error("surface {0} is busy")]
    SurfaceBusy(FrameId),

    /// Two writers raced on one file path.
    #[error("write conflict on {path}")]
    WriteConflict { path: String },

    /// A surface call failed or timed out; surface state is unknown.
    #[error("surface {frame} call failed: {reason}")]
    SurfaceIo { frame: FrameId, reason: String },

    /// The source-file layer failed.
    #[error("source I/O failed for {path}: {reason}")]
    SourceIo { path: String, reason: String },

    /// Compensation after a partial apply failed; surface and source may diverge.
    #[error("rollback failed after {cause}: {reason}")]
    RollbackFailed { cause: Box<EditorError>, reason: String },

    /// Malformed action.
    #[error("invalid action: {0}")]
    InvalidAction(String),
}

impl EditorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EditorError::ElementNotFound { .. } => ErrorKind::ElementNotFound,
            EditorError::CrossSurfaceTarget { .. } => ErrorKind::CrossSurfaceTarget,
            EditorError::InvalidGroupSelection(_) => ErrorKind::InvalidGroupSelection,
            EditorError::DiffAnchorMissing { .. } => ErrorKind::DiffAnchorMissing,
            EditorError::SyntaxInvalid { .. } => ErrorKind::SyntaxInvalid,
            EditorError::SurfaceBusy(_) => ErrorKind::SurfaceBusy,
            EditorError::WriteConflict { .. } => ErrorKind::WriteConflict,
            EditorError::SurfaceIo { .. } => ErrorKind::SurfaceIo,
            EditorError::SourceIo { .. } => ErrorKind::SourceIo,
            EditorError::RollbackFailed { .. } => ErrorKind::RollbackFailed,
            EditorError::InvalidAction(_) => ErrorKind::InvalidAction,
        }
    }

    /// Create an ElementNotFound error.
    pub fn not_found(target: &ActionTarget) -> Self {
        Self::ElementNotFound {
            target: target.to_string(),
        }
    }

    /// Create an InvalidGroupSelection error.
    pub fn invalid_group(reason: impl Into<String>) -> Self {
        Self::InvalidGroupSelection(reason.into())
    }

    /// Create a DiffAnchorMissing error.
    pub fn anchor_missing(
        path: impl Into<String>,
        anchor: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::DiffAnchorMissing {
            path: path.into(),
            anchor: anchor.into(),
            reason: reason.into(),
        }
    }

    /// Create a SyntaxInvalid error.
    pub fn syntax(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SyntaxInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SurfaceIo error.
    pub fn surface_io(frame: &FrameId, reason: impl Into<String>) -> Self {
        Self::SurfaceIo {
            frame: frame.clone(),
            reason: reason.into(),
        }
    }

    /// Create a SourceIo error.
    pub fn source_io(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceIo {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidAction error.
    pub fn invalid_action(reason: impl Into<String>) -> Self {
        Self::InvalidAction(reason.into())
    }

    /// Wrap this error as the cause of a failed rollback.
    pub fn rollback_failed(self, reason: impl Into<String>) -> Self {
        Self::RollbackFailed {
            cause: Box::new(self),
            reason: reason.into(),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EditorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::DomId;

    #[test]
    fn test_kind_classification() {
        assert!(ErrorKind::SurfaceBusy.is_recoverable());
        assert!(ErrorKind::ElementNotFound.is_recoverable());
        assert!(!ErrorKind::SyntaxInvalid.is_recoverable());
        assert!(ErrorKind::DiffAnchorMissing.is_user_facing());
        assert!(!ErrorKind::SurfaceBusy.is_user_facing());
    }

    #[test]
    fn test_error_messages() {
        let target = ActionTarget::new(FrameId::from("frame-1"), DomId::from("odid-x"), None);
        let err = EditorError::not_found(&target);
        assert_eq!(err.kind(), ErrorKind::ElementNotFound);
        assert!(err.to_string().contains("odid-x"));

        let err = EditorError::anchor_missing("app/page.tsx", "<div>", "not found");
        assert!(err.to_string().contains("app/page.tsx"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_rollback_wrapping_keeps_cause() {
        let inner = EditorError::syntax("a.tsx", "unbalanced }");
        let wrapped = inner.clone().rollback_failed("surface timed out");
        assert_eq!(wrapped.kind(), ErrorKind::RollbackFailed);
        match wrapped {
            EditorError::RollbackFailed { cause, .. } => assert_eq!(*cause, inner),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_kind_string_roundtrip() {
        assert_eq!(ErrorKind::WriteConflict.to_string(), "WriteConflict");
        assert_eq!("SurfaceBusy".parse::<ErrorKind>().unwrap(), ErrorKind::SurfaceBusy);
    }
}
