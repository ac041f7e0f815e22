//! Surface-layer error types.

use std::time::Duration;

use thiserror::Error;
use utsushi_types::{EditorError, FrameId};

/// Failure of one render-surface call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    /// No element with this dom id.
    #[error("no element {0}")]
    NotFound(String),

    /// The surface refused an operation that cannot apply to its tree.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The call did not finish in time. Surface state is unknown.
    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    /// The surface could not be reached.
    #[error("surface unavailable: {0}")]
    Unavailable(String),

    /// A snapshot could not be read.
    #[error("bad snapshot: {0}")]
    Snapshot(String),
}

impl SurfaceError {
    /// Create a NotFound error.
    pub fn not_found(dom_id: impl std::fmt::Display) -> Self {
        Self::NotFound(dom_id.to_string())
    }

    /// Create an InvalidOperation error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidOperation(reason.into())
    }

    /// Create an Unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// Whether the surface may have changed in ways the caller cannot see.
    pub fn leaves_state_unknown(&self) -> bool {
        matches!(self, SurfaceError::Timeout { .. } | SurfaceError::Unavailable(_))
    }

    /// Lift into the engine taxonomy for the given surface.
    pub fn on(self, frame: &FrameId) -> EditorError {
        match self {
            SurfaceError::NotFound(dom_id) => EditorError::ElementNotFound {
                target: format!("{frame}/{dom_id}"),
            },
            SurfaceError::InvalidOperation(reason) => EditorError::invalid_action(reason),
            other => EditorError::surface_io(frame, other.to_string()),
        }
    }
}

/// Surface-layer result type.
pub type SurfaceResult<T> = Result<T, SurfaceError>;
