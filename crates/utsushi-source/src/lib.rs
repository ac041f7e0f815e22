//! Source-file layer for utsushi.
//!
//! Everything that touches JSX/TSX text lives here:
//!
//! | Module | Role |
//! |--------|------|
//! | [`files`] | [`SourceFiles`] seam: memory and local-disk backends |
//! | [`queue`] | per-path write serialization |
//! | [`jsx`] | JSX structure over tree-sitter TSX: element spans, attributes, oids |
//! | [`diff`] | Code Diff Applier: full text, search/replace and oid blocks |
//! | [`codegen`] | direct-manipulation edits keyed by `data-oid` |
//! | [`sync`] | [`SourceSync`]: actions in, files out |
//!
//! ```text
//! ┌──────────────┐  Action   ┌────────────┐  edits   ┌───────────┐
//! │ ActionRunner │ ────────▶ │ SourceSync │ ───────▶ │  codegen  │
//! └──────────────┘           └─────┬──────┘          └───────────┘
//!                                  │ lock / read / write
//!                           ┌──────▼──────┐
//!                           │ SourceFiles │
//!                           └─────────────┘
//! ```

pub mod codegen;
pub mod diff;
pub mod error;
pub mod files;
pub mod jsx;
pub mod queue;
pub mod sync;

pub use diff::{
    DiffApplier, JsxSyntaxCheck, OidBlock, ProposedChange, SearchReplace, SyntaxCheck,
    apply_code_diff, apply_diff,
};
pub use error::{DiffError, SourceError, SourceResult};
pub use files::{LocalSourceFiles, MemorySourceFiles, SOURCE_EXTENSIONS, SourceFiles};
pub use queue::{DEFAULT_WRITE_LOCK_TIMEOUT, PathGuard, WriteQueue};
pub use sync::{SourceSync, TemplateNode};
