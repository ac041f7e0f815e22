//! Action engine for utsushi.
//!
//! ```text
//!   managers (group, copy, insert, drag, text, style)
//!        │ Selection / targets
//!        ▼
//!   ActionRunner ──▶ SurfaceAdapter (per frame, serialized)
//!        │       ──▶ SourceSync (per path, serialized)
//!        ▼
//!   HistoryManager (undo / redo / transactions)
//! ```
//!
//! All state hangs off one [`EditorSession`]; [`Editor`] bundles the runner
//! and the managers over it.

pub mod config;
pub mod editor;
pub mod history;
pub mod managers;
pub mod runner;
pub mod selection;
pub mod session;

pub use config::{BusyPolicy, ConfigError, EngineConfig};
pub use editor::Editor;
pub use history::{EntryStatus, HistoryEntry, HistoryManager};
pub use managers::{
    CopyManager, Direction, DragManager, GroupManager, InsertManager, StyleManager, TextManager,
    can_group, can_ungroup,
};
pub use runner::ActionRunner;
pub use selection::Selection;
pub use session::EditorSession;
