//! Render-surface seam for utsushi.
//!
//! ```text
//!                 ┌──────────────────────────┐
//!   Action ──────▶│      SurfaceAdapter      │──────▶ Action (as applied)
//!                 │ ElementLocator │ drag    │
//!                 └────────────┬─────────────┘
//!                              │ dyn RenderSurface
//!                 ┌────────────┴─────────────┐
//!                 │ MemorySurface │ (remote) │
//!                 └──────────────────────────┘
//! ```
//!
//! |------------------|------------------------------------------------|
//! | Module           | Purpose                                        |
//! |------------------|------------------------------------------------|
//! | [`surface`]      | `RenderSurface` trait, the per-surface calls   |
//! | [`memory`]       | In-process surface with a box layout           |
//! | [`locator`]      | Targets to live elements, stale id fallback    |
//! | [`adapter`]      | Applies actions, owns per-element edit state   |
//! | [`drag`]         | Drag sessions and insertion strategies         |
//! |------------------|------------------------------------------------|

pub mod adapter;
pub mod drag;
pub mod error;
pub mod locator;
pub mod memory;
pub mod surface;

pub use adapter::{
    DEFAULT_MIN_DRAG_DISTANCE, DEFAULT_SURFACE_TIMEOUT, ElementEditState, SavedStyle,
    SurfaceAdapter,
};
pub use drag::{DragOutcome, DragSession, InsertionStrategy, StyleChange};
pub use error::{SurfaceError, SurfaceResult};
pub use locator::ElementLocator;
pub use memory::{MemorySurface, SurfaceSnapshot};
pub use surface::{RenderSurface, TextEditResult};
