//! Shared identity, element and action types for utsushi.
//!
//! This crate is the leaf of the workspace: typed IDs, element snapshots,
//! the [`Action`] tagged union and the error taxonomy. It has **no internal
//! utsushi dependencies**.
//!
//! # Identity Overview
//!
//! ```text
//! Render surface (FrameId) ← one webview/iframe
//!     └── live element (DomId) ← unique per surface, stamped as data-onlook-dom-id
//!             └── origin node (Oid) ← JSX node in source, shared by every render
//!             └── instance (InstanceId) ← set when rendered from a component
//! ```
//!
//! # Key Types
//!
//! |--------------------|----------------------------------------------|
//! | Type               | Purpose                                      |
//! |--------------------|----------------------------------------------|
//! | [`ActionTarget`]   | One element on one surface                   |
//! | [`ActionElement`]  | Snapshot sufficient to recreate an element   |
//! | [`InsertLocation`] | Where an element goes within its parent      |
//! | [`LiveElement`]    | Element as read back from a surface          |
//! | [`Action`]         | Reversible edit, JSON tagged by `type`       |
//! | [`EditorError`]    | Error taxonomy, classified by [`ErrorKind`]  |
//! |--------------------|----------------------------------------------|

pub mod action;
pub mod element;
pub mod error;
pub mod ids;

// Re-export primary types at crate root for convenience.
pub use action::{
    Action, ActionKind, CodeDiff, DeleteElementAction, EditStyleAction, EditTextAction,
    GroupElementsAction, InsertElementAction, MoveElementAction, UngroupElementsAction,
    WriteCodeAction,
};
pub use element::{
    ActionElement, ActionTarget, ElementIdentity, InsertLocation, InsertPosition, LiveElement,
    Rect, UNRESOLVED_INDEX, attrs,
};
pub use error::{EditorError, ErrorKind, Result};
pub use ids::{DomId, FrameId, InstanceId, Oid};
