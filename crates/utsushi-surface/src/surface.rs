//! Render-surface operations trait.
//!
//! A render surface is the live, executing view of the edited page. It
//! usually lives in another process or sandbox, so every call is async and
//! fallible. Elements are addressed by [`DomId`]; positions count element
//! siblings only.

use async_trait::async_trait;
use utsushi_types::{ActionElement, DomId, FrameId, InsertLocation, LiveElement};

use crate::error::SurfaceResult;

/// Result of closing a text-editing session.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEditResult {
    pub new_content: String,
    pub element: LiveElement,
}

/// Core render-surface operations.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// The surface this handle drives.
    fn frame_id(&self) -> &FrameId;

    // ========================================================================
    // Reading
    // ========================================================================

    /// Every element on the surface in document order.
    async fn scan(&self) -> SurfaceResult<Vec<LiveElement>>;

    /// One element with its layout box.
    async fn get_element(&self, dom_id: &DomId) -> SurfaceResult<LiveElement>;

    /// Serializable snapshot of an element and its descendants.
    async fn get_action_element(&self, dom_id: &DomId) -> SurfaceResult<ActionElement>;

    /// Position among element siblings.
    async fn get_element_index(&self, dom_id: &DomId) -> SurfaceResult<usize>;

    /// Element children in order.
    async fn children(&self, dom_id: &DomId) -> SurfaceResult<Vec<DomId>>;

    // ========================================================================
    // Structure
    // ========================================================================

    /// Create the element (and its descendants) at `location`. Returns its dom id.
    async fn insert_element(
        &self,
        element: &ActionElement,
        location: &InsertLocation,
    ) -> SurfaceResult<DomId>;

    /// Detach the child at `index` of `parent`, returning its snapshot.
    async fn remove_element(&self, parent: &DomId, index: usize) -> SurfaceResult<ActionElement>;

    /// Move an element among its siblings so it ends at `new_index`
    /// (clamped). Returns the index it actually landed on.
    async fn move_element(&self, dom_id: &DomId, new_index: usize) -> SurfaceResult<usize>;

    /// Insert `container` under `parent` at the first child's position and
    /// move `children` into it, in the given order.
    async fn group_elements(
        &self,
        parent: &DomId,
        container: &ActionElement,
        children: &[DomId],
    ) -> SurfaceResult<DomId>;

    /// Spread the container's children into `parent` at its position and
    /// remove it. Returns the children in order.
    async fn ungroup_elements(&self, parent: &DomId, container: &DomId) -> SurfaceResult<Vec<DomId>>;

    // ========================================================================
    // Attributes and style
    // ========================================================================

    /// Set an inline style property. An empty value removes it.
    async fn set_style(&self, dom_id: &DomId, key: &str, value: &str) -> SurfaceResult<()>;

    /// Set an attribute, or remove it with `None`.
    async fn set_attribute(&self, dom_id: &DomId, name: &str, value: Option<&str>)
    -> SurfaceResult<()>;

    // ========================================================================
    // Text
    // ========================================================================

    /// Enter text editing. Returns the original content.
    async fn start_editing_text(&self, dom_id: &DomId) -> SurfaceResult<String>;

    /// Replace the text content.
    async fn edit_text(&self, dom_id: &DomId, content: &str) -> SurfaceResult<LiveElement>;

    /// Leave text editing.
    async fn stop_editing_text(&self, dom_id: &DomId) -> SurfaceResult<TextEditResult>;
}
