//! Element identity, targets, snapshots and insert locations.
//!
//! A live element has two identities: its [`DomId`] (render-accurate, per surface)
//! and its [`Oid`] (source-accurate, shared by every render of one JSX node).
//! Actions carry both so they can be replayed against a refreshed surface.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::ids::{DomId, FrameId, InstanceId, Oid};

/// Attribute names stamped on live elements. These are the only wire-format
/// markers; all other per-element edit state lives out of band.
pub mod attrs {
    /// Per-surface unique element stamp.
    pub const DATA_ONLOOK_DOM_ID: &str = "data-onlook-dom-id";
    /// Origin id, also present on the JSX node in source.
    pub const DATA_ONLOOK_ID: &str = "data-oid";
    /// Component instance id.
    pub const DATA_ONLOOK_INSTANCE_ID: &str = "data-oiid";
    /// Set on elements created by the editor (paste, insert, group container).
    pub const DATA_ONLOOK_INSERTED: &str = "data-onlook-inserted";
    /// Set while an element is being dragged.
    pub const DATA_ONLOOK_DRAGGING: &str = "data-onlook-dragging";
    /// Settled drop index, read by code sync after a drag.
    pub const DATA_ONLOOK_NEW_INDEX: &str = "data-onlook-new-index";
    /// Marks the drag placeholder.
    pub const DATA_ONLOOK_STUB: &str = "data-onlook-drag-stub";
    /// Set while an element's text is being edited in place.
    pub const DATA_ONLOOK_EDITING_TEXT: &str = "data-onlook-editing-text";
}

/// Full identity of a live element.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementIdentity {
    pub dom_id: DomId,
    pub oid: Option<Oid>,
    pub instance_id: Option<InstanceId>,
    pub frame_id: FrameId,
}

impl ElementIdentity {
    /// The oid code edits should target: the instance node when this element
    /// is a rendered component instance, otherwise the element's own node.
    pub fn source_oid(&self) -> Option<Oid> {
        self.instance_id
            .as_ref()
            .map(|id| Oid::from_raw(id.as_str()))
            .or_else(|| self.oid.clone())
    }

    /// Reduce to an action target, addressing the source node edits land on.
    pub fn to_target(&self) -> ActionTarget {
        ActionTarget {
            frame_id: self.frame_id.clone(),
            dom_id: self.dom_id.clone(),
            oid: self.source_oid(),
        }
    }
}

/// Reference to one element within one render surface.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionTarget {
    pub frame_id: FrameId,
    pub dom_id: DomId,
    pub oid: Option<Oid>,
}

impl ActionTarget {
    pub fn new(frame_id: FrameId, dom_id: DomId, oid: Option<Oid>) -> Self {
        Self {
            frame_id,
            dom_id,
            oid,
        }
    }
}

impl std::fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.oid {
            Some(oid) => write!(f, "{}/{}#{}", self.frame_id.short(), self.dom_id, oid.short()),
            None => write!(f, "{}/{}", self.frame_id.short(), self.dom_id),
        }
    }
}

/// Serializable snapshot of an element, sufficient to recreate it.
///
/// Attribute and style maps keep insertion order so regenerated markup is
/// stable across runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionElement {
    pub tag_name: String,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
    #[serde(default)]
    pub styles: IndexMap<String, String>,
    #[serde(default)]
    pub children: Vec<ActionElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    pub dom_id: DomId,
    pub oid: Oid,
}

impl ActionElement {
    /// Create an empty element with freshly minted identity.
    pub fn new(tag_name: impl Into<String>) -> Self {
        let dom_id = DomId::new();
        let oid = Oid::new();
        let mut attributes = IndexMap::new();
        attributes.insert(attrs::DATA_ONLOOK_DOM_ID.to_string(), dom_id.to_string());
        attributes.insert(attrs::DATA_ONLOOK_ID.to_string(), oid.to_string());
        Self {
            tag_name: tag_name.into(),
            attributes,
            styles: IndexMap::new(),
            children: Vec::new(),
            text_content: None,
            dom_id,
            oid,
        }
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(key.into(), value.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: ActionElement) -> Self {
        self.children.push(child);
        self
    }

    /// Copy this snapshot under a new identity, recursively re-minting every
    /// descendant and marking each node as editor-inserted. Only the `class`
    /// attribute survives from the source; other attributes are identity-bound.
    pub fn remint(&self) -> ActionElement {
        self.cleaned(DomId::new(), Oid::new())
    }

    /// Same as [`remint`](Self::remint) but with a caller-chosen root identity.
    pub fn cleaned(&self, dom_id: DomId, oid: Oid) -> ActionElement {
        let mut attributes = IndexMap::new();
        attributes.insert(
            "class".to_string(),
            self.attributes.get("class").cloned().unwrap_or_default(),
        );
        attributes.insert(attrs::DATA_ONLOOK_DOM_ID.to_string(), dom_id.to_string());
        attributes.insert(attrs::DATA_ONLOOK_ID.to_string(), oid.to_string());
        attributes.insert(attrs::DATA_ONLOOK_INSERTED.to_string(), "true".to_string());

        ActionElement {
            tag_name: self.tag_name.clone(),
            attributes,
            styles: self.styles.clone(),
            children: self.children.iter().map(ActionElement::remint).collect(),
            text_content: self.text_content.clone(),
            dom_id,
            oid,
        }
    }

    /// Every dom id in this subtree, root first.
    pub fn dom_ids(&self) -> Vec<DomId> {
        let mut out = vec![self.dom_id.clone()];
        for child in &self.children {
            out.extend(child.dom_ids());
        }
        out
    }

    /// Whether the editor created this element.
    pub fn is_inserted(&self) -> bool {
        self.attributes
            .get(attrs::DATA_ONLOOK_INSERTED)
            .is_some_and(|v| v == "true")
    }
}

/// Where an inserted element goes relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InsertPosition {
    Append,
    Prepend,
    Index,
}

/// Sentinel for "unresolved, compute from append".
pub const UNRESOLVED_INDEX: i32 = -1;

/// Location of an insert or removal within a parent element.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertLocation {
    pub position: InsertPosition,
    /// Parent dom id (or selector) the location is relative to.
    pub target_selector_or_id: String,
    pub index: i32,
}

impl InsertLocation {
    pub fn append(parent: &DomId) -> Self {
        Self {
            position: InsertPosition::Append,
            target_selector_or_id: parent.to_string(),
            index: UNRESOLVED_INDEX,
        }
    }

    pub fn prepend(parent: &DomId) -> Self {
        Self {
            position: InsertPosition::Prepend,
            target_selector_or_id: parent.to_string(),
            index: 0,
        }
    }

    pub fn at(parent: &DomId, index: usize) -> Self {
        Self {
            position: InsertPosition::Index,
            target_selector_or_id: parent.to_string(),
            index: index as i32,
        }
    }

    /// The parent as a dom id.
    pub fn parent_dom_id(&self) -> DomId {
        DomId::from_raw(self.target_selector_or_id.clone())
    }

    /// Resolve to a concrete child index given the parent's current child count.
    pub fn resolve(&self, child_count: usize) -> usize {
        match self.position {
            InsertPosition::Append => child_count,
            InsertPosition::Prepend => 0,
            InsertPosition::Index if self.index < 0 => child_count,
            InsertPosition::Index => (self.index as usize).min(child_count),
        }
    }

    /// Pin the location to a concrete index.
    pub fn resolved(&self, index: usize) -> Self {
        Self {
            position: InsertPosition::Index,
            target_selector_or_id: self.target_selector_or_id.clone(),
            index: index as i32,
        }
    }
}

/// Axis-aligned bounding box in surface coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether a y coordinate falls inside this box's vertical band.
    pub fn spans_y(&self, y: f64) -> bool {
        y >= self.y && y < self.bottom()
    }
}

/// An element as read back from a live surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveElement {
    pub identity: ElementIdentity,
    pub tag_name: String,
    pub parent: Option<ActionTarget>,
    /// Position among element siblings (text nodes excluded).
    pub index: usize,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
    #[serde(default)]
    pub styles: IndexMap<String, String>,
    #[serde(default)]
    pub text_content: Option<String>,
    pub rect: Rect,
    #[serde(default)]
    pub child_count: usize,
}

impl LiveElement {
    pub fn dom_id(&self) -> &DomId {
        &self.identity.dom_id
    }

    pub fn frame_id(&self) -> &FrameId {
        &self.identity.frame_id
    }

    pub fn oid(&self) -> Option<&Oid> {
        self.identity.oid.as_ref()
    }

    pub fn to_target(&self) -> ActionTarget {
        self.identity.to_target()
    }

    pub fn style(&self, key: &str) -> Option<&str> {
        self.styles.get(key).map(String::as_str)
    }
}
