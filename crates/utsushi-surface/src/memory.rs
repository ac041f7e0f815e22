//! In-process render surface.
//!
//! Used for tests and by the replay tool. The tree is an arena keyed by
//! [`DomId`]; layout is a simple block model (children stack vertically,
//! `display: flex` rows lay out horizontally and wrap with `flex-wrap: wrap`)
//! so drag hit-testing has real boxes to work with.
//!
//! Faults can be injected: [`MemorySurface::fail_next`] makes the next calls
//! fail as if the surface were unreachable, and [`MemorySurface::set_latency`]
//! delays every call so timeouts can be exercised.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use utsushi_types::{
    ActionElement, ActionTarget, DomId, ElementIdentity, FrameId, InsertLocation, InstanceId,
    LiveElement, Oid, Rect, attrs,
};

use crate::error::{SurfaceError, SurfaceResult};
use crate::surface::{RenderSurface, TextEditResult};

/// Width of the root box when it sets none.
const VIEWPORT_WIDTH: f64 = 1024.0;
/// Height of a leaf box when it sets none.
const LINE_HEIGHT: f64 = 20.0;

/// On-disk form of a surface: its frame id and the root element tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceSnapshot {
    pub frame_id: FrameId,
    pub root: ActionElement,
}

#[derive(Debug, Clone)]
struct Node {
    tag_name: String,
    oid: Option<Oid>,
    instance_id: Option<InstanceId>,
    attributes: IndexMap<String, String>,
    styles: IndexMap<String, String>,
    text: Option<String>,
    parent: Option<DomId>,
    children: Vec<DomId>,
}

#[derive(Debug, Default)]
struct Tree {
    nodes: HashMap<DomId, Node>,
    root: Option<DomId>,
}

impl Tree {
    fn node(&self, id: &DomId) -> SurfaceResult<&Node> {
        self.nodes.get(id).ok_or_else(|| SurfaceError::not_found(id))
    }

    fn node_mut(&mut self, id: &DomId) -> SurfaceResult<&mut Node> {
        self.nodes.get_mut(id).ok_or_else(|| SurfaceError::not_found(id))
    }

    fn parent_of(&self, id: &DomId) -> SurfaceResult<DomId> {
        self.node(id)?
            .parent
            .clone()
            .ok_or_else(|| SurfaceError::invalid(format!("{id} is the root")))
    }

    fn index_of(&self, id: &DomId) -> SurfaceResult<usize> {
        let Some(parent) = self.node(id)?.parent.as_ref() else {
            return Ok(0);
        };
        self.node(parent)?
            .children
            .iter()
            .position(|c| c == id)
            .ok_or_else(|| SurfaceError::invalid(format!("{id} missing from its parent")))
    }

    /// Add `el` and its descendants. `with_children = false` adds the node alone.
    fn add(
        &mut self,
        el: &ActionElement,
        parent: Option<DomId>,
        with_children: bool,
    ) -> SurfaceResult<DomId> {
        let dom_id = if el.dom_id.is_empty() {
            DomId::new()
        } else {
            el.dom_id.clone()
        };
        if self.nodes.contains_key(&dom_id) {
            return Err(SurfaceError::invalid(format!("duplicate dom id {dom_id}")));
        }
        let oid = (!el.oid.is_empty()).then(|| el.oid.clone());
        let instance_id = el
            .attributes
            .get(attrs::DATA_ONLOOK_INSTANCE_ID)
            .map(|s| InstanceId::from(s.as_str()));

        let mut attributes = el.attributes.clone();
        attributes.insert(attrs::DATA_ONLOOK_DOM_ID.to_string(), dom_id.to_string());
        if let Some(oid) = &oid {
            attributes.insert(attrs::DATA_ONLOOK_ID.to_string(), oid.to_string());
        }

        self.nodes.insert(
            dom_id.clone(),
            Node {
                tag_name: el.tag_name.clone(),
                oid,
                instance_id,
                attributes,
                styles: el.styles.clone(),
                text: el.text_content.clone(),
                parent,
                children: Vec::new(),
            },
        );
        if with_children {
            for child in &el.children {
                let child_id = self.add(child, Some(dom_id.clone()), true)?;
                self.node_mut(&dom_id)?.children.push(child_id);
            }
        }
        Ok(dom_id)
    }

    fn drop_subtree(&mut self, id: &DomId) {
        if let Some(node) = self.nodes.remove(id) {
            for child in &node.children {
                self.drop_subtree(child);
            }
        }
    }

    fn to_action_element(&self, id: &DomId) -> SurfaceResult<ActionElement> {
        let node = self.node(id)?;
        let children = node
            .children
            .iter()
            .map(|c| self.to_action_element(c))
            .collect::<SurfaceResult<Vec<_>>>()?;
        Ok(ActionElement {
            tag_name: node.tag_name.clone(),
            attributes: node.attributes.clone(),
            styles: node.styles.clone(),
            children,
            text_content: node.text.clone(),
            dom_id: id.clone(),
            oid: node.oid.clone().unwrap_or_else(|| Oid::from_raw("")),
        })
    }

    fn live(&self, frame_id: &FrameId, id: &DomId, rects: &HashMap<DomId, Rect>) -> SurfaceResult<LiveElement> {
        let node = self.node(id)?;
        let parent = match &node.parent {
            Some(p) => Some(ActionTarget::new(frame_id.clone(), p.clone(), self.node(p)?.oid.clone())),
            None => None,
        };
        Ok(LiveElement {
            identity: ElementIdentity {
                dom_id: id.clone(),
                oid: node.oid.clone(),
                instance_id: node.instance_id.clone(),
                frame_id: frame_id.clone(),
            },
            tag_name: node.tag_name.clone(),
            parent,
            index: self.index_of(id)?,
            attributes: node.attributes.clone(),
            styles: node.styles.clone(),
            text_content: node.text.clone(),
            rect: rects.get(id).copied().unwrap_or_default(),
            child_count: node.children.len(),
        })
    }

    fn document_order(&self) -> Vec<DomId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<&DomId> = self.root.iter().collect();
        while let Some(id) = stack.pop() {
            out.push(id.clone());
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    // ========================================================================
    // Layout
    // ========================================================================

    fn layout(&self) -> HashMap<DomId, Rect> {
        let mut out = HashMap::with_capacity(self.nodes.len());
        if let Some(root) = &self.root {
            self.place(root, 0.0, 0.0, VIEWPORT_WIDTH, &mut out);
        }
        out
    }

    fn place(&self, id: &DomId, x: f64, y: f64, avail: f64, out: &mut HashMap<DomId, Rect>) -> Rect {
        let Some(node) = self.nodes.get(id) else {
            return Rect::default();
        };
        if is_hidden(node) {
            self.hide(id, x, y, out);
            return Rect::new(x, y, 0.0, 0.0);
        }

        let width = px(&node.styles, "width").unwrap_or(avail);
        let display = node.styles.get("display").map(String::as_str);
        let row = display == Some("flex")
            && !node
                .styles
                .get("flex-direction")
                .is_some_and(|d| d.starts_with("column"));

        let content = if row {
            let wrap = node.styles.get("flex-wrap").is_some_and(|w| w == "wrap");
            let visible = node
                .children
                .iter()
                .filter(|c| self.nodes.get(*c).is_some_and(|n| !is_hidden(n)))
                .count()
                .max(1);
            let (mut cx, mut cy, mut line) = (x, y, 0.0_f64);
            for child in &node.children {
                let share = self
                    .nodes
                    .get(child)
                    .and_then(|n| px(&n.styles, "width"))
                    .unwrap_or(width / visible as f64);
                if wrap && cx > x && cx + share > x + width + f64::EPSILON {
                    cx = x;
                    cy += line;
                    line = 0.0;
                }
                let r = self.place(child, cx, cy, share, out);
                cx += r.width;
                line = line.max(r.height);
            }
            cy + line - y
        } else {
            let mut cy = y;
            for child in &node.children {
                cy += self.place(child, x, cy, width, out).height;
            }
            cy - y
        };

        let height = px(&node.styles, "height").unwrap_or(if node.children.is_empty() {
            LINE_HEIGHT
        } else {
            content
        });
        let rect = Rect::new(x, y, width, height);
        out.insert(id.clone(), rect);
        rect
    }

    fn hide(&self, id: &DomId, x: f64, y: f64, out: &mut HashMap<DomId, Rect>) {
        out.insert(id.clone(), Rect::new(x, y, 0.0, 0.0));
        if let Some(node) = self.nodes.get(id) {
            for child in &node.children {
                self.hide(child, x, y, out);
            }
        }
    }
}

fn is_hidden(node: &Node) -> bool {
    node.styles.get("display").is_some_and(|d| d == "none")
}

fn px(styles: &IndexMap<String, String>, key: &str) -> Option<f64> {
    styles.get(key)?.trim().strip_suffix("px")?.trim().parse().ok()
}

/// In-memory render surface.
///
/// Thread-safe via internal `RwLock`.
#[derive(Debug)]
pub struct MemorySurface {
    frame_id: FrameId,
    tree: RwLock<Tree>,
    fail_next: AtomicUsize,
    latency: Mutex<Option<Duration>>,
}

impl MemorySurface {
    /// Build a surface whose document is `root`.
    pub fn new(frame_id: FrameId, root: &ActionElement) -> SurfaceResult<Self> {
        let mut tree = Tree::default();
        let root_id = tree.add(root, None, true)?;
        tree.root = Some(root_id);
        Ok(Self {
            frame_id,
            tree: RwLock::new(tree),
            fail_next: AtomicUsize::new(0),
            latency: Mutex::new(None),
        })
    }

    pub fn from_snapshot(snapshot: &SurfaceSnapshot) -> SurfaceResult<Self> {
        Self::new(snapshot.frame_id.clone(), &snapshot.root)
    }

    pub fn from_json(json: &str) -> SurfaceResult<Self> {
        let snapshot: SurfaceSnapshot =
            serde_json::from_str(json).map_err(|e| SurfaceError::Snapshot(e.to_string()))?;
        Self::from_snapshot(&snapshot)
    }

    /// Read a JSON snapshot from disk.
    pub async fn load(path: impl AsRef<Path>) -> SurfaceResult<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SurfaceError::Snapshot(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// The current document as a snapshot.
    pub fn snapshot(&self) -> SurfaceResult<SurfaceSnapshot> {
        let tree = self.tree.read();
        let root = tree
            .root
            .as_ref()
            .ok_or_else(|| SurfaceError::invalid("surface has no root"))?;
        Ok(SurfaceSnapshot {
            frame_id: self.frame_id.clone(),
            root: tree.to_action_element(root)?,
        })
    }

    /// Make the next `n` calls fail as unreachable.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    pub fn len(&self) -> usize {
        self.tree.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.read().nodes.is_empty()
    }

    async fn enter(&self, op: &'static str) -> SurfaceResult<()> {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(SurfaceError::unavailable(format!("injected failure in {op}")));
        }
        Ok(())
    }

    fn live(&self, tree: &Tree, id: &DomId) -> SurfaceResult<LiveElement> {
        tree.live(&self.frame_id, id, &tree.layout())
    }
}

#[async_trait]
impl RenderSurface for MemorySurface {
    fn frame_id(&self) -> &FrameId {
        &self.frame_id
    }

    async fn scan(&self) -> SurfaceResult<Vec<LiveElement>> {
        self.enter("scan").await?;
        let tree = self.tree.read();
        let rects = tree.layout();
        tree.document_order()
            .iter()
            .map(|id| tree.live(&self.frame_id, id, &rects))
            .collect()
    }

    async fn get_element(&self, dom_id: &DomId) -> SurfaceResult<LiveElement> {
        self.enter("get_element").await?;
        let tree = self.tree.read();
        self.live(&tree, dom_id)
    }

    async fn get_action_element(&self, dom_id: &DomId) -> SurfaceResult<ActionElement> {
        self.enter("get_action_element").await?;
        self.tree.read().to_action_element(dom_id)
    }

    async fn get_element_index(&self, dom_id: &DomId) -> SurfaceResult<usize> {
        self.enter("get_element_index").await?;
        self.tree.read().index_of(dom_id)
    }

    async fn children(&self, dom_id: &DomId) -> SurfaceResult<Vec<DomId>> {
        self.enter("children").await?;
        Ok(self.tree.read().node(dom_id)?.children.clone())
    }

    async fn insert_element(
        &self,
        element: &ActionElement,
        location: &InsertLocation,
    ) -> SurfaceResult<DomId> {
        self.enter("insert_element").await?;
        let mut tree = self.tree.write();
        let parent = location.parent_dom_id();
        let index = location.resolve(tree.node(&parent)?.children.len());
        let id = tree.add(element, Some(parent.clone()), true)?;
        tree.node_mut(&parent)?.children.insert(index, id.clone());
        Ok(id)
    }

    async fn remove_element(&self, parent: &DomId, index: usize) -> SurfaceResult<ActionElement> {
        self.enter("remove_element").await?;
        let mut tree = self.tree.write();
        let id = tree
            .node(parent)?
            .children
            .get(index)
            .cloned()
            .ok_or_else(|| SurfaceError::invalid(format!("{parent} has no child {index}")))?;
        let snapshot = tree.to_action_element(&id)?;
        tree.node_mut(parent)?.children.remove(index);
        tree.drop_subtree(&id);
        Ok(snapshot)
    }

    async fn move_element(&self, dom_id: &DomId, new_index: usize) -> SurfaceResult<usize> {
        self.enter("move_element").await?;
        let mut tree = self.tree.write();
        let parent = tree.parent_of(dom_id)?;
        let from = tree.index_of(dom_id)?;
        let siblings = &mut tree.node_mut(&parent)?.children;
        let id = siblings.remove(from);
        let to = new_index.min(siblings.len());
        siblings.insert(to, id);
        Ok(to)
    }

    async fn group_elements(
        &self,
        parent: &DomId,
        container: &ActionElement,
        children: &[DomId],
    ) -> SurfaceResult<DomId> {
        self.enter("group_elements").await?;
        let mut tree = self.tree.write();
        let mut positions = Vec::with_capacity(children.len());
        for child in children {
            if tree.node(child)?.parent.as_ref() != Some(parent) {
                return Err(SurfaceError::invalid(format!("{child} is not a child of {parent}")));
            }
            positions.push(tree.index_of(child)?);
        }
        let at = positions
            .iter()
            .copied()
            .min()
            .ok_or_else(|| SurfaceError::invalid("nothing to group"))?;

        let container_id = tree.add(container, Some(parent.clone()), false)?;
        let siblings = &mut tree.node_mut(parent)?.children;
        siblings.retain(|c| !children.contains(c));
        siblings.insert(at, container_id.clone());
        tree.node_mut(&container_id)?.children = children.to_vec();
        for child in children {
            tree.node_mut(child)?.parent = Some(container_id.clone());
        }
        Ok(container_id)
    }

    async fn ungroup_elements(&self, parent: &DomId, container: &DomId) -> SurfaceResult<Vec<DomId>> {
        self.enter("ungroup_elements").await?;
        let mut tree = self.tree.write();
        if tree.node(container)?.parent.as_ref() != Some(parent) {
            return Err(SurfaceError::invalid(format!("{container} is not a child of {parent}")));
        }
        let at = tree.index_of(container)?;
        let kids = std::mem::take(&mut tree.node_mut(container)?.children);
        for kid in &kids {
            tree.node_mut(kid)?.parent = Some(parent.clone());
        }
        let siblings = &mut tree.node_mut(parent)?.children;
        siblings.remove(at);
        for (k, kid) in kids.iter().enumerate() {
            siblings.insert(at + k, kid.clone());
        }
        tree.nodes.remove(container);
        Ok(kids)
    }

    async fn set_style(&self, dom_id: &DomId, key: &str, value: &str) -> SurfaceResult<()> {
        self.enter("set_style").await?;
        let mut tree = self.tree.write();
        let styles = &mut tree.node_mut(dom_id)?.styles;
        if value.is_empty() {
            styles.shift_remove(key);
        } else {
            styles.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    async fn set_attribute(
        &self,
        dom_id: &DomId,
        name: &str,
        value: Option<&str>,
    ) -> SurfaceResult<()> {
        self.enter("set_attribute").await?;
        let mut tree = self.tree.write();
        let attributes = &mut tree.node_mut(dom_id)?.attributes;
        match value {
            Some(value) => {
                attributes.insert(name.to_string(), value.to_string());
            }
            None => {
                attributes.shift_remove(name);
            }
        }
        Ok(())
    }

    async fn start_editing_text(&self, dom_id: &DomId) -> SurfaceResult<String> {
        self.enter("start_editing_text").await?;
        let mut tree = self.tree.write();
        let node = tree.node_mut(dom_id)?;
        node.attributes
            .insert(attrs::DATA_ONLOOK_EDITING_TEXT.to_string(), "true".to_string());
        Ok(node.text.clone().unwrap_or_default())
    }

    async fn edit_text(&self, dom_id: &DomId, content: &str) -> SurfaceResult<LiveElement> {
        self.enter("edit_text").await?;
        let mut tree = self.tree.write();
        tree.node_mut(dom_id)?.text = (!content.is_empty()).then(|| content.to_string());
        self.live(&tree, dom_id)
    }

    async fn stop_editing_text(&self, dom_id: &DomId) -> SurfaceResult<TextEditResult> {
        self.enter("stop_editing_text").await?;
        let mut tree = self.tree.write();
        let node = tree.node_mut(dom_id)?;
        node.attributes.shift_remove(attrs::DATA_ONLOOK_EDITING_TEXT);
        let new_content = node.text.clone().unwrap_or_default();
        Ok(TextEditResult {
            new_content,
            element: self.live(&tree, dom_id)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn el(dom: &str) -> ActionElement {
        ActionElement {
            dom_id: DomId::from(dom),
            oid: Oid::from(format!("oid-{dom}")),
            ..ActionElement::new("div")
        }
        .with_attribute(attrs::DATA_ONLOOK_DOM_ID, dom)
        .with_attribute(attrs::DATA_ONLOOK_ID, format!("oid-{dom}"))
    }

    fn surface() -> MemorySurface {
        let root = el("root")
            .with_child(el("a").with_style("height", "40px"))
            .with_child(el("b").with_style("height", "40px"))
            .with_child(el("c").with_style("height", "40px"));
        MemorySurface::new(FrameId::from("f1"), &root).unwrap()
    }

    async fn order(s: &MemorySurface) -> Vec<String> {
        s.children(&DomId::from("root"))
            .await
            .unwrap()
            .iter()
            .map(|d| d.to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_vertical_layout() {
        let s = surface();
        let b = s.get_element(&DomId::from("b")).await.unwrap();
        assert_eq!(b.rect, Rect::new(0.0, 40.0, VIEWPORT_WIDTH, 40.0));
        assert_eq!(b.index, 1);
        assert_eq!(b.parent.unwrap().dom_id, DomId::from("root"));
        let root = s.get_element(&DomId::from("root")).await.unwrap();
        assert_eq!(root.rect.height, 120.0);
        assert_eq!(root.child_count, 3);
    }

    #[tokio::test]
    async fn test_flex_row_wraps() {
        let root = el("root")
            .with_style("display", "flex")
            .with_style("flex-wrap", "wrap")
            .with_style("width", "200px")
            .with_child(el("a").with_style("width", "100px"))
            .with_child(el("b").with_style("width", "100px"))
            .with_child(el("c").with_style("width", "100px"));
        let s = MemorySurface::new(FrameId::from("f1"), &root).unwrap();
        let b = s.get_element(&DomId::from("b")).await.unwrap();
        let c = s.get_element(&DomId::from("c")).await.unwrap();
        assert_eq!(b.rect, Rect::new(100.0, 0.0, 100.0, LINE_HEIGHT));
        assert_eq!(c.rect, Rect::new(0.0, LINE_HEIGHT, 100.0, LINE_HEIGHT));
    }

    #[tokio::test]
    async fn test_move_clamps_and_reports() {
        let s = surface();
        assert_eq!(s.move_element(&DomId::from("a"), 9).await.unwrap(), 2);
        assert_eq!(order(&s).await, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_insert_and_remove() {
        let s = surface();
        let new = el("n");
        let id = s
            .insert_element(&new, &InsertLocation::at(&DomId::from("root"), 1))
            .await
            .unwrap();
        assert_eq!(id, DomId::from("n"));
        assert_eq!(order(&s).await, vec!["a", "n", "b", "c"]);

        let removed = s.remove_element(&DomId::from("root"), 1).await.unwrap();
        assert_eq!(removed.dom_id, DomId::from("n"));
        assert_eq!(order(&s).await, vec!["a", "b", "c"]);

        let err = s.insert_element(&el("a"), &InsertLocation::append(&DomId::from("root"))).await;
        assert!(matches!(err, Err(SurfaceError::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn test_group_then_ungroup() {
        let s = surface();
        let container = el("g");
        let ids = [DomId::from("a"), DomId::from("c")];
        s.group_elements(&DomId::from("root"), &container, &ids).await.unwrap();
        assert_eq!(order(&s).await, vec!["g", "b"]);
        assert_eq!(s.children(&DomId::from("g")).await.unwrap(), ids.to_vec());

        let kids = s.ungroup_elements(&DomId::from("root"), &DomId::from("g")).await.unwrap();
        assert_eq!(kids, ids.to_vec());
        assert_eq!(order(&s).await, vec!["a", "c", "b"]);
        assert!(s.get_element(&DomId::from("g")).await.is_err());
    }

    #[tokio::test]
    async fn test_style_removal_keeps_order() {
        let s = surface();
        let a = DomId::from("a");
        s.set_style(&a, "color", "red").await.unwrap();
        s.set_style(&a, "transform", "translate(1px, 1px)").await.unwrap();
        s.set_style(&a, "transform", "").await.unwrap();
        let live = s.get_element(&a).await.unwrap();
        let keys: Vec<&str> = live.styles.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["height", "color"]);
    }

    #[tokio::test]
    async fn test_text_editing_marks_element() {
        let s = surface();
        let a = DomId::from("a");
        assert_eq!(s.start_editing_text(&a).await.unwrap(), "");
        let live = s.edit_text(&a, "Hello").await.unwrap();
        assert!(live.attributes.contains_key(attrs::DATA_ONLOOK_EDITING_TEXT));
        let done = s.stop_editing_text(&a).await.unwrap();
        assert_eq!(done.new_content, "Hello");
        assert!(!done.element.attributes.contains_key(attrs::DATA_ONLOOK_EDITING_TEXT));
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let s = surface();
        s.fail_next(1);
        let err = s.scan().await.unwrap_err();
        assert!(err.leaves_state_unknown());
        assert_eq!(s.scan().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_snapshot_file_round_trip() {
        let s = surface();
        let json = serde_json::to_string(&s.snapshot().unwrap()).unwrap();
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), json).unwrap();

        let loaded = MemorySurface::load(file.path()).await.unwrap();
        assert_eq!(loaded.frame_id(), &FrameId::from("f1"));
        assert_eq!(order(&loaded).await, vec!["a", "b", "c"]);
    }
}
