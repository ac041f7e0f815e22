//! Drag protocol.
//!
//! ```text
//!   start_drag ──▶ drag* ──▶ end ──────▶ DragOutcome
//!       │                 └─▶ cancel ──▶ original state
//!       └── session dropped unfinished ─▶ cancel, spawned
//! ```
//!
//! In-flow elements are dragged by translating them and moving a hidden
//! placeholder (the stub) to the slot the pointer points at. Sibling boxes are
//! measured once at start, so each pointer move costs one children read and
//! at most one stub move. At the end the element takes the stub's slot.
//!
//! Absolutely positioned elements change `left`/`top` instead. The surface
//! is put back at the end and the outcome carries both values, so the caller
//! can record the change as style edits in one transaction.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, warn};
use utsushi_types::{
    ActionElement, ActionTarget, DomId, EditorError, InsertLocation, LiveElement, Rect, Result,
    attrs,
};

use crate::adapter::{SavedStyle, SurfaceAdapter};

/// How a pointer position maps to a slot among siblings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum InsertionStrategy {
    /// First sibling whose row holds the pointer left of its right edge, or
    /// that lies wholly below the pointer.
    #[default]
    EdgeScan,
    /// Sibling with the nearest center, before or after it by pointer side.
    NearestCenter,
}

impl InsertionStrategy {
    /// Slot for a pointer at `(x, y)`. `siblings.len()` means append.
    pub fn index(self, siblings: &[Rect], x: f64, y: f64) -> usize {
        match self {
            InsertionStrategy::EdgeScan => siblings
                .iter()
                .position(|r| {
                    if r.spans_y(y) {
                        x < r.right()
                    } else {
                        r.y > y
                    }
                })
                .unwrap_or(siblings.len()),
            InsertionStrategy::NearestCenter => {
                let distance = |r: &Rect| {
                    let (cx, cy) = r.center();
                    (cx - x).powi(2) + (cy - y).powi(2)
                };
                let Some((i, nearest)) = siblings
                    .iter()
                    .enumerate()
                    .min_by(|(_, a), (_, b)| distance(a).total_cmp(&distance(b)))
                else {
                    return 0;
                };
                let (cx, cy) = nearest.center();
                let after = if nearest.spans_y(y) { x > cx } else { y > cy };
                i + usize::from(after)
            }
        }
    }
}

/// `left`/`top` before and after an absolute drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleChange {
    pub original: String,
    pub new: String,
}

impl StyleChange {
    pub fn changed(&self) -> bool {
        self.original != self.new
    }
}

/// What a finished drag did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// In-flow element; the surface already shows it at `new_index`.
    Reordered {
        target: ActionTarget,
        original_index: usize,
        new_index: usize,
    },
    /// Absolute element; the surface was put back to the original values.
    Repositioned {
        target: ActionTarget,
        left: StyleChange,
        top: StyleChange,
    },
}

impl DragOutcome {
    pub fn target(&self) -> &ActionTarget {
        match self {
            DragOutcome::Reordered { target, .. } | DragOutcome::Repositioned { target, .. } => {
                target
            }
        }
    }

    pub fn changed(&self) -> bool {
        match self {
            DragOutcome::Reordered {
                original_index,
                new_index,
                ..
            } => original_index != new_index,
            DragOutcome::Repositioned { left, top, .. } => left.changed() || top.changed(),
        }
    }
}

#[derive(Debug)]
enum DragMode {
    Flow {
        parent: DomId,
        stub: DomId,
        sibling_ids: Vec<DomId>,
        sibling_rects: Vec<Rect>,
        slot: Option<usize>,
        stub_shown: bool,
    },
    Absolute {
        left: f64,
        top: f64,
        last: Option<(f64, f64)>,
    },
}

#[derive(Debug)]
struct DragState {
    target: ActionTarget,
    original_index: usize,
    saved: SavedStyle,
    mode: DragMode,
    moved: bool,
}

/// An element being dragged.
///
/// Finish with [`end`](Self::end) or [`cancel`](Self::cancel). A session
/// dropped unfinished cancels itself on the current tokio runtime.
#[derive(Debug)]
pub struct DragSession {
    adapter: Arc<SurfaceAdapter>,
    state: Option<DragState>,
}

impl DragSession {
    pub fn target(&self) -> Option<&ActionTarget> {
        self.state.as_ref().map(|s| &s.target)
    }

    /// Pointer moved by `(dx, dy)` from the start and is now at `(x, y)`.
    pub async fn drag(&mut self, dx: f64, dy: f64, x: f64, y: f64) -> Result<()> {
        let adapter = &self.adapter;
        let Some(state) = self.state.as_mut() else {
            return Err(EditorError::invalid_action("drag already finished"));
        };
        if !state.moved && dx.abs().max(dy.abs()) <= adapter.min_drag_distance {
            return Ok(());
        }
        state.moved = true;
        let dom_id = &state.target.dom_id;

        match &mut state.mode {
            DragMode::Absolute { left, top, last } => {
                let to = (*left + dx, *top + dy);
                adapter.set_style(dom_id, "left", &px(to.0)).await?;
                adapter.set_style(dom_id, "top", &px(to.1)).await?;
                *last = Some(to);
            }
            DragMode::Flow {
                parent,
                stub,
                sibling_ids,
                sibling_rects,
                slot,
                stub_shown,
            } => {
                adapter
                    .set_style(dom_id, "transform", &format!("translate({}, {})", px(dx), px(dy)))
                    .await?;
                if !*stub_shown {
                    adapter.set_style(stub, "display", "").await?;
                    *stub_shown = true;
                }
                let k = adapter.strategy.index(sibling_rects, x, y);
                if *slot != Some(k) {
                    adapter.place_stub(parent, stub, sibling_ids.get(k)).await?;
                    *slot = Some(k);
                }
            }
        }
        Ok(())
    }

    /// Finish the drag and report what changed.
    pub async fn end(mut self) -> Result<DragOutcome> {
        match self.state.take() {
            Some(state) => self.adapter.finish_drag(state, true).await,
            None => Err(EditorError::invalid_action("drag already finished")),
        }
    }

    /// Put everything back as it was before the drag.
    pub async fn cancel(mut self) -> Result<()> {
        if let Some(state) = self.state.take() {
            self.adapter.finish_drag(state, false).await?;
        }
        Ok(())
    }
}

impl Drop for DragSession {
    fn drop(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(target = %state.target, "drag session dropped, cancelling");
                let adapter = self.adapter.clone();
                handle.spawn(async move {
                    if let Err(e) = adapter.finish_drag(state, false).await {
                        warn!(error = %e, "cancelling abandoned drag failed");
                    }
                });
            }
            Err(_) => {
                warn!(target = %state.target, "drag abandoned outside a runtime, surface left mid-drag");
            }
        }
    }
}

fn px(v: f64) -> String {
    format!("{v}px")
}

fn parse_px(v: Option<&str>) -> Option<f64> {
    v?.trim().strip_suffix("px")?.trim().parse().ok()
}

/// Placeholder with the dragged element's box, hidden until the first move.
fn stub_for(el: &LiveElement) -> ActionElement {
    let mut stub = ActionElement::new("div")
        .with_attribute(attrs::DATA_ONLOOK_STUB, "true")
        .with_style("width", px(el.rect.width))
        .with_style("height", px(el.rect.height));
    for key in ["margin", "padding", "border-radius"] {
        if let Some(value) = el.style(key) {
            stub = stub.with_style(key, value);
        }
    }
    stub.with_style("display", "none")
}

impl SurfaceAdapter {
    /// Begin dragging `target`.
    ///
    /// Starting again on an element whose last drag never finished keeps the
    /// styles saved by that first start.
    pub async fn start_drag(self: &Arc<Self>, target: &ActionTarget) -> Result<DragSession> {
        let el = self.locator.resolve(target).await?;
        let parent = el
            .parent
            .clone()
            .ok_or_else(|| EditorError::invalid_action("the root element cannot be dragged"))?;
        let dom_id = el.dom_id().clone();

        self.update_state(&dom_id, |s| {
            s.saved_style.get_or_insert_with(|| SavedStyle::of(&el));
            s.original_index.get_or_insert(el.index);
        });
        let state = self.edit_state(&dom_id).unwrap_or_default();
        let original_index = state.original_index.unwrap_or(el.index);
        let saved = state.saved_style.unwrap_or_default();

        let mode = match self.prepare_drag(&el, &parent.dom_id).await {
            Ok(mode) => mode,
            Err(e) => {
                self.update_state(&dom_id, |s| {
                    s.saved_style = None;
                    s.original_index = None;
                });
                return Err(e);
            }
        };
        debug!(target = %target, index = original_index, "drag started");
        Ok(DragSession {
            adapter: self.clone(),
            state: Some(DragState {
                target: el.to_target(),
                original_index,
                saved,
                mode,
                moved: false,
            }),
        })
    }

    async fn prepare_drag(&self, el: &LiveElement, parent: &DomId) -> Result<DragMode> {
        let dom_id = el.dom_id();
        self.call(
            "set_attribute",
            self.surface
                .set_attribute(dom_id, attrs::DATA_ONLOOK_DRAGGING, Some("true")),
        )
        .await?;

        if el.style("position") == Some("absolute") {
            return Ok(DragMode::Absolute {
                left: parse_px(el.style("left")).unwrap_or(el.rect.x),
                top: parse_px(el.style("top")).unwrap_or(el.rect.y),
                last: None,
            });
        }

        let kids = self.call("children", self.surface.children(parent)).await?;
        let mut sibling_ids = Vec::with_capacity(kids.len());
        let mut sibling_rects = Vec::with_capacity(kids.len());
        let mut leftover = Vec::new();
        for (at, id) in kids.iter().enumerate().filter(|(_, id)| *id != dom_id) {
            let sibling = self.call("get_element", self.surface.get_element(id)).await?;
            if sibling.attributes.contains_key(attrs::DATA_ONLOOK_STUB) {
                leftover.push(at);
                continue;
            }
            sibling_ids.push(id.clone());
            sibling_rects.push(sibling.rect);
        }
        // placeholders from drags whose cleanup failed
        for at in leftover.iter().rev() {
            self.call("remove_element", self.surface.remove_element(parent, *at))
                .await?;
        }
        let index = el.index - leftover.iter().filter(|at| **at < el.index).count();

        let stub = self
            .call(
                "insert_element",
                self.surface
                    .insert_element(&stub_for(el), &InsertLocation::at(parent, index + 1)),
            )
            .await?;
        Ok(DragMode::Flow {
            parent: parent.clone(),
            stub,
            sibling_ids,
            sibling_rects,
            slot: None,
            stub_shown: false,
        })
    }

    /// Move the stub right before `before`, or last when `None`.
    async fn place_stub(&self, parent: &DomId, stub: &DomId, before: Option<&DomId>) -> Result<()> {
        let kids = self.call("children", self.surface.children(parent)).await?;
        let others: Vec<&DomId> = kids.iter().filter(|id| *id != stub).collect();
        let to = before
            .and_then(|b| others.iter().position(|id| *id == b))
            .unwrap_or(others.len());
        self.call("move_element", self.surface.move_element(stub, to))
            .await?;
        Ok(())
    }

    /// Settle a drag and drop its saved state. Every cleanup step is tried
    /// even after one fails; the first error is returned. A failed cleanup
    /// keeps the saved styles so the next drag of the element starts from the
    /// real originals.
    async fn finish_drag(&self, state: DragState, commit: bool) -> Result<DragOutcome> {
        let dom_id = state.target.dom_id.clone();
        let result = self.settle_drag(&state, commit).await;
        match &result {
            Ok(outcome) => {
                let new_index = match outcome {
                    DragOutcome::Reordered {
                        original_index,
                        new_index,
                        ..
                    } if original_index != new_index => Some(*new_index),
                    _ => None,
                };
                self.update_state(&dom_id, |s| {
                    s.saved_style = None;
                    s.original_index = None;
                    s.new_index = new_index;
                });
                debug!(target = %state.target, changed = outcome.changed(), commit, "drag finished");
            }
            Err(e) => warn!(target = %state.target, error = %e, "drag did not finish cleanly"),
        }
        result
    }

    async fn settle_drag(&self, state: &DragState, commit: bool) -> Result<DragOutcome> {
        let dom_id = &state.target.dom_id;
        let saved = &state.saved;

        match &state.mode {
            DragMode::Flow { parent, stub, .. } => {
                let placed = self.place_dragged(state, parent, stub, commit).await;
                if placed.is_err() {
                    if let Err(e) = self.remove_stub(parent, stub).await {
                        warn!(stub = %stub, error = %e, "drag placeholder left on the surface");
                    }
                }
                let restored = self
                    .set_style(dom_id, "transform", saved.transform.as_deref().unwrap_or(""))
                    .await;
                let cleared = self.clear_dragging(dom_id).await;

                let new_index = placed?;
                restored?;
                cleared?;
                Ok(DragOutcome::Reordered {
                    target: state.target.clone(),
                    original_index: state.original_index,
                    new_index,
                })
            }
            DragMode::Absolute { left, top, last } => {
                let original_left = saved.left.clone().unwrap_or_default();
                let original_top = saved.top.clone().unwrap_or_default();
                let restored_left = self.set_style(dom_id, "left", &original_left).await;
                let restored_top = self.set_style(dom_id, "top", &original_top).await;
                let cleared = self.clear_dragging(dom_id).await;
                restored_left?;
                restored_top?;
                cleared?;

                let (new_left, new_top) = match (commit, last) {
                    (true, Some(_)) => {
                        let to = last.unwrap_or((*left, *top));
                        (px(to.0), px(to.1))
                    }
                    _ => (original_left.clone(), original_top.clone()),
                };
                Ok(DragOutcome::Repositioned {
                    target: state.target.clone(),
                    left: StyleChange {
                        original: original_left,
                        new: new_left,
                    },
                    top: StyleChange {
                        original: original_top,
                        new: new_top,
                    },
                })
            }
        }
    }

    /// Swap the stub for the dragged element and mark where it landed.
    async fn place_dragged(
        &self,
        state: &DragState,
        parent: &DomId,
        stub: &DomId,
        commit: bool,
    ) -> Result<usize> {
        let dom_id = &state.target.dom_id;
        let kids = self.call("children", self.surface.children(parent)).await?;
        let new_index = if commit {
            kids.iter()
                .filter(|id| *id != dom_id)
                .position(|id| id == stub)
                .unwrap_or(state.original_index)
        } else {
            state.original_index
        };
        if let Some(at) = kids.iter().position(|id| id == stub) {
            self.call("remove_element", self.surface.remove_element(parent, at))
                .await?;
        }
        let current = kids
            .iter()
            .filter(|id| *id != stub)
            .position(|id| id == dom_id)
            .ok_or_else(|| EditorError::not_found(&state.target))?;
        if new_index != current {
            self.call("move_element", self.surface.move_element(dom_id, new_index))
                .await?;
        }

        let marker = (new_index != state.original_index).then(|| new_index.to_string());
        self.call(
            "set_attribute",
            self.surface
                .set_attribute(dom_id, attrs::DATA_ONLOOK_NEW_INDEX, marker.as_deref()),
        )
        .await?;
        Ok(new_index)
    }

    async fn remove_stub(&self, parent: &DomId, stub: &DomId) -> Result<()> {
        let kids = self.call("children", self.surface.children(parent)).await?;
        if let Some(at) = kids.iter().position(|id| id == stub) {
            self.call("remove_element", self.surface.remove_element(parent, at))
                .await?;
        }
        Ok(())
    }

    async fn clear_dragging(&self, dom_id: &DomId) -> Result<()> {
        self.call(
            "set_attribute",
            self.surface
                .set_attribute(dom_id, attrs::DATA_ONLOOK_DRAGGING, None),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySurface;
    use crate::surface::RenderSurface;
    use std::time::Duration;
    use utsushi_types::{Action, FrameId, MoveElementAction, Oid};

    fn el(dom: &str) -> ActionElement {
        ActionElement {
            dom_id: DomId::from(dom),
            oid: Oid::from(format!("oid-{dom}")),
            ..ActionElement::new("div")
        }
        .with_attribute(attrs::DATA_ONLOOK_DOM_ID, dom)
        .with_attribute(attrs::DATA_ONLOOK_ID, format!("oid-{dom}"))
    }

    /// Five 40px rows a..e stacked from y = 0.
    fn setup() -> (Arc<MemorySurface>, Arc<SurfaceAdapter>) {
        let mut root = el("root");
        for name in ["a", "b", "c", "d", "e"] {
            root = root.with_child(el(name).with_style("height", "40px"));
        }
        root = root.with_child(
            el("abs")
                .with_style("position", "absolute")
                .with_style("left", "10px")
                .with_style("top", "20px"),
        );
        let surface = Arc::new(MemorySurface::new(FrameId::from("f1"), &root).unwrap());
        let adapter = Arc::new(SurfaceAdapter::new(surface.clone()));
        (surface, adapter)
    }

    fn t(dom: &str) -> ActionTarget {
        ActionTarget::new(
            FrameId::from("f1"),
            DomId::from(dom),
            Some(Oid::from(format!("oid-{dom}"))),
        )
    }

    async fn order(s: &MemorySurface) -> Vec<String> {
        s.children(&DomId::from("root"))
            .await
            .unwrap()
            .iter()
            .map(DomId::to_string)
            .collect()
    }

    #[test]
    fn test_edge_scan() {
        let rows: Vec<Rect> = (0..4)
            .map(|i| Rect::new(0.0, 40.0 * i as f64, 100.0, 40.0))
            .collect();
        let s = InsertionStrategy::EdgeScan;
        assert_eq!(s.index(&rows, 10.0, 45.0), 1);
        assert_eq!(s.index(&rows, 10.0, -5.0), 0);
        assert_eq!(s.index(&rows, 10.0, 500.0), 4);
        // right of a row's edge falls through to the next row below
        assert_eq!(s.index(&rows, 150.0, 45.0), 2);
    }

    #[test]
    fn test_nearest_center_in_wrapped_row() {
        // two rows of two boxes
        let grid = vec![
            Rect::new(0.0, 0.0, 50.0, 50.0),
            Rect::new(50.0, 0.0, 50.0, 50.0),
            Rect::new(0.0, 50.0, 50.0, 50.0),
            Rect::new(50.0, 50.0, 50.0, 50.0),
        ];
        let s = InsertionStrategy::NearestCenter;
        assert_eq!(s.index(&grid, 60.0, 70.0), 3);
        assert_eq!(s.index(&grid, 90.0, 70.0), 4);
        assert_eq!(s.index(&grid, 40.0, 10.0), 1);
        assert_eq!(s.index(&[], 0.0, 0.0), 0);
    }

    #[tokio::test]
    async fn test_drag_reorders_and_marks_new_index() {
        let (surface, adapter) = setup();
        let mut session = adapter.start_drag(&t("c")).await.unwrap();
        // from c's middle (y = 100) up into b's band
        session.drag(0.0, -55.0, 10.0, 45.0).await.unwrap();
        let outcome = session.end().await.unwrap();

        assert_eq!(
            outcome,
            DragOutcome::Reordered {
                target: t("c"),
                original_index: 2,
                new_index: 1,
            }
        );
        assert_eq!(order(&surface).await, vec!["a", "c", "b", "d", "e", "abs"]);
        let c = surface.get_element(&DomId::from("c")).await.unwrap();
        assert_eq!(
            c.attributes.get(attrs::DATA_ONLOOK_NEW_INDEX).map(String::as_str),
            Some("1")
        );
        assert!(!c.attributes.contains_key(attrs::DATA_ONLOOK_DRAGGING));
        assert!(c.style("transform").is_none());
        assert_eq!(adapter.edit_state(&DomId::from("c")).unwrap().new_index, Some(1));

        // the move that records the drag consumes the marker
        adapter
            .apply(&Action::MoveElement(MoveElementAction {
                target: t("c"),
                original_index: 2,
                new_index: 1,
            }))
            .await
            .unwrap();
        let c = surface.get_element(&DomId::from("c")).await.unwrap();
        assert!(!c.attributes.contains_key(attrs::DATA_ONLOOK_NEW_INDEX));
        assert!(adapter.edit_state(&DomId::from("c")).is_none());
    }

    #[tokio::test]
    async fn test_drag_below_threshold_is_noop() {
        let (surface, adapter) = setup();
        let before = surface.snapshot().unwrap();
        let mut session = adapter.start_drag(&t("b")).await.unwrap();
        session.drag(2.0, 3.0, 10.0, 200.0).await.unwrap();
        let outcome = session.end().await.unwrap();
        assert!(!outcome.changed());
        assert_eq!(surface.snapshot().unwrap(), before);
        assert!(adapter.edit_state(&DomId::from("b")).is_none());
    }

    #[tokio::test]
    async fn test_cancel_restores() {
        let (surface, adapter) = setup();
        let before = surface.snapshot().unwrap();
        let mut session = adapter.start_drag(&t("a")).await.unwrap();
        session.drag(0.0, 150.0, 10.0, 170.0).await.unwrap();
        assert_ne!(surface.snapshot().unwrap(), before);
        session.cancel().await.unwrap();
        assert_eq!(surface.snapshot().unwrap(), before);
    }

    #[tokio::test]
    async fn test_dropped_session_restores() {
        let (surface, adapter) = setup();
        let before = surface.snapshot().unwrap();
        {
            let mut session = adapter.start_drag(&t("d")).await.unwrap();
            session.drag(0.0, -100.0, 10.0, 30.0).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(surface.snapshot().unwrap(), before);
    }

    #[tokio::test]
    async fn test_reentrant_start_keeps_saved_style() {
        let (surface, adapter) = setup();
        surface
            .set_style(&DomId::from("b"), "transform", "scale(2)")
            .await
            .unwrap();
        let mut first = adapter.start_drag(&t("b")).await.unwrap();
        first.drag(0.0, 60.0, 10.0, 130.0).await.unwrap();
        // second start while the first is still live
        let second = adapter.start_drag(&t("b")).await.unwrap();
        assert_eq!(
            adapter
                .edit_state(&DomId::from("b"))
                .unwrap()
                .saved_style
                .unwrap()
                .transform
                .as_deref(),
            Some("scale(2)")
        );
        second.cancel().await.unwrap();
        first.cancel().await.unwrap();
        let b = surface.get_element(&DomId::from("b")).await.unwrap();
        assert_eq!(b.style("transform"), Some("scale(2)"));
    }

    #[tokio::test]
    async fn test_failed_cancel_still_cleans_up() {
        let (surface, adapter) = setup();
        surface
            .set_style(&DomId::from("b"), "transform", "scale(2)")
            .await
            .unwrap();
        let before = surface.snapshot().unwrap();
        let mut session = adapter.start_drag(&t("b")).await.unwrap();
        session.drag(0.0, 100.0, 10.0, 170.0).await.unwrap();

        // the first cleanup read fails
        surface.fail_next(1);
        assert!(session.cancel().await.is_err());

        assert_eq!(order(&surface).await, vec!["a", "b", "c", "d", "e", "abs"]);
        let b = surface.get_element(&DomId::from("b")).await.unwrap();
        assert_eq!(b.style("transform"), Some("scale(2)"));
        assert!(!b.attributes.contains_key(attrs::DATA_ONLOOK_DRAGGING));
        assert_eq!(surface.snapshot().unwrap(), before);
    }

    #[tokio::test]
    async fn test_next_drag_recovers_from_failed_cleanup() {
        let (surface, adapter) = setup();
        surface
            .set_style(&DomId::from("b"), "transform", "scale(2)")
            .await
            .unwrap();
        let before = surface.snapshot().unwrap();
        let mut session = adapter.start_drag(&t("b")).await.unwrap();
        session.drag(0.0, 100.0, 10.0, 170.0).await.unwrap();

        // every cleanup step fails
        surface.fail_next(100);
        assert!(session.cancel().await.is_err());
        surface.fail_next(0);
        assert_eq!(order(&surface).await.len(), 7);
        let saved = adapter.edit_state(&DomId::from("b")).unwrap().saved_style.unwrap();
        assert_eq!(saved.transform.as_deref(), Some("scale(2)"));

        let session = adapter.start_drag(&t("b")).await.unwrap();
        session.cancel().await.unwrap();
        assert_eq!(surface.snapshot().unwrap(), before);
        assert!(adapter.edit_state(&DomId::from("b")).is_none());
    }

    #[tokio::test]
    async fn test_absolute_drag_reports_offsets() {
        let (surface, adapter) = setup();
        let mut session = adapter.start_drag(&t("abs")).await.unwrap();
        session.drag(30.0, 40.0, 0.0, 0.0).await.unwrap();
        let live = surface.get_element(&DomId::from("abs")).await.unwrap();
        assert_eq!(live.style("left"), Some("40px"));

        let outcome = session.end().await.unwrap();
        match outcome {
            DragOutcome::Repositioned { left, top, .. } => {
                assert_eq!((left.original.as_str(), left.new.as_str()), ("10px", "40px"));
                assert_eq!((top.original.as_str(), top.new.as_str()), ("20px", "60px"));
            }
            other => panic!("expected reposition, got {other:?}"),
        }
        let live = surface.get_element(&DomId::from("abs")).await.unwrap();
        assert_eq!(live.style("left"), Some("10px"));
        assert_eq!(order(&surface).await.len(), 6);
    }

    #[tokio::test]
    async fn test_root_cannot_be_dragged() {
        let (_surface, adapter) = setup();
        assert!(adapter.start_drag(&t("root")).await.is_err());
    }
}
