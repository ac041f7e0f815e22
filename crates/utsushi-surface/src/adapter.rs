//! Live-Surface Adapter: actions in, surface calls out, ground truth back.
//!
//! ```text
//!   Action ──▶ resolve targets ──▶ surface calls ──▶ read back ──▶ Action'
//!               (ElementLocator)    (timeout each)    (indices,     (what
//!                                         │            snapshots)    happened)
//!                                         ▼ failure
//!                                 resync + SurfaceIo
//! ```
//!
//! The action returned from [`SurfaceAdapter::apply`] records what the
//! surface actually did: the index an element really landed on, the exact
//! snapshot of a removed element, the sibling order of grouped children.
//! Its inverse is therefore exact.
//!
//! Per-element edit state (saved drag styles, original indices, text-edit
//! originals) lives here in [`ElementEditState`], out of band. The surface
//! only carries the few marker attributes it needs itself.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, info, warn};
use utsushi_types::{
    Action, ActionElement, ActionTarget, DeleteElementAction, DomId, EditorError, ErrorKind, FrameId,
    GroupElementsAction, InsertElementAction, InsertLocation, LiveElement, Result,
    UngroupElementsAction, attrs,
};

use crate::drag::InsertionStrategy;
use crate::error::{SurfaceError, SurfaceResult};
use crate::locator::ElementLocator;
use crate::surface::RenderSurface;

/// Default per-call timeout.
pub const DEFAULT_SURFACE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default pointer travel before a drag starts moving anything.
pub const DEFAULT_MIN_DRAG_DISTANCE: f64 = 5.0;

/// Inline styles saved when a drag starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedStyle {
    pub position: Option<String>,
    pub transform: Option<String>,
    pub left: Option<String>,
    pub top: Option<String>,
}

impl SavedStyle {
    pub fn of(el: &LiveElement) -> Self {
        let get = |k: &str| el.style(k).map(str::to_string);
        Self {
            position: get("position"),
            transform: get("transform"),
            left: get("left"),
            top: get("top"),
        }
    }
}

/// Out-of-band edit state for one live element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementEditState {
    /// Set once per drag; a re-entrant start keeps the first.
    pub saved_style: Option<SavedStyle>,
    pub original_index: Option<usize>,
    /// Where a finished drag left the element, until a move action consumes it.
    pub new_index: Option<usize>,
    /// Content before the current text-editing session.
    pub text_original: Option<String>,
}

impl ElementEditState {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Drives one render surface.
pub struct SurfaceAdapter {
    pub(crate) surface: Arc<dyn RenderSurface>,
    pub(crate) locator: ElementLocator,
    pub(crate) edit_state: DashMap<DomId, ElementEditState>,
    pub(crate) timeout: Duration,
    pub(crate) strategy: InsertionStrategy,
    pub(crate) min_drag_distance: f64,
}

impl std::fmt::Debug for SurfaceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceAdapter")
            .field("frame_id", self.frame_id())
            .field("editing", &self.edit_state.len())
            .field("timeout", &self.timeout)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

impl SurfaceAdapter {
    pub fn new(surface: Arc<dyn RenderSurface>) -> Self {
        Self {
            locator: ElementLocator::new(surface.clone()),
            surface,
            edit_state: DashMap::new(),
            timeout: DEFAULT_SURFACE_TIMEOUT,
            strategy: InsertionStrategy::default(),
            min_drag_distance: DEFAULT_MIN_DRAG_DISTANCE,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_insertion_strategy(mut self, strategy: InsertionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_min_drag_distance(mut self, distance: f64) -> Self {
        self.min_drag_distance = distance;
        self
    }

    pub fn frame_id(&self) -> &FrameId {
        self.surface.frame_id()
    }

    pub fn surface(&self) -> &Arc<dyn RenderSurface> {
        &self.surface
    }

    pub fn locator(&self) -> &ElementLocator {
        &self.locator
    }

    /// Edit state for an element, if any is held.
    pub fn edit_state(&self, dom_id: &DomId) -> Option<ElementEditState> {
        self.edit_state.get(dom_id).map(|s| s.clone())
    }

    pub(crate) fn update_state(&self, dom_id: &DomId, f: impl FnOnce(&mut ElementEditState)) {
        let mut entry = self.edit_state.entry(dom_id.clone()).or_default();
        f(&mut entry);
        let empty = entry.is_empty();
        drop(entry);
        if empty {
            self.edit_state.remove(dom_id);
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Run one surface call under the timeout. Any failure means the surface
    /// state is unknown, so it triggers a resync before the error returns.
    pub(crate) async fn call<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = SurfaceResult<T>> + Send,
    {
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(SurfaceError::Timeout {
                op,
                after: self.timeout,
            }),
        };
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(frame = %self.frame_id(), op, error = %e, "surface call failed, resyncing");
                self.resync_quietly().await;
                Err(e.on(self.frame_id()))
            }
        }
    }

    async fn resync_quietly(&self) {
        if let Err(e) = self.resync().await {
            warn!(frame = %self.frame_id(), error = %e, "resync failed");
        }
    }

    /// Rescan the surface: refresh the locator and drop edit state for
    /// elements that no longer exist. Returns the element count.
    pub async fn resync(&self) -> Result<usize> {
        let elements = match tokio::time::timeout(self.timeout, self.surface.scan()).await {
            Ok(Ok(elements)) => elements,
            Ok(Err(e)) => return Err(e.on(self.frame_id())),
            Err(_) => {
                return Err(SurfaceError::Timeout {
                    op: "scan",
                    after: self.timeout,
                }
                .on(self.frame_id()));
            }
        };
        let retired = self.locator.sync(&elements);
        let present: HashSet<&DomId> = elements.iter().map(LiveElement::dom_id).collect();
        let before = self.edit_state.len();
        self.edit_state.retain(|id, _| present.contains(id));
        info!(
            frame = %self.frame_id(),
            elements = elements.len(),
            retired,
            pruned = before - self.edit_state.len(),
            "surface resynced"
        );
        Ok(elements.len())
    }

    /// Resolve one target through the locator.
    pub async fn resolve(&self, target: &ActionTarget) -> Result<LiveElement> {
        self.locator.resolve(target).await
    }

    /// Resolve every target an action carries, failing fast on the first miss.
    pub async fn resolve_targets(&self, action: &Action) -> Result<HashMap<DomId, LiveElement>> {
        let mut live = HashMap::new();
        for target in action.targets() {
            if live.contains_key(&target.dom_id) {
                continue;
            }
            match self.locator.resolve(target).await {
                Ok(el) => {
                    live.insert(target.dom_id.clone(), el);
                }
                Err(e) => {
                    if e.kind() == ErrorKind::SurfaceIo {
                        self.resync_quietly().await;
                    }
                    return Err(e);
                }
            }
        }
        Ok(live)
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Apply `action` to the surface. Returns the action as it actually
    /// happened, which is what history records and what gets inverted.
    pub async fn apply(&self, action: &Action) -> Result<Action> {
        let live = self.resolve_targets(action).await?;
        let mut action = action.clone();
        retarget(&mut action, &live);

        match &mut action {
            Action::InsertElement(a) => self.insert(a, &live).await?,
            Action::DeleteElement(a) => self.delete(a).await?,
            Action::MoveElement(a) => {
                let current = live
                    .get(&a.target.dom_id)
                    .map(|el| el.index)
                    .ok_or_else(|| EditorError::not_found(&a.target))?;
                let landed = self
                    .call("move_element", self.surface.move_element(&a.target.dom_id, a.new_index))
                    .await?;
                // an element a drag already placed keeps the recorded origin
                if current != landed {
                    a.original_index = current;
                }
                a.new_index = landed;
                self.consume_new_index(&a.target.dom_id).await?;
            }
            Action::EditText(a) => {
                for t in &a.targets {
                    self.call("edit_text", self.surface.edit_text(&t.dom_id, &a.new_content))
                        .await?;
                }
            }
            Action::EditStyle(a) => {
                for t in &a.targets {
                    self.set_style(&t.dom_id, &a.style_key, &a.new_value).await?;
                }
            }
            Action::GroupElements(a) => self.group(a, &live).await?,
            Action::UngroupElements(a) => self.ungroup(a).await?,
            Action::WriteCode(_) => {}
        }

        debug!(frame = %self.frame_id(), kind = %action.kind(), "applied to surface");
        Ok(action)
    }

    /// `className` sets the `class` attribute; anything else is an inline style.
    pub async fn set_style(&self, dom_id: &DomId, key: &str, value: &str) -> Result<()> {
        if key == "className" {
            let value = (!value.is_empty()).then_some(value);
            self.call("set_attribute", self.surface.set_attribute(dom_id, "class", value))
                .await
        } else {
            self.call("set_style", self.surface.set_style(dom_id, key, value))
                .await
        }
    }

    async fn insert(
        &self,
        a: &mut InsertElementAction,
        live: &HashMap<DomId, LiveElement>,
    ) -> Result<()> {
        for (i, t) in a.targets.iter().enumerate() {
            let parent = live.get(&t.dom_id).ok_or_else(|| EditorError::not_found(t))?;
            let location = InsertLocation {
                target_selector_or_id: t.dom_id.to_string(),
                ..a.location.clone()
            };
            let index = location.resolve(parent.child_count);
            // further renders of the same parent get their own dom ids
            let element = if i == 0 {
                a.element.clone()
            } else {
                a.element.cleaned(DomId::new(), a.element.oid.clone())
            };
            self.call(
                "insert_element",
                self.surface
                    .insert_element(&element, &location.resolved(index)),
            )
            .await?;
            if i == 0 {
                a.location = location.resolved(index);
            }
        }
        debug!(element = %a.element.dom_id, index = a.location.index, "inserted");
        Ok(())
    }

    async fn delete(&self, a: &mut DeleteElementAction) -> Result<()> {
        let removed_id = a.removed_element.dom_id.clone();
        for (i, t) in a.targets.iter().enumerate() {
            let children = self
                .call("children", self.surface.children(&t.dom_id))
                .await?;
            let index = match children.iter().position(|c| *c == removed_id) {
                Some(index) => index,
                None => self.child_by_oid(t, &children, &a.removed_element).await?,
            };
            let snapshot = self
                .call("remove_element", self.surface.remove_element(&t.dom_id, index))
                .await?;
            let gone = snapshot.dom_ids();
            for id in &gone {
                self.edit_state.remove(id);
            }
            self.locator.forget(&gone);
            if i == 0 {
                a.removed_element = snapshot;
                a.location = InsertLocation::at(&t.dom_id, index);
            }
        }
        Ok(())
    }

    /// Index among `children` of an element whose dom id went stale, found
    /// again by its oid. The recorded index is never trusted on its own.
    async fn child_by_oid(
        &self,
        parent: &ActionTarget,
        children: &[DomId],
        removed: &ActionElement,
    ) -> Result<usize> {
        let stale = ActionTarget::new(
            self.frame_id().clone(),
            removed.dom_id.clone(),
            Some(removed.oid.clone()),
        );
        let el = self.locator.resolve(&stale).await?;
        let under_parent = el.parent.as_ref().is_some_and(|p| p.dom_id == parent.dom_id);
        if !under_parent || children.get(el.index) != Some(el.dom_id()) {
            return Err(EditorError::ElementNotFound {
                target: format!("{}/{}", self.frame_id(), removed.dom_id),
            });
        }
        debug!(stale = %removed.dom_id, now = %el.dom_id(), "removing stale dom id by oid");
        Ok(el.index)
    }

    async fn group(
        &self,
        a: &mut GroupElementsAction,
        live: &HashMap<DomId, LiveElement>,
    ) -> Result<()> {
        let mut children: Vec<(usize, ActionTarget)> = Vec::with_capacity(a.children.len());
        for child in &a.children {
            let el = live.get(&child.dom_id).ok_or_else(|| EditorError::not_found(child))?;
            if el.parent.as_ref().map(|p| &p.dom_id) != Some(&a.parent.dom_id) {
                return Err(EditorError::invalid_group(format!(
                    "{} is not a child of {}",
                    child.dom_id, a.parent.dom_id
                )));
            }
            children.push((el.index, child.clone()));
        }
        children.sort_by_key(|(index, _)| *index);
        children.dedup_by_key(|(index, _)| *index);

        let ids: Vec<DomId> = children.iter().map(|(_, t)| t.dom_id.clone()).collect();
        let container = strip_children(&a.container);
        self.call(
            "group_elements",
            self.surface.group_elements(&a.parent.dom_id, &container, &ids),
        )
        .await?;
        a.child_indices = Some(children.iter().map(|(i, _)| *i).collect());
        a.children = children.into_iter().map(|(_, t)| t).collect();
        a.container = container;
        Ok(())
    }

    async fn ungroup(&self, a: &mut UngroupElementsAction) -> Result<()> {
        let container_id = a.container.dom_id.clone();
        let at = self
            .call("get_element_index", self.surface.get_element_index(&container_id))
            .await?;
        let snapshot = self
            .call("get_action_element", self.surface.get_action_element(&container_id))
            .await?;
        let kids = self
            .call(
                "ungroup_elements",
                self.surface.ungroup_elements(&a.parent.dom_id, &container_id),
            )
            .await?;
        a.container = strip_children(&snapshot);
        self.edit_state.remove(&container_id);

        if a.children.is_empty() {
            let frame = self.frame_id().clone();
            a.children = snapshot
                .children
                .iter()
                .map(|c| {
                    let oid = (!c.oid.is_empty()).then(|| c.oid.clone());
                    ActionTarget::new(frame.clone(), c.dom_id.clone(), oid)
                })
                .collect();
        }

        let Some(indices) = &a.child_indices else {
            return Ok(());
        };
        if indices.len() != kids.len() {
            return Err(EditorError::invalid_action(
                "childIndices length does not match the container's children",
            ));
        }
        // Last first: each move leaves the later children already placed.
        for (k, (kid, &target)) in kids.iter().zip(indices).enumerate().rev() {
            if target != at + k {
                self.call("move_element", self.surface.move_element(kid, target))
                    .await?;
            }
        }
        Ok(())
    }

    /// A move that lands after a drag consumes the drag's new-index marker.
    async fn consume_new_index(&self, dom_id: &DomId) -> Result<()> {
        let pending = self
            .edit_state
            .get(dom_id)
            .is_some_and(|s| s.new_index.is_some());
        if pending {
            self.call(
                "set_attribute",
                self.surface
                    .set_attribute(dom_id, attrs::DATA_ONLOOK_NEW_INDEX, None),
            )
            .await?;
            self.update_state(dom_id, |s| s.new_index = None);
        }
        Ok(())
    }

    // ========================================================================
    // Text editing
    // ========================================================================

    /// Enter text editing on `target`. Returns the original content.
    pub async fn start_text_edit(&self, target: &ActionTarget) -> Result<String> {
        let el = self.locator.resolve(target).await?;
        let original = self
            .call("start_editing_text", self.surface.start_editing_text(el.dom_id()))
            .await?;
        self.update_state(el.dom_id(), |s| {
            s.text_original.get_or_insert_with(|| original.clone());
        });
        Ok(original)
    }

    /// Show `content` while editing. Surface only.
    pub async fn edit_text_live(&self, target: &ActionTarget, content: &str) -> Result<LiveElement> {
        self.call("edit_text", self.surface.edit_text(&target.dom_id, content))
            .await
    }

    /// Leave text editing. Returns `(original, new)` content.
    pub async fn stop_text_edit(&self, target: &ActionTarget) -> Result<(String, String)> {
        let done = self
            .call("stop_editing_text", self.surface.stop_editing_text(&target.dom_id))
            .await?;
        let original = self
            .edit_state
            .get(&target.dom_id)
            .and_then(|s| s.text_original.clone())
            .unwrap_or_default();
        self.update_state(&target.dom_id, |s| s.text_original = None);
        Ok((original, done.new_content))
    }

    /// Snapshot an element for copying.
    pub async fn snapshot(&self, target: &ActionTarget) -> Result<ActionElement> {
        let el = self.locator.resolve(target).await?;
        self.call("get_action_element", self.surface.get_action_element(el.dom_id()))
            .await
    }
}

fn strip_children(el: &ActionElement) -> ActionElement {
    ActionElement {
        children: Vec::new(),
        ..el.clone()
    }
}

/// Point targets whose dom id went stale at the element the locator found.
fn retarget(action: &mut Action, live: &HashMap<DomId, LiveElement>) {
    fn fix(t: &mut ActionTarget, live: &HashMap<DomId, LiveElement>) {
        if let Some(el) = live.get(&t.dom_id) {
            if el.dom_id() != &t.dom_id {
                *t = el.to_target();
            }
        }
    }
    match action {
        Action::InsertElement(a) => a.targets.iter_mut().for_each(|t| fix(t, live)),
        Action::DeleteElement(a) => a.targets.iter_mut().for_each(|t| fix(t, live)),
        Action::EditText(a) => a.targets.iter_mut().for_each(|t| fix(t, live)),
        Action::EditStyle(a) => a.targets.iter_mut().for_each(|t| fix(t, live)),
        Action::MoveElement(a) => fix(&mut a.target, live),
        Action::GroupElements(a) => {
            fix(&mut a.parent, live);
            a.children.iter_mut().for_each(|t| fix(t, live));
        }
        Action::UngroupElements(a) => {
            fix(&mut a.parent, live);
            a.children.iter_mut().for_each(|t| fix(t, live));
        }
        Action::WriteCode(_) => {}
    }
}
