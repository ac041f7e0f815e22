//! Element Locator: from an [`ActionTarget`] to the live element.
//!
//! Lookup goes by dom id first, which is exact while the surface lives. When
//! the surface was reloaded the dom id is gone, so the locator falls back to
//! the oid. One render of that oid is taken as is; several are narrowed by
//! where the old dom id was last seen (parent oid and sibling index). Anything
//! still ambiguous is `ElementNotFound`: the caller re-prompts, nobody guesses.
//!
//! Placements of dom ids a scan no longer finds are retired, not dropped, and
//! survive exactly one more scan. Memory stays bounded by two renders.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;
use utsushi_types::{ActionTarget, DomId, EditorError, FrameId, LiveElement, Oid, Result};

use crate::error::SurfaceError;
use crate::surface::RenderSurface;

/// Where an element was last seen.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Placement {
    parent_oid: Option<Oid>,
    index: usize,
}

impl Placement {
    fn of(el: &LiveElement) -> Self {
        Self {
            parent_oid: el.parent.as_ref().and_then(|p| p.oid.clone()),
            index: el.index,
        }
    }
}

/// Resolves targets against one surface.
pub struct ElementLocator {
    surface: Arc<dyn RenderSurface>,
    last_seen: DashMap<DomId, Placement>,
    retired: DashMap<DomId, Placement>,
}

impl std::fmt::Debug for ElementLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementLocator")
            .field("frame_id", self.surface.frame_id())
            .field("known", &self.last_seen.len())
            .field("retired", &self.retired.len())
            .finish()
    }
}

impl ElementLocator {
    pub fn new(surface: Arc<dyn RenderSurface>) -> Self {
        Self {
            surface,
            last_seen: DashMap::new(),
            retired: DashMap::new(),
        }
    }

    pub fn frame_id(&self) -> &FrameId {
        self.surface.frame_id()
    }

    fn check_frame(&self, target: &ActionTarget) -> Result<()> {
        if &target.frame_id != self.frame_id() {
            return Err(EditorError::CrossSurfaceTarget {
                expected: self.frame_id().clone(),
                found: target.frame_id.clone(),
            });
        }
        Ok(())
    }

    /// Find the live element for `target`.
    pub async fn resolve(&self, target: &ActionTarget) -> Result<LiveElement> {
        self.check_frame(target)?;
        match self.surface.get_element(&target.dom_id).await {
            Ok(el) => {
                self.remember(&el);
                return Ok(el);
            }
            Err(SurfaceError::NotFound(_)) => {}
            Err(e) => return Err(e.on(self.frame_id())),
        }

        let Some(oid) = &target.oid else {
            return Err(EditorError::not_found(target));
        };
        let candidates: Vec<LiveElement> = self
            .surface
            .scan()
            .await
            .map_err(|e| e.on(self.frame_id()))?
            .into_iter()
            .filter(|el| el.oid() == Some(oid))
            .collect();

        let found = match candidates.len() {
            0 => None,
            1 => candidates.into_iter().next(),
            n => {
                debug!(target = %target, candidates = n, "oid rendered more than once");
                self.disambiguate(&target.dom_id, candidates)
            }
        };
        let el = found.ok_or_else(|| EditorError::not_found(target))?;
        debug!(target = %target, now = %el.dom_id(), "resolved stale dom id by oid");
        self.remember(&el);
        Ok(el)
    }

    fn disambiguate(&self, stale: &DomId, candidates: Vec<LiveElement>) -> Option<LiveElement> {
        let placement = match self.last_seen.get(stale) {
            Some(p) => p.clone(),
            None => self.retired.get(stale)?.clone(),
        };
        let mut matching = candidates
            .into_iter()
            .filter(|el| Placement::of(el) == placement);
        let first = matching.next()?;
        matching.next().is_none().then_some(first)
    }

    /// Position of `target` among its element siblings.
    pub async fn index_of(&self, target: &ActionTarget) -> Result<usize> {
        Ok(self.resolve(target).await?.index)
    }

    /// The parent of `target`, or `None` for the root.
    pub async fn parent_of(&self, target: &ActionTarget) -> Result<Option<ActionTarget>> {
        Ok(self.resolve(target).await?.parent)
    }

    /// Record where an element is.
    pub fn remember(&self, el: &LiveElement) {
        self.last_seen.insert(el.dom_id().clone(), Placement::of(el));
    }

    /// Replace everything known with a fresh scan. Returns how many dom ids
    /// were retired because the scan no longer found them.
    pub fn sync(&self, elements: &[LiveElement]) -> usize {
        let present: HashSet<&DomId> = elements.iter().map(LiveElement::dom_id).collect();
        let vanished: Vec<DomId> = self
            .last_seen
            .iter()
            .filter(|entry| !present.contains(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        self.retired.clear();
        for id in &vanished {
            if let Some((id, placement)) = self.last_seen.remove(id) {
                self.retired.insert(id, placement);
            }
        }
        for el in elements {
            self.remember(el);
        }
        vanished.len()
    }

    /// Drop everything known about `ids`.
    pub fn forget(&self, ids: &[DomId]) {
        for id in ids {
            self.last_seen.remove(id);
            self.retired.remove(id);
        }
    }

    /// Placements held, live and retired.
    pub fn len(&self) -> usize {
        self.last_seen.len() + self.retired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn knows(&self, dom_id: &DomId) -> bool {
        self.last_seen.contains_key(dom_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySurface;
    use utsushi_types::{ActionElement, ErrorKind, attrs};

    fn el(dom: &str, oid: &str) -> ActionElement {
        ActionElement {
            dom_id: DomId::from(dom),
            oid: Oid::from(oid),
            ..ActionElement::new("div")
        }
        .with_attribute(attrs::DATA_ONLOOK_DOM_ID, dom)
        .with_attribute(attrs::DATA_ONLOOK_ID, oid)
    }

    /// A list rendering one card component twice.
    fn page(suffix: &str) -> ActionElement {
        el(&format!("root{suffix}"), "root")
            .with_child(el(&format!("h{suffix}"), "heading"))
            .with_child(el(&format!("c1{suffix}"), "card"))
            .with_child(el(&format!("c2{suffix}"), "card"))
    }

    fn target(dom: &str, oid: &str) -> ActionTarget {
        ActionTarget::new(FrameId::from("f1"), DomId::from(dom), Some(Oid::from(oid)))
    }

    fn locator(root: &ActionElement) -> ElementLocator {
        let surface = MemorySurface::new(FrameId::from("f1"), root).unwrap();
        ElementLocator::new(Arc::new(surface))
    }

    #[tokio::test]
    async fn test_resolve_by_dom_id() {
        let loc = locator(&page(""));
        let el = loc.resolve(&target("c2", "card")).await.unwrap();
        assert_eq!(el.index, 2);
        assert_eq!(loc.index_of(&target("c2", "card")).await.unwrap(), 2);
        let parent = loc.parent_of(&target("c2", "card")).await.unwrap().unwrap();
        assert_eq!(parent.dom_id, DomId::from("root"));
    }

    #[tokio::test]
    async fn test_unique_oid_fallback() {
        let loc = locator(&page("-reloaded"));
        let el = loc.resolve(&target("h", "heading")).await.unwrap();
        assert_eq!(el.dom_id(), &DomId::from("h-reloaded"));
    }

    #[tokio::test]
    async fn test_ambiguous_oid_is_not_guessed() {
        let loc = locator(&page("-reloaded"));
        let err = loc.resolve(&target("c2", "card")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ElementNotFound);
    }

    #[tokio::test]
    async fn test_last_seen_placement_narrows() {
        let before = locator(&page(""));
        before.resolve(&target("c2", "card")).await.unwrap();

        // same locator memory, reloaded surface
        let after = locator(&page("-reloaded"));
        for entry in before.last_seen.iter() {
            after.last_seen.insert(entry.key().clone(), entry.value().clone());
        }
        let el = after.resolve(&target("c2", "card")).await.unwrap();
        assert_eq!(el.dom_id(), &DomId::from("c2-reloaded"));
    }

    #[tokio::test]
    async fn test_sync_retires_then_drops_vanished_ids() {
        let surface = Arc::new(MemorySurface::new(FrameId::from("f1"), &page("")).unwrap());
        let loc = ElementLocator::new(surface.clone());
        loc.sync(&surface.scan().await.unwrap());
        assert_eq!(loc.len(), 4);

        // the surface reloads with fresh dom ids
        let reloaded = MemorySurface::new(FrameId::from("f1"), &page("-reloaded")).unwrap();
        let elements = reloaded.scan().await.unwrap();
        assert_eq!(loc.sync(&elements), 4);
        assert!(loc.knows(&DomId::from("c2-reloaded")));
        assert!(loc.retired.contains_key(&DomId::from("c2")));
        assert_eq!(loc.len(), 8);

        // a stale target can still be narrowed right after the reload
        let after = ElementLocator::new(Arc::new(reloaded));
        for entry in loc.retired.iter() {
            after.retired.insert(entry.key().clone(), entry.value().clone());
        }
        let el = after.resolve(&target("c2", "card")).await.unwrap();
        assert_eq!(el.dom_id(), &DomId::from("c2-reloaded"));

        // repeated scans do not grow memory
        for _ in 0..3 {
            assert_eq!(loc.sync(&elements), 0);
        }
        assert_eq!(loc.len(), 4);
        assert!(!loc.knows(&DomId::from("c2")));
        assert!(!loc.retired.contains_key(&DomId::from("c2")));

        loc.forget(&[DomId::from("h-reloaded")]);
        assert_eq!(loc.len(), 3);
    }

    #[tokio::test]
    async fn test_cross_surface_rejected() {
        let loc = locator(&page(""));
        let other = ActionTarget::new(FrameId::from("f2"), DomId::from("h"), None);
        let err = loc.resolve(&other).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CrossSurfaceTarget);
    }

    #[tokio::test]
    async fn test_missing_without_oid() {
        let loc = locator(&page(""));
        let gone = ActionTarget::new(FrameId::from("f1"), DomId::from("zzz"), None);
        assert_eq!(loc.resolve(&gone).await.unwrap_err().kind(), ErrorKind::ElementNotFound);
    }
}
