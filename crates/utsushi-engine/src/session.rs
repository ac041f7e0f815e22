//! Editor session: the one context object every component is built from.
//!
//! Holds the configuration, the source layer, one [`SurfaceAdapter`] per
//! render surface, per-surface action locks and the history. Nothing in the
//! engine is global; two sessions never share state.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use tokio::sync::{Mutex as TokioMutex, OwnedMutexGuard};
use tracing::{debug, info};
use utsushi_source::{SourceFiles, SourceSync};
use utsushi_surface::{RenderSurface, SurfaceAdapter};
use utsushi_types::{EditorError, FrameId, Result};

use crate::config::{BusyPolicy, EngineConfig};
use crate::history::HistoryManager;

/// Shared editing context.
pub struct EditorSession {
    config: EngineConfig,
    source: Arc<SourceSync>,
    surfaces: DashMap<FrameId, Arc<SurfaceAdapter>>,
    frame_locks: DashMap<FrameId, Arc<TokioMutex<()>>>,
    history: Mutex<HistoryManager>,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("surfaces", &self.surfaces.len())
            .field("history", &"<locked>")
            .field("busy_policy", &self.config.busy_policy)
            .finish()
    }
}

impl EditorSession {
    pub fn new(config: EngineConfig, files: Arc<dyn SourceFiles>) -> Self {
        let source = SourceSync::new(files).with_write_timeout(config.write_lock_timeout());
        Self {
            history: Mutex::new(HistoryManager::new(config.history_limit)),
            source: Arc::new(source),
            surfaces: DashMap::new(),
            frame_locks: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<SourceSync> {
        &self.source
    }

    /// Register a render surface. Replaces any adapter for the same frame.
    pub fn add_surface(&self, surface: Arc<dyn RenderSurface>) -> Arc<SurfaceAdapter> {
        let frame = surface.frame_id().clone();
        let adapter = Arc::new(
            SurfaceAdapter::new(surface)
                .with_timeout(self.config.surface_timeout())
                .with_insertion_strategy(self.config.insertion_strategy)
                .with_min_drag_distance(self.config.min_drag_distance),
        );
        info!(frame = %frame, "surface registered");
        self.surfaces.insert(frame, adapter.clone());
        adapter
    }

    pub fn remove_surface(&self, frame: &FrameId) -> Option<Arc<SurfaceAdapter>> {
        self.frame_locks.remove(frame);
        self.surfaces.remove(frame).map(|(_, adapter)| adapter)
    }

    /// The adapter driving `frame`.
    pub fn adapter(&self, frame: &FrameId) -> Result<Arc<SurfaceAdapter>> {
        self.surfaces
            .get(frame)
            .map(|a| a.value().clone())
            .ok_or_else(|| EditorError::invalid_action(format!("unknown surface {frame}")))
    }

    pub fn frames(&self) -> Vec<FrameId> {
        self.surfaces.iter().map(|e| e.key().clone()).collect()
    }

    /// Serialize actions on one surface. Under [`BusyPolicy::Reject`] a
    /// surface already applying an action fails with `SurfaceBusy`.
    pub async fn lock_frame(&self, frame: &FrameId) -> Result<OwnedMutexGuard<()>> {
        let lock = self
            .frame_locks
            .entry(frame.clone())
            .or_insert_with(|| Arc::new(TokioMutex::new(())))
            .clone();
        match self.config.busy_policy {
            BusyPolicy::Queue => Ok(lock.lock_owned().await),
            BusyPolicy::Reject => lock.try_lock_owned().map_err(|_| {
                debug!(frame = %frame, "surface busy, rejecting");
                EditorError::SurfaceBusy(frame.clone())
            }),
        }
    }

    /// Whether an action is in flight on `frame`.
    pub fn is_busy(&self, frame: &FrameId) -> bool {
        self.frame_locks
            .get(frame)
            .is_some_and(|lock| lock.try_lock().is_err())
    }

    pub fn history(&self) -> MutexGuard<'_, HistoryManager> {
        self.history.lock()
    }
}
