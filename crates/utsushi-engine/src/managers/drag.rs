//! Drag and keyboard shift.
//!
//! A drag changes only the surface until it ends; the outcome is then
//! recorded as a `move-element` (in-flow) or as `left`/`top` style edits in
//! one step (absolute).

use std::sync::Arc;

use strum::{Display, EnumString};
use utsushi_surface::{DragOutcome, DragSession, SurfaceAdapter};
use utsushi_types::{
    Action, ActionTarget, EditStyleAction, EditorError, LiveElement, MoveElementAction, Result,
};

use crate::runner::ActionRunner;

/// Keyboard shift direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub struct DragManager {
    runner: ActionRunner,
}

impl DragManager {
    pub fn new(runner: ActionRunner) -> Self {
        Self { runner }
    }

    fn adapter(&self, target: &ActionTarget) -> Result<Arc<SurfaceAdapter>> {
        self.runner.session().adapter(&target.frame_id)
    }

    pub async fn start(&self, target: &ActionTarget) -> Result<DragSession> {
        self.adapter(target)?.start_drag(target).await
    }

    /// End the drag and record what it changed.
    pub async fn end(&self, session: DragSession) -> Result<Vec<Action>> {
        let outcome = session.end().await?;
        self.record(outcome).await
    }

    /// Record a finished drag. Nothing is recorded when nothing changed.
    pub async fn record(&self, outcome: DragOutcome) -> Result<Vec<Action>> {
        if !outcome.changed() {
            return Ok(Vec::new());
        }
        match outcome {
            DragOutcome::Reordered {
                target,
                original_index,
                new_index,
            } => {
                let action = Action::MoveElement(MoveElementAction {
                    target,
                    original_index,
                    new_index,
                });
                Ok(vec![self.runner.run(action).await?])
            }
            DragOutcome::Repositioned { target, left, top } => {
                let actions = [("left", left), ("top", top)]
                    .into_iter()
                    .filter(|(_, change)| change.changed())
                    .map(|(key, change)| {
                        Action::EditStyle(EditStyleAction {
                            targets: vec![target.clone()],
                            style_key: key.to_string(),
                            original_value: change.original,
                            new_value: change.new,
                        })
                    })
                    .collect();
                self.runner.run_all(actions).await
            }
        }
    }

    /// Move `element` one sibling slot. `None` at either edge.
    pub async fn shift(&self, element: &LiveElement, direction: Direction) -> Result<Option<Action>> {
        let target = element.to_target();
        let adapter = self.adapter(&target)?;
        let live = adapter.resolve(&target).await?;
        let parent = live
            .parent
            .as_ref()
            .ok_or_else(|| EditorError::invalid_action("the root element cannot be shifted"))?;
        let siblings = adapter.resolve(parent).await?.child_count;

        let new_index = match direction {
            Direction::Up => live.index.saturating_sub(1),
            Direction::Down => (live.index + 1).min(siblings.saturating_sub(1)),
        };
        if new_index == live.index {
            return Ok(None);
        }
        let action = Action::MoveElement(MoveElementAction {
            target: live.to_target(),
            original_index: live.index,
            new_index,
        });
        Ok(Some(self.runner.run(action).await?))
    }
}
