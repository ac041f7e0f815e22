//! In-place text editing.
//!
//! Keystrokes only touch the surface. Stopping records one `edit-text`
//! action, and only when the content changed.

use std::sync::Arc;

use utsushi_surface::SurfaceAdapter;
use utsushi_types::{Action, ActionTarget, EditTextAction, LiveElement, Result};

use crate::runner::ActionRunner;

#[derive(Debug, Clone)]
pub struct TextManager {
    runner: ActionRunner,
}

impl TextManager {
    pub fn new(runner: ActionRunner) -> Self {
        Self { runner }
    }

    fn adapter(&self, target: &ActionTarget) -> Result<Arc<SurfaceAdapter>> {
        self.runner.session().adapter(&target.frame_id)
    }

    /// Returns the original content.
    pub async fn start(&self, target: &ActionTarget) -> Result<String> {
        self.adapter(target)?.start_text_edit(target).await
    }

    pub async fn edit(&self, target: &ActionTarget, content: &str) -> Result<LiveElement> {
        self.adapter(target)?.edit_text_live(target, content).await
    }

    pub async fn stop(&self, target: &ActionTarget) -> Result<Option<Action>> {
        let (original, new) = self.adapter(target)?.stop_text_edit(target).await?;
        if original == new {
            return Ok(None);
        }
        let action = Action::EditText(EditTextAction {
            targets: vec![target.clone()],
            original_content: original,
            new_content: new,
        });
        Ok(Some(self.runner.run(action).await?))
    }

    /// Leave editing and put the original content back.
    pub async fn cancel(&self, target: &ActionTarget) -> Result<()> {
        let adapter = self.adapter(target)?;
        let (original, new) = adapter.stop_text_edit(target).await?;
        if original != new {
            adapter.edit_text_live(target, &original).await?;
        }
        Ok(())
    }
}
